//! フィールドスキャナと索引ビルダ
//!
//! このモジュールは、生の辞書テキストを1回の走査で解析し、索引付け可能な
//! トークンのスパン`(オフセット, 長さ, フィールド種別)`をプラガブルな
//! 索引ビルダへ送り出す機能を提供します。
//!
//! 主な構成要素:
//!
//! - [`DictionaryFormat`]: 辞書フォーマットごとのフィールド境界規則
//! - [`EdictFormat`]: EDICT形式(`単語 [読み] /訳語/.../`)の実装
//! - [`DictionaryIndexer`]: 走査とスパンの送出を行うドライバ
//! - [`IndexBuilder`]: スパンを索引ペイロードへ変換する側の契約
//! - [`BinarySearchIndexBuilder`] / [`BinarySearchIndex`]: オフセット配列の
//!   構築側と検索側

pub mod binary_search;
pub mod builder;
pub mod format;
pub mod scanner;

pub use binary_search::BinarySearchIndex;
pub use builder::BinarySearchIndexBuilder;
pub use format::{DictionaryFormat, EdictFormat};
pub use scanner::DictionaryIndexer;

use crate::container::IndexContainer;
use crate::errors::Result;

/// 辞書エントリのフィールド種別
///
/// 索引付けされるトークンが、エントリのどのフィールドにあるかを示します。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// 見出し語フィールド
    Word,
    /// 読みフィールド
    Reading,
    /// 訳語フィールド
    Translation,
}

/// スキャナが駆動する索引ビルダの契約
///
/// 1回の索引構築は必ず`start_build_index`と`end_build_index`で囲まれ、
/// その間に受理されたスパンごとに`add_entry`が呼び出されます。
///
/// ライフタイムパラメータ`'s`は、構築対象の辞書テキストの寿命です。
/// ビルダは`start_build_index`で渡されたテキストを構築終了まで保持できます。
pub trait IndexBuilder<'s> {
    /// 索引構築の開始を通知します。
    ///
    /// # 引数
    ///
    /// * `container` - 構築先のコンテナ。バイトオーダータグの参照に使用されます。
    /// * `source` - 索引付け対象の辞書テキスト
    fn start_build_index(&mut self, container: &IndexContainer, source: &'s [u8]) -> Result<()>;

    /// 1つの索引エントリを追加します。
    ///
    /// # 引数
    ///
    /// * `offset` - 辞書テキスト内のバイトオフセット
    /// * `length` - スパンのバイト長
    /// * `kind` - スパンのフィールド種別
    ///
    /// # 戻り値
    ///
    /// `Ok(true)`で走査を継続します。`Ok(false)`はビルダがこれ以上の入力を
    /// 受け付けられないことを意味し、スキャナは直ちに走査を中断して失敗を
    /// 報告しなければなりません。
    fn add_entry(&mut self, offset: usize, length: usize, kind: FieldKind) -> Result<bool>;

    /// 索引構築の終了を通知します。
    ///
    /// # 引数
    ///
    /// * `container` - 構築先のコンテナ。`success`が`true`の場合、ビルダは
    ///   ここで索引レコードを作成します。
    /// * `success` - 走査が完了した場合は`true`、中断された場合は`false`
    fn end_build_index(&mut self, container: &mut IndexContainer, success: bool) -> Result<()>;
}
