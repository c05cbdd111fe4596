//! # Jiten
//!
//! Jitenは、日本語辞書アプリケーションのためのディスク上の索引付けと
//! 活用形検索のコア実装です。
//!
//! ## 概要
//!
//! このライブラリは、入力された語(活用した動詞・形容詞の形を含む)を、
//! 生の辞書テキスト内の事前構築されたバイトオフセットへ、辞書全体を
//! 走査することなく解決するための3つのコンポーネントを提供します:
//!
//! - **索引コンテナ**: 1つの辞書に対する複数の名前付きバイナリ索引を
//!   1つのファイルに永続化するランダムアクセス可能なフォーマット
//! - **フィールドスキャナ**: 生の辞書テキストを走査し、索引付け可能な
//!   トークンのスパンをプラガブルな索引ビルダへ送り出すドライバ
//! - **活用トライ**: 活用語尾から辞書形への対応を保持するエッジ圧縮トライ。
//!   辞書検索の前に活用を取り除くために使用されます
//!
//! ## 使用例
//!
//! ```
//! # fn main() -> jiten::errors::Result<()> {
//! use jiten::character::Utf8Decoder;
//! use jiten::container::IndexContainer;
//! use jiten::index::{BinarySearchIndex, BinarySearchIndexBuilder};
//! use jiten::index::{DictionaryIndexer, EdictFormat};
//!
//! let dictionary = "子供 [こども] /(n) child/\n";
//!
//! // build the word index into a fresh container
//! let dir = tempfile::tempdir()?;
//! let mut container = IndexContainer::open(dir.path().join("demo.index"), true)?;
//! let format = EdictFormat::new();
//! let decoder = Utf8Decoder;
//! let indexer = DictionaryIndexer::new(dictionary.as_bytes(), &format, &decoder);
//! let mut builder = BinarySearchIndexBuilder::new(BinarySearchIndex::TYPE);
//! indexer.build_index(&mut container, &mut builder)?;
//! container.end_editing()?;
//!
//! // and search it directly afterwards
//! let mut index = BinarySearchIndex::new();
//! index.attach(&container)?;
//! let positions: Vec<usize> = index
//!     .entry_positions(dictionary.as_bytes(), "子供".as_bytes())
//!     .collect();
//! assert!(!positions.is_empty());
//! # Ok(())
//! # }
//! ```

/// 文字クラスと文字境界デコーダ
pub mod character;

/// 索引コンテナファイルフォーマット
pub mod container;

/// 活用形の検索
pub mod conjugation;

/// エラー型の定義
pub mod errors;

/// フィールドスキャナと索引ビルダ
pub mod index;

/// 内部ユーティリティ関数
pub mod utils;

#[cfg(test)]
mod tests;

// Re-exports
pub use container::IndexContainer;
pub use conjugation::{Conjugation, ConjugationRegistry, ConjugationTrie};
pub use errors::JitenError;
pub use index::{DictionaryIndexer, EdictFormat, FieldKind, IndexBuilder};

/// このライブラリのバージョン番号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
