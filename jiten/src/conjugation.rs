//! 動詞・形容詞の活用形の検索
//!
//! このモジュールは、活用語尾から辞書形への対応表を保持する
//! エッジ圧縮トライと、その対応表をパッケージ内リソースから一度だけ
//! 構築するプロセス全体のレジストリを提供します。
//!
//! 辞書検索の前段として、入力された語の活用語尾を最長一致で検出し、
//! 辞書形の語尾に置き換えるために使用されます。
//!
//! # 使用例
//!
//! ```
//! use jiten::conjugation::ConjugationRegistry;
//!
//! let registry = ConjugationRegistry::global();
//! // 書いた -> 書く: the past-tense ending いた maps back to く
//! let matches = registry.find_conjugations("いた").expect("known ending");
//! assert!(matches.iter().any(|c| c.dictionary_form() == "く"));
//! ```

mod resource;
mod trie;

pub use trie::ConjugationTrie;

use std::sync::{Arc, LazyLock, Mutex, OnceLock};

use hashbrown::HashMap;

/// パッケージに同梱される活用定義リソース
const DEFAULT_RESOURCE: &str = include_str!("../data/vconj");

/// プロセス全体のレジストリ
static GLOBAL_REGISTRY: LazyLock<ConjugationRegistry> = LazyLock::new(ConjugationRegistry::new);

/// 1つの活用形の定義
///
/// 活用語尾、対応する辞書形の語尾、および文法種別の説明からなる不変値です。
/// 構造的に同一の活用はレジストリ経由でインターンされ、プロセス内で
/// 1つのインスタンスが共有されます。
#[derive(Debug, PartialEq, Eq)]
pub struct Conjugation {
    conjugated_form: String,
    dictionary_form: String,
    grammatical_type: String,
}

impl Conjugation {
    /// 活用した語尾を返します。
    pub fn conjugated_form(&self) -> &str {
        &self.conjugated_form
    }

    /// 辞書形の語尾を返します。
    pub fn dictionary_form(&self) -> &str {
        &self.dictionary_form
    }

    /// 文法種別の説明を返します。
    pub fn grammatical_type(&self) -> &str {
        &self.grammatical_type
    }
}

/// 活用定義のプロセス全体レジストリ
///
/// 2つの責務を持ちます:
///
/// - **インターン**: `(活用語尾, 辞書形, 種別)`の三つ組をキーとするキャッシュで、
///   構造的に同一の[`Conjugation`]を1つの`Arc`として共有します。
/// - **一度だけの構築**: 同梱リソースからの[`ConjugationTrie`]の構築を
///   初期化バリアで保護します。最初の呼び出しがロックの下で構築し、
///   以降の呼び出しは完成した構造を参照するだけです。
///
/// 構築後のトライは不変であり、同期なしの並行読み出しに対して安全です。
pub struct ConjugationRegistry {
    interned: Mutex<HashMap<(String, String, String), Arc<Conjugation>>>,
    trie: OnceLock<ConjugationTrie>,
}

impl ConjugationRegistry {
    /// 空のレジストリを生成します。
    ///
    /// 通常は[`ConjugationRegistry::global`]を使用してください。
    /// 独立したレジストリはテストや独自リソースの読み込みに使用します。
    pub fn new() -> Self {
        Self {
            interned: Mutex::new(HashMap::new()),
            trie: OnceLock::new(),
        }
    }

    /// プロセス全体のレジストリを返します。
    pub fn global() -> &'static ConjugationRegistry {
        &GLOBAL_REGISTRY
    }

    /// 活用定義をインターンします。
    ///
    /// 同一の三つ組が既に生成されていれば、そのインスタンスを再利用します。
    pub fn intern(
        &self,
        conjugated_form: &str,
        dictionary_form: &str,
        grammatical_type: &str,
    ) -> Arc<Conjugation> {
        let mut cache = match self.interned.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let key = (
            conjugated_form.to_string(),
            dictionary_form.to_string(),
            grammatical_type.to_string(),
        );
        Arc::clone(cache.entry(key).or_insert_with(|| {
            Arc::new(Conjugation {
                conjugated_form: conjugated_form.to_string(),
                dictionary_form: dictionary_form.to_string(),
                grammatical_type: grammatical_type.to_string(),
            })
        }))
    }

    /// 構築済みのトライを返します。未構築の場合は同梱リソースから構築します。
    ///
    /// リソースが読み込めない場合はエラーをログに記録し、空のトライを
    /// 設置します。以降の検索は単に一致なしを報告します。
    pub fn trie(&self) -> &ConjugationTrie {
        self.trie.get_or_init(|| {
            match ConjugationTrie::from_reader(DEFAULT_RESOURCE.as_bytes(), self) {
                Ok(trie) => trie,
                Err(err) => {
                    log::error!("failed to load the conjugation resource: {err}");
                    ConjugationTrie::empty()
                }
            }
        })
    }

    /// 指定されたリーダーからトライを構築して設置します。
    ///
    /// 既にトライが構築済みの場合、リーダーは無視され構築済みの
    /// トライが返されます。リーダーが読み込めない場合はエラーをログに
    /// 記録し、空のトライを設置します。
    pub fn initialize_with<R: std::io::Read>(&self, reader: R) -> &ConjugationTrie {
        self.trie
            .get_or_init(|| match ConjugationTrie::from_reader(reader, self) {
                Ok(trie) => trie,
                Err(err) => {
                    log::error!("failed to load the conjugation resource: {err}");
                    ConjugationTrie::empty()
                }
            })
    }

    /// 入力文字列の先頭に一致する活用形を検索します。
    ///
    /// # 引数
    ///
    /// * `text` - 活用した語尾で始まる可能性のあるひらがな文字列
    ///
    /// # 戻り値
    ///
    /// 最長一致した語尾に対応する活用のリスト。一致がない場合は`None`。
    /// リストは最長一致から順に並び、各辞書形は一度だけ現れます。
    pub fn find_conjugations(&self, text: &str) -> Option<&[Arc<Conjugation>]> {
        self.trie().find_conjugations(text)
    }
}

impl Default for ConjugationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_shares_identical_conjugations() {
        let registry = ConjugationRegistry::new();
        let a = registry.intern("いた", "く", "past");
        let b = registry.intern("いた", "く", "past");
        let c = registry.intern("いた", "く", "conditional");
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn test_global_registry_resolves_packaged_endings() {
        let registry = ConjugationRegistry::global();
        let matches = registry.find_conjugations("いた").expect("packaged ending");
        assert!(matches.iter().any(|c| c.dictionary_form() == "く"));
        assert!(registry.find_conjugations("qqq").is_none());
    }

    #[test]
    fn test_unreadable_resource_degrades_to_an_empty_trie() {
        struct FailingReader;
        impl std::io::Read for FailingReader {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("resource unavailable"))
            }
        }

        let registry = ConjugationRegistry::new();
        let trie = registry.initialize_with(FailingReader);
        assert!(trie.is_empty());
        assert!(registry.find_conjugations("いた").is_none());
    }
}
