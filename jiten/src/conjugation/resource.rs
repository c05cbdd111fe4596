//! 活用定義リソースの読み込み
//!
//! リソースは2つのセクションからなるテキストファイルです。`$`で始まる行が
//! セクションの区切りで、`#`で始まる行はコメントとして無視されます。
//! セクション1は`略号<TAB>種別の説明`の対応表、セクション2は
//! `活用語尾<TAB>辞書形語尾<TAB>略号`の活用行です。

use std::io::{BufRead, BufReader, Read};

use hashbrown::HashMap;

use super::{ConjugationRegistry, ConjugationTrie};
use crate::errors::Result;
use crate::utils::parse_tsv_row;

/// リソースを解析してトライを構築します。
///
/// 必要なタブを欠いた行は警告を記録して読み飛ばします。セクション2の行が
/// 参照する略号がセクション1に存在しない場合、略号そのものが種別の説明として
/// 使用されます。構築後、伝播パスは実行済みです。
pub(super) fn parse_resource<R: Read>(
    reader: R,
    registry: &ConjugationRegistry,
) -> Result<ConjugationTrie> {
    let mut labels: HashMap<String, String> = HashMap::new();
    let mut trie = ConjugationTrie::empty();
    let mut in_conjugations = false;

    for line in BufReader::new(reader).lines() {
        let line = line?;
        if line.starts_with('#') {
            continue;
        }
        if line.starts_with('$') {
            // start of the conjugation section
            in_conjugations = true;
            continue;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let fields = parse_tsv_row(line);
        if !in_conjugations {
            if fields.len() >= 2 {
                labels.insert(fields[0].trim().to_string(), fields[1].trim().to_string());
            } else {
                log::warn!("conjugation resource: skipping malformed label row: {line}");
            }
        } else if fields.len() >= 3 {
            let abbreviation = fields[2].trim();
            let grammatical_type = labels
                .get(abbreviation)
                .map(String::as_str)
                .unwrap_or(abbreviation);
            trie.add_conjugation(&fields[0], &fields[1], grammatical_type, registry);
        } else {
            log::warn!("conjugation resource: skipping malformed conjugation row: {line}");
        }
    }

    trie.propagate_conjugations();
    Ok(trie)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESOURCE: &str = "\
# test conjugation resource
v5k\tgodan verb, ku ending
adj-i\ti-adjective
$ conjugations follow
# past tense
いた\tく\tv5k
かった\tい\tadj-i
くない\tい\tunknown-label
malformed row without tabs
";

    #[test]
    fn test_parse_resource_builds_the_trie() {
        let registry = ConjugationRegistry::new();
        let trie = parse_resource(RESOURCE.as_bytes(), &registry).unwrap();
        assert_eq!(3, trie.len());

        let matches = trie.find_conjugations("いたら").unwrap();
        assert_eq!("く", matches[0].dictionary_form());
        assert_eq!("godan verb, ku ending", matches[0].grammatical_type());
    }

    #[test]
    fn test_unknown_abbreviation_falls_back_to_itself() {
        let registry = ConjugationRegistry::new();
        let trie = parse_resource(RESOURCE.as_bytes(), &registry).unwrap();
        let matches = trie.find_conjugations("くない").unwrap();
        assert_eq!("unknown-label", matches[0].grammatical_type());
    }

    #[test]
    fn test_io_error_is_propagated() {
        struct FailingReader;
        impl Read for FailingReader {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("resource unavailable"))
            }
        }

        let registry = ConjugationRegistry::new();
        assert!(parse_resource(FailingReader, &registry).is_err());
    }
}
