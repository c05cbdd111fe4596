//! コンポーネントを横断する結合テスト
//!
//! 辞書テキストの索引付けから、活用形の正規化、二分探索による
//! エントリ解決までの一連の流れを検証します。

use crate::character::Utf8Decoder;
use crate::conjugation::ConjugationRegistry;
use crate::container::IndexContainer;
use crate::index::{
    BinarySearchIndex, BinarySearchIndexBuilder, DictionaryIndexer, EdictFormat, FieldKind,
    IndexBuilder,
};

const DICTIONARY: &str = "\
会う [あう] /(v5u) to meet/to see/
書く [かく] /(v5k) to write/
子供 [こども] /(n) child/
食べる [たべる] /(v1) to eat/
";

fn entry_line(source: &[u8], position: usize) -> &[u8] {
    let start = source[..position]
        .iter()
        .rposition(|&b| b == b'\n')
        .map(|i| i + 1)
        .unwrap_or(0);
    let end = source[position..]
        .iter()
        .position(|&b| b == b'\n')
        .map(|i| position + i)
        .unwrap_or(source.len());
    &source[start..end]
}

#[test]
fn test_index_build_and_lookup_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("edict.index");

    let mut container = IndexContainer::open(&path, true).unwrap();
    let format = EdictFormat::new();
    let decoder = Utf8Decoder;
    let indexer = DictionaryIndexer::new(DICTIONARY.as_bytes(), &format, &decoder);
    let mut builder = BinarySearchIndexBuilder::new(BinarySearchIndex::TYPE);
    indexer.build_index(&mut container, &mut builder).unwrap();
    container.end_editing().unwrap();

    let mut index = BinarySearchIndex::new();
    index.attach(&container).unwrap();

    let source = DICTIONARY.as_bytes();
    let positions: Vec<usize> = index.entry_positions(source, "書く".as_bytes()).collect();
    assert!(!positions.is_empty());
    for position in positions {
        assert_eq!("書く [かく] /(v5k) to write/".as_bytes(), entry_line(source, position));
    }
}

#[test]
fn test_inflected_lookup_through_the_conjugation_trie() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("edict.index");

    let mut container = IndexContainer::open(&path, true).unwrap();
    let format = EdictFormat::new();
    let decoder = Utf8Decoder;
    let indexer = DictionaryIndexer::new(DICTIONARY.as_bytes(), &format, &decoder);
    let mut builder = BinarySearchIndexBuilder::new(BinarySearchIndex::TYPE);
    indexer.build_index(&mut container, &mut builder).unwrap();
    container.end_editing().unwrap();

    let mut index = BinarySearchIndex::new();
    index.attach(&container).unwrap();
    let source = DICTIONARY.as_bytes();

    // 書いた does not occur in the dictionary as written
    let typed = "書いた";
    assert_eq!(
        0,
        index.entry_positions(source, typed.as_bytes()).count()
    );

    // stripping the inflected ending いた resolves the dictionary form 書く
    let registry = ConjugationRegistry::global();
    let stem = "書";
    let ending = &typed[stem.len()..];
    let conjugations = registry.find_conjugations(ending).unwrap();
    let mut resolved = false;
    for conjugation in conjugations {
        let candidate = format!("{stem}{}", conjugation.dictionary_form());
        if index.entry_positions(source, candidate.as_bytes()).count() > 0 {
            assert_eq!("書く", candidate);
            resolved = true;
        }
    }
    assert!(resolved);
}

#[test]
fn test_word_and_reading_indexes_can_coexist() {
    /// 指定された種別のスパンだけを受理するビルダ
    struct FilteringBuilder<'s> {
        kind: FieldKind,
        inner: BinarySearchIndexBuilder<'s>,
    }

    impl<'s> IndexBuilder<'s> for FilteringBuilder<'s> {
        fn start_build_index(
            &mut self,
            container: &IndexContainer,
            source: &'s [u8],
        ) -> crate::errors::Result<()> {
            self.inner.start_build_index(container, source)
        }

        fn add_entry(
            &mut self,
            offset: usize,
            length: usize,
            kind: FieldKind,
        ) -> crate::errors::Result<bool> {
            if kind == self.kind {
                self.inner.add_entry(offset, length, kind)
            } else {
                Ok(true)
            }
        }

        fn end_build_index(
            &mut self,
            container: &mut IndexContainer,
            success: bool,
        ) -> crate::errors::Result<()> {
            self.inner.end_build_index(container, success)
        }
    }

    const WORD_INDEX: i32 = 0x1;
    const READING_INDEX: i32 = 0x2;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("edict.index");
    let mut container = IndexContainer::open(&path, true).unwrap();
    let format = EdictFormat::new();
    let decoder = Utf8Decoder;
    let indexer = DictionaryIndexer::new(DICTIONARY.as_bytes(), &format, &decoder);

    for (kind, index_type) in [
        (FieldKind::Word, WORD_INDEX),
        (FieldKind::Reading, READING_INDEX),
    ] {
        let mut builder = FilteringBuilder {
            kind,
            inner: BinarySearchIndexBuilder::new(index_type),
        };
        indexer.build_index(&mut container, &mut builder).unwrap();
    }
    container.end_editing().unwrap();

    let source = DICTIONARY.as_bytes();

    let mut words = BinarySearchIndex::with_type(WORD_INDEX);
    words.attach(&container).unwrap();
    assert!(words.entry_positions(source, "子供".as_bytes()).count() > 0);
    assert_eq!(0, words.entry_positions(source, "こども".as_bytes()).count());

    let mut readings = BinarySearchIndex::with_type(READING_INDEX);
    readings.attach(&container).unwrap();
    assert!(readings.entry_positions(source, "こども".as_bytes()).count() > 0);
    assert_eq!(0, readings.entry_positions(source, "子供".as_bytes()).count());
}
