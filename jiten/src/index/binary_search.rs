//! 構築済みオフセット配列に対する二分探索
//!
//! このモジュールは、[`BinarySearchIndexBuilder`](super::BinarySearchIndexBuilder)が
//! 構築した索引ペイロードを読み込み、検索式に前方一致するエントリの
//! バイトオフセットを列挙する検索側の実装を提供します。

use std::cmp::Ordering;

use crate::container::IndexContainer;
use crate::errors::{JitenError, Result};

/// ソート済みオフセット配列に対する二分探索索引
///
/// コンテナから索引ペイロードを読み込んだ後は、辞書テキストと検索式を
/// 与えるだけで一致するエントリ位置を列挙できます。
pub struct BinarySearchIndex {
    index_type: i32,
    entries: Vec<i32>,
}

impl BinarySearchIndex {
    /// 二分探索索引の標準の型タグ("BiSe"のASCIIコード)。
    pub const TYPE: i32 = 0x4269_5365;

    /// 標準の型タグを使用する索引を生成します。
    pub fn new() -> Self {
        Self::with_type(Self::TYPE)
    }

    /// 指定された型タグを使用する索引を生成します。
    pub fn with_type(index_type: i32) -> Self {
        Self {
            index_type,
            entries: Vec::new(),
        }
    }

    /// この索引の型タグを返します。
    pub fn index_type(&self) -> i32 {
        self.index_type
    }

    /// コンテナから索引ペイロードを読み込みます。
    ///
    /// # エラー
    ///
    /// この関数は以下の場合にエラーを返します:
    /// - コンテナに該当する型タグの索引が存在しない場合。
    /// - ペイロードが32ビット整数の列として解釈できない場合。
    pub fn attach(&mut self, container: &IndexContainer) -> Result<()> {
        let payload = container.index_data(self.index_type)?;
        if payload.len() % 4 != 0 {
            return Err(JitenError::invalid_format(
                "index",
                "offset index payload length is not a multiple of four",
            ));
        }
        let order = container.index_byte_order();
        let mut entries = Vec::with_capacity(payload.len() / 4);
        for chunk in payload.chunks_exact(4) {
            let offset = order.decode_i32([chunk[0], chunk[1], chunk[2], chunk[3]]);
            if offset < 0 {
                return Err(JitenError::invalid_format(
                    "index",
                    "offset index contains a negative entry",
                ));
            }
            entries.push(offset);
        }
        self.entries = entries;
        Ok(())
    }

    /// 読み込まれているエントリ数を返します。
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 索引が空かどうかを返します。
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 検索式に前方一致するすべてのエントリ位置を返します。
    ///
    /// # 引数
    ///
    /// * `source` - 索引構築時に使用した辞書テキスト
    /// * `expression` - 検索式のバイト列
    ///
    /// # 戻り値
    ///
    /// 一致するエントリのバイトオフセットを、索引順に列挙するイテレータ。
    /// 一致がない場合は空のイテレータ。
    pub fn entry_positions<'a>(
        &'a self,
        source: &'a [u8],
        expression: &'a [u8],
    ) -> impl Iterator<Item = usize> + 'a {
        let range = match self.find_any_match(source, expression) {
            Some(found) => {
                let first = self.expand_match(source, expression, found, true);
                let last = self.expand_match(source, expression, found, false);
                first..last + 1
            }
            None => 1..1, // empty
        };
        range.map(move |i| self.entries[i] as usize)
    }

    /// 検索式に一致する任意のエントリ位置を二分探索で見つけます。
    fn find_any_match(&self, source: &[u8], expression: &[u8]) -> Option<usize> {
        let mut from = 0isize;
        let mut to = self.entries.len() as isize - 1;
        while from <= to {
            let curr = ((to - from) / 2 + from) as usize;
            match compare_prefix(expression, source, self.entries[curr] as usize) {
                Ordering::Greater => from = curr as isize + 1,
                Ordering::Less => to = curr as isize - 1,
                Ordering::Equal => return Some(curr),
            }
        }
        None
    }

    /// 一致位置から前方または後方に隣接する一致を広げます。
    fn expand_match(
        &self,
        source: &[u8],
        expression: &[u8],
        mut found: usize,
        backwards: bool,
    ) -> usize {
        loop {
            let next = if backwards {
                match found.checked_sub(1) {
                    Some(next) => next,
                    None => return found,
                }
            } else {
                found + 1
            };
            if next >= self.entries.len() {
                return found;
            }
            if compare_prefix(expression, source, self.entries[next] as usize) != Ordering::Equal {
                return found;
            }
            found = next;
        }
    }
}

impl Default for BinarySearchIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// 検索式と、`offset`から始まる辞書テキストを前方一致で比較します。
///
/// 検索式の全バイトが一致した時点で`Equal`になります。
fn compare_prefix(expression: &[u8], source: &[u8], offset: usize) -> Ordering {
    let text = source.get(offset..).unwrap_or(&[]);
    for (i, &expected) in expression.iter().enumerate() {
        match text.get(i) {
            None => return Ordering::Greater,
            Some(&actual) => match expected.cmp(&actual) {
                Ordering::Equal => {}
                other => return other,
            },
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::Utf8Decoder;
    use crate::index::builder::BinarySearchIndexBuilder;
    use crate::index::format::EdictFormat;
    use crate::index::scanner::DictionaryIndexer;

    const DICTIONARY: &str = "\
会う [あう] /(v5u) to meet/
子供 [こども] /(n) child/
子 [こ] /(n) child/
学校 [がっこう] /(n) school/
";

    fn build_index(dir: &tempfile::TempDir) -> IndexContainer {
        let mut container =
            IndexContainer::open(dir.path().join("dictionary.index"), true).unwrap();
        let format = EdictFormat::new();
        let decoder = Utf8Decoder;
        let indexer = DictionaryIndexer::new(DICTIONARY.as_bytes(), &format, &decoder);
        let mut builder = BinarySearchIndexBuilder::new(BinarySearchIndex::TYPE);
        indexer.build_index(&mut container, &mut builder).unwrap();
        container.end_editing().unwrap();
        container
    }

    #[test]
    fn test_lookup_finds_matching_entries() {
        let dir = tempfile::tempdir().unwrap();
        let container = build_index(&dir);
        let mut index = BinarySearchIndex::new();
        index.attach(&container).unwrap();

        let source = DICTIONARY.as_bytes();
        let positions: Vec<usize> = index.entry_positions(source, "子供".as_bytes()).collect();
        assert!(!positions.is_empty());
        for position in positions {
            assert!(source[position..].starts_with("子供".as_bytes()));
        }
    }

    #[test]
    fn test_lookup_prefix_matches_several_entries() {
        let dir = tempfile::tempdir().unwrap();
        let container = build_index(&dir);
        let mut index = BinarySearchIndex::new();
        index.attach(&container).unwrap();

        let source = DICTIONARY.as_bytes();
        // 子 is a prefix of both 子供 and 子, and the whole-word span of 子供
        // plus the standalone 子 entry must all match
        let positions: Vec<usize> = index.entry_positions(source, "子".as_bytes()).collect();
        assert!(positions.len() >= 2);
        for position in &positions {
            assert!(source[*position..].starts_with("子".as_bytes()));
        }
    }

    #[test]
    fn test_lookup_of_absent_expression_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let container = build_index(&dir);
        let mut index = BinarySearchIndex::new();
        index.attach(&container).unwrap();

        let positions: Vec<usize> = index
            .entry_positions(DICTIONARY.as_bytes(), "存在".as_bytes())
            .collect();
        assert!(positions.is_empty());
    }

    #[test]
    fn test_attach_to_absent_type_fails() {
        let dir = tempfile::tempdir().unwrap();
        let container = build_index(&dir);
        let mut index = BinarySearchIndex::with_type(0x7777);
        let result = index.attach(&container);
        assert!(matches!(result, Err(JitenError::InvalidState(_))));
    }

    #[test]
    fn test_lookup_on_empty_index_is_empty() {
        let index = BinarySearchIndex::new();
        let positions: Vec<usize> = index.entry_positions(b"text", b"te").collect();
        assert!(positions.is_empty());
    }
}
