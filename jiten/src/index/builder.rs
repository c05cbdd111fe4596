//! 二分探索索引の構築
//!
//! このモジュールは、スキャナが送出したスパンのオフセットを収集し、
//! 辞書テキスト順にソートしたオフセット配列を索引ペイロードとして
//! コンテナへ書き込む[`IndexBuilder`]実装を提供します。

use crate::container::{ByteOrderTag, IndexContainer};
use crate::errors::{JitenError, Result};
use crate::index::{FieldKind, IndexBuilder};

/// 二分探索索引を構築するビルダ
///
/// 受理した各スパンの開始オフセットを32ビット整数として収集し、
/// 構築終了時にオフセットの指すテキスト(バッファ終端までの接尾辞)の
/// バイト順でソートして、コンテナの記録バイトオーダーで符号化した
/// オフセット配列を索引レコードとして作成します。
pub struct BinarySearchIndexBuilder<'s> {
    index_type: i32,
    byte_order: ByteOrderTag,
    source: Option<&'s [u8]>,
    offsets: Vec<i32>,
}

impl<'s> BinarySearchIndexBuilder<'s> {
    /// 指定された型タグの索引を構築するビルダを生成します。
    pub fn new(index_type: i32) -> Self {
        Self {
            index_type,
            byte_order: ByteOrderTag::native(),
            source: None,
            offsets: Vec::new(),
        }
    }

    /// ビルダが構築する索引の型タグを返します。
    pub fn index_type(&self) -> i32 {
        self.index_type
    }
}

impl<'s> IndexBuilder<'s> for BinarySearchIndexBuilder<'s> {
    fn start_build_index(&mut self, container: &IndexContainer, source: &'s [u8]) -> Result<()> {
        self.byte_order = container.index_byte_order();
        self.source = Some(source);
        self.offsets.clear();
        Ok(())
    }

    fn add_entry(&mut self, offset: usize, _length: usize, _kind: FieldKind) -> Result<bool> {
        let offset = i32::try_from(offset).map_err(|_| {
            JitenError::invalid_argument("offset", "entry offset exceeds the 32-bit index limit")
        })?;
        self.offsets.push(offset);
        Ok(true)
    }

    fn end_build_index(&mut self, container: &mut IndexContainer, success: bool) -> Result<()> {
        let source = self.source.take().ok_or_else(|| {
            JitenError::invalid_state(
                "index build was never started",
                "end_build_index() without start_build_index()",
            )
        })?;

        if !success {
            self.offsets.clear();
            return Ok(());
        }

        log::info!("sorting {} index entries", self.offsets.len());
        self.offsets
            .sort_unstable_by(|&a, &b| source[a as usize..].cmp(&source[b as usize..]));

        let mut payload = Vec::with_capacity(self.offsets.len() * 4);
        for &offset in &self.offsets {
            payload.extend_from_slice(&self.byte_order.encode_i32(offset));
        }
        self.offsets.clear();
        container.create_index(self.index_type, &payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::Utf8Decoder;
    use crate::index::binary_search::BinarySearchIndex;
    use crate::index::format::EdictFormat;
    use crate::index::scanner::DictionaryIndexer;

    const DICTIONARY: &str = "\
会う [あう] /(v5u) to meet/
子供 [こども] /(n) child/
学校 [がっこう] /(n) school/
";

    #[test]
    fn test_build_creates_a_sorted_offset_index() {
        let dir = tempfile::tempdir().unwrap();
        let mut container =
            IndexContainer::open(dir.path().join("dictionary.index"), true).unwrap();
        let format = EdictFormat::new();
        let decoder = Utf8Decoder;
        let text = DICTIONARY.as_bytes();
        let indexer = DictionaryIndexer::new(text, &format, &decoder);
        let mut builder = BinarySearchIndexBuilder::new(BinarySearchIndex::TYPE);

        let entries = indexer.build_index(&mut container, &mut builder).unwrap();
        assert!(entries > 0);
        container.end_editing().unwrap();
        assert!(container.has_index(BinarySearchIndex::TYPE));

        let payload = container.index_data(BinarySearchIndex::TYPE).unwrap();
        assert_eq!(0, payload.len() % 4);
        assert_eq!(entries * 4, payload.len());

        // the offsets must be sorted by the text they point at
        let order = container.index_byte_order();
        let offsets: Vec<i32> = payload
            .chunks_exact(4)
            .map(|c| order.decode_i32([c[0], c[1], c[2], c[3]]))
            .collect();
        for pair in offsets.windows(2) {
            let (a, b) = (pair[0] as usize, pair[1] as usize);
            assert!(text[a..] <= text[b..]);
        }
    }

    #[test]
    fn test_aborted_build_creates_no_index() {
        let dir = tempfile::tempdir().unwrap();
        let mut container =
            IndexContainer::open(dir.path().join("dictionary.index"), true).unwrap();
        let mut builder = BinarySearchIndexBuilder::new(BinarySearchIndex::TYPE);
        let text = DICTIONARY.as_bytes();

        builder.start_build_index(&container, text).unwrap();
        assert!(builder.add_entry(0, 6, FieldKind::Word).unwrap());
        builder.end_build_index(&mut container, false).unwrap();

        assert!(!container.has_index(BinarySearchIndex::TYPE));
    }
}
