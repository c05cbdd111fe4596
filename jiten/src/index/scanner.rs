//! 辞書テキストの走査と索引エントリの送出
//!
//! このモジュールは、生の辞書テキストを左から右へ1回だけ走査し、
//! 索引付け可能なトークンのスパンを[`IndexBuilder`]へ送り出すドライバを
//! 提供します。

use crate::character::{CharacterClass, CharacterDecoder};
use crate::container::IndexContainer;
use crate::errors::{JitenError, Result};
use crate::index::format::DictionaryFormat;
use crate::index::{FieldKind, IndexBuilder};

/// ローマ字の索引語として受理される最小文字数
///
/// 境界認識のためだけに使われる長さ1のトークンは索引に入れません。
const MIN_ROMAN_TERM_CHARS: usize = 3;

/// 辞書テキストから索引を構築するスキャナ
///
/// 索引語の境界は隣接する文字の文字クラスで決定されます。日本語の文字
/// (漢字・ひらがな・カタカナ)は1つの語にまとめられ、語全体のスパンに加えて、
/// 語内の各漢字の直後から始まる接尾スパンも索引に入ります。これにより、
/// 複合語は語全体でも漢字のまとまりでも検索できるようになります。
/// ローマ字の語は[`MIN_ROMAN_TERM_CHARS`]文字以上の場合のみ索引に入ります。
pub struct DictionaryIndexer<'a, F, D> {
    text: &'a [u8],
    format: &'a F,
    decoder: &'a D,
}

impl<'a, F, D> DictionaryIndexer<'a, F, D>
where
    F: DictionaryFormat,
    D: CharacterDecoder,
{
    /// 新しいスキャナを生成します。
    ///
    /// # 引数
    ///
    /// * `text` - 索引付け対象の辞書テキスト
    /// * `format` - 辞書フォーマットのフィールド境界規則
    /// * `decoder` - テキストのエンコーディングに対応する文字デコーダ
    pub fn new(text: &'a [u8], format: &'a F, decoder: &'a D) -> Self {
        Self {
            text,
            format,
            decoder,
        }
    }

    /// テキスト全体を走査して索引を構築します。
    ///
    /// 走査は必ず`builder.start_build_index`と`builder.end_build_index`で
    /// 囲まれます。ビルダの`add_entry`が`false`を返した場合、走査は直ちに
    /// 中断され、`end_build_index(container, false)`の後にエラーが返されます。
    ///
    /// # 戻り値
    ///
    /// 送出された索引エントリの数。
    ///
    /// # エラー
    ///
    /// この関数は以下の場合にエラーを返します:
    /// - ビルダがエントリの受け付けを拒否した場合。
    /// - ビルダ自身がエラーを返した場合。
    pub fn build_index<B>(&self, container: &mut IndexContainer, builder: &mut B) -> Result<usize>
    where
        B: IndexBuilder<'a>,
    {
        builder.start_build_index(container, self.text)?;
        match self.scan_entries(builder) {
            Ok(entries) => {
                builder.end_build_index(container, true)?;
                log::info!("indexed {entries} entries");
                Ok(entries)
            }
            Err(err) => {
                builder.end_build_index(container, false)?;
                Err(err)
            }
        }
    }

    /// 1回の走査ですべての索引語を送出します。
    fn scan_entries<B>(&self, builder: &mut B) -> Result<usize>
    where
        B: IndexBuilder<'a>,
    {
        let buf = self.text;
        let decoder = self.decoder;
        let mut pos = 0usize;
        let mut field = self.format.first_field();
        let mut entries = 0usize;
        let mut sub_starts: Vec<usize> = Vec::with_capacity(8);

        'scan: loop {
            // skip to the first character of an indexable term,
            // letting the format track field transitions over the separators
            let mut term_start;
            let mut class;
            let in_word = false;
            loop {
                term_start = pos;
                let Some((c, next)) = decoder.read_char(buf, pos) else {
                    break 'scan;
                };
                pos = next;
                class = decoder.char_class(c, in_word);
                field = self.format.move_to_next_field(buf, &mut pos, c, field);
                if class != CharacterClass::Other {
                    break;
                }
            }

            let term_field = field;
            let in_word = class == CharacterClass::RomanWord;
            let mut prev_kanji = class == CharacterClass::Kanji;
            let mut term_chars = 1usize;
            sub_starts.clear();
            sub_starts.push(term_start);

            // find the end of the term; the end of the buffer is an implicit end
            let (term_end, next_char) = loop {
                let term_end = pos;
                let Some((c, next)) = decoder.read_char(buf, pos) else {
                    break (term_end, None);
                };
                let next_class = decoder.char_class(c, in_word);
                if !class.continues(next_class) {
                    break (term_end, Some((c, next, next_class)));
                }
                // each position directly after a kanji starts an extra span,
                // so compounds are searchable by their kanji cores
                if prev_kanji && matches!(term_field, FieldKind::Word | FieldKind::Reading) {
                    sub_starts.push(term_end);
                }
                prev_kanji = next_class == CharacterClass::Kanji;
                term_chars += 1;
                pos = next;
            };

            let accepted = match class {
                CharacterClass::RomanWord => term_chars >= MIN_ROMAN_TERM_CHARS,
                _ => true,
            };
            if accepted {
                for &start in &sub_starts {
                    if !builder.add_entry(start, term_end - start, term_field)? {
                        return Err(JitenError::invalid_state(
                            "index build aborted",
                            "the index builder rejected further entries",
                        ));
                    }
                    entries += 1;
                }
            }

            match next_char {
                None => break 'scan,
                Some((c, next, next_class)) => {
                    if next_class == CharacterClass::Other {
                        // consume the separator and track the field transition
                        pos = next;
                        field = self.format.move_to_next_field(buf, &mut pos, c, field);
                    }
                    // otherwise leave the character unread,
                    // it may start the next indexable term
                }
            }
        }

        Ok(entries)
    }
}
