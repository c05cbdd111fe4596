//! 構築済み索引に対する検索モジュール
//!
//! このモジュールは、標準入力から読み込んだ語を検索し、一致する辞書エントリの
//! 行を標準出力に出力します。語の末尾の活用語尾は、検索前に活用トライで
//! 辞書形へ正規化されます。

use std::collections::HashSet;
use std::fs;
use std::io::{self, BufRead, BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;

use jiten::conjugation::ConjugationRegistry;
use jiten::container::IndexContainer;
use jiten::errors::JitenError;
use jiten::index::BinarySearchIndex;

use crate::build::default_index_path;

/// 検索コマンドの引数
#[derive(Parser, Debug)]
#[clap(name = "lookup", about = "Looks up words in a built index container.")]
pub struct Args {
    /// Dictionary file in EDICT format (UTF-8).
    #[clap(short = 'd', long)]
    dict_in: PathBuf,

    /// Index container built for the dictionary.
    ///
    /// Defaults to the dictionary path with the `.index` extension appended.
    #[clap(short = 'i', long)]
    index_in: Option<PathBuf>,
}

/// 検索処理中に発生する可能性のあるエラー
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// 入出力エラー
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// 索引の読み込みまたは検索のエラー
    #[error("Index lookup failed: {0}")]
    Jiten(#[from] JitenError),
}

/// 標準入力から読み込んだ語を検索し、一致する辞書エントリを出力します。
pub fn run(args: Args) -> Result<(), LookupError> {
    let index_path = args
        .index_in
        .unwrap_or_else(|| default_index_path(&args.dict_in));

    eprintln!("Loading the dictionary...");
    let text = fs::read(&args.dict_in)?;
    let container = IndexContainer::open(&index_path, false)?;
    let mut index = BinarySearchIndex::new();
    index.attach(&container)?;

    let registry = ConjugationRegistry::global();
    log::info!("conjugation table: {} rows", registry.trie().len());

    eprintln!("Ready to look up");

    let out = io::stdout();
    let mut out = BufWriter::new(out.lock());
    for line in io::stdin().lock().lines() {
        let word = line?;
        let word = word.trim();
        if word.is_empty() {
            continue;
        }
        for entry in find_entries(&index, &text, word) {
            out.write_all(&entry)?;
            out.write_all(b"\n")?;
        }
        out.flush()?;
    }
    Ok(())
}

/// 語に一致する辞書エントリの行を収集します。
///
/// まず入力語そのもので検索し、次に語の各分割位置で末尾を活用語尾として
/// 解釈し、辞書形に置き換えた候補で検索します。
fn find_entries(index: &BinarySearchIndex, text: &[u8], word: &str) -> Vec<Vec<u8>> {
    let registry = ConjugationRegistry::global();
    let mut candidates = vec![word.to_string()];
    for (split, _) in word.char_indices().skip(1) {
        let (stem, tail) = word.split_at(split);
        if let Some(conjugations) = registry.find_conjugations(tail) {
            for conjugation in conjugations {
                candidates.push(format!("{stem}{}", conjugation.dictionary_form()));
            }
        }
    }

    let mut seen = HashSet::new();
    let mut entries = Vec::new();
    for candidate in candidates {
        for position in index.entry_positions(text, candidate.as_bytes()) {
            let (start, end) = entry_bounds(text, position);
            if seen.insert(start) {
                entries.push(text[start..end].to_vec());
            }
        }
    }
    entries
}

/// エントリ位置を含む行の範囲を返します。
fn entry_bounds(text: &[u8], position: usize) -> (usize, usize) {
    let start = text[..position]
        .iter()
        .rposition(|&b| b == b'\n')
        .map(|i| i + 1)
        .unwrap_or(0);
    let end = text[position..]
        .iter()
        .position(|&b| b == b'\n' || b == b'\r')
        .map(|i| position + i)
        .unwrap_or(text.len());
    (start, end)
}
