//! 索引コンテナの構築モジュール
//!
//! このモジュールは、EDICT形式の辞書ファイルを走査して、見出し語・読み・
//! 訳語のオフセット索引を1つのコンテナファイルに構築する機能を提供します。

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::PathBuf;

use clap::Parser;

use jiten::character::Utf8Decoder;
use jiten::container::{self, IndexContainer};
use jiten::errors::JitenError;
use jiten::index::{BinarySearchIndex, BinarySearchIndexBuilder, DictionaryIndexer, EdictFormat};

/// ビルドコマンドの引数
#[derive(Parser, Debug)]
#[clap(name = "build", about = "Builds search indexes for an EDICT dictionary file.")]
pub struct Args {
    /// Dictionary file in EDICT format (UTF-8).
    #[clap(short = 'd', long)]
    dict_in: PathBuf,

    /// File to which the index container is output.
    ///
    /// Defaults to the dictionary path with the `.index` extension appended.
    #[clap(short = 'o', long)]
    index_out: Option<PathBuf>,
}

/// ビルド処理中に発生する可能性のあるエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// 入出力エラー
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// 索引構築エラー
    #[error("Index building failed: {0}")]
    Jiten(#[from] JitenError),
}

/// 辞書ファイルから索引コンテナを構築します。
///
/// 既存のコンテナファイルは上書きされます。
pub fn run(args: Args) -> Result<(), BuildError> {
    let index_path = args
        .index_out
        .unwrap_or_else(|| default_index_path(&args.dict_in));

    eprintln!("Reading the dictionary...");
    let text = fs::read(&args.dict_in)?;

    if index_path.exists() {
        fs::remove_file(&index_path)?;
    }
    let mut container = IndexContainer::open(&index_path, true)?;

    eprintln!("Building the index...");
    let format = EdictFormat::new();
    let decoder = Utf8Decoder;
    let indexer = DictionaryIndexer::new(&text, &format, &decoder);
    let mut builder = BinarySearchIndexBuilder::new(BinarySearchIndex::TYPE);
    let entries = indexer.build_index(&mut container, &mut builder)?;
    container.close();

    eprintln!("Indexed {} entries into {}", entries, index_path.display());
    Ok(())
}

/// 辞書パスに標準拡張子を付加した既定の索引パスを返します。
pub(crate) fn default_index_path(dictionary: &PathBuf) -> PathBuf {
    let mut path = OsString::from(dictionary.as_os_str());
    path.push(container::EXTENSION);
    PathBuf::from(path)
}
