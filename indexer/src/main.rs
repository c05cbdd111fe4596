//! 辞書索引ツールのメインエントリーポイント
//!
//! このバイナリは、EDICT形式の辞書ファイルに対する索引コンテナの構築と、
//! 構築済みコンテナに対する検索のサブコマンドを提供します。

mod build;
mod lookup;

use clap::Parser;
use thiserror::Error;

use crate::build::BuildError;
use crate::lookup::LookupError;

/// コマンドライン引数の構造体
///
/// `clap`を使用してコマンドライン引数をパースします。
#[derive(Parser, Debug)]
#[clap(name = "indexer", version)]
struct Cli {
    /// 実行するサブコマンド
    #[clap(subcommand)]
    command: Command,
}

/// 利用可能なサブコマンド
#[derive(Parser, Debug)]
enum Command {
    /// EDICT形式の辞書ファイルから索引コンテナを構築します
    Build(build::Args),

    /// 構築済みの索引コンテナに対して語を検索します
    ///
    /// 入力語の活用語尾は検索前に辞書形へ正規化されます。
    Lookup(lookup::Args),
}

/// 索引ツールの実行中に発生する可能性のあるエラー
#[derive(Debug, Error)]
pub enum IndexerError {
    /// 索引構築中のエラー
    #[error(transparent)]
    Build(#[from] BuildError),
    /// 検索中のエラー
    #[error(transparent)]
    Lookup(#[from] LookupError),
}

/// メイン関数
///
/// コマンドライン引数をパースし、指定されたサブコマンドを実行します。
fn main() -> Result<(), IndexerError> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Build(args) => Ok(build::run(args)?),
        Command::Lookup(args) => Ok(lookup::run(args)?),
    }
}
