//! ユーティリティ関数を提供するモジュール
//!
//! リソースファイルの行解析に使用されるTSV処理ヘルパーが含まれています。

use csv_core::ReadFieldResult;

/// タブ区切りの行を解析してフィールドのベクターに分割する
///
/// この関数は、タブ区切り形式の文字列を解析し、各フィールドを個別の文字列として
/// 抽出します。ダブルクォートで囲まれたフィールドも正しく処理します。
///
/// # 引数
///
/// * `row` - 解析するタブ区切り形式の文字列
///
/// # 戻り値
///
/// 解析されたフィールドを格納する文字列のベクター
///
/// # 例
///
/// ```
/// # use jiten::utils::parse_tsv_row;
/// let fields = parse_tsv_row("いた\tく\tv5k");
/// assert_eq!(fields, vec!["いた", "く", "v5k"]);
/// ```
pub fn parse_tsv_row(row: &str) -> Vec<String> {
    let mut fields = vec![];
    let mut rdr = csv_core::ReaderBuilder::new().delimiter(b'\t').build();
    let mut bytes = row.as_bytes();
    let mut output = [0; 4096];
    loop {
        let (result, nin, nout) = rdr.read_field(bytes, &mut output);
        let end = match result {
            ReadFieldResult::InputEmpty => true,
            ReadFieldResult::Field { .. } => false,
            ReadFieldResult::End => true,
            _ => unreachable!(),
        };
        fields.push(std::str::from_utf8(&output[..nout]).unwrap().to_string());
        if end {
            break;
        }
        bytes = &bytes[nin..];
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tsv_row() {
        assert_eq!(
            &["かない", "く", "v5k"],
            parse_tsv_row("かない\tく\tv5k").as_slice()
        );
    }

    #[test]
    fn test_parse_tsv_row_single_field() {
        assert_eq!(&["ない"], parse_tsv_row("ない").as_slice());
    }
}
