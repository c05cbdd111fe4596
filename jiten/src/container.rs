//! 索引コンテナファイルフォーマット
//!
//! このモジュールは、1つの辞書に対する複数の名前付きバイナリ索引を
//! 1つのファイルに永続化するコンテナフォーマットを提供します。
//!
//! # ファイルレイアウト
//!
//! コンテナファイルは、作成プロセスのネイティブバイトオーダーで書かれた
//! 4つの32ビット整数からなる固定ヘッダ
//! `{MAGIC, VERSION, HEADER_LENGTH, BYTE_ORDER_CODE}`で始まり、
//! その後に0個以上の索引レコードが続きます。各レコードは
//! `{TYPE: i32, LENGTH: i32, SUBHEADER_LENGTH: i32}`のサブヘッダと
//! `LENGTH`バイトのペイロードで構成されます。
//!
//! バイトオーダーはヘッダに記録されますが、読み込み時に変換されません。
//! 異なるエンディアンのマシンで作成されたコンテナを開くと、マジックナンバーの
//! 検証に失敗します。コンテナフォーマットのマシン間可搬性はサポート対象外です。
//!
//! # アクセスモードと編集モード
//!
//! コンテナは読み取り専用の**アクセスモード**(メモリマップによるゼロコピー読み出し、
//! 複数リーダー安全)か、排他的な**編集モード**(索引の追加・削除)のどちらかで
//! 開きます。[`IndexContainer::end_editing`]で、ファイルを閉じずに編集モードから
//! アクセスモードへ遷移できます。

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use hashbrown::HashMap;
use memmap2::Mmap;

use crate::errors::{JitenError, Result};

/// 索引コンテナファイルを識別するマジックナンバー("JTIX"のASCIIコード)。
pub const MAGIC: i32 = 0x4a54_4958;

/// 索引フォーマットのバージョン番号。
pub const VERSION: i32 = 1000;

/// 現行バージョンの索引ヘッダのバイト長。
pub const HEADER_LENGTH: i32 = 4 * 4;

/// 各索引レコードのサブヘッダのバイト長。
pub const SUBHEADER_LENGTH: i32 = 3 * 4;

/// このフォーマットの索引ファイルの標準拡張子。
pub const EXTENSION: &str = ".index";

/// ヘッダに記録されるバイトオーダータグ
///
/// コンテナ作成時のプロセスのネイティブバイトオーダーが記録されます。
/// 索引ペイロード内の整数はこのタグの示すオーダーで符号化されます。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrderTag {
    /// ビッグエンディアン(ヘッダコード1)
    BigEndian,
    /// リトルエンディアン(ヘッダコード2)
    LittleEndian,
}

impl ByteOrderTag {
    /// 実行中のプロセスのネイティブバイトオーダーを返します。
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            Self::BigEndian
        } else {
            Self::LittleEndian
        }
    }

    /// ヘッダに書き込まれる整数コードを返します。
    pub const fn code(self) -> i32 {
        match self {
            Self::BigEndian => 1,
            Self::LittleEndian => 2,
        }
    }

    /// ヘッダの整数コードからタグを復元します。
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::BigEndian),
            2 => Some(Self::LittleEndian),
            _ => None,
        }
    }

    /// このオーダーで32ビット整数を符号化します。
    #[inline(always)]
    pub fn encode_i32(self, value: i32) -> [u8; 4] {
        match self {
            Self::BigEndian => value.to_be_bytes(),
            Self::LittleEndian => value.to_le_bytes(),
        }
    }

    /// このオーダーで32ビット整数を復号します。
    #[inline(always)]
    pub fn decode_i32(self, bytes: [u8; 4]) -> i32 {
        match self {
            Self::BigEndian => i32::from_be_bytes(bytes),
            Self::LittleEndian => i32::from_le_bytes(bytes),
        }
    }
}

/// コンテナ内の1つの索引レコードのメタデータ
#[derive(Debug, Clone, Copy)]
struct IndexMetaData {
    /// ペイロード先頭のファイル内バイトオフセット
    data_offset: u64,
    /// ペイロードのバイト長
    length: u32,
}

/// コンテナの開きかた
enum Mode {
    /// 排他的な編集モード
    Edit,
    /// 読み取り専用のアクセスモード(メモリマップを保持)
    Access(Mmap),
}

/// 索引データをファイルに格納する索引コンテナ
///
/// 開いている間、1つのファイルハンドルを排他的に所有します。
/// 辞書の索引付け時に作成され、通常の検索時にはアクセスモードで開かれます。
pub struct IndexContainer {
    path: PathBuf,
    file: File,
    mode: Mode,
    byte_order: ByteOrderTag,
    directory: HashMap<i32, IndexMetaData>,
}

impl IndexContainer {
    /// 索引コンテナファイルを新規作成するか、既存のファイルを開きます。
    ///
    /// ファイルが存在しない場合、編集モードでのみ新規作成できます。
    /// 既存のファイルを開く場合は、固定ヘッダを検証した後、すべての索引レコードを
    /// 順に走査してメモリ内ディレクトリを構築します。
    ///
    /// # 引数
    ///
    /// * `path` - 索引コンテナファイルのパス
    /// * `edit_mode` - `true`で編集モード、`false`でアクセスモード
    ///
    /// # エラー
    ///
    /// この関数は以下の場合にエラーを返します:
    /// - 要求されたモードでファイルを開けない場合(アクセスモードでの
    ///   存在しないファイルの指定を含む)。
    /// - マジックナンバーまたはバージョンが一致しない場合。
    /// - ヘッダまたはレコードが途中で切れている場合。
    pub fn open<P: AsRef<Path>>(path: P, edit_mode: bool) -> Result<Self> {
        let path = path.as_ref();
        let create = edit_mode && !path.exists();

        let mut file = OpenOptions::new()
            .read(true)
            .write(edit_mode)
            .create(create)
            .open(path)?;

        let (byte_order, directory) = if create {
            (Self::write_header(&mut file)?, HashMap::new())
        } else {
            let byte_order = Self::read_header(&mut file)?;
            let directory = Self::scan_records(&mut file)?;
            (byte_order, directory)
        };

        let mode = if edit_mode {
            Mode::Edit
        } else {
            Mode::Access(unsafe { Mmap::map(&file)? })
        };

        Ok(Self {
            path: path.to_path_buf(),
            file,
            mode,
            byte_order,
            directory,
        })
    }

    /// 指定された型タグの索引がコンテナに存在するかどうかを返します。
    ///
    /// メモリ内ディレクトリに対するO(1)の検索で、I/Oは発生しません。
    #[inline(always)]
    pub fn has_index(&self, index_type: i32) -> bool {
        self.directory.contains_key(&index_type)
    }

    /// 新しい索引レコードをコンテナ末尾に追加します。
    ///
    /// 編集モードでのみ有効です。サブヘッダとペイロードの書き込みが成功した後に
    /// のみメモリ内ディレクトリが更新されるため、部分的に書き込まれたレコードが
    /// ディレクトリから見えることはありません。
    ///
    /// # 引数
    ///
    /// * `index_type` - 索引の型タグ。コンテナ内で一意でなければなりません。
    /// * `payload` - 索引データのバイト列
    ///
    /// # エラー
    ///
    /// この関数は以下の場合にエラーを返します:
    /// - アクセスモードで呼び出された場合。
    /// - 同じ型タグの索引が既に存在する場合。
    /// - ファイルへの書き込みに失敗した場合。
    pub fn create_index(&mut self, index_type: i32, payload: &[u8]) -> Result<()> {
        self.require_edit()?;
        if self.has_index(index_type) {
            return Err(JitenError::invalid_state(
                "index data already exists",
                format!("index type {index_type:#x}"),
            ));
        }
        let length = i32::try_from(payload.len()).map_err(|_| {
            JitenError::invalid_argument("payload", "index payload exceeds the 32-bit record limit")
        })?;

        let record_start = self.file.seek(SeekFrom::End(0))?;
        let mut subheader = [0u8; SUBHEADER_LENGTH as usize];
        subheader[0..4].copy_from_slice(&index_type.to_ne_bytes());
        subheader[4..8].copy_from_slice(&length.to_ne_bytes());
        subheader[8..12].copy_from_slice(&SUBHEADER_LENGTH.to_ne_bytes());
        self.file.write_all(&subheader)?;
        self.file.write_all(payload)?;

        self.directory.insert(
            index_type,
            IndexMetaData {
                data_offset: record_start + SUBHEADER_LENGTH as u64,
                length: payload.len() as u32,
            },
        );
        Ok(())
    }

    /// 指定された型タグの索引ペイロードを返します。
    ///
    /// アクセスモードでのみ有効です。返されるスライスはメモリマップされた
    /// ファイルを直接参照するため、コピーは発生しません。
    ///
    /// # エラー
    ///
    /// この関数は以下の場合にエラーを返します:
    /// - 編集モードで呼び出された場合。
    /// - 指定された型タグの索引が存在しない場合。
    pub fn index_data(&self, index_type: i32) -> Result<&[u8]> {
        let Mode::Access(map) = &self.mode else {
            return Err(JitenError::invalid_state(
                "container is in edit mode",
                "call end_editing() before reading index data",
            ));
        };
        let meta = self.directory.get(&index_type).ok_or_else(|| {
            JitenError::invalid_state(
                "no index data available",
                format!("index type {index_type:#x}"),
            )
        })?;
        let start = meta.data_offset as usize;
        map.get(start..start + meta.length as usize).ok_or_else(|| {
            JitenError::invalid_format("container", "index record extends past the end of the file")
        })
    }

    /// 指定された型タグの索引をコンテナから削除します。
    ///
    /// 編集モードでのみ有効です。コンテナファイルは削除対象のレコードを除いて
    /// 書き直され、一時ファイル経由でアトミックに置き換えられます。
    /// 存在しない型タグの削除はエラーではなく、何もしません。
    ///
    /// # エラー
    ///
    /// この関数は以下の場合にエラーを返します:
    /// - アクセスモードで呼び出された場合。
    /// - 書き直し中にI/Oエラーが発生した場合。
    pub fn delete_index(&mut self, index_type: i32) -> Result<()> {
        self.require_edit()?;
        if !self.has_index(index_type) {
            return Ok(());
        }

        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut temp = tempfile::NamedTempFile::new_in(parent)?;
        self.write_header_to(temp.as_file_mut())?;

        // copy the surviving records in file order
        let mut survivors: Vec<(i32, IndexMetaData)> = self
            .directory
            .iter()
            .filter(|(ty, _)| **ty != index_type)
            .map(|(ty, meta)| (*ty, *meta))
            .collect();
        survivors.sort_unstable_by_key(|(_, meta)| meta.data_offset);

        for (ty, meta) in &survivors {
            let length = meta.length as i32;
            let mut subheader = [0u8; SUBHEADER_LENGTH as usize];
            subheader[0..4].copy_from_slice(&ty.to_ne_bytes());
            subheader[4..8].copy_from_slice(&length.to_ne_bytes());
            subheader[8..12].copy_from_slice(&SUBHEADER_LENGTH.to_ne_bytes());
            temp.as_file_mut().write_all(&subheader)?;

            self.file.seek(SeekFrom::Start(meta.data_offset))?;
            let mut payload = (&self.file).take(u64::from(meta.length));
            io::copy(&mut payload, temp.as_file_mut())?;
        }
        temp.as_file().sync_all()?;

        let mut file = temp.persist(&self.path)?;
        self.directory = Self::scan_records(&mut file)?;
        self.file = file;
        Ok(())
    }

    /// 同じインスタンスを編集モードからアクセスモードへ遷移させます。
    ///
    /// ファイルを閉じずに遷移するため、索引を構築した直後にそのまま検索に
    /// 使用できます。
    ///
    /// # エラー
    ///
    /// この関数は以下の場合にエラーを返します:
    /// - アクセスモードで呼び出された場合。
    /// - ファイルの同期またはメモリマップに失敗した場合。
    pub fn end_editing(&mut self) -> Result<()> {
        self.require_edit()?;
        self.file.sync_all()?;
        self.mode = Mode::Access(unsafe { Mmap::map(&self.file)? });
        Ok(())
    }

    /// アクセスモードで開かれているかどうかを返します。
    pub fn can_access(&self) -> bool {
        matches!(self.mode, Mode::Access(_))
    }

    /// 編集モードで開かれているかどうかを返します。
    pub fn can_edit(&self) -> bool {
        matches!(self.mode, Mode::Edit)
    }

    /// ヘッダに記録されたバイトオーダータグを返します。
    pub fn index_byte_order(&self) -> ByteOrderTag {
        self.byte_order
    }

    /// コンテナに格納されている索引の型タグを返します。
    pub fn index_types(&self) -> Vec<i32> {
        self.directory.keys().copied().collect()
    }

    /// コンテナを閉じてファイルハンドルを解放します。
    ///
    /// コンテナを値として消費するため、閉じた後の操作はコンパイル時に
    /// 不可能になります。単にドロップした場合も同じようにファイルは閉じられます。
    pub fn close(self) {}

    fn require_edit(&self) -> Result<()> {
        if self.can_edit() {
            Ok(())
        } else {
            Err(JitenError::invalid_state(
                "container is in access mode",
                "the operation requires edit mode",
            ))
        }
    }

    /// 新規ファイルにヘッダのみを書き込みます。
    fn write_header(file: &mut File) -> Result<ByteOrderTag> {
        let byte_order = ByteOrderTag::native();
        let mut header = [0u8; HEADER_LENGTH as usize];
        header[0..4].copy_from_slice(&MAGIC.to_ne_bytes());
        header[4..8].copy_from_slice(&VERSION.to_ne_bytes());
        header[8..12].copy_from_slice(&HEADER_LENGTH.to_ne_bytes());
        header[12..16].copy_from_slice(&byte_order.code().to_ne_bytes());
        file.write_all(&header)?;
        Ok(byte_order)
    }

    fn write_header_to(&self, file: &mut File) -> Result<()> {
        let mut header = [0u8; HEADER_LENGTH as usize];
        header[0..4].copy_from_slice(&MAGIC.to_ne_bytes());
        header[4..8].copy_from_slice(&VERSION.to_ne_bytes());
        header[8..12].copy_from_slice(&HEADER_LENGTH.to_ne_bytes());
        header[12..16].copy_from_slice(&self.byte_order.code().to_ne_bytes());
        file.write_all(&header)?;
        Ok(())
    }

    /// 固定ヘッダを読み込んで検証します。
    fn read_header(file: &mut File) -> Result<ByteOrderTag> {
        file.seek(SeekFrom::Start(0))?;
        let mut header = [0u8; HEADER_LENGTH as usize];
        read_exact_record(file, &mut header, "premature end of index file header")?;

        if ne_i32(&header[0..4]) != MAGIC {
            return Err(JitenError::invalid_format(
                "container",
                "index file does not start with the magic number",
            ));
        }
        let version = ne_i32(&header[4..8]);
        if version != VERSION {
            return Err(JitenError::invalid_format(
                "container",
                format!("index version {version} not supported"),
            ));
        }
        // the header length field must not be validated against the constant here,
        // it points to the first index record
        let header_length = ne_i32(&header[8..12]);
        if header_length < HEADER_LENGTH {
            return Err(JitenError::invalid_format(
                "container",
                format!("invalid header length {header_length}"),
            ));
        }
        let code = ne_i32(&header[12..16]);
        ByteOrderTag::from_code(code).ok_or_else(|| {
            JitenError::invalid_format("container", format!("invalid byte order code {code}"))
        })
    }

    /// すべての索引レコードを順に走査してメモリ内ディレクトリを構築します。
    fn scan_records(file: &mut File) -> Result<HashMap<i32, IndexMetaData>> {
        let file_length = file.metadata()?.len();
        let mut directory = HashMap::new();

        file.seek(SeekFrom::Start(8))?;
        let mut first = [0u8; 4];
        read_exact_record(file, &mut first, "premature end of index file header")?;
        let mut offset = ne_i32(&first) as u64;

        while offset < file_length {
            file.seek(SeekFrom::Start(offset))?;
            let mut subheader = [0u8; SUBHEADER_LENGTH as usize];
            read_exact_record(file, &mut subheader, "premature end of index record")?;

            let index_type = ne_i32(&subheader[0..4]);
            let length = ne_i32(&subheader[4..8]);
            let subheader_length = ne_i32(&subheader[8..12]);
            if length < 0 || subheader_length != SUBHEADER_LENGTH {
                return Err(JitenError::invalid_format(
                    "container",
                    format!("invalid index record at offset {offset}"),
                ));
            }
            let data_offset = offset + subheader_length as u64;
            let next = data_offset + length as u64;
            if next > file_length {
                return Err(JitenError::invalid_format(
                    "container",
                    "index record extends past the end of the file",
                ));
            }
            let previous = directory.insert(
                index_type,
                IndexMetaData {
                    data_offset,
                    length: length as u32,
                },
            );
            if previous.is_some() {
                return Err(JitenError::invalid_format(
                    "container",
                    format!("duplicate index type {index_type:#x}"),
                ));
            }
            offset = next;
        }
        Ok(directory)
    }
}

/// レコード読み込みの途中終端を破損エラーとして報告します。
fn read_exact_record(file: &mut File, buf: &mut [u8], msg: &'static str) -> Result<()> {
    file.read_exact(buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            JitenError::invalid_format("container", msg)
        } else {
            JitenError::StdIo(e)
        }
    })
}

#[inline(always)]
fn ne_i32(bytes: &[u8]) -> i32 {
    i32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}
