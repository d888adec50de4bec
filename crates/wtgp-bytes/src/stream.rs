//! 成長可能なビッグエンディアンのバイトストリーム
//!
//! WTGP プロトコルのすべてのメッセージはこのストリーム上で
//! エンコード/デコードされる。
//!
//! ## 不変条件
//! ```text
//! position <= size <= capacity
//! ```
//! 書き込みは position が size を超える場合 size（と必要なら capacity）を
//! 伸長する。読み取りはすべて境界チェックされ、残りバイト数が不足する場合
//! `BytesError::TruncatedMessage` で失敗する（範囲外読み取りは起こさない）。

use alloc::string::String;
use alloc::vec::Vec;

use crate::error::BytesError;

/// 読み書きカーソルを持つ可変長バイトバッファ
///
/// 一つのメッセージの生成側または消費側が排他的に所有する。
/// メッセージをまたいで共有されることはない。
#[derive(Debug, Clone, Default)]
pub struct ByteStream {
    /// バッファ本体。`data.len()` が外部から見える size に一致する。
    data: Vec<u8>,
    /// 読み書きカーソル
    position: usize,
}

impl ByteStream {
    /// 空のストリームを生成する
    pub fn new() -> Self {
        ByteStream {
            data: Vec::new(),
            position: 0,
        }
    }

    /// 既存のバイト列からストリームを生成する（受信フレームのデコード用）
    ///
    /// size は `bytes.len()`、position は 0 になる。
    pub fn from_bytes(bytes: &[u8]) -> Self {
        ByteStream {
            data: bytes.to_vec(),
            position: 0,
        }
    }

    /// ストリームのサイズ（書き込み済みバイト数）
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 現在のカーソル位置
    pub fn position(&self) -> usize {
        self.position
    }

    /// カーソル位置を設定する（size を超える値は size に切り詰める）
    pub fn set_position(&mut self, position: usize) {
        self.position = position.min(self.data.len());
    }

    /// カーソル以降に残っているバイト数
    pub fn bytes_available(&self) -> usize {
        self.data.len() - self.position
    }

    /// size とカーソルをゼロに戻す（容量は保持する）
    pub fn clear(&mut self) {
        self.data.clear();
        self.position = 0;
    }

    /// 書き込み済み領域全体への参照
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// 送信用にちょうど size バイトのコピーを返す
    ///
    /// 余剰確保分の末尾ゴミは含まれない。
    pub fn compact(&self) -> Vec<u8> {
        self.data.clone()
    }

    /// position から n バイト書き込む前の伸長処理
    ///
    /// 末尾を超える分はゼロ埋めで size を伸ばす。Vec の再確保は
    /// 倍々成長なので capacity の伸長もそれに従う。
    fn will_write(&mut self, n: usize) {
        let end = self.position + n;
        if end > self.data.len() {
            self.data.resize(end, 0);
        }
    }

    /// n バイトの読み取りが可能か検査する
    fn check_read(&self, n: usize) -> Result<(), BytesError> {
        if self.bytes_available() < n {
            Err(BytesError::TruncatedMessage)
        } else {
            Ok(())
        }
    }

    // ---- 固定幅フィールド（すべてビッグエンディアン） ----

    /// 1 バイト書き込む
    pub fn write_u8(&mut self, value: u8) {
        self.will_write(1);
        self.data[self.position] = value;
        self.position += 1;
    }

    /// 符号なし 1 バイト読み取る
    pub fn read_u8(&mut self) -> Result<u8, BytesError> {
        self.check_read(1)?;
        let value = self.data[self.position];
        self.position += 1;
        Ok(value)
    }

    /// 符号なし 16 ビットを書き込む
    pub fn write_u16(&mut self, value: u16) {
        self.will_write(2);
        self.data[self.position..self.position + 2].copy_from_slice(&value.to_be_bytes());
        self.position += 2;
    }

    /// 符号付き 16 ビットを書き込む
    pub fn write_i16(&mut self, value: i16) {
        self.write_u16(value as u16);
    }

    /// 符号なし 16 ビットを読み取る
    pub fn read_u16(&mut self) -> Result<u16, BytesError> {
        self.check_read(2)?;
        let value = u16::from_be_bytes([self.data[self.position], self.data[self.position + 1]]);
        self.position += 2;
        Ok(value)
    }

    /// 符号付き 16 ビットを読み取る
    pub fn read_i16(&mut self) -> Result<i16, BytesError> {
        Ok(self.read_u16()? as i16)
    }

    /// 符号なし 32 ビットを書き込む
    pub fn write_u32(&mut self, value: u32) {
        self.will_write(4);
        self.data[self.position..self.position + 4].copy_from_slice(&value.to_be_bytes());
        self.position += 4;
    }

    /// 符号付き 32 ビットを書き込む
    pub fn write_i32(&mut self, value: i32) {
        self.write_u32(value as u32);
    }

    /// 符号なし 32 ビットを読み取る
    pub fn read_u32(&mut self) -> Result<u32, BytesError> {
        self.check_read(4)?;
        let mut buf = [0u8; 4];
        buf.copy_from_slice(&self.data[self.position..self.position + 4]);
        self.position += 4;
        Ok(u32::from_be_bytes(buf))
    }

    /// 符号付き 32 ビットを読み取る
    pub fn read_i32(&mut self) -> Result<i32, BytesError> {
        Ok(self.read_u32()? as i32)
    }

    // ---- 生バイト列 ----

    /// バイト列をそのまま書き込む
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.will_write(bytes.len());
        self.data[self.position..self.position + bytes.len()].copy_from_slice(bytes);
        self.position += bytes.len();
    }

    /// len バイトを読み取り、スライスとして返す
    pub fn read_slice(&mut self, len: usize) -> Result<&[u8], BytesError> {
        self.check_read(len)?;
        let start = self.position;
        self.position += len;
        Ok(&self.data[start..start + len])
    }

    /// 残りのバイトをすべて読み取る
    pub fn read_remaining(&mut self) -> &[u8] {
        let start = self.position;
        self.position = self.data.len();
        &self.data[start..]
    }

    // ---- UTF-8 文字列 ----

    /// 2 バイトの長さプレフィックス付き UTF-8 文字列を書き込む
    pub fn write_utf(&mut self, value: &str) {
        let bytes = value.as_bytes();
        self.write_u16(bytes.len() as u16);
        self.write_bytes(bytes);
    }

    /// 2 バイトの長さプレフィックス付き UTF-8 文字列を読み取る
    pub fn read_utf(&mut self) -> Result<String, BytesError> {
        let len = self.read_u16()? as usize;
        self.read_utf_bytes(len)
    }

    /// 長さプレフィックスなしで len バイトを UTF-8 としてデコードする
    ///
    /// 終端文字列ペイロード（close の理由テキスト、cookie 値、
    /// reconnect のホスト名など）に使う。
    pub fn read_utf_bytes(&mut self, len: usize) -> Result<String, BytesError> {
        let bytes = self.read_slice(len)?;
        core::str::from_utf8(bytes)
            .map(String::from)
            .map_err(|_| BytesError::InvalidUtf8)
    }
}
