//! 接続プリアンブルの組み立て
//!
//! 接続確立直後にクライアントが一度だけ送る最初のフレーム。
//!
//! ```text
//! [u32 magic "WTGP"][u32 version][u32 remainder 長][remainder]
//! remainder = [u16 幅][u16 高さ][RSA ブロブ（鍵設定時のみ）][認証セクション]
//! ```
//!
//! RSA ブロブはセッション秘密を公開鍵で包んだもの（modulus 長、通常
//! 128 バイト）。認証セクションはクエリ文字列と cookie を長さプレフィックス
//! 付き UTF-8 で並べたもので、鍵設定時はセッションの CBC で暗号化済みの
//! バイト列が渡される。暗号化は wtgp-session 側の責務。

use alloc::vec::Vec;

use wtgp_bytes::ByteStream;

use crate::error::ProtoError;
use crate::{PROTOCOL_MAGIC, PROTOCOL_VERSION};

/// プリアンブルフレームの構成要素
pub struct Preamble<'a> {
    pub width: u16,
    pub height: u16,
    /// RSA で包んだセッション秘密（平文モードでは None）
    pub key_blob: Option<&'a [u8]>,
    /// エンコード済み（必要なら暗号化済み）の認証セクション
    pub auth: &'a [u8],
}

impl Preamble<'_> {
    /// 送信用のフレームにエンコードする
    pub fn encode(&self) -> Vec<u8> {
        let mut remainder = ByteStream::new();
        remainder.write_u16(self.width);
        remainder.write_u16(self.height);
        if let Some(blob) = self.key_blob {
            remainder.write_bytes(blob);
        }
        remainder.write_bytes(self.auth);

        let mut header = ByteStream::new();
        header.write_u32(PROTOCOL_MAGIC);
        header.write_u32(PROTOCOL_VERSION);
        header.write_u32(remainder.size() as u32);
        header.write_bytes(remainder.as_slice());
        header.compact()
    }

    /// 平文の認証セクション（クエリ文字列 + cookie）をエンコードする
    pub fn encode_auth(query: &str, cookie: &str) -> Vec<u8> {
        let mut out = ByteStream::new();
        out.write_utf(query);
        out.write_utf(cookie);
        out.compact()
    }
}

/// サーバー側でデコードしたプリアンブル（検証・テスト用のミラー実装）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPreamble {
    pub width: u16,
    pub height: u16,
    /// RSA ブロブと認証セクション（切り分けは鍵設定に依存する）
    pub rest: Vec<u8>,
}

impl DecodedPreamble {
    /// マジックとバージョンを検証しつつプリアンブルを読む
    pub fn decode(frame: &[u8]) -> Result<Self, ProtoError> {
        let mut bytes = ByteStream::from_bytes(frame);
        let magic = bytes.read_u32()?;
        if magic != PROTOCOL_MAGIC {
            return Err(ProtoError::BadMagic(magic));
        }
        let version = bytes.read_u32()?;
        if version != PROTOCOL_VERSION {
            return Err(ProtoError::BadVersion(version));
        }
        let remainder_len = bytes.read_u32()? as usize;
        if bytes.bytes_available() < remainder_len {
            return Err(ProtoError::TruncatedMessage);
        }
        let mut remainder = ByteStream::from_bytes(bytes.read_slice(remainder_len)?);
        let width = remainder.read_u16()?;
        let height = remainder.read_u16()?;
        Ok(DecodedPreamble {
            width,
            height,
            rest: remainder.read_remaining().to_vec(),
        })
    }
}
