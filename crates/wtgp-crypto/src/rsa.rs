//! RSA 公開鍵暗号（PKCS#1 v1.5 パディング）
//!
//! 接続ごとに一度だけ、セッション秘密（鍵 + IV）をサーバーの公開鍵で
//! 暗号化して送るために使う。サーバー認証は行わない：公開鍵は設定に
//! 埋め込まれた値を無条件に信頼する（既知の設計上の制約）。
//!
//! ## パディング形式（チャンクごと）
//!
//! ```text
//! [0x00][0x02][非ゼロ乱数バイト列][0x00][メッセージバイト列]
//! 合計長 = modulus のバイト長、オーバーヘッドは最低 11 バイト
//! ```

use alloc::vec::Vec;

use num_bigint::BigUint;

use crate::error::CryptoError;
use crate::random::fill_random_nonzero;

/// PKCS#1 v1.5 パディングの最小オーバーヘッド（バイト）
const PKCS1_OVERHEAD: usize = 11;

/// RSA 公開鍵（modulus + 公開指数）
///
/// 起動時に 16 進文字列の設定値からロードされ、以後は不変。
pub struct RsaPublicKey {
    n: BigUint,
    e: BigUint,
    /// modulus のバイト長（= 暗号化チャンク 1 つの出力長）
    modulus_len: usize,
}

impl RsaPublicKey {
    /// 16 進文字列の modulus と公開指数から鍵を構築する
    ///
    /// # エラー
    /// - `CryptoError::InvalidPublicKey`: 16 進パース失敗、または
    ///   modulus が小さすぎてパディングの余地がない
    pub fn from_hex(modulus_hex: &str, exponent_hex: &str) -> Result<Self, CryptoError> {
        let n = BigUint::parse_bytes(modulus_hex.as_bytes(), 16)
            .ok_or(CryptoError::InvalidPublicKey)?;
        let e = BigUint::parse_bytes(exponent_hex.as_bytes(), 16)
            .ok_or(CryptoError::InvalidPublicKey)?;

        let modulus_len = (n.bits() as usize + 7) / 8;
        if modulus_len <= PKCS1_OVERHEAD {
            return Err(CryptoError::InvalidPublicKey);
        }
        Ok(RsaPublicKey { n, e, modulus_len })
    }

    /// modulus のバイト長
    pub fn modulus_len(&self) -> usize {
        self.modulus_len
    }

    /// 平文を PKCS#1 v1.5 でパディングし、公開指数で冪剰余して暗号化する
    ///
    /// 平文が 1 チャンク（modulus 長 - 11）を超える場合は分割され、
    /// 出力は各チャンクの暗号文（それぞれ modulus 長）の連結になる。
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let chunk_len = self.modulus_len - PKCS1_OVERHEAD;
        let mut out = Vec::with_capacity(
            plaintext.len().div_ceil(chunk_len.max(1)) * self.modulus_len,
        );

        for chunk in plaintext.chunks(chunk_len) {
            let padded = self.pkcs1_pad(chunk)?;
            let m = BigUint::from_bytes_be(&padded);
            let c = m.modpow(&self.e, &self.n);

            // 出力チャンクは必ず modulus 長に左ゼロ詰めする
            let bytes = c.to_bytes_be();
            out.resize(out.len() + self.modulus_len - bytes.len(), 0);
            out.extend_from_slice(&bytes);
        }
        Ok(out)
    }

    /// チャンクを PKCS#1 v1.5 type 2 形式にパディングする
    fn pkcs1_pad(&self, chunk: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let mut padded = Vec::with_capacity(self.modulus_len);
        padded.push(0x00);
        padded.push(0x02);

        let pad_len = self.modulus_len - 3 - chunk.len();
        let start = padded.len();
        padded.resize(start + pad_len, 0);
        fill_random_nonzero(&mut padded[start..])?;

        padded.push(0x00);
        padded.extend_from_slice(chunk);
        debug_assert_eq!(padded.len(), self.modulus_len);
        Ok(padded)
    }
}
