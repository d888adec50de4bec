//! AES-CBC モード実装（方向ごとのフィードバックベクター付き）
//!
//! ## フレームの暗号化方式
//!
//! ```text
//! 平文フレーム → PKCS#5 パディング → ブロックごとに
//!   [feedback と XOR] → [AES 暗号化] → feedback := 暗号文ブロック
//! ```
//!
//! フレーム間で feedback は持ち越される。つまり各フレームは独立に
//! パディングされるが、CBC の連鎖は接続全体で一本のストリームとして
//! 続く（受信側も同じ順でフレームを処理する前提）。
//!
//! 送信方向と受信方向は同じ鍵/IV から初期化された **別々の** コンテキスト
//! を使う。一つの可変 IV を両方向で共有するとストリームが非同期になる。

use alloc::vec::Vec;

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::{Aes128, Aes192, Aes256};

use crate::error::CryptoError;

/// AES のブロック長（バイト）
pub const BLOCK_SIZE: usize = 16;

/// 鍵長に応じた AES ブロック暗号（10/12/14 ラウンド）
enum AesKey {
    Aes128(Aes128),
    Aes192(Aes192),
    Aes256(Aes256),
}

impl AesKey {
    fn new(key: &[u8]) -> Result<Self, CryptoError> {
        match key.len() {
            16 => Ok(AesKey::Aes128(Aes128::new(GenericArray::from_slice(key)))),
            24 => Ok(AesKey::Aes192(Aes192::new(GenericArray::from_slice(key)))),
            32 => Ok(AesKey::Aes256(Aes256::new(GenericArray::from_slice(key)))),
            _ => Err(CryptoError::InvalidKeyLength),
        }
    }

    fn encrypt_block(&self, block: &mut [u8]) {
        let block = GenericArray::from_mut_slice(block);
        match self {
            AesKey::Aes128(k) => k.encrypt_block(block),
            AesKey::Aes192(k) => k.encrypt_block(block),
            AesKey::Aes256(k) => k.encrypt_block(block),
        }
    }

    fn decrypt_block(&self, block: &mut [u8]) {
        let block = GenericArray::from_mut_slice(block);
        match self {
            AesKey::Aes128(k) => k.decrypt_block(block),
            AesKey::Aes192(k) => k.decrypt_block(block),
            AesKey::Aes256(k) => k.decrypt_block(block),
        }
    }
}

/// 一方向分の CBC コンテキスト
///
/// `encrypt_frame` 用と `decrypt_frame` 用に別インスタンスを構築し、
/// それぞれの方向専用に使うこと。
pub struct CbcContext {
    key: AesKey,
    /// ローリング IV。直前の暗号文ブロックを保持する。
    feedback: [u8; BLOCK_SIZE],
}

impl CbcContext {
    /// 鍵と初期 IV からコンテキストを生成する
    pub fn new(key: &[u8], iv: &[u8; BLOCK_SIZE]) -> Result<Self, CryptoError> {
        Ok(CbcContext {
            key: AesKey::new(key)?,
            feedback: *iv,
        })
    }

    /// 1 フレームを PKCS#5 パディングして暗号化する
    ///
    /// 平文長がブロック長の倍数でも丸ごと 1 ブロックのパディングが付く。
    pub fn encrypt_frame(&mut self, plaintext: &[u8]) -> Vec<u8> {
        // パディング値 = 次のブロック境界までの距離（1..=16）
        let pad = BLOCK_SIZE - plaintext.len() % BLOCK_SIZE;
        let mut buf = Vec::with_capacity(plaintext.len() + pad);
        buf.extend_from_slice(plaintext);
        buf.resize(plaintext.len() + pad, pad as u8);

        for block in buf.chunks_exact_mut(BLOCK_SIZE) {
            for (b, f) in block.iter_mut().zip(self.feedback.iter()) {
                *b ^= f;
            }
            self.key.encrypt_block(block);
            self.feedback.copy_from_slice(block);
        }
        buf
    }

    /// 1 フレームを復号して PKCS#5 パディングを取り除く
    ///
    /// # エラー
    /// - `CryptoError::InvalidBlockLength`: 長さがブロックの倍数でない
    /// - `CryptoError::InvalidPadding`: パディングバイトが矛盾している
    pub fn decrypt_frame(&mut self, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
            return Err(CryptoError::InvalidBlockLength);
        }

        let mut buf = ciphertext.to_vec();
        let mut saved = [0u8; BLOCK_SIZE];
        for block in buf.chunks_exact_mut(BLOCK_SIZE) {
            // 上書きされる前に暗号文ブロックを退避する
            saved.copy_from_slice(block);
            self.key.decrypt_block(block);
            for (b, f) in block.iter_mut().zip(self.feedback.iter()) {
                *b ^= f;
            }
            self.feedback = saved;
        }

        // PKCS#5 アンパッド
        let pad = *buf.last().unwrap_or(&0) as usize;
        if pad == 0 || pad > BLOCK_SIZE || pad > buf.len() {
            return Err(CryptoError::InvalidPadding);
        }
        if buf[buf.len() - pad..].iter().any(|&b| b as usize != pad) {
            return Err(CryptoError::InvalidPadding);
        }
        buf.truncate(buf.len() - pad);
        Ok(buf)
    }
}
