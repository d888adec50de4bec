//! セッション秘密（AES 鍵 + IV）
//!
//! ## ワイヤ上のフォーマット（32 バイト）
//!
//! ```text
//! bytes[0..16]  = AES-128 鍵
//! bytes[16..32] = CBC 初期 IV
//! ```
//!
//! この 32 バイトをサーバーの RSA 公開鍵で暗号化してプリアンブルに
//! 埋め込む。接続試行のたびに新規生成し、再接続で使い回さない。

use crate::cbc::{CbcContext, BLOCK_SIZE};
use crate::error::CryptoError;
use crate::random::fill_random;

/// セッション秘密のワイヤ長（鍵 16 + IV 16）
pub const SECRET_LEN: usize = 32;

/// 1 接続分の対称鍵マテリアル
pub struct SessionSecret {
    key: [u8; 16],
    iv: [u8; BLOCK_SIZE],
}

impl SessionSecret {
    /// OS の CSPRNG から新しい秘密を生成する
    pub fn generate() -> Result<Self, CryptoError> {
        let mut key = [0u8; 16];
        let mut iv = [0u8; BLOCK_SIZE];
        fill_random(&mut key)?;
        fill_random(&mut iv)?;
        Ok(SessionSecret { key, iv })
    }

    /// 32 バイトのワイヤ表現から復元する（テスト・サーバー側実装用）
    pub fn from_bytes(bytes: &[u8; SECRET_LEN]) -> Self {
        let mut key = [0u8; 16];
        let mut iv = [0u8; BLOCK_SIZE];
        key.copy_from_slice(&bytes[0..16]);
        iv.copy_from_slice(&bytes[16..32]);
        SessionSecret { key, iv }
    }

    /// RSA で包んでサーバーに送る 32 バイトのワイヤ表現
    pub fn to_bytes(&self) -> [u8; SECRET_LEN] {
        let mut out = [0u8; SECRET_LEN];
        out[0..16].copy_from_slice(&self.key);
        out[16..32].copy_from_slice(&self.iv);
        out
    }

    /// 送信方向専用の CBC コンテキストを構築する
    pub fn encrypt_context(&self) -> CbcContext {
        // 鍵長は常に 16 バイトなので失敗しない
        CbcContext::new(&self.key, &self.iv).expect("fixed-length key")
    }

    /// 受信方向専用の CBC コンテキストを構築する
    ///
    /// 同じ鍵/IV から初期化されるが、以後のフィードバックベクターは
    /// `encrypt_context` とは独立に進む。
    pub fn decrypt_context(&self) -> CbcContext {
        CbcContext::new(&self.key, &self.iv).expect("fixed-length key")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_roundtrip() {
        let secret = SessionSecret::generate().unwrap();
        let bytes = secret.to_bytes();
        let restored = SessionSecret::from_bytes(&bytes);
        assert_eq!(restored.to_bytes(), bytes);
    }

    #[test]
    fn test_generate_is_random() {
        let a = SessionSecret::generate().unwrap();
        let b = SessionSecret::generate().unwrap();
        assert_ne!(a.to_bytes(), b.to_bytes());
    }

    #[test]
    fn test_contexts_interoperate() {
        let secret = SessionSecret::generate().unwrap();
        let mut enc = secret.encrypt_context();
        let mut dec = secret.decrypt_context();
        let ct = enc.encrypt_frame(b"hello session");
        assert_eq!(dec.decrypt_frame(&ct).unwrap(), b"hello session");
    }
}
