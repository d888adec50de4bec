//! 暗号エラー型

/// 暗号操作のエラー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoError {
    /// 鍵の長さが不正（16/24/32 バイト以外）
    InvalidKeyLength,
    /// 暗号文がブロック長の倍数でない（ストリーム非同期の兆候）
    InvalidBlockLength,
    /// PKCS#5 パディング検証失敗（ストリーム非同期または改竄）
    InvalidPadding,
    /// RSA 公開鍵（16進文字列）のパースに失敗
    InvalidPublicKey,
    /// OS の乱数ソースからの取得に失敗
    RandomFailed,
}

impl core::fmt::Display for CryptoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CryptoError::InvalidKeyLength => {
                write!(f, "Invalid key length (expected 16, 24 or 32 bytes)")
            }
            CryptoError::InvalidBlockLength => {
                write!(f, "Ciphertext length is not a multiple of the block size")
            }
            CryptoError::InvalidPadding => write!(f, "Invalid PKCS#5 padding"),
            CryptoError::InvalidPublicKey => write!(f, "Invalid RSA public key"),
            CryptoError::RandomFailed => write!(f, "Failed to read from the system CSPRNG"),
        }
    }
}
