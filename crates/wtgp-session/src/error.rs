//! セッション層のエラー型

use wtgp_crypto::CryptoError;
use wtgp_proto::ProtoError;

/// フレーム処理またはハンドシェイクの失敗
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// メッセージのデコード失敗
    Proto(ProtoError),
    /// 復号失敗または鍵マテリアルの生成失敗
    Crypto(CryptoError),
}

impl From<ProtoError> for SessionError {
    fn from(err: ProtoError) -> Self {
        SessionError::Proto(err)
    }
}

impl From<CryptoError> for SessionError {
    fn from(err: CryptoError) -> Self {
        SessionError::Crypto(err)
    }
}

impl core::fmt::Display for SessionError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SessionError::Proto(err) => write!(f, "protocol error: {}", err),
            SessionError::Crypto(err) => write!(f, "crypto error: {}", err),
        }
    }
}
