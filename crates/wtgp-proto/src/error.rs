//! プロトコルデコードのエラー型

use wtgp_bytes::BytesError;

/// フレームのデコードに失敗した理由
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtoError {
    /// ペイロードが途中で切れている
    TruncatedMessage,
    /// 文字列フィールドが正しい UTF-8 でない
    InvalidUtf8,
    /// compound の入れ子が深すぎる
    NestingTooDeep,
    /// プリアンブルのマジックナンバーが一致しない
    BadMagic(u32),
    /// プリアンブルのバージョンが一致しない
    BadVersion(u32),
}

impl From<BytesError> for ProtoError {
    fn from(err: BytesError) -> Self {
        match err {
            BytesError::TruncatedMessage => ProtoError::TruncatedMessage,
            BytesError::InvalidUtf8 => ProtoError::InvalidUtf8,
        }
    }
}

impl core::fmt::Display for ProtoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ProtoError::TruncatedMessage => write!(f, "truncated message"),
            ProtoError::InvalidUtf8 => write!(f, "invalid utf-8 in message"),
            ProtoError::NestingTooDeep => write!(f, "compound message nested too deeply"),
            ProtoError::BadMagic(magic) => write!(f, "bad preamble magic: {:#010x}", magic),
            ProtoError::BadVersion(version) => write!(f, "unsupported version: {}", version),
        }
    }
}
