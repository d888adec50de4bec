//! バイトストリームのエラー型

/// バイトストリーム操作のエラー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BytesError {
    /// 読み取りに必要なバイト数が残っていない（メッセージ切り詰め）
    TruncatedMessage,
    /// UTF-8 デコードに失敗
    InvalidUtf8,
}

impl core::fmt::Display for BytesError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BytesError::TruncatedMessage => write!(f, "Truncated message: not enough bytes"),
            BytesError::InvalidUtf8 => write!(f, "Invalid UTF-8 sequence"),
        }
    }
}
