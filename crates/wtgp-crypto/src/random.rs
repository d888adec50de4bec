//! OS の CSPRNG からの乱数取得
//!
//! 時刻シードの自前ジェネレータは使わず、常に
//! `getrandom`（WASM では crypto.getRandomValues）から取得する。

use crate::error::CryptoError;

/// バッファを乱数で埋める
pub fn fill_random(buf: &mut [u8]) -> Result<(), CryptoError> {
    getrandom::getrandom(buf).map_err(|_| CryptoError::RandomFailed)
}

/// バッファを非ゼロの乱数バイトで埋める（PKCS#1 パディング用）
pub fn fill_random_nonzero(buf: &mut [u8]) -> Result<(), CryptoError> {
    fill_random(buf)?;
    for b in buf.iter_mut() {
        while *b == 0 {
            let mut one = [0u8; 1];
            fill_random(&mut one)?;
            *b = one[0];
        }
    }
    Ok(())
}
