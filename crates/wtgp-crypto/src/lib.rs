//! # wtgp-crypto
//!
//! WTGP 接続の暗号プリミティブ実装。
//! `no_std` + `alloc` 環境（WASM を含む）で動作する。
//!
//! ## セッション確立の流れ
//!
//! ```text
//! 1. SessionSecret::generate()    鍵 16B + IV 16B を CSPRNG から生成
//! 2. RsaPublicKey::encrypt()      32B 秘密を PKCS#1 v1.5 で包んで冪剰余
//!    → modulus 長（通常 128B）のブロブをプリアンブルに埋め込む
//! 3. encrypt_context() /          同じ鍵/IV から方向別の CBC コンテキスト
//!    decrypt_context()            を構築（以後フィードバックは独立に進む）
//! ```
//!
//! ## CBC フレーム構造
//!
//! ```text
//! 平文フレーム → PKCS#5 パディング → CBC 暗号化
//! フレーム間でフィードバックベクター（直前の暗号文ブロック）を持ち越す
//! ```

#![no_std]
extern crate alloc;

mod cbc;
mod error;
mod random;
mod rsa;
mod secret;

pub use cbc::{CbcContext, BLOCK_SIZE};
pub use error::CryptoError;
pub use random::{fill_random, fill_random_nonzero};
pub use rsa::RsaPublicKey;
pub use secret::{SessionSecret, SECRET_LEN};
