//! # wtgp-bytes
//!
//! WTGP ワイヤプロトコルの基礎となるバイトストリーム実装。
//!
//! すべてのフィールドはビッグエンディアン。文字列は 2 バイトの
//! 長さプレフィックス + UTF-8 バイト列でエンコードされる。
//!
//! ## ワイヤ上の基本型
//!
//! ```text
//! u8 / i16 / u16 / i32 / u32 : 固定幅ビッグエンディアン
//! UTF 文字列                 : [len: u16 BE][utf8 bytes...]
//! 終端文字列                 : 長さプレフィックスなし（フレーム末尾まで）
//! ```

#![no_std]
extern crate alloc;

mod error;
mod stream;

pub use error::BytesError;
pub use stream::ByteStream;
