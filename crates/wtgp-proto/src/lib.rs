//! # wtgp-proto
//!
//! WTGP ワイヤプロトコルのメッセージ定義とコーデック。
//!
//! ## フレーム構造
//!
//! トランスポート（WebSocket）はメッセージ境界を保存するので、
//! 1 フレーム = `[u8 タグ][ペイロード]` の全体がそのまま 1 メッセージ。
//! 暗号化が有効な間はフレーム全体が CBC で包まれる（包むのは
//! wtgp-session の責務で、このクレートは平文フレームのみ扱う）。
//!
//! compound メッセージの内側だけは `u16 長さ + サブメッセージ` の
//! 繰り返しで自己区切りする。

#![no_std]
extern crate alloc;

mod error;
mod message;
mod preamble;

pub use error::ProtoError;
pub use message::{ClientMessage, ServerMessage};
pub use preamble::{DecodedPreamble, Preamble};

/// プリアンブル先頭のマジックナンバー（"WTGP"）
pub const PROTOCOL_MAGIC: u32 = 0x5754_4750;

/// プロトコルバージョン
pub const PROTOCOL_VERSION: u32 = 1;

/// compound の入れ子の最大深さ（超過したフレームは拒否する）
pub const MAX_COMPOUND_DEPTH: u32 = 8;

/// クライアント → サーバーのメッセージタグ
pub mod client_tag {
    pub const MOUSE_PRESSED: u8 = 0;
    pub const MOUSE_RELEASED: u8 = 1;
    pub const KEY_PRESSED: u8 = 2;
    pub const KEY_PRESSED_NUMPAD: u8 = 3;
    pub const KEY_RELEASED: u8 = 4;
    pub const KEY_RELEASED_NUMPAD: u8 = 5;
    pub const WINDOW_CLOSED: u8 = 6;
    pub const CRYPTO_TOGGLED: u8 = 7;
    pub const PONG: u8 = 8;
}

/// サーバー → クライアントのメッセージタグ
pub mod server_tag {
    pub const UPDATE_WINDOW: u8 = 0;
    pub const REMOVE_WINDOW: u8 = 1;
    pub const SET_CONTENTS: u8 = 2;
    pub const MOVE_CONTENTS: u8 = 3;
    pub const SET_COOKIE: u8 = 4;
    pub const CLOSE: u8 = 5;
    pub const TOGGLE_CRYPTO: u8 = 6;
    pub const COMPOUND: u8 = 7;
    pub const PING: u8 = 8;
    pub const RECONNECT: u8 = 9;
    pub const EVALUATE: u8 = 10;
}
