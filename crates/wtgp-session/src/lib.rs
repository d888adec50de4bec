//! # wtgp-session
//!
//! WTGP 接続 1 本分の状態機械。
//!
//! トランスポート（WebSocket）やタイマーには依存せず、呼び出し側から
//! 受信フレームと現在時刻（ミリ秒）を与えられて動く純粋な状態機械。
//! 戻り値として「送信すべきフレーム」「画面差分の有無」「ページ側に
//! 委譲するアクション」を返す。
//!
//! ```text
//! ページ / WASM 境界
//!   ├── start(query, cookie)      → プリアンブルフレーム
//!   ├── handle_frame(bytes, now)  → 返信フレーム + アクション
//!   ├── key_*/mouse_* (入力)      → 入力フレーム
//!   ├── tick(now)                 → 保留キーのフラッシュ + 死活監視
//!   └── flush_display()           → 変化したセルのリスト
//! ```

#![no_std]
extern crate alloc;

mod error;
mod input;
mod session;

pub use error::SessionError;
pub use input::KeyboardState;
pub use session::{
    FrameOutcome, Session, SessionAction, SessionState, SessionStats, TickOutcome,
};

/// この時間サーバーから何も受信しなければ接続断とみなす（ミリ秒）
pub const LIVENESS_TIMEOUT_MS: u64 = 60_000;

/// 同一キーの押下をこの間隔未満で繰り返した場合は間引く（ミリ秒）
pub const KEY_REPEAT_MIN_INTERVAL_MS: u64 = 30;
