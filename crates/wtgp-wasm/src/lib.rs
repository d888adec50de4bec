//! # wtgp-wasm
//!
//! wasm-bindgen エクスポート：ブラウザページから呼び出す公開 API。
//!
//! プロトコル・暗号・合成はすべて WASM 側で行い、ページ側は
//! WebSocket の配線・タイマー・セル描画・cookie の永続化だけを担当する。
//!
//! ## 使用方法（TypeScript）
//!
//! ```typescript
//! import { GridClient, init_panic_hook } from '../wtgp-wasm-pkg/wtgp_wasm';
//!
//! // パニック時のスタックトレースを有効化（開発時）
//! init_panic_hook();
//!
//! // クライアント初期化（公開鍵はサーバー設定と同じ 16 進文字列）
//! const client = new GridClient(80, 24, serverModulusHex, "10001");
//!
//! const socket = new WebSocket(`ws://${host}:${port}/client`);
//! socket.binaryType = "arraybuffer";
//! socket.onopen = () => {
//!     socket.send(client.start(location.search, document.cookie));
//! };
//! socket.onmessage = (event) => {
//!     for (const reply of client.recvFrame(new Uint8Array(event.data), Date.now())) {
//!         socket.send(reply);
//!     }
//!     paint();
//!     handleActions();
//! };
//!
//! // 定期タイマー（保留キーのフラッシュと死活監視）
//! setInterval(() => {
//!     for (const frame of client.tick(Date.now())) socket.send(frame);
//!     paint();
//!     handleActions();
//! }, 50);
//!
//! function paint() {
//!     const cells = client.flushDisplay();   // [x, y, value] の繰り返し
//!     for (let i = 0; i < cells.length; i += 3) {
//!         paintCell(cells[i], cells[i + 1], cells[i + 2]);
//!     }
//! }
//!
//! function handleActions() {
//!     for (const action of JSON.parse(client.takeActions())) {
//!         switch (action.type) {
//!             case "setCookie":
//!                 // 5 年の有効期限で永続化する
//!                 document.cookie = `${action.key}=${action.value}; max-age=${5 * 365 * 24 * 3600}`;
//!                 break;
//!             case "reconnect":
//!                 reconnect(action.host, action.port);  // 新しい GridClient で繋ぎ直す
//!                 break;
//!         }
//!     }
//! }
//! ```

use wasm_bindgen::prelude::*;

pub mod client;

pub use client::GridClient;

/// パニック時にブラウザコンソールにスタックトレースを出力する
///
/// 開発時に必ず呼び出すこと。本番ビルドでは feature flag で無効化可能。
#[wasm_bindgen]
pub fn init_panic_hook() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}
