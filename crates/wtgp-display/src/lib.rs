//! # wtgp-display
//!
//! ウィンドウスタックのコンポジタ。
//! サーバーが送ってくるウィンドウ操作（生成・移動・内容更新・削除）を
//! 適用し、ダーティ領域だけを再合成して「前回描画との差分セル」を
//! 吐き出す。描画バックエンド（DOM / canvas）には依存しない。
//!
//! ## 合成モデル
//!
//! ```text
//! Window 群（layer 昇順） → ダーティ矩形内を下から上へ合成
//!                          → 前回描画バッファと比較
//!                          → 変化したセルのみ CellUpdate として出力
//! ```
//!
//! セル値 0 は透明。どのウィンドウにも覆われないセルは空白 (0x20) として
//! 描画される。

#![no_std]
extern crate alloc;

pub mod cell;
mod geom;
mod screen;
mod window;

pub use geom::{Point, Rect};
pub use screen::{CellUpdate, Screen};
pub use window::Window;
