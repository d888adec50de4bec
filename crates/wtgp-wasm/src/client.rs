//! GridClient wasm-bindgen エクスポート
//!
//! ブラウザページから呼び出す WTGP クライアントの主エントリポイント。
//! プロトコル・暗号・画面合成を統合する。

extern crate alloc;

use alloc::format;
use alloc::vec::Vec;

use js_sys::{Int32Array, Uint8Array};
use serde::Serialize;
use wasm_bindgen::prelude::*;

use wtgp_crypto::RsaPublicKey;
use wtgp_session::{Session, SessionAction};

/// `takeActions` で JSON 化するアクション
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum ActionDto<'a> {
    /// ページ側で cookie を永続化する
    SetCookie { key: &'a str, value: &'a str },
    /// 新しい GridClient で指定先に繋ぎ直す
    Reconnect { host: &'a str, port: u16 },
    /// 接続が終了した（バナーは表示済み）
    Closed { reason: &'a str },
    /// 死活監視のタイムアウトで終了した
    TimedOut,
}

/// WTGP クライアントセッション
///
/// ## 内部アーキテクチャ
///
/// ```text
/// GridClient
///   └── Session        (wtgp-session) - 接続状態機械
///         ├── Screen        (wtgp-display) - ウィンドウ合成と差分描画
///         ├── CbcContext x2 (wtgp-crypto)  - 方向別フレーム暗号
///         └── ServerMessage (wtgp-proto)   - ワイヤコーデック
/// ```
///
/// ## スレッド安全性
///
/// WASM はシングルスレッドのため、JS からは単一スレッドで呼び出される前提。
#[wasm_bindgen]
pub struct GridClient {
    session: Session,
    /// ページ側が `takeActions` で引き取るまで溜めるアクション
    pending_actions: Vec<SessionAction>,
    timed_out: bool,
}

#[wasm_bindgen]
impl GridClient {
    /// クライアントを初期化する
    ///
    /// # 引数
    /// - `width` / `height`: 画面のセル数
    /// - `modulus_hex` / `exponent_hex`: サーバーの RSA 公開鍵（16 進）。
    ///   両方省略すると全フレームが平文になる（開発用）。
    ///
    /// # エラー
    /// - 公開鍵の 16 進パース失敗、または modulus が短すぎる
    /// - CSPRNG からのセッション秘密の生成失敗
    #[wasm_bindgen(constructor)]
    pub fn new(
        width: u16,
        height: u16,
        modulus_hex: Option<String>,
        exponent_hex: Option<String>,
    ) -> Result<GridClient, JsError> {
        let public_key = match modulus_hex {
            Some(modulus) => {
                let exponent = exponent_hex.unwrap_or_else(|| String::from("10001"));
                Some(
                    RsaPublicKey::from_hex(&modulus, &exponent)
                        .map_err(|e| JsError::new(&format!("Invalid server key: {}", e)))?,
                )
            }
            None => None,
        };
        let session = Session::new(width, height, public_key)
            .map_err(|e| JsError::new(&format!("Session init failed: {}", e)))?;
        Ok(GridClient {
            session,
            pending_actions: Vec::new(),
            timed_out: false,
        })
    }

    /// プリアンブルフレームを生成する
    ///
    /// WebSocket の onopen で呼び、戻り値をそのまま送信する。
    ///
    /// # 引数
    /// - `query`: `location.search`
    /// - `cookie`: `document.cookie`
    #[wasm_bindgen]
    pub fn start(&mut self, query: &str, cookie: &str) -> Result<Uint8Array, JsError> {
        let frame = self
            .session
            .start(query, cookie)
            .map_err(|e| JsError::new(&format!("Handshake failed: {}", e)))?;
        Ok(to_uint8(&frame))
    }

    /// 受信した 1 フレームを処理する
    ///
    /// # 引数
    /// - `frame`: WebSocket message の `Uint8Array`
    /// - `now_ms`: 現在時刻（`Date.now()`）
    ///
    /// # 戻り値
    /// サーバーへ送り返すフレーム（pong、crypto-toggled）の配列。
    /// 処理後に `flushDisplay` と `takeActions` を呼ぶこと。
    ///
    /// # エラー
    /// - デコードまたは復号の失敗。セッションは終了し、接続断バナーが
    ///   画面差分として出る。
    #[wasm_bindgen(js_name = "recvFrame")]
    pub fn recv_frame(&mut self, frame: &[u8], now_ms: f64) -> Result<js_sys::Array, JsError> {
        let outcome = self
            .session
            .handle_frame(frame, now_ms as u64)
            .map_err(|e| JsError::new(&format!("Bad frame: {}", e)))?;

        for tag in &outcome.unknown_tags {
            web_sys::console::warn_1(&JsValue::from_str(&format!(
                "Unknown message type: {}",
                tag
            )));
        }
        self.pending_actions.extend(outcome.actions);
        Ok(frames_to_array(outcome.replies))
    }

    /// 定期タイマー tick（保留キーのフラッシュ・死活監視）
    ///
    /// ページの `setInterval` から 50ms 程度の間隔で呼び出す。
    ///
    /// # 戻り値
    /// 送信すべきフレームの配列
    #[wasm_bindgen]
    pub fn tick(&mut self, now_ms: f64) -> js_sys::Array {
        let outcome = self.session.tick(now_ms as u64);
        if outcome.timed_out {
            self.timed_out = true;
        }
        frames_to_array(outcome.frames)
    }

    // ---- 入力イベント ----

    /// マウス押下（セル座標）。送信すべきフレームを返す。
    #[wasm_bindgen(js_name = "mouseDown")]
    pub fn mouse_down(&mut self, x: i16, y: i16) -> Option<Uint8Array> {
        self.session.mouse_pressed(x, y).map(|f| to_uint8(&f))
    }

    /// マウス解放（セル座標）
    #[wasm_bindgen(js_name = "mouseUp")]
    pub fn mouse_up(&mut self, x: i16, y: i16) -> Option<Uint8Array> {
        self.session.mouse_released(x, y).map(|f| to_uint8(&f))
    }

    /// キー押下（keydown）。押下は文字イベント待ちで保留されるため、
    /// 返るのは保留中だった別キーのフラッシュ分だけのことが多い。
    #[wasm_bindgen(js_name = "keyDown")]
    pub fn key_down(&mut self, code: u32, numpad: bool, now_ms: f64) -> js_sys::Array {
        frames_to_array(self.session.key_down(code, numpad, now_ms as u64))
    }

    /// 文字イベント（keypress）。保留中の押下と合わせて送信される。
    #[wasm_bindgen(js_name = "keyChar")]
    pub fn key_char(&mut self, ch: u16) -> Option<Uint8Array> {
        self.session.key_char(ch).map(|f| to_uint8(&f))
    }

    /// キー解放（keyup）
    #[wasm_bindgen(js_name = "keyUp")]
    pub fn key_up(&mut self, code: u32, numpad: bool) -> js_sys::Array {
        frames_to_array(self.session.key_up(code, numpad))
    }

    /// ページが閉じられる直前の通知（onbeforeunload）
    #[wasm_bindgen(js_name = "windowClosed")]
    pub fn window_closed(&mut self) -> Option<Uint8Array> {
        self.session.window_closed().map(|f| to_uint8(&f))
    }

    // ---- 表示 ----

    /// 描画すべき差分があるか
    #[wasm_bindgen(js_name = "hasDirty")]
    pub fn has_dirty(&self) -> bool {
        self.session.has_dirty()
    }

    /// 前回呼び出しから変化したセルを返す
    ///
    /// # 戻り値
    /// `[x, y, value]` を変化セル分だけ並べた Int32Array。
    /// value の下位 16 ビットが文字、bit16 が反転、bit17 が減光。
    #[wasm_bindgen(js_name = "flushDisplay")]
    pub fn flush_display(&mut self) -> Int32Array {
        let updates = self.session.flush_display();
        let mut flat = Vec::with_capacity(updates.len() * 3);
        for update in updates {
            flat.push(update.x);
            flat.push(update.y);
            flat.push(update.value as i32);
        }
        let arr = Int32Array::new_with_length(flat.len() as u32);
        arr.copy_from(&flat);
        arr
    }

    /// ページ側の描画状態が失われた場合の全面再描画要求
    #[wasm_bindgen(js_name = "invalidateDisplay")]
    pub fn invalidate_display(&mut self) {
        self.session.invalidate_display();
    }

    // ---- 状態とアクション ----

    /// セッションが終了済みか
    #[wasm_bindgen(js_name = "isClosed")]
    pub fn is_closed(&self) -> bool {
        self.session.is_closed()
    }

    /// フレーム暗号化が有効か
    #[wasm_bindgen(js_name = "cryptoEnabled")]
    pub fn crypto_enabled(&self) -> bool {
        self.session.crypto_enabled()
    }

    /// 溜まっているアクションを JSON 配列で引き取る
    ///
    /// # 戻り値
    /// ```json
    /// [{"type":"setCookie","key":"id","value":"42"},
    ///  {"type":"reconnect","host":"other.example","port":8080}]
    /// ```
    #[wasm_bindgen(js_name = "takeActions")]
    pub fn take_actions(&mut self) -> Result<String, JsError> {
        let mut dtos: Vec<ActionDto<'_>> = Vec::new();
        for action in &self.pending_actions {
            dtos.push(match action {
                SessionAction::SetCookie { key, value } => ActionDto::SetCookie { key, value },
                SessionAction::Reconnect { host, port } => ActionDto::Reconnect {
                    host,
                    port: *port,
                },
                SessionAction::Closed { reason } => ActionDto::Closed { reason },
            });
        }
        if self.timed_out {
            dtos.push(ActionDto::TimedOut);
        }
        let json = serde_json::to_string(&dtos)
            .map_err(|e| JsError::new(&format!("Action encode failed: {}", e)))?;
        self.pending_actions.clear();
        self.timed_out = false;
        Ok(json)
    }

    /// WebSocket の onerror から呼ぶ。接続断バナーを表示して終了する。
    #[wasm_bindgen(js_name = "transportError")]
    pub fn transport_error(&mut self) {
        self.session.transport_error();
    }

    /// セッション統計を JSON 文字列で返す
    ///
    /// # 戻り値
    /// JSON 文字列:
    /// ```json
    /// {
    ///   "frames_received": 120,
    ///   "frames_sent": 45,
    ///   "unknown_tags": 0,
    ///   "evaluate_ignored": 0,
    ///   "keys_suppressed": 3
    /// }
    /// ```
    #[wasm_bindgen(js_name = "getStats")]
    pub fn get_stats(&self) -> String {
        let stats = self.session.stats();
        format!(
            r#"{{"frames_received":{},"frames_sent":{},"unknown_tags":{},"evaluate_ignored":{},"keys_suppressed":{}}}"#,
            stats.frames_received,
            stats.frames_sent,
            stats.unknown_tags,
            stats.evaluate_ignored,
            stats.keys_suppressed,
        )
    }
}

/// バイト列を Uint8Array にコピーする
fn to_uint8(bytes: &[u8]) -> Uint8Array {
    let arr = Uint8Array::new_with_length(bytes.len() as u32);
    arr.copy_from(bytes);
    arr
}

/// フレームのリストを Uint8Array の js_sys::Array に変換する
fn frames_to_array(frames: Vec<Vec<u8>>) -> js_sys::Array {
    let result = js_sys::Array::new();
    for frame in frames {
        result.push(&to_uint8(&frame));
    }
    result
}
