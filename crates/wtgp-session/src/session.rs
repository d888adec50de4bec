//! 接続状態機械
//!
//! 1 接続分の全状態を保持する。グローバル状態は持たず、再接続時は
//! 新しい `Session` を作り直す（セッション秘密も作り直される）。

use alloc::string::String;
use alloc::vec::Vec;

use wtgp_bytes::ByteStream;
use wtgp_crypto::{CbcContext, RsaPublicKey, SessionSecret};
use wtgp_display::{CellUpdate, Screen};
use wtgp_proto::{ClientMessage, Preamble, ServerMessage};

use crate::error::SessionError;
use crate::input::KeyboardState;
use crate::LIVENESS_TIMEOUT_MS;

/// 接続のライフサイクル
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// 生成済み、プリアンブル未送信
    Connecting,
    /// プリアンブル送信済み、フレーム交換中
    Open,
    /// 終了（close 受信、エラー、またはタイムアウト）
    Closed,
}

/// セッション自身では完結できず、ページ側に委譲するアクション
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// cookie の永続化（有効期限はページ側の規約で付ける）
    SetCookie { key: String, value: String },
    /// 指定ホスト/ポートへ接続し直す（このセッションは終了済み）
    Reconnect { host: String, port: u16 },
    /// 接続が終了した（理由はバナーとして表示済み）
    Closed { reason: String },
}

/// 受信フレーム 1 つの処理結果
#[derive(Debug, Default)]
pub struct FrameOutcome {
    /// 画面内容が変化したか（変化時は `flush_display` を呼ぶべき）
    pub display_changed: bool,
    /// サーバーへ送信すべきフレーム（エンコード・暗号化済み）
    pub replies: Vec<Vec<u8>>,
    /// ページ側に委譲するアクション
    pub actions: Vec<SessionAction>,
    /// 読み捨てた未知のメッセージタグ（ログ用）
    pub unknown_tags: Vec<u8>,
}

/// `tick` の処理結果
#[derive(Debug, Default)]
pub struct TickOutcome {
    /// サーバーへ送信すべきフレーム
    pub frames: Vec<Vec<u8>>,
    /// 死活監視でタイムアウトした（セッションは終了済み）
    pub timed_out: bool,
}

/// セッション統計
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionStats {
    pub frames_received: u64,
    pub frames_sent: u64,
    pub unknown_tags: u64,
    pub evaluate_ignored: u64,
    pub keys_suppressed: u64,
}

/// WTGP 接続 1 本分の状態機械
pub struct Session {
    state: SessionState,
    /// toggle-crypto で切り替わる。プリアンブル直後は常に平文。
    crypto_enabled: bool,
    secret: SessionSecret,
    public_key: Option<RsaPublicKey>,
    /// 送信方向の CBC（プリアンブルの認証セクションから進み続ける）
    enc: CbcContext,
    /// 受信方向の CBC
    dec: CbcContext,
    screen: Screen,
    keyboard: KeyboardState,
    /// 最後にフレームを受信した時刻（死活監視用）
    last_recv_ms: Option<u64>,
    stats: SessionStats,
}

impl Session {
    /// 新しいセッションを生成する
    ///
    /// `public_key` が与えられた場合、プリアンブルにセッション秘密の
    /// RSA ブロブが含まれ、サーバーは toggle-crypto で暗号化を有効に
    /// できる。None なら全フレームが平文のままになる。
    pub fn new(
        width: u16,
        height: u16,
        public_key: Option<RsaPublicKey>,
    ) -> Result<Self, SessionError> {
        let secret = SessionSecret::generate()?;
        let enc = secret.encrypt_context();
        let dec = secret.decrypt_context();
        Ok(Session {
            state: SessionState::Connecting,
            crypto_enabled: false,
            secret,
            public_key,
            enc,
            dec,
            screen: Screen::new(width, height),
            keyboard: KeyboardState::new(),
            last_recv_ms: None,
            stats: SessionStats::default(),
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }

    pub fn crypto_enabled(&self) -> bool {
        self.crypto_enabled
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    /// プリアンブルフレームを生成し、セッションを開始する
    ///
    /// 公開鍵が設定されていれば、セッション秘密を RSA で包んだブロブと
    /// CBC 暗号化した認証セクション（クエリ + cookie）が入る。送信方向の
    /// フィードバックベクターはここから後続フレームへ進み続ける。
    pub fn start(&mut self, query: &str, cookie: &str) -> Result<Vec<u8>, SessionError> {
        let auth_plain = Preamble::encode_auth(query, cookie);
        let key_blob;
        let auth;
        match &self.public_key {
            Some(key) => {
                key_blob = Some(key.encrypt(&self.secret.to_bytes())?);
                auth = self.enc.encrypt_frame(&auth_plain);
            }
            None => {
                key_blob = None;
                auth = auth_plain;
            }
        }

        let frame = Preamble {
            width: self.screen.width() as u16,
            height: self.screen.height() as u16,
            key_blob: key_blob.as_deref(),
            auth: &auth,
        }
        .encode();
        self.state = SessionState::Open;
        Ok(frame)
    }

    /// サーバーから受信した 1 フレームを処理する
    ///
    /// デコードや復号に失敗した場合は接続断バナーを出してセッションを
    /// 終了し、エラーを返す。終了済みセッションへのフレームは無視する。
    pub fn handle_frame(
        &mut self,
        frame: &[u8],
        now_ms: u64,
    ) -> Result<FrameOutcome, SessionError> {
        if self.state != SessionState::Open {
            return Ok(FrameOutcome::default());
        }
        self.last_recv_ms = Some(now_ms);
        self.stats.frames_received += 1;

        match self.decode_frame(frame) {
            Ok(message) => {
                let mut outcome = FrameOutcome::default();
                outcome.display_changed = self.apply(message, &mut outcome);
                Ok(outcome)
            }
            Err(err) => {
                self.fail("Protocol error.  Please reload the page.");
                Err(err)
            }
        }
    }

    fn decode_frame(&mut self, frame: &[u8]) -> Result<ServerMessage, SessionError> {
        let plain;
        let mut bytes = if self.crypto_enabled {
            plain = self.dec.decrypt_frame(frame)?;
            ByteStream::from_bytes(&plain)
        } else {
            ByteStream::from_bytes(frame)
        };
        Ok(ServerMessage::decode(&mut bytes)?)
    }

    /// デコード済みメッセージを適用し、画面が変化したかを返す
    fn apply(&mut self, message: ServerMessage, outcome: &mut FrameOutcome) -> bool {
        match message {
            ServerMessage::UpdateWindow {
                id,
                layer,
                bounds,
                fill,
            } => {
                self.screen.update_window(id, layer, bounds, fill);
                true
            }

            ServerMessage::RemoveWindow { id } => {
                self.screen.remove_window(id);
                true
            }

            ServerMessage::SetContents { id, bounds, values } => {
                self.screen.set_window_contents(id, bounds, &values);
                true
            }

            ServerMessage::MoveContents {
                id,
                source,
                dest,
                fill,
            } => {
                self.screen.move_window_contents(id, source, dest, fill);
                true
            }

            ServerMessage::SetCookie { key, value } => {
                outcome.actions.push(SessionAction::SetCookie { key, value });
                false
            }

            ServerMessage::Close { reason } => {
                self.fail(&reason);
                outcome
                    .actions
                    .push(SessionAction::Closed { reason });
                true
            }

            ServerMessage::ToggleCrypto => {
                // 応答は切り替え前のモードでエンコードしてから切り替える
                let reply = self.send_frame(&ClientMessage::CryptoToggled);
                outcome.replies.push(reply);
                self.crypto_enabled = !self.crypto_enabled;
                false
            }

            ServerMessage::Compound { children } => {
                let mut modified = false;
                for child in children {
                    modified = self.apply(child, outcome) || modified;
                }
                modified
            }

            ServerMessage::Ping { payload } => {
                let reply = self.send_frame(&ClientMessage::Pong { payload });
                outcome.replies.push(reply);
                false
            }

            ServerMessage::Reconnect { host, port } => {
                // このセッションは終わり。ページ側が新セッションで繋ぎ直す。
                self.screen.clear_windows();
                self.state = SessionState::Closed;
                outcome
                    .actions
                    .push(SessionAction::Reconnect { host, port });
                true
            }

            ServerMessage::Evaluate { source: _ } => {
                // スクリプト実行要求は受理するが実行しない
                self.stats.evaluate_ignored += 1;
                false
            }

            ServerMessage::Unknown { tag } => {
                self.stats.unknown_tags += 1;
                outcome.unknown_tags.push(tag);
                false
            }
        }
    }

    /// 送信フレームをエンコードする（暗号化が有効なら CBC で包む）
    fn send_frame(&mut self, message: &ClientMessage) -> Vec<u8> {
        let plain = message.encode();
        self.stats.frames_sent += 1;
        if self.crypto_enabled {
            self.enc.encrypt_frame(&plain)
        } else {
            plain
        }
    }

    // ---- 入力イベント ----

    pub fn mouse_pressed(&mut self, x: i16, y: i16) -> Option<Vec<u8>> {
        self.input_frame(ClientMessage::MousePressed { x, y })
    }

    pub fn mouse_released(&mut self, x: i16, y: i16) -> Option<Vec<u8>> {
        self.input_frame(ClientMessage::MouseReleased { x, y })
    }

    fn input_frame(&mut self, message: ClientMessage) -> Option<Vec<u8>> {
        if self.state != SessionState::Open {
            return None;
        }
        Some(self.send_frame(&message))
    }

    /// キー押下。文字イベント待ちで保留されるため、通常このティックでは
    /// フレームを返さない（保留中の別キーのフラッシュ分は返る）。
    pub fn key_down(&mut self, code: u32, numpad: bool, now_ms: u64) -> Vec<Vec<u8>> {
        if self.state != SessionState::Open {
            return Vec::new();
        }
        let result = self.keyboard.key_down(code, numpad, now_ms);
        if result.suppressed {
            self.stats.keys_suppressed += 1;
        }
        let mut frames = Vec::new();
        if let Some(key) = result.flushed {
            frames.push(self.send_frame(&ClientMessage::KeyPressed {
                code: key.code,
                ch: 0,
                numpad: key.numpad,
            }));
        }
        frames
    }

    /// 文字イベント。保留中の押下と合わせて key-pressed を送信する。
    pub fn key_char(&mut self, ch: u16) -> Option<Vec<u8>> {
        if self.state != SessionState::Open {
            return None;
        }
        let (key, ch) = self.keyboard.key_char(ch)?;
        Some(self.send_frame(&ClientMessage::KeyPressed {
            code: key.code,
            ch,
            numpad: key.numpad,
        }))
    }

    /// キー解放。保留中の押下があれば先にフラッシュする。
    /// 押下時に確定した文字は key-released にも載せる。
    pub fn key_up(&mut self, code: u32, numpad: bool) -> Vec<Vec<u8>> {
        if self.state != SessionState::Open {
            return Vec::new();
        }
        let mut frames = Vec::new();
        let (pending, ch) = self.keyboard.key_up(code);
        if let Some(pending) = pending {
            frames.push(self.send_frame(&ClientMessage::KeyPressed {
                code: pending.code,
                ch: 0,
                numpad: pending.numpad,
            }));
        }
        frames.push(self.send_frame(&ClientMessage::KeyReleased { code, ch, numpad }));
        frames
    }

    /// ページが閉じられる直前の通知
    pub fn window_closed(&mut self) -> Option<Vec<u8>> {
        self.input_frame(ClientMessage::WindowClosed)
    }

    // ---- タイマー ----

    /// 定期 tick。保留キーのフラッシュと死活監視を行う。
    pub fn tick(&mut self, now_ms: u64) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        if self.state != SessionState::Open {
            return outcome;
        }

        if let Some(key) = self.keyboard.flush() {
            outcome.frames.push(self.send_frame(&ClientMessage::KeyPressed {
                code: key.code,
                ch: 0,
                numpad: key.numpad,
            }));
        }

        if let Some(last) = self.last_recv_ms {
            if now_ms.saturating_sub(last) > LIVENESS_TIMEOUT_MS {
                self.fail("Connection timed out.  Please reload the page.");
                outcome.timed_out = true;
            }
        }
        outcome
    }

    // ---- 表示と終了 ----

    /// トランスポートのエラー通知（WebSocket onerror 相当）
    pub fn transport_error(&mut self) {
        self.fail(
            "No connection to server.  Please wait a moment, then reload the page.",
        );
    }

    /// バナーを表示してセッションを終了する
    pub fn fail(&mut self, reason: &str) {
        if self.state == SessionState::Closed {
            return;
        }
        self.screen.show_banner(reason);
        self.state = SessionState::Closed;
    }

    /// 画面に描画すべき差分があるか
    pub fn has_dirty(&self) -> bool {
        self.screen.has_dirty()
    }

    /// ダーティ領域を合成して変化セルを返す
    pub fn flush_display(&mut self) -> Vec<CellUpdate> {
        self.screen.update_display()
    }

    /// 描画側の状態が失われた場合の全面再描画要求
    pub fn invalidate_display(&mut self) {
        self.screen.invalidate();
    }
}
