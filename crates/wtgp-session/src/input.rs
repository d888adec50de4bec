//! キーボード入力の整流
//!
//! ブラウザの keydown は押下キーの文字を直接は持たない。文字は直後の
//! keypress（文字イベント）で届くので、keydown を一旦保留し、
//!
//! - 同じティック内に文字イベントが来ればその文字と合わせて送信
//! - 来なければ次の tick で文字コード 0 として送信
//!
//! する。また OS のキーリピートによる高頻度の keydown は、同一キー
//! コードについて最小間隔未満のものを間引く。

use alloc::collections::BTreeMap;

use crate::KEY_REPEAT_MIN_INTERVAL_MS;

/// 文字イベント待ちで保留中のキー押下
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingKey {
    pub code: u32,
    pub numpad: bool,
}

/// `key_down` の処理結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyDownResult {
    /// キーリピートの間引きで今回の押下が捨てられたか
    pub suppressed: bool,
    /// 今回の押下より前から保留されていたキー（先に送信が必要）
    pub flushed: Option<PendingKey>,
}

/// キーボード入力の保留とリピート間引きの状態
#[derive(Debug, Default)]
pub struct KeyboardState {
    /// キーコード → 最後に受理した押下時刻（ミリ秒）
    last_down_ms: BTreeMap<u32, u64>,
    /// キーコード → 文字イベントで確定した文字（解放メッセージにも載せる）
    last_char: BTreeMap<u32, u16>,
    pending: Option<PendingKey>,
}

impl KeyboardState {
    pub fn new() -> Self {
        KeyboardState::default()
    }

    /// キー押下を受理または間引く
    ///
    /// 別のキーが保留中なら、それを `flushed` として先に吐き出す。
    pub fn key_down(&mut self, code: u32, numpad: bool, now_ms: u64) -> KeyDownResult {
        let flushed = self.pending.take();

        if let Some(&last) = self.last_down_ms.get(&code) {
            if now_ms.saturating_sub(last) < KEY_REPEAT_MIN_INTERVAL_MS {
                return KeyDownResult {
                    suppressed: true,
                    flushed,
                };
            }
        }
        self.last_down_ms.insert(code, now_ms);
        self.pending = Some(PendingKey { code, numpad });
        KeyDownResult {
            suppressed: false,
            flushed,
        }
    }

    /// 文字イベントで保留中の押下を完成させる
    pub fn key_char(&mut self, ch: u16) -> Option<(PendingKey, u16)> {
        self.pending.take().map(|key| {
            self.last_char.insert(key.code, ch);
            (key, ch)
        })
    }

    /// 保留中の押下を文字なしで吐き出す（tick から呼ぶ）
    pub fn flush(&mut self) -> Option<PendingKey> {
        self.pending.take()
    }

    /// キー解放。保留中の押下があれば先に吐き出す必要があるので返す。
    /// 2 つ目の戻り値は押下時に確定した文字（文字イベントなしなら 0）。
    pub fn key_up(&mut self, code: u32) -> (Option<PendingKey>, u16) {
        self.last_down_ms.remove(&code);
        let ch = self.last_char.remove(&code).unwrap_or(0);
        (self.pending.take(), ch)
    }
}
