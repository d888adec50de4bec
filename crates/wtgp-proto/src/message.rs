//! メッセージのエンコード / デコード

use alloc::string::String;
use alloc::vec::Vec;

use wtgp_bytes::ByteStream;
use wtgp_display::{Point, Rect};

use crate::error::ProtoError;
use crate::{client_tag, server_tag, MAX_COMPOUND_DEPTH};

/// サーバーから受信するメッセージ
///
/// 未知のタグは `Unknown` として保持する（フレーム全体を読み捨てて
/// 接続は継続する）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// ウィンドウの生成または位置・寸法・layer の更新
    UpdateWindow {
        id: i32,
        layer: i32,
        bounds: Rect,
        fill: u32,
    },
    /// ウィンドウの削除
    RemoveWindow { id: i32 },
    /// ウィンドウローカル矩形へのセル内容の書き込み
    SetContents {
        id: i32,
        bounds: Rect,
        values: Vec<u32>,
    },
    /// ウィンドウ内の矩形内容の移動（スクロールの実体）
    MoveContents {
        id: i32,
        source: Rect,
        dest: Point,
        fill: u32,
    },
    /// ページ側で永続化すべき cookie
    SetCookie { key: String, value: String },
    /// 理由テキスト付きの接続終了
    Close { reason: String },
    /// 暗号化モードの切り替え要求
    ToggleCrypto,
    /// サブメッセージの一括適用（1 回の再描画にまとめる）
    Compound { children: Vec<ServerMessage> },
    /// 生存確認。ペイロードをそのまま pong で返す。
    Ping { payload: Vec<u8> },
    /// 別ホスト/ポートへの再接続指示
    Reconnect { host: String, port: u16 },
    /// サーバーからのスクリプト実行要求（受理するが実行しない）
    Evaluate { source: String },
    /// 未知のタグ
    Unknown { tag: u8 },
}

impl ServerMessage {
    /// 1 フレーム分の平文ペイロードをデコードする
    pub fn decode(bytes: &mut ByteStream) -> Result<Self, ProtoError> {
        Self::decode_at_depth(bytes, 0)
    }

    fn decode_at_depth(bytes: &mut ByteStream, depth: u32) -> Result<Self, ProtoError> {
        if depth > MAX_COMPOUND_DEPTH {
            return Err(ProtoError::NestingTooDeep);
        }
        let tag = bytes.read_u8()?;
        match tag {
            server_tag::UPDATE_WINDOW => Ok(ServerMessage::UpdateWindow {
                id: bytes.read_i32()?,
                layer: bytes.read_i32()?,
                bounds: read_rect(bytes)?,
                fill: bytes.read_u32()?,
            }),

            server_tag::REMOVE_WINDOW => Ok(ServerMessage::RemoveWindow {
                id: bytes.read_i32()?,
            }),

            server_tag::SET_CONTENTS => {
                let id = bytes.read_i32()?;
                let bounds = read_rect(bytes)?;
                let count = if bounds.is_empty() {
                    0
                } else {
                    (bounds.width as usize) * (bounds.height as usize)
                };
                // 先に残量を検査してから確保する（長さ偽装への耐性）
                if bytes.bytes_available() < count * 4 {
                    return Err(ProtoError::TruncatedMessage);
                }
                let mut values = Vec::with_capacity(count);
                for _ in 0..count {
                    values.push(bytes.read_u32()?);
                }
                Ok(ServerMessage::SetContents { id, bounds, values })
            }

            server_tag::MOVE_CONTENTS => Ok(ServerMessage::MoveContents {
                id: bytes.read_i32()?,
                source: read_rect(bytes)?,
                dest: Point::new(
                    i32::from(bytes.read_i16()?),
                    i32::from(bytes.read_i16()?),
                ),
                fill: bytes.read_u32()?,
            }),

            server_tag::SET_COOKIE => {
                let key = bytes.read_utf()?;
                let len = bytes.bytes_available();
                let value = bytes.read_utf_bytes(len)?;
                Ok(ServerMessage::SetCookie { key, value })
            }

            server_tag::CLOSE => {
                let len = bytes.bytes_available();
                Ok(ServerMessage::Close {
                    reason: bytes.read_utf_bytes(len)?,
                })
            }

            server_tag::TOGGLE_CRYPTO => Ok(ServerMessage::ToggleCrypto),

            server_tag::COMPOUND => {
                let mut children = Vec::new();
                while bytes.bytes_available() > 0 {
                    let len = bytes.read_u16()? as usize;
                    let mut sub = ByteStream::from_bytes(bytes.read_slice(len)?);
                    children.push(Self::decode_at_depth(&mut sub, depth + 1)?);
                }
                Ok(ServerMessage::Compound { children })
            }

            server_tag::PING => Ok(ServerMessage::Ping {
                payload: bytes.read_remaining().to_vec(),
            }),

            server_tag::RECONNECT => {
                // 末尾 2 バイトがポート、それより前がホスト名
                let available = bytes.bytes_available();
                if available < 2 {
                    return Err(ProtoError::TruncatedMessage);
                }
                let host = bytes.read_utf_bytes(available - 2)?;
                let port = bytes.read_u16()?;
                Ok(ServerMessage::Reconnect { host, port })
            }

            server_tag::EVALUATE => {
                let len = bytes.bytes_available();
                Ok(ServerMessage::Evaluate {
                    source: bytes.read_utf_bytes(len)?,
                })
            }

            tag => Ok(ServerMessage::Unknown { tag }),
        }
    }

    /// このメッセージの適用が画面内容を変え得るか
    pub fn modifies_display(&self) -> bool {
        match self {
            ServerMessage::UpdateWindow { .. }
            | ServerMessage::RemoveWindow { .. }
            | ServerMessage::SetContents { .. }
            | ServerMessage::MoveContents { .. } => true,
            ServerMessage::Compound { children } => {
                children.iter().any(ServerMessage::modifies_display)
            }
            _ => false,
        }
    }
}

/// クライアントから送信するメッセージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    MousePressed { x: i16, y: i16 },
    MouseReleased { x: i16, y: i16 },
    /// キー押下。code は機種非依存のキーコード、ch は文字（なければ 0）。
    KeyPressed { code: u32, ch: u16, numpad: bool },
    KeyReleased { code: u32, ch: u16, numpad: bool },
    /// ページが閉じられようとしている
    WindowClosed,
    /// toggle-crypto への応答
    CryptoToggled,
    /// ping への応答（ペイロードをそのまま返す）
    Pong { payload: Vec<u8> },
}

impl ClientMessage {
    /// 1 フレーム分の平文ペイロードにエンコードする
    pub fn encode(&self) -> Vec<u8> {
        let mut out = ByteStream::new();
        match self {
            ClientMessage::MousePressed { x, y } => {
                out.write_u8(client_tag::MOUSE_PRESSED);
                out.write_i16(*x);
                out.write_i16(*y);
            }
            ClientMessage::MouseReleased { x, y } => {
                out.write_u8(client_tag::MOUSE_RELEASED);
                out.write_i16(*x);
                out.write_i16(*y);
            }
            ClientMessage::KeyPressed { code, ch, numpad } => {
                out.write_u8(if *numpad {
                    client_tag::KEY_PRESSED_NUMPAD
                } else {
                    client_tag::KEY_PRESSED
                });
                out.write_u32(*code);
                out.write_u16(*ch);
            }
            ClientMessage::KeyReleased { code, ch, numpad } => {
                out.write_u8(if *numpad {
                    client_tag::KEY_RELEASED_NUMPAD
                } else {
                    client_tag::KEY_RELEASED
                });
                out.write_u32(*code);
                out.write_u16(*ch);
            }
            ClientMessage::WindowClosed => {
                out.write_u8(client_tag::WINDOW_CLOSED);
            }
            ClientMessage::CryptoToggled => {
                out.write_u8(client_tag::CRYPTO_TOGGLED);
            }
            ClientMessage::Pong { payload } => {
                out.write_u8(client_tag::PONG);
                out.write_bytes(payload);
            }
        }
        out.compact()
    }
}

/// 4 つの i16（x, y, width, height）から成る矩形を読む
fn read_rect(bytes: &mut ByteStream) -> Result<Rect, ProtoError> {
    Ok(Rect::new(
        i32::from(bytes.read_i16()?),
        i32::from(bytes.read_i16()?),
        i32::from(bytes.read_i16()?),
        i32::from(bytes.read_i16()?),
    ))
}
