//! wtgp-wasm 統合テスト
//!
//! bytes + crypto + proto + display + session の完全なパイプラインをテストする。
//! 検査用サーバーを相手に、プリアンブル → 暗号化切り替え → ウィンドウ操作 →
//! 入力 → 切断までの実際のフレーム交換をシミュレートする。

use wtgp_bytes::ByteStream;
use wtgp_crypto::{CbcContext, SessionSecret, RsaPublicKey};
use wtgp_proto::{client_tag, server_tag, DecodedPreamble};
use wtgp_session::{Session, SessionAction};

/// RSA ブロブの長さ（検査用鍵の modulus 長）
const BLOB_LEN: usize = 128;

/// 指数 1 の検査用公開鍵。暗号化が恒等写像になるので、サーバー側は
/// パディングを剥がすだけでセッション秘密を取り出せる。
fn test_key() -> RsaPublicKey {
    RsaPublicKey::from_hex(&"ff".repeat(BLOB_LEN), "01").unwrap()
}

// ==============================================================
// ヘルパー: クライアントと同じワイヤ規約で喋る検査用サーバー
// ==============================================================

struct TestServer {
    /// サーバー → クライアント方向の CBC
    enc: CbcContext,
    /// クライアント → サーバー方向の CBC
    dec: CbcContext,
    crypto: bool,
    query: String,
    cookie: String,
}

impl TestServer {
    /// プリアンブルを受理し、セッション秘密と認証セクションを取り出す
    fn accept(preamble: &[u8]) -> Self {
        let decoded = DecodedPreamble::decode(preamble).unwrap();
        assert_eq!(decoded.width, 80);
        assert_eq!(decoded.height, 24);

        // PKCS#1 v1.5: [0x00][0x02][非ゼロ乱数][0x00][秘密 32 バイト]
        let blob = &decoded.rest[..BLOB_LEN];
        assert_eq!(&blob[0..2], &[0x00, 0x02]);
        let sep = 2 + blob[2..].iter().position(|&b| b == 0).unwrap();
        let secret_bytes: [u8; 32] = blob[sep + 1..].try_into().unwrap();
        let secret = SessionSecret::from_bytes(&secret_bytes);

        // 認証セクションはクライアントの送信方向 CBC で包まれている
        let mut dec = secret.decrypt_context();
        let auth = dec.decrypt_frame(&decoded.rest[BLOB_LEN..]).unwrap();
        let mut bytes = ByteStream::from_bytes(&auth);
        let query = bytes.read_utf().unwrap();
        let cookie = bytes.read_utf().unwrap();

        TestServer {
            enc: secret.encrypt_context(),
            dec,
            crypto: false,
            query,
            cookie,
        }
    }

    /// クライアントへのフレームを（必要なら暗号化して）作る
    fn send(&mut self, plain: &[u8]) -> Vec<u8> {
        if self.crypto {
            self.enc.encrypt_frame(plain)
        } else {
            plain.to_vec()
        }
    }

    /// クライアントから受けたフレームを平文に戻す
    fn recv(&mut self, frame: &[u8]) -> Vec<u8> {
        if self.crypto {
            self.dec.decrypt_frame(frame).unwrap()
        } else {
            frame.to_vec()
        }
    }
}

fn update_window_frame(id: i32, layer: i32, rect: [i16; 4], fill: u32) -> Vec<u8> {
    let mut s = ByteStream::new();
    s.write_u8(server_tag::UPDATE_WINDOW);
    s.write_i32(id);
    s.write_i32(layer);
    for v in rect {
        s.write_i16(v);
    }
    s.write_u32(fill);
    s.compact()
}

fn set_contents_frame(id: i32, rect: [i16; 4], text: &str) -> Vec<u8> {
    let mut s = ByteStream::new();
    s.write_u8(server_tag::SET_CONTENTS);
    s.write_i32(id);
    for v in rect {
        s.write_i16(v);
    }
    for unit in text.encode_utf16() {
        s.write_u32(u32::from(unit));
    }
    s.compact()
}

fn compound_frame(children: &[Vec<u8>]) -> Vec<u8> {
    let mut s = ByteStream::new();
    s.write_u8(server_tag::COMPOUND);
    for child in children {
        s.write_u16(child.len() as u16);
        s.write_bytes(child);
    }
    s.compact()
}

// ==============================================================
// テスト本体
// ==============================================================

#[test]
fn test_full_encrypted_session() {
    let mut client = Session::new(80, 24, Some(test_key())).unwrap();
    let preamble = client.start("?seat=3", "token=xyz").unwrap();

    let mut server = TestServer::accept(&preamble);
    assert_eq!(server.query, "?seat=3");
    assert_eq!(server.cookie, "token=xyz");

    // --- 暗号化の切り替え ---
    let frame = server.send(&[server_tag::TOGGLE_CRYPTO]);
    let outcome = client.handle_frame(&frame, 100).unwrap();
    // 応答は切り替え前（平文）のモードで届く
    assert_eq!(outcome.replies, vec![vec![client_tag::CRYPTO_TOGGLED]]);
    server.crypto = true;
    assert!(client.crypto_enabled());

    // --- 暗号化されたウィンドウ操作（compound で 1 回の再描画に） ---
    let compound = compound_frame(&[
        update_window_frame(1, 0, [10, 5, 20, 3], 0x20),
        set_contents_frame(1, [0, 0, 5, 1], "Hello"),
    ]);
    let frame = server.send(&compound);
    let outcome = client.handle_frame(&frame, 200).unwrap();
    assert!(outcome.display_changed);

    let updates = client.flush_display();
    // fill 0x20 は初期画面と同じなので、差分は "Hello" の 5 セルだけ
    assert_eq!(updates.len(), 5);
    for (i, expected) in "Hello".chars().enumerate() {
        let update = updates
            .iter()
            .find(|u| u.x == 10 + i as i32 && u.y == 5)
            .unwrap();
        assert_eq!(update.value, expected as u32);
    }

    // --- 入力はサーバー側で復号できる ---
    assert!(client.key_down(65, false, 300).is_empty());
    let frame = client.key_char(u16::from(b'a')).unwrap();
    let plain = server.recv(&frame);
    assert_eq!(plain[0], client_tag::KEY_PRESSED);
    assert_eq!(&plain[1..5], &65u32.to_be_bytes());
    assert_eq!(&plain[5..7], &u16::from(b'a').to_be_bytes());

    let frames = client.key_up(65, false);
    let released = server.recv(&frames[0]);
    assert_eq!(released[0], client_tag::KEY_RELEASED);
    // 解放メッセージにも押下時の文字が載る
    assert_eq!(&released[5..7], &u16::from(b'a').to_be_bytes());

    // --- ping / pong（フレームをまたぐ CBC フィードバックの継続を兼ねる） ---
    for seq in 0u8..5 {
        let mut ping = vec![server_tag::PING];
        ping.extend_from_slice(&[seq, 0xAA]);
        let frame = server.send(&ping);
        let outcome = client.handle_frame(&frame, 400 + u64::from(seq)).unwrap();
        let pong = server.recv(&outcome.replies[0]);
        assert_eq!(pong, vec![client_tag::PONG, seq, 0xAA]);
    }

    // --- 切断 ---
    let mut close = vec![server_tag::CLOSE];
    close.extend_from_slice("Session terminated".as_bytes());
    let frame = server.send(&close);
    let outcome = client.handle_frame(&frame, 500).unwrap();
    assert_eq!(
        outcome.actions,
        vec![SessionAction::Closed {
            reason: String::from("Session terminated"),
        }]
    );
    assert!(client.is_closed());

    // バナーが差分として現れる
    let updates = client.flush_display();
    assert!(!updates.is_empty());
    assert!(updates.iter().any(|u| u.value == u32::from(b'#')));

    // 終了後の入力は出ない
    assert_eq!(client.mouse_pressed(0, 0), None);
}

#[test]
fn test_plaintext_session_without_key() {
    let mut client = Session::new(80, 24, None).unwrap();
    let preamble = client.start("", "").unwrap();

    // 鍵なしのプリアンブルは RSA ブロブを持たず、認証セクションは平文
    let decoded = DecodedPreamble::decode(&preamble).unwrap();
    let mut bytes = ByteStream::from_bytes(&decoded.rest);
    assert_eq!(bytes.read_utf().unwrap(), "");
    assert_eq!(bytes.read_utf().unwrap(), "");

    // フレームは平文のまま交換される
    let outcome = client
        .handle_frame(&update_window_frame(1, 0, [0, 0, 4, 1], u32::from(b'*')), 0)
        .unwrap();
    assert!(outcome.display_changed);
    assert_eq!(client.flush_display().len(), 4);

    let frame = client.mouse_pressed(2, 0).unwrap();
    assert_eq!(frame, vec![client_tag::MOUSE_PRESSED, 0, 2, 0, 0]);
}

#[test]
fn test_reconnect_handoff() {
    let mut client = Session::new(80, 24, Some(test_key())).unwrap();
    let preamble = client.start("", "").unwrap();
    let mut server = TestServer::accept(&preamble);

    let mut reconnect = vec![server_tag::RECONNECT];
    reconnect.extend_from_slice(b"standby.example");
    reconnect.extend_from_slice(&9000u16.to_be_bytes());
    let frame = server.send(&reconnect);
    let outcome = client.handle_frame(&frame, 0).unwrap();
    assert_eq!(
        outcome.actions,
        vec![SessionAction::Reconnect {
            host: String::from("standby.example"),
            port: 9000,
        }]
    );
    assert!(client.is_closed());

    // 新しいセッションは新しい秘密でプリアンブルを作り直す
    let mut next = Session::new(80, 24, Some(test_key())).unwrap();
    let preamble2 = next.start("", "").unwrap();
    assert_ne!(preamble, preamble2);
    TestServer::accept(&preamble2);
}

#[test]
fn test_tampered_frame_fails_closed() {
    let mut client = Session::new(80, 24, Some(test_key())).unwrap();
    let preamble = client.start("", "").unwrap();
    let mut server = TestServer::accept(&preamble);

    let frame = server.send(&[server_tag::TOGGLE_CRYPTO]);
    client.handle_frame(&frame, 0).unwrap();
    server.crypto = true;

    // 暗号化フレームの改竄はパディング検査か長さ検査で弾かれる
    let mut frame = server.send(&[server_tag::PING, 1]);
    frame.truncate(frame.len() - 1);
    assert!(client.handle_frame(&frame, 1).is_err());
    assert!(client.is_closed());
}
