//! Integration tests driving an in-process server over real TCP sockets.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::io::AsyncWriteExt;
use tokio::net::{
    TcpStream,
    tcp::{OwnedReadHalf, OwnedWriteHalf},
};
use tokio_util::codec::{FramedRead, FramedWrite};

use tsudoi_server::domain::SERVER_SENDER;
use tsudoi_server::protocol::{Frame, FrameCodec, HistoryEntry};
use tsudoi_server::runner::{ChatServer, ServerConfig};

const RECV_TIMEOUT: Duration = Duration::from_secs(2);
/// Window in which we assert that a frame does NOT arrive
const QUIET_WINDOW: Duration = Duration::from_millis(200);

/// Start a server on an ephemeral port and leave it running in the background
async fn start_server() -> SocketAddr {
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        history_capacity: 100,
    };
    let server = ChatServer::bind(&config).await.expect("failed to bind server");
    let addr = server.local_addr().expect("failed to get local addr");
    tokio::spawn(server.run(std::future::pending()));
    addr
}

/// Raw framed TCP peer used to talk to the server under test
struct TestClient {
    read: FramedRead<OwnedReadHalf, FrameCodec>,
    write: FramedWrite<OwnedWriteHalf, FrameCodec>,
}

impl TestClient {
    /// Connect and send the handshake, without consuming any reply
    async fn handshake(addr: SocketAddr, username: &str) -> Self {
        let stream = TcpStream::connect(addr).await.expect("failed to connect");
        let (read_half, write_half) = stream.into_split();
        let mut client = TestClient {
            read: FramedRead::new(read_half, FrameCodec::new()),
            write: FramedWrite::new(write_half, FrameCodec::new()),
        };
        client
            .write
            .send(&Frame::Handshake {
                username: username.to_string(),
            })
            .await
            .expect("failed to send handshake");
        client
    }

    /// Connect, handshake, and consume the expected history frame
    async fn join(addr: SocketAddr, username: &str) -> Self {
        let mut client = Self::handshake(addr, username).await;
        let first = client.recv().await;
        assert!(
            matches!(first, Frame::History { .. }),
            "expected history as the first frame, got {:?}",
            first
        );
        client
    }

    async fn recv(&mut self) -> Frame {
        tokio::time::timeout(RECV_TIMEOUT, self.read.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("connection closed while waiting for a frame")
            .expect("failed to decode frame")
    }

    /// Assert that nothing arrives within the quiet window
    async fn expect_silence(&mut self) {
        let result = tokio::time::timeout(QUIET_WINDOW, self.read.next()).await;
        assert!(result.is_err(), "unexpected frame: {:?}", result);
    }

    /// Assert the connection is closed by the server (EOF)
    async fn expect_closed(&mut self) {
        let result = tokio::time::timeout(RECV_TIMEOUT, self.read.next())
            .await
            .expect("timed out waiting for the server to close the connection");
        assert!(result.is_none(), "expected EOF, got {:?}", result);
    }

    async fn send_chat(&mut self, sender: &str, message: &str) {
        self.write
            .send(&Frame::Chat {
                sender: sender.to_string(),
                message: message.to_string(),
                time: String::new(),
            })
            .await
            .expect("failed to send chat frame");
    }
}

fn expect_chat(frame: Frame) -> (String, String, String) {
    match frame {
        Frame::Chat {
            sender,
            message,
            time,
        } => (sender, message, time),
        other => panic!("expected a chat frame, got {:?}", other),
    }
}

fn expect_history(frame: Frame) -> Vec<HistoryEntry> {
    match frame {
        Frame::History { messages } => messages,
        other => panic!("expected a history frame, got {:?}", other),
    }
}

#[tokio::test]
async fn test_new_client_receives_empty_history() {
    // テスト項目: 最初の参加者には空の履歴スナップショットが届く
    // given (前提条件):
    let addr = start_server().await;

    // when (操作):
    let mut alice = TestClient::handshake(addr, "alice").await;
    let first = alice.recv().await;

    // then (期待する結果):
    let entries = expect_history(first);
    assert!(entries.is_empty());
}

#[tokio::test]
async fn test_history_replays_prior_chat_messages_in_order() {
    // テスト項目: 後から参加したクライアントに過去のチャットが追記順で再生され、
    //             参加・退出通知は履歴に含まれない
    // given (前提条件):
    let addr = start_server().await;
    let mut alice = TestClient::join(addr, "alice").await;
    alice.send_chat("alice", "first").await;
    alice.send_chat("alice", "second").await;
    // 配信と履歴追記が終わるのを待つ
    tokio::time::sleep(Duration::from_millis(200)).await;

    // when (操作):
    let mut bob = TestClient::handshake(addr, "bob").await;
    let first = bob.recv().await;

    // then (期待する結果):
    let entries = expect_history(first);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].sender, "alice");
    assert_eq!(entries[0].message, "first");
    assert_eq!(entries[1].sender, "alice");
    assert_eq!(entries[1].message, "second");
    assert!(entries.iter().all(|e| e.sender != SERVER_SENDER));
}

#[tokio::test]
async fn test_chat_is_broadcast_to_everyone_except_the_sender() {
    // テスト項目: チャットが送信者以外の全クライアントに届き、送信者にエコーされない
    // given (前提条件):
    let addr = start_server().await;
    let mut alice = TestClient::join(addr, "alice").await;
    let mut bob = TestClient::join(addr, "bob").await;
    let mut carol = TestClient::join(addr, "carol").await;
    // 参加通知を読み捨てる
    let _ = alice.recv().await; // bob joined
    let _ = alice.recv().await; // carol joined
    let _ = bob.recv().await; // carol joined

    // when (操作):
    alice.send_chat("alice", "hi").await;

    // then (期待する結果):
    let (sender, message, time) = expect_chat(bob.recv().await);
    assert_eq!(sender, "alice");
    assert_eq!(message, "hi");
    assert!(!time.is_empty(), "server should stamp the time");

    let (sender, message, _) = expect_chat(carol.recv().await);
    assert_eq!(sender, "alice");
    assert_eq!(message, "hi");

    alice.expect_silence().await;
}

#[tokio::test]
async fn test_server_uses_registered_name_as_sender() {
    // テスト項目: クライアントが名乗った sender ではなく登録名で配信される
    // given (前提条件):
    let addr = start_server().await;
    let mut alice = TestClient::join(addr, "alice").await;
    let mut bob = TestClient::join(addr, "bob").await;
    let _ = alice.recv().await; // bob joined

    // when (操作): alice が sender を偽って送信
    alice.send_chat("mallory", "hello").await;

    // then (期待する結果):
    let (sender, message, _) = expect_chat(bob.recv().await);
    assert_eq!(sender, "alice");
    assert_eq!(message, "hello");
}

#[tokio::test]
async fn test_join_notice_reaches_existing_clients_only() {
    // テスト項目: 参加通知が既存クライアントにのみ届く
    // given (前提条件):
    let addr = start_server().await;
    let mut alice = TestClient::join(addr, "alice").await;

    // when (操作):
    let mut bob = TestClient::join(addr, "bob").await;

    // then (期待する結果):
    let (sender, message, _) = expect_chat(alice.recv().await);
    assert_eq!(sender, SERVER_SENDER);
    assert_eq!(message, "bob has joined the chat");

    bob.expect_silence().await;
}

#[tokio::test]
async fn test_disconnect_produces_exactly_one_left_notice() {
    // テスト項目: 切断時に退出通知がちょうど 1 回配信され、名前が再利用可能になる
    // given (前提条件):
    let addr = start_server().await;
    let mut alice = TestClient::join(addr, "alice").await;
    let bob = TestClient::join(addr, "bob").await;
    let _ = alice.recv().await; // bob joined

    // when (操作): bob が切断する
    drop(bob);

    // then (期待する結果): alice に退出通知が 1 回だけ届く
    let (sender, message, _) = expect_chat(alice.recv().await);
    assert_eq!(sender, SERVER_SENDER);
    assert_eq!(message, "bob has left the chat");
    alice.expect_silence().await;

    // 退出後は同じ表示名で再参加できる（レジストリから削除済み）
    let mut bob_again = TestClient::join(addr, "bob").await;
    let (_, message, _) = expect_chat(alice.recv().await);
    assert_eq!(message, "bob has joined the chat");
    bob_again.expect_silence().await;
}

#[tokio::test]
async fn test_duplicate_display_name_is_rejected_with_a_notice() {
    // テスト項目: 使用中の表示名での接続は通知付きで拒否され、既存接続に影響しない
    // given (前提条件):
    let addr = start_server().await;
    let mut alice = TestClient::join(addr, "alice").await;

    // when (操作): 同じ名前で 2 本目の接続
    let mut impostor = TestClient::handshake(addr, "alice").await;

    // then (期待する結果): 履歴の前に Server 通知が届き、接続が閉じられる
    let (sender, message, _) = expect_chat(impostor.recv().await);
    assert_eq!(sender, SERVER_SENDER);
    assert!(message.contains("already in use"), "got: {}", message);
    impostor.expect_closed().await;

    // 既存の alice は登録されたまま（参加・退出通知も届かない）
    alice.expect_silence().await;
}

#[tokio::test]
async fn test_empty_username_falls_back_to_generated_name() {
    // テスト項目: 空のユーザー名では User_<port> 形式の名前が割り当てられる
    // given (前提条件):
    let addr = start_server().await;
    let mut alice = TestClient::join(addr, "alice").await;

    // when (操作):
    let mut anon = TestClient::join(addr, "").await;

    // then (期待する結果): 参加通知の名前が生成名になっている
    let (sender, message, _) = expect_chat(alice.recv().await);
    assert_eq!(sender, SERVER_SENDER);
    assert!(
        message.starts_with("User_") && message.ends_with(" has joined the chat"),
        "got: {}",
        message
    );
    anon.expect_silence().await;
}

#[tokio::test]
async fn test_first_frame_other_than_handshake_closes_the_connection() {
    // テスト項目: ハンドシェイク以外の最初のフレームはプロトコル違反として切断される
    // given (前提条件):
    let addr = start_server().await;
    let stream = TcpStream::connect(addr).await.unwrap();
    let (read_half, write_half) = stream.into_split();
    let mut read = FramedRead::new(read_half, FrameCodec::new());
    let mut write = FramedWrite::new(write_half, FrameCodec::new());

    // when (操作):
    write
        .send(&Frame::Chat {
            sender: "alice".to_string(),
            message: "hi".to_string(),
            time: String::new(),
        })
        .await
        .unwrap();

    // then (期待する結果): 登録されずに接続が閉じられる
    let result = tokio::time::timeout(RECV_TIMEOUT, read.next())
        .await
        .expect("timed out waiting for the server to close the connection");
    assert!(result.is_none(), "expected EOF, got {:?}", result);
}

#[tokio::test]
async fn test_malformed_frame_disconnects_only_that_client() {
    // テスト項目: 不正フレームを送ったクライアントだけが切断され、退出通知が流れる
    // given (前提条件):
    let addr = start_server().await;
    let mut alice = TestClient::join(addr, "alice").await;

    let stream = TcpStream::connect(addr).await.unwrap();
    let (read_half, mut write_half) = stream.into_split();
    let mut bob_read = FramedRead::new(read_half, FrameCodec::new());
    {
        let mut framed = FramedWrite::new(&mut write_half, FrameCodec::new());
        framed
            .send(&Frame::Handshake {
                username: "bob".to_string(),
            })
            .await
            .unwrap();
    }
    let first = tokio::time::timeout(RECV_TIMEOUT, bob_read.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert!(matches!(first, Frame::History { .. }));
    let _ = alice.recv().await; // bob joined

    // when (操作): bob が長さプレフィックス付きの壊れた JSON を送る
    let payload = b"{broken";
    let mut raw = (payload.len() as u32).to_be_bytes().to_vec();
    raw.extend_from_slice(payload);
    write_half.write_all(&raw).await.unwrap();

    // then (期待する結果): alice に bob の退出通知が届き、alice は接続されたまま
    let (sender, message, _) = expect_chat(alice.recv().await);
    assert_eq!(sender, SERVER_SENDER);
    assert_eq!(message, "bob has left the chat");
    alice.expect_silence().await;
}

#[tokio::test]
async fn test_history_is_the_first_frame_even_under_broadcast_load() {
    // テスト項目: 他クライアントの送信と同時進行で参加しても、新規参加者の
    //             最初のフレームは必ず履歴スナップショットになる
    // given (前提条件): alice が受信せずに送信し続けている
    let addr = start_server().await;
    let mut alice = TestClient::join(addr, "alice").await;
    let flooder = tokio::spawn(async move {
        loop {
            alice.send_chat("alice", "flood").await;
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    });

    // when (操作) / then (期待する結果): ハンドシェイク直後の最初のフレームが
    // 途中のチャットや参加通知に追い越されない
    for i in 0..50 {
        let name = format!("user{}", i);
        let mut client = TestClient::handshake(addr, &name).await;
        let first = client.recv().await;
        assert!(
            matches!(first, Frame::History { .. }),
            "first frame after handshake was not history: {:?}",
            first
        );
        drop(client);
    }

    flooder.abort();
}

#[tokio::test]
async fn test_messages_are_delivered_in_send_order() {
    // テスト項目: 同一送信者の連続メッセージが送信順で届く（FIFO 保証）
    // given (前提条件):
    let addr = start_server().await;
    let mut alice = TestClient::join(addr, "alice").await;
    let mut bob = TestClient::join(addr, "bob").await;
    let _ = alice.recv().await; // bob joined

    // when (操作):
    for i in 0..5 {
        alice.send_chat("alice", &format!("message-{}", i)).await;
    }

    // then (期待する結果):
    for i in 0..5 {
        let (sender, message, _) = expect_chat(bob.recv().await);
        assert_eq!(sender, "alice");
        assert_eq!(message, format!("message-{}", i));
    }
}
