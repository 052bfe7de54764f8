//! Chat session and JSON-RPC transport against loopback stub servers.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

use roomer_core::protocol::dispatch::{
    DispatchReply, DispatchRequest, RpcRequest, RpcResponse, DISPATCH_METHOD,
};
use roomer_core::protocol::irc::{command, Message};
use roomer_core::{classify, FailureClass, RelayError};
use roomer_relay::chat::{ChatSender, ChatSession, IrcSession};
use roomer_relay::config::ChatSection;
use roomer_relay::dispatch::{DispatchChannel, DispatchClient, DispatchConnector, JsonRpcConnector};

async fn listener() -> (TcpListener, String) {
    let l = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = l.local_addr().unwrap().to_string();
    (l, addr)
}

/// Answers each request line with `reply(id)` until the client hangs up.
async fn serve_rpc(l: TcpListener, reply: impl Fn(u64) -> String + Send + 'static) {
    let (sock, _) = l.accept().await.unwrap();
    let (rd, mut wr) = sock.into_split();
    let mut lines = BufReader::new(rd).lines();
    while let Some(line) = lines.next_line().await.unwrap() {
        let req: RpcRequest<DispatchRequest> = serde_json::from_str(&line).unwrap();
        assert_eq!(req.method, DISPATCH_METHOD);
        let out = reply(req.id);
        wr.write_all(out.as_bytes()).await.unwrap();
        wr.write_all(b"\n").await.unwrap();
    }
}

fn request() -> DispatchRequest {
    DispatchRequest::new("alice", "hello", "chat.example:6667", "#roomtest")
}

#[tokio::test]
async fn jsonrpc_call_round_trip() {
    let (l, addr) = listener().await;
    let server = tokio::spawn(serve_rpc(l, |id| {
        serde_json::to_string(&RpcResponse::success(id, DispatchReply::accepted())).unwrap()
    }));

    let client = DispatchClient::new(Arc::new(JsonRpcConnector::new(addr, 65536)), DISPATCH_METHOD);
    client.connect().await.unwrap();
    assert!(client.call(&request()).await.unwrap().ok);
    // ids keep advancing on the same connection
    assert!(client.call(&request()).await.unwrap().ok);

    drop(client);
    server.await.unwrap();
}

#[tokio::test]
async fn jsonrpc_remote_error_keeps_connection() {
    let (l, addr) = listener().await;
    tokio::spawn(serve_rpc(l, |id| {
        serde_json::to_string(&RpcResponse::<DispatchReply>::failure(id, "no such method"))
            .unwrap()
    }));

    let client = DispatchClient::new(Arc::new(JsonRpcConnector::new(addr, 65536)), DISPATCH_METHOD);
    client.connect().await.unwrap();
    let err = client.call(&request()).await.expect_err("remote error");
    assert_eq!(err, RelayError::Remote("no such method".into()));
    assert_eq!(classify(&err), FailureClass::Other);
    assert!(client.is_connected().await);
}

#[tokio::test]
async fn jsonrpc_hangup_is_network_failure() {
    let (l, addr) = listener().await;
    tokio::spawn(async move {
        let (sock, _) = l.accept().await.unwrap();
        let mut lines = BufReader::new(sock).lines();
        // read the request, then hang up without answering
        let _ = lines.next_line().await.unwrap();
    });

    let client = DispatchClient::new(Arc::new(JsonRpcConnector::new(addr, 65536)), DISPATCH_METHOD);
    client.connect().await.unwrap();
    let err = client.call(&request()).await.expect_err("hangup");
    assert_eq!(classify(&err), FailureClass::Network, "err={err}");
    assert!(!client.is_connected().await);

    // the dead handle fails fast until reconnected
    assert_eq!(client.call(&request()).await, Err(RelayError::Shutdown));
}

#[tokio::test]
async fn jsonrpc_garbage_reply_is_protocol_error() {
    let (l, addr) = listener().await;
    tokio::spawn(serve_rpc(l, |_| "not json".to_string()));

    let connector = JsonRpcConnector::new(addr, 65536);
    let mut channel = connector.connect().await.unwrap();
    let err = channel
        .call(DISPATCH_METHOD, &request())
        .await
        .expect_err("garbage");
    assert_eq!(err.code(), "PROTOCOL");
}

#[tokio::test]
async fn jsonrpc_connect_refused_is_other() {
    let (l, addr) = listener().await;
    drop(l);
    let err = JsonRpcConnector::new(addr, 65536)
        .connect()
        .await
        .err()
        .expect("refused");
    assert_eq!(classify(&err), FailureClass::Other);
}

#[tokio::test]
async fn irc_session_registers_and_exchanges_lines() {
    let (l, addr) = listener().await;
    let server = tokio::spawn(async move {
        let (sock, _) = l.accept().await.unwrap();
        let (rd, mut wr) = sock.into_split();
        let mut lines = BufReader::new(rd).lines();

        let mut registration = Vec::new();
        for _ in 0..3 {
            registration.push(lines.next_line().await.unwrap().unwrap());
        }
        wr.write_all(b"PING :irc.example\r\n\r\n:irc.example 001 relaybot :Welcome\r\n")
            .await
            .unwrap();

        let pong = lines.next_line().await.unwrap().unwrap();
        (registration, pong)
    });

    let cfg = ChatSection {
        nick: "relaybot".into(),
        server: addr,
        password: Some("secret".into()),
        ..ChatSection::default()
    };
    let session = IrcSession::new(&cfg);
    session.connect().await.unwrap();

    let ping = session.next_message().await.unwrap().unwrap();
    assert_eq!(ping.command, command::PING);
    session
        .send(&Message::new(command::PONG, vec![]).with_trailing("irc.example"))
        .await
        .unwrap();

    // blank lines are skipped
    let welcome = session.next_message().await.unwrap().unwrap();
    assert_eq!(welcome.command, command::RPL_WELCOME);
    assert_eq!(welcome.name(), Some("irc.example"));

    let (registration, pong) = server.await.unwrap();
    assert_eq!(
        registration,
        vec!["PASS secret", "NICK relaybot", "USER relaybot 0 * :relaybot"]
    );
    assert_eq!(pong, "PONG :irc.example");

    // server task dropped its socket
    assert!(session.next_message().await.is_none());
    assert!(session.next_message().await.is_none());
}

#[tokio::test]
async fn irc_send_before_connect_fails_fast() {
    let session = IrcSession::new(&ChatSection::default());
    let err = session
        .send(&Message::new(command::NICK, vec!["x".into()]))
        .await
        .expect_err("not connected");
    assert_eq!(err, RelayError::Shutdown);
}
