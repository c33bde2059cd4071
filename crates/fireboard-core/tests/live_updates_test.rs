#![allow(clippy::unwrap_used)]
// Live-update stream against a local WebSocket server and a mocked node.

use std::time::Duration;

use futures_util::SinkExt;
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{Message as WsMessage, Utf8Bytes};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fireboard_core::{BoardConfig, FeedController};

const MESSAGES: &str = "/api/v1/namespaces/default/messages";
const SUBSCRIPTION: &str = "/ws?namespace=default&ephemeral&autoack";

// ── Helpers ─────────────────────────────────────────────────────────

async fn mock_node() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(MESSAGES))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "header": { "id": "m1", "author": "org1" }, "data": [{ "id": "d1" }] }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/namespaces/default/data/d1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "d1", "value": "hello" })))
        .mount(&server)
        .await;
    server
}

async fn message_requests(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == MESSAGES)
        .count()
}

async fn wait_for_requests(server: &MockServer, expected: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while message_requests(server).await < expected {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("expected {expected} message requests"));
}

/// Event-stream stand-in. Reports each handshake URI and writes the frames
/// it is handed to the current connection; a close frame ends that
/// connection and the server waits for the next one.
async fn spawn_event_server() -> (Url, mpsc::UnboundedReceiver<String>, mpsc::UnboundedSender<WsMessage>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = Url::parse(&format!("ws://{}/ws", listener.local_addr().unwrap())).unwrap();
    let (uri_tx, uri_rx) = mpsc::unbounded_channel();
    let (frame_tx, mut frame_rx) = mpsc::unbounded_channel::<WsMessage>();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let uri_tx = uri_tx.clone();
            let callback = move |req: &Request, resp: Response| {
                let _ = uri_tx.send(req.uri().to_string());
                Ok::<Response, ErrorResponse>(resp)
            };
            let Ok(mut ws) = tokio_tungstenite::accept_hdr_async(stream, callback).await else {
                continue;
            };
            while let Some(frame) = frame_rx.recv().await {
                let closing = matches!(frame, WsMessage::Close(_));
                if ws.send(frame).await.is_err() || closing {
                    break;
                }
            }
        }
    });

    (url, uri_rx, frame_tx)
}

async fn next_uri(uris: &mut mpsc::UnboundedReceiver<String>) -> String {
    tokio::time::timeout(Duration::from_secs(5), uris.recv())
        .await
        .unwrap()
        .unwrap()
}

// ── Live updates ────────────────────────────────────────────────────

#[tokio::test]
async fn test_frames_trigger_one_refresh_each_and_close_reconnects() {
    let node = mock_node().await;
    let (events_url, mut uris, frames) = spawn_event_server().await;
    let config = BoardConfig {
        events_url: Some(events_url),
        reconnect_initial_delay: Duration::from_millis(10),
        reconnect_max_delay: Duration::from_millis(50),
        ..BoardConfig::for_node(Url::parse(&node.uri()).unwrap())
    };
    let ctrl = FeedController::new(config).unwrap();

    ctrl.start().await.unwrap();
    assert_eq!(message_requests(&node).await, 1);

    // Subscription is namespaced and ephemeral with auto-ack.
    assert_eq!(next_uri(&mut uris).await, SUBSCRIPTION);

    // One text frame, one refresh.
    frames.send(WsMessage::Text(Utf8Bytes::from_static("{\"type\":\"message_confirmed\"}"))).unwrap();
    wait_for_requests(&node, 2).await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(message_requests(&node).await, 2);

    // Binary payloads are ticks too.
    frames.send(WsMessage::Binary(vec![1, 2, 3].into())).unwrap();
    wait_for_requests(&node, 3).await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(message_requests(&node).await, 3);

    // A clean close is followed by a fresh subscription.
    frames
        .send(WsMessage::Close(Some(CloseFrame {
            code: CloseCode::Normal,
            reason: Utf8Bytes::from_static("bye"),
        })))
        .unwrap();
    assert_eq!(next_uri(&mut uris).await, SUBSCRIPTION);

    assert_eq!(ctrl.snapshot().len(), 1);
    ctrl.shutdown().await;
}
