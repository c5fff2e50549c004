// WebSocket behavior over a real connection to a served router

mod common;

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use common::*;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const STREAM_RATE: u32 = 44100;

async fn spawn_server() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = app_with(SoftmaxHead, None);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}

async fn connect(addr: SocketAddr) -> Client {
    let (client, _) = connect_async(format!("ws://{}/socket", addr)).await.unwrap();
    client
}

/// Next reply, which must be a JSON text frame
async fn next_event(client: &mut Client) -> Value {
    let msg = tokio::time::timeout(Duration::from_secs(10), client.next())
        .await
        .expect("no reply in time")
        .expect("connection closed")
        .unwrap();

    match msg {
        Message::Text(text) => serde_json::from_str(&text).unwrap(),
        other => panic!("expected a text frame, got {:?}", other),
    }
}

#[tokio::test]
async fn test_error_then_result_on_same_connection() {
    let addr = spawn_server().await;
    let mut client = connect(addr).await;

    let mut misaligned = f32le_bytes(&sine(220.0, STREAM_RATE, 0.1));
    misaligned.push(0);
    client.send(Message::Binary(misaligned)).await.unwrap();

    let valid = f32le_bytes(&sine(220.0, STREAM_RATE, 0.5));
    client.send(Message::Binary(valid)).await.unwrap();

    let first = next_event(&mut client).await;
    assert_eq!(first["event"], "error");
    assert!(first["data"]["message"]
        .as_str()
        .unwrap()
        .contains("multiple of 4"));

    let second = next_event(&mut client).await;
    assert_eq!(second["event"], "emotion_result");
    assert_eq!(second["data"]["probabilities"].as_object().unwrap().len(), 4);
}

#[tokio::test]
async fn test_replies_follow_message_order() {
    let addr = spawn_server().await;
    let mut client = connect(addr).await;

    let samples = sine(330.0, STREAM_RATE, 0.25);
    let envelope = serde_json::json!({ "event": "audio_data", "data": samples }).to_string();

    client.send(Message::Text(envelope)).await.unwrap();
    client
        .send(Message::Text(r#"{"event": "subscribe", "data": 1}"#.to_string()))
        .await
        .unwrap();
    client
        .send(Message::Binary(f32le_bytes(&samples)))
        .await
        .unwrap();

    let first = next_event(&mut client).await;
    let second = next_event(&mut client).await;
    let third = next_event(&mut client).await;

    assert_eq!(first["event"], "emotion_result");
    assert_eq!(second["event"], "error");
    assert_eq!(third["event"], "emotion_result");
    assert_eq!(first, third);
}

#[tokio::test]
async fn test_close_ends_connection() {
    let addr = spawn_server().await;
    let mut client = connect(addr).await;

    client.send(Message::Close(None)).await.unwrap();

    // The server stops reading; the stream ends with a close frame, EOF, or a reset
    let drained = tokio::time::timeout(Duration::from_secs(10), async {
        while let Some(msg) = client.next().await {
            match msg {
                Ok(Message::Close(_)) | Err(_) => break,
                Ok(_) => continue,
            }
        }
    })
    .await;

    assert!(drained.is_ok(), "connection stayed open after close");
}
