use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

use server::game_server::start_test_server;

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn connect(addr: &str) -> WsClient {
    let (ws, _) = connect_async(format!("ws://{addr}/ws"))
        .await
        .expect("client should connect");
    ws
}

/// Read frames until one with the wanted `type` discriminator arrives.
async fn recv_type(ws: &mut WsClient, wanted: &str) -> Value {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let frame = ws
                .next()
                .await
                .expect("stream should stay open")
                .expect("frame should be readable");
            if let Message::Text(text) = frame {
                let value: Value = serde_json::from_str(&text).expect("frames are JSON");
                if value["type"] == wanted {
                    return value;
                }
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for a {wanted} message"))
}

#[tokio::test]
async fn two_clients_handshake_and_start_a_round() {
    let server = start_test_server().await.expect("server should start");
    let addr = server.ws_addr().to_string();

    let mut a = connect(&addr).await;
    let connected = recv_type(&mut a, "connected").await;
    assert_eq!(connected["roundNumber"], 1);
    assert_eq!(connected["waitingForPlayers"], true);
    assert_eq!(connected["playersNeeded"], 1);
    assert!(connected["id"].is_string());

    // The ack is built before the player-count check runs, so the second
    // client still sees the tail end of the waiting state.
    let mut b = connect(&addr).await;
    let connected_b = recv_type(&mut b, "connected").await;
    assert_eq!(connected_b["playersNeeded"], 0);

    // Both observers see the same round begin.
    let round_a = recv_type(&mut a, "newRound").await;
    let round_b = recv_type(&mut b, "newRound").await;
    assert_eq!(round_a["roundNumber"], round_b["roundNumber"]);
    assert_eq!(round_a["isActive"], true);

    // A processed movement fans a state snapshot out to everyone.
    b.send(Message::Text(
        json!({"type": "movement", "position": {"x": 1600.0, "y": 1600.0}}).to_string(),
    ))
    .await
    .expect("movement should send");

    let states = recv_type(&mut a, "playerStates").await;
    assert_eq!(states["players"].as_array().expect("players array").len(), 2);
    assert_eq!(states["roundInfo"]["isActive"], true);
    assert!(states["food"].as_array().expect("food array").len() > 0);

    server.shutdown().await.expect("clean shutdown");
}

#[tokio::test]
async fn malformed_payload_is_reported_without_dropping_the_connection() {
    let server = start_test_server().await.expect("server should start");
    let addr = server.ws_addr().to_string();

    let mut a = connect(&addr).await;
    recv_type(&mut a, "connected").await;

    a.send(Message::Text("not json at all".to_string()))
        .await
        .expect("frame should send");
    let error = recv_type(&mut a, "error").await;
    assert!(
        error["message"]
            .as_str()
            .expect("error message")
            .contains("Malformed")
    );

    // The connection survived: a valid message still works.
    a.send(Message::Text(json!({"type": "forceStart"}).to_string()))
        .await
        .expect("frame should send");
    let round = recv_type(&mut a, "newRound").await;
    assert_eq!(round["isActive"], true);

    server.shutdown().await.expect("clean shutdown");
}

#[tokio::test]
async fn plain_http_request_to_the_ws_path_gets_a_500() {
    let server = start_test_server().await.expect("server should start");
    let addr = server.ws_addr().to_string();

    let mut stream = TcpStream::connect(&addr).await.expect("tcp connect");
    stream
        .write_all(b"GET /ws HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .expect("request should send");

    let mut response = Vec::new();
    stream
        .read_to_end(&mut response)
        .await
        .expect("response should arrive");
    let response = String::from_utf8_lossy(&response);
    assert!(
        response.starts_with("HTTP/1.1 500"),
        "unexpected response: {response}"
    );

    server.shutdown().await.expect("clean shutdown");
}
