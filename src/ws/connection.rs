use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};
use url::Url;

use crate::ws::error::RealtimeError;
use crate::ws::stomp::{Command, Frame};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Open the WebSocket and complete the STOMP handshake.
///
/// Returns the two halves of the connection so reading and writing can
/// live in different tasks.
pub async fn connect(
    url: &Url,
    handshake_timeout: Duration,
) -> Result<(StompWriter, StompReader), RealtimeError> {
    tokio::time::timeout(handshake_timeout, handshake(url))
        .await
        .map_err(|_| RealtimeError::Timeout)?
}

async fn handshake(url: &Url) -> Result<(StompWriter, StompReader), RealtimeError> {
    // 1. Open the transport
    let (ws, _response) = connect_async(url.as_str()).await?;
    let (sink, stream) = ws.split();
    let mut writer = StompWriter {
        sink,
        next_subscription: 0,
    };
    let mut reader = StompReader { stream };

    // 2. Say hello, we never send heart-beats so we ask for none
    let host = url.host_str().unwrap_or("localhost");
    let hello = Frame::new(Command::Connect)
        .header("accept-version", "1.2,1.1,1.0")
        .header("host", host)
        .header("heart-beat", "0,0");
    writer.write(&hello).await?;

    // 3. The first frame decides
    match reader.next_frame().await {
        Some(Ok(frame)) if frame.command == Command::Connected => {
            info!(
                "STOMP session established (version {})",
                frame.get("version").unwrap_or("1.0")
            );
            Ok((writer, reader))
        }
        Some(Ok(frame)) if frame.command == Command::Error => {
            let reason = frame.get("message").unwrap_or(frame.body.as_str()).to_string();
            Err(RealtimeError::Rejected(reason))
        }
        Some(Ok(frame)) => Err(RealtimeError::UnexpectedFrame(frame.command.to_string())),
        Some(Err(e)) => Err(e),
        None => Err(RealtimeError::Closed),
    }
}

/// Sending half of a STOMP session
pub struct StompWriter {
    sink: SplitSink<WsStream, Message>,
    next_subscription: u32,
}

impl StompWriter {
    /// Subscribe to a destination, returns the subscription id
    pub async fn subscribe(&mut self, destination: &str) -> Result<String, RealtimeError> {
        let id = format!("sub-{}", self.next_subscription);
        self.next_subscription += 1;
        let frame = Frame::new(Command::Subscribe)
            .header("id", &id)
            .header("destination", destination)
            .header("ack", "auto");
        self.write(&frame).await?;
        debug!("Subscribed to {} as {}", destination, id);
        Ok(id)
    }

    pub async fn send_json(&mut self, destination: &str, body: &str) -> Result<(), RealtimeError> {
        let frame = Frame::new(Command::Send)
            .header("destination", destination)
            .header("content-type", "application/json")
            .header("content-length", &body.len().to_string())
            .body(body);
        self.write(&frame).await
    }

    /// Polite goodbye, failures are only logged
    pub async fn disconnect(mut self) {
        if let Err(e) = self.write(&Frame::new(Command::Disconnect)).await {
            debug!("DISCONNECT not delivered: {}", e);
        }
        if let Err(e) = self.sink.close().await {
            debug!("WebSocket close failed: {}", e);
        }
    }

    async fn write(&mut self, frame: &Frame) -> Result<(), RealtimeError> {
        self.sink.send(Message::Text(frame.encode().into())).await?;
        Ok(())
    }
}

/// Receiving half of a STOMP session
pub struct StompReader {
    stream: SplitStream<WsStream>,
}

impl StompReader {
    /// Next complete frame. `None` once the socket is closed.
    pub async fn next_frame(&mut self) -> Option<Result<Frame, RealtimeError>> {
        while let Some(msg) = self.stream.next().await {
            let decoded = match msg {
                Ok(Message::Text(text)) => Frame::decode(text.as_str()),
                Ok(Message::Binary(bytes)) => match std::str::from_utf8(&bytes) {
                    Ok(text) => Frame::decode(text),
                    Err(_) => {
                        debug!("Skipping non UTF-8 binary message");
                        continue;
                    }
                },
                Ok(Message::Close(_)) => return None,
                Ok(_) => continue,
                Err(e) => return Some(Err(e.into())),
            };
            match decoded {
                Ok(Some(frame)) => return Some(Ok(frame)),
                // heart-beat
                Ok(None) => continue,
                Err(e) => return Some(Err(e.into())),
            }
        }
        None
    }
}
