// Feed transport - the socket seam
//
// A transport dials a URL and hands back a FeedConn: a pair of channels
// fronting a pump task that owns the actual socket. The manager only ever
// talks to the channels, which keeps its select loop cancel-safe and lets
// tests swap in a scripted transport with no network at all.

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async,
    tungstenite::protocol::{frame::coding::CloseCode, frame::CloseFrame, Message},
};

/// Inbound side of a connection, as the manager sees it.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Text(String),
    /// The peer closed the socket; `None` means the transport failed
    /// without a close frame (abnormal closure).
    Closed { code: Option<u16> },
}

/// Outbound side: text frames and the final close.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Text(String),
    /// Send a close frame with this code and shut the pump down.
    Close(u16),
}

/// A live connection: channels fronting the pump task.
///
/// Dropping the handle tears the pump down; sending `Outbound::Close`
/// first makes the teardown carry an explicit close code.
pub struct FeedConn {
    pub tx: mpsc::UnboundedSender<Outbound>,
    pub rx: mpsc::Receiver<Frame>,
}

/// Dials connections. The manager owns one transport for its lifetime.
#[async_trait]
pub trait FeedTransport: Send + 'static {
    async fn dial(&mut self, url: &str) -> Result<FeedConn>;
}

/// Production transport over tokio-tungstenite.
pub struct WsTransport;

#[async_trait]
impl FeedTransport for WsTransport {
    async fn dial(&mut self, url: &str) -> Result<FeedConn> {
        let (ws, _) = connect_async(url)
            .await
            .with_context(|| format!("websocket dial to {url} failed"))?;

        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (in_tx, in_rx) = mpsc::channel(64);
        tokio::spawn(pump(ws, out_rx, in_tx));

        Ok(FeedConn {
            tx: out_tx,
            rx: in_rx,
        })
    }
}

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Own the socket: forward outbound frames, deliver inbound text, and
/// report the close. Ends when either side hangs up.
async fn pump(ws: WsStream, mut out_rx: mpsc::UnboundedReceiver<Outbound>, in_tx: mpsc::Sender<Frame>) {
    let (mut sink, mut stream) = ws.split();

    loop {
        tokio::select! {
            out = out_rx.recv() => match out {
                Some(Outbound::Text(text)) => {
                    if sink.send(Message::Text(text)).await.is_err() {
                        let _ = in_tx.send(Frame::Closed { code: None }).await;
                        break;
                    }
                }
                Some(Outbound::Close(code)) => {
                    let close = CloseFrame {
                        code: CloseCode::from(code),
                        reason: "".into(),
                    };
                    let _ = sink.send(Message::Close(Some(close))).await;
                    break;
                }
                // Manager dropped the handle; plain teardown.
                None => break,
            },
            msg = stream.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    if in_tx.send(Frame::Text(text)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    let code = frame.map(|f| u16::from(f.code));
                    let _ = in_tx.send(Frame::Closed { code }).await;
                    break;
                }
                // Transport-level ping/pong and binary frames are not part
                // of the feed protocol.
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    tracing::debug!("websocket transport error: {err}");
                    let _ = in_tx.send(Frame::Closed { code: None }).await;
                    break;
                }
                None => {
                    let _ = in_tx.send(Frame::Closed { code: None }).await;
                    break;
                }
            }
        }
    }
}
