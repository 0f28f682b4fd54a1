// WebSocket API server.
//
// Binds a TCP listener and serves JSON request/response traffic: each text
// frame is one ApiRequest, answered with one ApiResponse frame. Frame
// classification lives in `frame_action` so the protocol handling can be
// unit-tested without opening sockets.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tracing::{info, warn};

use crate::app::App;

/// What to do with one incoming WebSocket frame.
#[derive(Debug, PartialEq)]
pub enum FrameAction {
    /// Send this JSON payload back to the client.
    Reply(String),
    /// The client is closing; stop serving this connection.
    Close,
    /// Binary/ping/pong frames carry no requests.
    Ignore,
}

/// Classify a frame and, for text frames, produce the response payload.
pub fn frame_action(app: &App, msg: &Message) -> FrameAction {
    match msg {
        Message::Text(text) => FrameAction::Reply(app.handle_text(text)),
        Message::Close(_) => FrameAction::Close,
        _ => FrameAction::Ignore,
    }
}

/// Run the API server on `127.0.0.1:{port}`, serving each connection in
/// its own task. Runs until the task is cancelled or the process exits.
pub async fn run(port: u16, app: Arc<App>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(format!("127.0.0.1:{port}")).await?;
    let local_addr = listener.local_addr()?;
    info!("API server listening on {local_addr}");

    loop {
        let (stream, addr) = listener.accept().await?;
        let addr_str = addr.to_string();
        info!("Accepted connection from {addr_str}");
        let app = Arc::clone(&app);
        tokio::spawn(async move {
            if let Err(e) = serve_connection(stream, &addr_str, app).await {
                warn!("Connection {addr_str} ended with error: {e}");
            }
        });
    }
}

/// Serve one client: handshake, then read frames and reply until the
/// client closes or errors.
async fn serve_connection(stream: TcpStream, addr: &str, app: Arc<App>) -> anyhow::Result<()> {
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    let (mut write, mut read) = ws_stream.split();

    while let Some(msg_result) = read.next().await {
        let msg = match msg_result {
            Ok(msg) => msg,
            Err(e) => {
                warn!("WebSocket error from {addr}: {e}");
                break;
            }
        };
        match frame_action(&app, &msg) {
            FrameAction::Reply(payload) => {
                write.send(Message::Text(payload.into())).await?;
            }
            FrameAction::Close => {
                info!("Client {addr} sent close frame");
                break;
            }
            FrameAction::Ignore => {}
        }
    }

    Ok(())
}
