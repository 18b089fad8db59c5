use std::sync::{Arc, atomic::Ordering};

use futures::{SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{
    self,
    client::IntoClientRequest,
    handshake::client::Request,
    http::HeaderValue,
    protocol::Message,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{Connection, Node, NodeMessage, NodeState};
use crate::{
    common::ClientResult,
    protocol::IncomingMessage,
};

impl Node {
    /// Opens the websocket and starts the reader and writer tasks.
    ///
    /// Must be called from within a tokio runtime. A failed handshake leaves
    /// the node `Disconnected`.
    pub async fn connect(self: &Arc<Self>) -> ClientResult<()> {
        if self.is_connected() {
            return Ok(());
        }
        self.set_state(NodeState::Connecting);

        let request = match self.handshake_request() {
            Ok(request) => request,
            Err(e) => {
                self.set_state(NodeState::Disconnected);
                return Err(e);
            }
        };

        debug!("[{}] Connecting to {}", self.name(), self.config.ws_url());
        let ws_stream = match tokio_tungstenite::connect_async(request).await {
            Ok((stream, _)) => stream,
            Err(e) => {
                warn!("[{}] Connection failed: {}", self.name(), e);
                self.set_state(NodeState::Disconnected);
                return Err(e.into());
            }
        };
        let (mut write, read) = ws_stream.split();

        let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
        let cancel = CancellationToken::new();

        let name = self.name().to_string();
        tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                let closing = matches!(msg, Message::Close(_));
                if let Err(e) = write.send(msg).await {
                    warn!("[{}] WS write error: {}", name, e);
                    break;
                }
                if closing {
                    break;
                }
            }
            let _ = write.close().await;
        });

        let id = self.next_generation();
        *self.connection.lock() = Some(Connection {
            id,
            writer: tx,
            cancel: cancel.clone(),
        });
        self.set_state(NodeState::Connected);
        info!("[{}] Connected to {}", self.name(), self.config.ws_url());
        self.forward(NodeMessage::Connected {
            node: self.name().to_string(),
        });

        let node = Arc::clone(self);
        tokio::spawn(async move { node.read_loop(id, read, cancel).await });

        Ok(())
    }

    fn handshake_request(&self) -> ClientResult<Request> {
        let mut request = self.config.ws_url().into_client_request()?;
        let headers = request.headers_mut();
        headers.insert("Authorization", HeaderValue::from_str(&self.config.password)?);
        headers.insert(
            "User-Id",
            HeaderValue::from_str(&self.session.user_id.to_string())?,
        );
        headers.insert("Num-Shards", HeaderValue::from(self.session.shard_count));
        headers.insert(
            "Client-Name",
            HeaderValue::from_str(&self.session.client_name)?,
        );
        Ok(request)
    }

    async fn read_loop<S>(self: Arc<Self>, id: u64, mut read: S, cancel: CancellationToken)
    where
        S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
    {
        let (code, reason) = loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    break (1000u16, "Closed by client".to_string());
                }
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => self.handle_text(text.as_str()),
                        Some(Ok(Message::Close(frame))) => {
                            break frame
                                .map(|cf| (cf.code.into(), cf.reason.to_string()))
                                .unwrap_or((1000u16, "No reason".into()));
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            warn!("[{}] WS read error: {}", self.name(), e);
                            break (1006u16, format!("IO error: {}", e));
                        }
                        None => {
                            break (1006u16, "Stream ended".to_string());
                        }
                    }
                }
            }
        };

        // Dropping the connection ends the writer task. A newer connection
        // may already be in place after close + connect; leave that one alone.
        {
            let mut current = self.connection.lock();
            match current.as_ref() {
                Some(connection) if connection.id != id => {
                    debug!("[{}] Stale reader for connection {} exited", self.name(), id);
                    return;
                }
                Some(_) => {
                    if let Some(connection) = current.take() {
                        connection.cancel.cancel();
                    }
                }
                None if self.generation.load(Ordering::Relaxed) != id => return,
                None => {}
            }
        }
        self.set_state(NodeState::Disconnected);

        info!(
            "[{}] WS closed: code={}, reason='{}'",
            self.name(),
            code,
            reason
        );
        self.forward(NodeMessage::Closed {
            node: self.name().to_string(),
            node_id: self.id,
            code,
            reason,
        });
    }

    fn handle_text(&self, text: &str) {
        debug!("[{}] <- {}", self.name(), text);

        let message: IncomingMessage = match serde_json::from_str(text) {
            Ok(m) => m,
            Err(e) => {
                warn!(
                    "[{}] Failed to parse node message: {} - Text: {}",
                    self.name(),
                    e,
                    text
                );
                return;
            }
        };

        if let IncomingMessage::Stats(stats) = &message {
            *self.stats.write() = Some(stats.clone());
        }

        self.forward(NodeMessage::Payload {
            node: self.name().to_string(),
            message,
        });
    }
}
