#![allow(dead_code)]

use std::{net::SocketAddr, time::Duration};

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use lavabridge::{
    Permissions, ShardGateway,
    common::types::{AnyResult, ChannelId, GuildId},
};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::{
    net::TcpListener,
    sync::{mpsc, oneshot},
};
use tokio_tungstenite::tungstenite::{
    handshake::server::{ErrorResponse, Request, Response},
    http::HeaderMap,
    protocol::Message,
};

pub const WAIT: Duration = Duration::from_secs(5);

/// One-shot websocket server standing in for an audio node.
pub struct MockNode {
    pub addr: SocketAddr,
    /// JSON frames the client sent.
    pub received: mpsc::UnboundedReceiver<Value>,
    /// Frames to push to the client.
    pub outgoing: mpsc::UnboundedSender<Message>,
    pub headers: oneshot::Receiver<HeaderMap>,
}

impl MockNode {
    pub async fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (received_tx, received) = mpsc::unbounded_channel();
        let (outgoing, mut outgoing_rx) = mpsc::unbounded_channel::<Message>();
        let (headers_tx, headers) = oneshot::channel();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let callback = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
                let _ = headers_tx.send(req.headers().clone());
                Ok(resp)
            };
            let ws = tokio_tungstenite::accept_hdr_async(stream, callback)
                .await
                .unwrap();
            let (mut write, mut read) = ws.split();

            loop {
                tokio::select! {
                    msg = read.next() => match msg {
                        Some(Ok(Message::Text(text))) => {
                            let value: Value = serde_json::from_str(text.as_str()).unwrap();
                            let _ = received_tx.send(value);
                        }
                        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                        Some(Ok(_)) => {}
                    },
                    out = outgoing_rx.recv() => match out {
                        Some(msg) => {
                            if write.send(msg).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    },
                }
            }
        });

        Self {
            addr,
            received,
            outgoing,
            headers,
        }
    }

    pub fn push(&self, value: Value) {
        self.outgoing
            .send(Message::Text(value.to_string().into()))
            .unwrap();
    }

    pub async fn next_json(&mut self) -> Value {
        tokio::time::timeout(WAIT, self.received.recv())
            .await
            .expect("timed out waiting for a frame")
            .expect("mock node closed")
    }
}

/// Chat gateway double that records every opcode-4 packet.
#[derive(Default)]
pub struct RecordingGateway {
    pub sent: Mutex<Vec<(u64, Value)>>,
    pub permissions: Option<Permissions>,
    /// Reject every send, as a disconnected shard would.
    pub offline: bool,
}

impl RecordingGateway {
    pub fn with_permissions(permissions: Permissions) -> Self {
        Self {
            permissions: Some(permissions),
            ..Self::default()
        }
    }

    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<(u64, Value)> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl ShardGateway for RecordingGateway {
    async fn send(&self, shard_id: u64, payload: Value) -> AnyResult<()> {
        if self.offline {
            return Err(format!("shard {} is not connected", shard_id).into());
        }
        self.sent.lock().push((shard_id, payload));
        Ok(())
    }

    async fn channel_permissions(
        &self,
        _guild_id: &GuildId,
        _channel_id: &ChannelId,
    ) -> Option<Permissions> {
        self.permissions
    }
}
