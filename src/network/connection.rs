//! Per-client socket task.
//!
//! Inbound lines go to the core as [`CoreEvent::Line`]; outbound messages
//! arrive on a bounded queue whose sender lives in the user's record. When
//! the core removes the user that sender drops, the queue drains, and the
//! task closes the socket.

use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use slirc_proto::Message;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};
use tracing::{Instrument, debug, warn};

use crate::state::{CoreEvent, CoreHandle, Uid};
use crate::telemetry::spans;

pub struct Connection {
    uid: Uid,
    stream: TcpStream,
    addr: SocketAddr,
    core: CoreHandle,
    sendq: usize,
    max_line_len: usize,
}

impl Connection {
    pub fn new(
        uid: Uid,
        stream: TcpStream,
        addr: SocketAddr,
        core: CoreHandle,
        sendq: usize,
        max_line_len: usize,
    ) -> Self {
        Self {
            uid,
            stream,
            addr,
            core,
            sendq,
            max_line_len,
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let span = spans::connection(&self.uid, &self.addr.to_string());
        self.run_inner().instrument(span).await
    }

    async fn run_inner(self) -> anyhow::Result<()> {
        let Self {
            uid,
            stream,
            addr,
            core,
            sendq,
            max_line_len,
        } = self;

        let (tx, mut outgoing) = mpsc::channel::<Message>(sendq.max(1));
        let connected = CoreEvent::Connected {
            uid: uid.clone(),
            host: addr.ip().to_string(),
            sender: tx,
        };
        if !core.send(connected).await {
            return Ok(());
        }

        let framed = Framed::new(stream, LinesCodec::new_with_max_length(max_line_len));
        let (mut writer, mut reader) = framed.split();

        // None once the core has dropped the user itself.
        let reason: Option<String> = loop {
            tokio::select! {
                inbound = reader.next() => match inbound {
                    Some(Ok(line)) => {
                        if line.is_empty() {
                            continue;
                        }
                        if !core.send(CoreEvent::Line { uid: uid.clone(), line }).await {
                            break None;
                        }
                    }
                    Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                        warn!(max = max_line_len, "Input line too long, discarded");
                    }
                    Some(Err(LinesCodecError::Io(e))) => break Some(format!("Read error: {e}")),
                    None => break Some("Connection closed".to_string()),
                },
                outbound = outgoing.recv() => match outbound {
                    Some(msg) => {
                        if let Err(e) = writer.send(format!("{msg}\r")).await {
                            break Some(format!("Write error: {e}"));
                        }
                    }
                    None => break None,
                },
            }
        };

        match reason {
            Some(reason) => {
                debug!(%reason, "Client went away");
                core.send(CoreEvent::Disconnected { uid, reason }).await;
            }
            None => {
                let _ = writer.close().await;
            }
        }
        Ok(())
    }
}
