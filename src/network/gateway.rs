//! Gateway - TCP listener that accepts incoming connections.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info, instrument};

use crate::config::Config;
use crate::network::Connection;
use crate::state::{CoreHandle, UidGenerator};

/// Accepts clients and spawns a [`Connection`] task for each.
pub struct Gateway {
    listener: TcpListener,
    core: CoreHandle,
    uid_gen: Arc<UidGenerator>,
    sendq: usize,
    max_line_len: usize,
}

impl Gateway {
    pub async fn bind(
        addr: SocketAddr,
        config: &Config,
        core: CoreHandle,
        uid_gen: Arc<UidGenerator>,
    ) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, "Listener bound");
        Ok(Self {
            listener,
            core,
            uid_gen,
            sendq: config.limits.sendq,
            max_line_len: config.limits.max_line_len,
        })
    }

    /// Address actually bound, useful when binding port 0.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections forever.
    #[instrument(skip(self), name = "gateway")]
    pub async fn run(self) -> anyhow::Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let uid = self.uid_gen.next_uid();
                    info!(%uid, %addr, "Connection accepted");

                    let connection = Connection::new(
                        uid.clone(),
                        stream,
                        addr,
                        self.core.clone(),
                        self.sendq,
                        self.max_line_len,
                    );
                    tokio::spawn(async move {
                        if let Err(e) = connection.run().await {
                            error!(%uid, %addr, error = %e, "Connection error");
                        }
                        info!(%uid, %addr, "Connection closed");
                    });
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }
}
