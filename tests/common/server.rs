//! In-process daemon listening on an ephemeral port.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use slircd_core::config::Config;
use slircd_core::network::Gateway;
use slircd_core::state::{CoreHandle, Matrix, actor};
use tokio::task::JoinHandle;

pub struct TestServer {
    addr: SocketAddr,
    pub core: CoreHandle,
    gateway: JoinHandle<()>,
}

impl TestServer {
    pub async fn spawn(config: Config) -> anyhow::Result<Self> {
        let mut config = config;
        config.listen.address = SocketAddr::from(([127, 0, 0, 1], 0));
        let config = Arc::new(config);

        let mut matrix = Matrix::new(Arc::clone(&config))?;
        for name in &config.modules.load {
            matrix.load_bundled(name)?;
        }
        let uid_gen = Arc::clone(&matrix.uid_gen);
        let (core, _core_task) = actor::spawn(matrix);

        let gateway = Gateway::bind(config.listen.address, &config, core.clone(), uid_gen).await?;
        let addr = gateway.local_addr()?;
        let gateway = tokio::spawn(async move {
            let _ = gateway.run().await;
        });

        Ok(Self { addr, core, gateway })
    }

    pub fn address(&self) -> String {
        self.addr.to_string()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.gateway.abort();
    }
}
