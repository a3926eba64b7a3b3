//! Chamber 6: serve as an HTTP proxy until the prompt is submitted.
//!
//! Two activities run side by side:
//! - the proxy itself (`http::ProxyServer`), returning the first submission
//! - an error listener on the control connection, logging every report the
//!   chamber sends until it closes the connection
//!
//! Neither is joined when the submission arrives.

use tokio::net::TcpStream;

use super::{connect, ChamberResult};
use crate::config::{HttpProxyConfig, TransportConfig};
use crate::http::ProxyServer;
use crate::net::{StreamError, StreamReader};
use crate::prompt::{ChamberPrompt, Identifier};

pub async fn run(
    config: &HttpProxyConfig,
    transport: &TransportConfig,
    identifier: &Identifier,
) -> ChamberResult<ChamberPrompt> {
    let server = ProxyServer::bind(config).await?;
    let port = server.local_addr().port();

    let mut control = connect(&config.control_address, transport).await?;
    let mut announcement = identifier.as_bytes().to_vec();
    announcement.extend_from_slice(format!(" {}", port).as_bytes());
    control.send(&announcement).await?;
    tracing::info!(port, control = %config.control_address, "Proxy announced");

    tokio::spawn(report_errors(control));

    let prompt = server.run_until_submission().await?;
    Ok(ChamberPrompt::new(prompt))
}

/// Log every message on the control connection until the peer closes it.
async fn report_errors(mut control: StreamReader<TcpStream>) {
    loop {
        match control.read_available().await {
            Ok(report) => {
                tracing::warn!(
                    report = %String::from_utf8_lossy(&report).trim_end(),
                    "Proxy chamber reported an error"
                );
            }
            Err(StreamError::NoData) => {
                tracing::debug!("Control connection closed");
                return;
            }
            Err(e) => {
                tracing::debug!(error = %e, "Control connection failed");
                return;
            }
        }
    }
}
