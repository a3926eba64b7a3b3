//! Chamber 0: introduce ourselves by username.

use bytes::Bytes;

use super::{connect, ChamberResult};
use crate::config::{EndpointConfig, TransportConfig};
use crate::prompt::{ChamberPrompt, Identifier};

/// Read the greeting, answer with `username`, return the first prompt.
pub async fn run(
    endpoint: &EndpointConfig,
    transport: &TransportConfig,
    username: &Identifier,
) -> ChamberResult<ChamberPrompt> {
    let mut conn = connect(&endpoint.address, transport).await?;

    let greeting: Bytes = conn.read_available().await?;
    tracing::info!(greeting = %String::from_utf8_lossy(&greeting).trim_end(), "Greeting");

    conn.send(username.as_bytes()).await?;
    let prompt = conn.read_prompt().await?;
    Ok(ChamberPrompt::new(prompt))
}
