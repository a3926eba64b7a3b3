//! Chamber 7: collect the closing message.

use super::{connect, ChamberResult};
use crate::config::{EndpointConfig, TransportConfig};
use crate::prompt::{ChamberPrompt, Identifier};

/// Send the last identifier; whatever arrives first is the final message.
pub async fn run(
    endpoint: &EndpointConfig,
    transport: &TransportConfig,
    identifier: &Identifier,
) -> ChamberResult<ChamberPrompt> {
    let mut conn = connect(&endpoint.address, transport).await?;
    conn.send(identifier.as_bytes()).await?;
    let message = conn.read_available().await?;
    Ok(ChamberPrompt::new(message))
}
