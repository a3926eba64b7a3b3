//! Chamber 5: one YAP request and one YAP response over UDP.

use tokio::net::UdpSocket;

use super::{recv_datagram, ChamberResult};
use crate::codec::yap;
use crate::config::{EndpointConfig, TransportConfig};
use crate::prompt::{ChamberPrompt, Identifier};

pub async fn run(
    endpoint: &EndpointConfig,
    transport: &TransportConfig,
    identifier: &Identifier,
) -> ChamberResult<ChamberPrompt> {
    let socket = UdpSocket::bind("0.0.0.0:0").await?;

    let request = yap::encode(identifier.as_bytes());
    socket.send_to(&request, endpoint.address.as_str()).await?;
    tracing::debug!(bytes = request.len(), address = %endpoint.address, "YAP request sent");

    let (reply, _) = recv_datagram(&socket, transport).await?;
    let payload = yap::decode(&reply)?;
    Ok(ChamberPrompt::new(payload))
}
