//! Chamber 1: let the chamber call us back over UDP.

use tokio::net::UdpSocket;

use super::{recv_datagram, ChamberResult};
use crate::config::{TransportConfig, UdpCallbackConfig};
use crate::prompt::{ChamberPrompt, Identifier};

/// Challenge the chamber may send before the prompt.
const UPPER_CODE_CHALLENGE: &[u8] = b"upper-code?";

pub async fn run(
    config: &UdpCallbackConfig,
    transport: &TransportConfig,
    identifier: &Identifier,
) -> ChamberResult<ChamberPrompt> {
    let socket = UdpSocket::bind(("0.0.0.0", config.callback_port)).await?;
    let port = socket.local_addr()?.port();
    tracing::debug!(port, "Callback socket bound");

    let mut announcement = format!("{} ", port).into_bytes();
    announcement.extend_from_slice(identifier.as_bytes());
    socket.send_to(&announcement, config.address.as_str()).await?;

    let (mut reply, from) = recv_datagram(&socket, transport).await?;
    if reply == UPPER_CODE_CHALLENGE {
        tracing::debug!(%from, "Answering upper-code challenge");
        socket.send_to(&identifier.to_ascii_uppercase(), from).await?;
        (reply, _) = recv_datagram(&socket, transport).await?;
    }

    Ok(ChamberPrompt::new(reply))
}
