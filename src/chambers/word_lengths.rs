//! Chamber 2: report the lengths of the streamed words.

use super::{connect, ChamberResult};
use crate::config::{TransportConfig, WordLengthsConfig};
use crate::prompt::{ChamberPrompt, Identifier};

pub async fn run(
    config: &WordLengthsConfig,
    transport: &TransportConfig,
    identifier: &Identifier,
) -> ChamberResult<ChamberPrompt> {
    let mut conn = connect(&config.address, transport).await?;

    let lengths = conn.word_lengths(config.max_total).await?;
    tracing::debug!(reads = conn.reads(), "Word lengths collected");

    let mut reply = identifier.as_bytes().to_vec();
    reply.push(b' ');
    reply.extend_from_slice(lengths.as_bytes());
    reply.extend_from_slice(b" --");
    conn.send(&reply).await?;
    conn.discard_buffered();

    let prompt = conn.read_prompt().await?;
    Ok(ChamberPrompt::new(prompt))
}
