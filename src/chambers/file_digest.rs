//! Chamber 4: fingerprint a length-prefixed file transfer.
//!
//! The peer sends `<length>:` followed by exactly `length` raw bytes. The
//! bytes are hashed as they arrive; only the current read is ever held.

use md5::Md5;
use sha1::{Digest, Sha1};
use tokio::io::AsyncRead;

use super::{connect, ChamberResult};
use crate::config::{FileDigestConfig, HashAlgorithm, TransportConfig};
use crate::net::{StreamError, StreamReader};
use crate::prompt::{ChamberPrompt, Identifier};

pub async fn run(
    config: &FileDigestConfig,
    transport: &TransportConfig,
    identifier: &Identifier,
) -> ChamberResult<ChamberPrompt> {
    let mut conn = connect(&config.address, transport).await?;
    conn.send(identifier.as_bytes()).await?;

    let digest = digest_transfer(&mut conn, config.algorithm).await?;
    tracing::info!(
        algorithm = ?config.algorithm,
        digest = %hex::encode(&digest),
        "File digest computed"
    );

    conn.send(&digest).await?;
    let prompt = conn.read_prompt().await?;
    Ok(ChamberPrompt::new(prompt))
}

/// Read a length-prefixed transfer from `conn` and return its raw digest.
pub async fn digest_transfer<S>(
    conn: &mut StreamReader<S>,
    algorithm: HashAlgorithm,
) -> Result<Vec<u8>, StreamError>
where
    S: AsyncRead + Unpin,
{
    let len = conn.read_length_prefix().await?;
    tracing::debug!(len, "File transfer announced");

    match algorithm {
        HashAlgorithm::Md5 => digest_body::<Md5, _>(conn, len).await,
        HashAlgorithm::Sha1 => digest_body::<Sha1, _>(conn, len).await,
    }
}

async fn digest_body<D, S>(conn: &mut StreamReader<S>, len: u64) -> Result<Vec<u8>, StreamError>
where
    D: Digest,
    S: AsyncRead + Unpin,
{
    let mut hasher = D::new();
    conn.read_exact_with(len, |chunk| hasher.update(chunk)).await?;
    Ok(hasher.finalize().to_vec())
}
