//! Chamber 3: answer a word puzzle.
//!
//! Deployments pose one of two puzzles:
//! - `decipher`: after we send the identifier the peer streams words followed
//!   by a decimal key `N`; the reply is the last `N` words shifted by `N`,
//!   terminated by `--`.
//! - `word-after-sum`: the peer streams numbers and words; the reply is the
//!   first word seen after the running sum passes the configured maximum,
//!   followed by the identifier.

use tokio::net::TcpStream;

use super::{connect, ChamberResult};
use crate::codec::decipher;
use crate::config::{PuzzleMode, TransportConfig, WordPuzzleConfig};
use crate::net::StreamReader;
use crate::prompt::{ChamberPrompt, Identifier};

pub async fn run(
    config: &WordPuzzleConfig,
    transport: &TransportConfig,
    identifier: &Identifier,
) -> ChamberResult<ChamberPrompt> {
    let mut conn = connect(&config.address, transport).await?;

    let reply = match config.mode {
        PuzzleMode::Decipher => solve_decipher(&mut conn, identifier).await?,
        PuzzleMode::WordAfterSum => {
            solve_word_after_sum(&mut conn, identifier, config.max_total).await?
        }
    };
    conn.send(&reply).await?;
    conn.discard_buffered();

    let prompt = conn.read_prompt().await?;
    Ok(ChamberPrompt::new(prompt))
}

async fn solve_decipher(
    conn: &mut StreamReader<TcpStream>,
    identifier: &Identifier,
) -> ChamberResult<Vec<u8>> {
    conn.send(identifier.as_bytes()).await?;

    let keyed = conn.words_before_key().await?;
    // The key doubles as the word count and the shift.
    let shift = (keyed.key % 26) as u32;
    tracing::debug!(key = keyed.key, words = %String::from_utf8_lossy(&keyed.words), "Cipher text");

    let mut reply = decipher(&keyed.words, shift);
    reply.extend_from_slice(b"--");
    tracing::debug!(plain = %String::from_utf8_lossy(&reply), "Deciphered");
    Ok(reply)
}

async fn solve_word_after_sum(
    conn: &mut StreamReader<TcpStream>,
    identifier: &Identifier,
    max_total: u64,
) -> ChamberResult<Vec<u8>> {
    let word = conn.word_after_sum(max_total).await?;
    tracing::debug!(word = %String::from_utf8_lossy(&word), max_total, "Word after sum");

    let mut reply = word.to_vec();
    reply.push(b' ');
    reply.extend_from_slice(identifier.as_bytes());
    Ok(reply)
}
