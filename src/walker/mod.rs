//! Walk orchestration.
//!
//! # Responsibilities
//! - Run the chambers in order, strictly one at a time
//! - Thread each prompt's identifier into the next chamber
//! - Stop at the first failure and name the chamber that failed
//!
//! # Design Decisions
//! - No retries; a failed chamber ends the walk
//! - A walk may resume at any chamber given the identifier it expects

use std::time::Instant;

use thiserror::Error;
use tracing::Instrument;

use crate::chambers::{self, Chamber, ChamberError};
use crate::config::{IdentityConfig, WalkerConfig};
use crate::prompt::{ChamberPrompt, Identifier};

pub mod report;

pub use report::{StepRecord, WalkReport};

/// Reasons a walk stopped early.
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("no username configured and $USER is not set")]
    MissingUsername,

    #[error("chamber {0} needs a starting identifier")]
    MissingIdentifier(Chamber),

    #[error("chamber {chamber} failed: {source}")]
    Chamber {
        chamber: Chamber,
        #[source]
        source: ChamberError,
    },
}

impl WalkError {
    /// The chamber the walk stopped in, if it got that far.
    pub fn chamber(&self) -> Option<Chamber> {
        match self {
            WalkError::MissingUsername => Some(Chamber::Handshake),
            WalkError::MissingIdentifier(chamber) | WalkError::Chamber { chamber, .. } => {
                Some(*chamber)
            }
        }
    }
}

/// Drives the fixed chamber sequence.
pub struct Walker {
    config: WalkerConfig,
}

impl Walker {
    pub fn new(config: WalkerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WalkerConfig {
        &self.config
    }

    /// Walk every chamber from the handshake onwards.
    pub async fn run(&self) -> Result<WalkReport, WalkError> {
        self.run_from(Chamber::Handshake, None).await
    }

    /// Walk from `start`. Every chamber but the handshake needs `identifier`.
    pub async fn run_from(
        &self,
        start: Chamber,
        identifier: Option<Identifier>,
    ) -> Result<WalkReport, WalkError> {
        // The handshake consumes the username where later chambers take an identifier.
        let mut input = match (start, identifier) {
            (Chamber::Handshake, _) => resolve_username(&self.config.identity)?,
            (_, Some(identifier)) => identifier,
            (chamber, None) => return Err(WalkError::MissingIdentifier(chamber)),
        };

        let mut report = WalkReport::default();

        for &chamber in &Chamber::SEQUENCE[start.index()..] {
            let span = tracing::info_span!("chamber", index = chamber.index(), name = chamber.name());
            tracing::info!(parent: &span, input = %input, "Entering chamber");

            let started = Instant::now();
            let prompt = self
                .enter(chamber, &input)
                .instrument(span.clone())
                .await
                .map_err(|source| WalkError::Chamber { chamber, source })?;
            let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

            report.steps.push(StepRecord {
                index: chamber.index(),
                chamber,
                input: input.to_string(),
                elapsed_ms,
            });

            if chamber.is_final() {
                tracing::info!(parent: &span, message = %prompt, elapsed_ms, "Walk complete");
                report.final_message = prompt.to_string();
                break;
            }

            tracing::info!(parent: &span, prompt = %prompt, elapsed_ms, "Chamber solved");
            let next = prompt
                .into_identifier()
                .map_err(|e| WalkError::Chamber {
                    chamber,
                    source: e.into(),
                })?;
            input = next;
        }

        Ok(report)
    }

    async fn enter(&self, chamber: Chamber, input: &Identifier) -> Result<ChamberPrompt, ChamberError> {
        let config = &self.config;
        let transport = &config.transport;

        match chamber {
            Chamber::Handshake => chambers::handshake::run(&config.handshake, transport, input).await,
            Chamber::UdpCallback => {
                chambers::udp_callback::run(&config.udp_callback, transport, input).await
            }
            Chamber::WordLengths => {
                chambers::word_lengths::run(&config.word_lengths, transport, input).await
            }
            Chamber::WordPuzzle => {
                chambers::word_puzzle::run(&config.word_puzzle, transport, input).await
            }
            Chamber::FileDigest => {
                chambers::file_digest::run(&config.file_digest, transport, input).await
            }
            Chamber::Yap => chambers::yap::run(&config.yap, transport, input).await,
            Chamber::HttpProxy => {
                chambers::http_proxy::run(&config.http_proxy, transport, input).await
            }
            Chamber::Finale => chambers::finale::run(&config.finale, transport, input).await,
        }
    }
}

/// Username from configuration, falling back to `$USER`.
pub fn resolve_username(identity: &IdentityConfig) -> Result<Identifier, WalkError> {
    identity
        .username
        .clone()
        .or_else(|| std::env::var("USER").ok())
        .and_then(|name| Identifier::new(name))
        .ok_or(WalkError::MissingUsername)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_username_wins() {
        let identity = IdentityConfig {
            username: Some("  fast_rhino ".to_string()),
        };
        assert_eq!(resolve_username(&identity).unwrap().as_bytes(), b"fast_rhino");
    }

    #[tokio::test]
    async fn resume_without_identifier_is_rejected() {
        let walker = Walker::new(WalkerConfig::default());
        let err = walker.run_from(Chamber::Yap, None).await.unwrap_err();
        assert!(matches!(err, WalkError::MissingIdentifier(Chamber::Yap)));
        assert_eq!(err.chamber(), Some(Chamber::Yap));
    }

    #[test]
    fn chamber_error_names_the_chamber() {
        let err = WalkError::Chamber {
            chamber: Chamber::FileDigest,
            source: ChamberError::Prompt(crate::prompt::PromptError::MissingIdentifier),
        };
        assert!(err.to_string().starts_with("chamber 4 (file_digest) failed"));
    }
}
