use std::{error::Error, fmt};

use payloadscan_types::Slot;
use serde::{Deserialize, Serialize};

/// Message beacon nodes return for a slot without a block.
pub const BLOCK_NOT_FOUND_MESSAGE: &str = "Could not find requested block";

#[derive(Debug, thiserror::Error)]
pub enum BeaconClientError {
    #[error("Reqwest error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("error from API: {0}")]
    Api(#[from] ApiError),

    #[error("no block found for slot {slot}")]
    BlockNotFound { slot: Slot },

    #[error("unexpected status {status} from beacon node")]
    UnexpectedStatus { status: u16 },

    #[error("beacon node syncing")]
    BeaconNodeSyncing,
}

impl BeaconClientError {
    /// True if the beacon node reported that no block exists for the requested slot.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::BlockNotFound { .. } => true,
            Self::Api(err) => err.code() == 404 || err.message().contains(BLOCK_NOT_FOUND_MESSAGE),
            _ => false,
        }
    }
}

// NOTE: `IndexedError` must come before `ErrorMessage` so
// the `serde(untagged)` machinery does not greedily match it first.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum ApiError {
    IndexedError { code: u16, message: String, failures: Vec<IndexedError> },
    ErrorMessage { code: u16, message: String },
}

impl ApiError {
    pub fn code(&self) -> u16 {
        match self {
            Self::IndexedError { code, .. } | Self::ErrorMessage { code, .. } => *code,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::IndexedError { message, .. } | Self::ErrorMessage { message, .. } => message,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct IndexedError {
    index: usize,
    message: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ErrorMessage { message, .. } => {
                write!(f, "{message}")
            }
            Self::IndexedError { message, failures, .. } => {
                write!(f, "{message}: ")?;
                for failure in failures {
                    write!(f, "{failure:?}, ")?;
                }
                Ok(())
            }
        }
    }
}

impl Error for ApiError {}
