use std::io;

use thiserror::Error;

use crate::stack::transport::{HttpStatused, TransportError};

#[derive(Debug, Error)]
pub enum BblError {
    #[error("cannot parse {what}: {fragment}")]
    Parse {
        what: &'static str,
        fragment: String,
    },

    #[error("{0}")]
    Range(String),

    #[error("stack not found: {name}")]
    StackNotFound { name: String },

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("template composition error: {0}")]
    Composition(String),

    #[error("stack output '{key}' missing")]
    MissingOutput { key: String },

    #[error("ops path '{path}': {reason}")]
    Ops { path: String, reason: String },

    #[error("operation cancelled")]
    Cancelled,

    #[error("stack {name} did not settle after {polls} polls")]
    WaitExhausted { name: String, polls: u32 },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("telemetry initialization error: {0}")]
    Telemetry(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml_bw::Error),
}

impl BblError {
    pub(crate) fn parse(what: &'static str, fragment: impl Into<String>) -> Self {
        BblError::Parse {
            what,
            fragment: fragment.into(),
        }
    }

    pub fn is_stack_not_found(&self) -> bool {
        matches!(self, BblError::StackNotFound { .. })
    }
}

impl HttpStatused for BblError {
    fn status_code(&self) -> Option<u16> {
        match self {
            BblError::Transport(err) => err.status_code(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, BblError>;
