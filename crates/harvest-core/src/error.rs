//! Error types for `harvest-core`.

use thiserror::Error;

use crate::event::EventKind;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown event kind: {0:?}")]
  UnknownEventKind(String),

  #[error("unknown platform action: {0:?}")]
  UnknownAction(String),

  #[error("action {action} does not produce {kind} events")]
  KindMismatch {
    kind:   EventKind,
    action: &'static str,
  },

  #[error("empty observation line")]
  EmptyLine,

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
