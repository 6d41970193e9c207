//! Error types for pagewise

use thiserror::Error;

/// Construction and configuration failures.
///
/// Bank operations themselves never fail; they degrade to sentinel values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BankError {
    #[error("Invalid page size: {0}")]
    InvalidPageSize(usize),
    #[error("Unknown channel type: {0}")]
    UnknownChannelType(String),
    #[error("Unknown settle policy: {0}")]
    UnknownSettlePolicy(String),
    #[error("Unknown command: {0}")]
    UnknownCommand(String),
}

pub type Result<T> = std::result::Result<T, BankError>;
