//! Error types for slotflow.
//!
//! Validation failures (slot requests, payload construction) are returned to the
//! caller as `FlowError` values. Decoding of stored documents never surfaces these
//! errors on its default path: it degrades to an empty structure instead.

use std::{io::ErrorKind, string::FromUtf8Error};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::flow::SlotKind;

/// Unified error type for all slotflow operations.
#[derive(Deserialize, Serialize, Error, Debug, Clone, PartialEq)]
pub enum FlowError {
    /// A manual slot request collides with a slot held by another step.
    #[error("slot {slot} is already used by step {holder}")]
    DuplicateSlot {
        slot: String,
        holder: String,
    },

    /// A slot string is not `M1..M50` / `T1..T50`, or has the wrong kind for the step.
    #[error("invalid slot format: {0}")]
    InvalidSlotFormat(String),

    /// Every slot of the requested kind is taken.
    #[error("no free {0:?} slot left")]
    SlotLimitExceeded(SlotKind),

    /// A snapshot document parses as neither the current nor the legacy format.
    #[error("malformed snapshot: {0}")]
    MalformedSnapshot(String),

    /// An annotation document could not be parsed.
    #[error("malformed annotation document: {0}")]
    MalformedAnnotationDocument(String),

    /// Step payload data failed validation (time rules, delays, timer bounds).
    #[error("{0}")]
    InvalidPayload(String),

    #[error("step {0} not found")]
    StepNotFound(String),

    #[error("group {0} not found")]
    GroupNotFound(String),

    /// Edge definition errors.
    #[error("{0}")]
    Edge(String),

    /// Configuration parsing or validation errors.
    #[error("{0}")]
    Config(String),

    /// Data conversion errors (JSON, TOML).
    #[error("{0}")]
    Convert(String),

    /// Row store errors.
    #[error("{0}")]
    Store(String),

    /// I/O operation errors.
    #[error("{0}")]
    IoError(String),
}

impl From<FlowError> for String {
    fn from(val: FlowError) -> Self {
        val.to_string()
    }
}

impl From<std::io::Error> for FlowError {
    fn from(error: std::io::Error) -> Self {
        FlowError::IoError(error.to_string())
    }
}

impl From<FlowError> for std::io::Error {
    fn from(val: FlowError) -> Self {
        #[allow(clippy::io_other_error)]
        std::io::Error::new(ErrorKind::Other, val.to_string())
    }
}

impl From<FromUtf8Error> for FlowError {
    fn from(_: FromUtf8Error) -> Self {
        FlowError::Convert("Error with utf-8 string convert".to_string())
    }
}

impl From<serde_json::Error> for FlowError {
    fn from(error: serde_json::Error) -> Self {
        FlowError::Convert(error.to_string())
    }
}

impl From<toml::de::Error> for FlowError {
    fn from(error: toml::de::Error) -> Self {
        FlowError::Config(error.to_string())
    }
}
