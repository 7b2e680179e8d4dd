// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::storage::Labels;
use thiserror::Error;

/// A series or series set cursor failed to advance.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error while reading from storage")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A payload is not a well-formed serialized profile.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to decompress payload")]
    Decompress(#[source] std::io::Error),

    #[error("payload exceeds the limit of {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("payload is not a valid pprof message")]
    Protobuf(#[from] prost::DecodeError),

    #[error("string table index {index} is out of range, the table has {len} entries")]
    StringIndexOutOfRange { index: i64, len: usize },

    #[error("sample references location id {0}, which does not exist")]
    MissingLocation(u64),

    #[error("line references function id {0}, which does not exist")]
    MissingFunction(u64),

    #[error("location references mapping id {0}, which does not exist")]
    MissingMapping(u64),

    #[error("{kind} id {id} appears more than once")]
    DuplicateId { kind: &'static str, id: u64 },

    #[error("expected {expected} sample values, but sample had {actual}")]
    ValueCountMismatch { expected: usize, actual: usize },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Two decoded profiles cannot be combined into one.
#[derive(Debug, Error)]
pub enum CombineError {
    #[error("cannot combine an empty sequence of profiles")]
    Empty,

    #[error("incompatible sample types [{left}] and [{right}]")]
    IncompatibleSampleTypes { left: String, right: String },

    #[error("incompatible period types {left} and {right}")]
    IncompatiblePeriodTypes { left: String, right: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A label set could not be built.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum LabelsError {
    #[error("label names must not be empty")]
    EmptyName,

    #[error("duplicate label name {0:?}")]
    DuplicateName(String),

    #[error("expected a label of the form name=value, got {0:?}")]
    Malformed(String),
}

/// The single terminal failure of a merge. Everything except
/// [MergeError::Cancelled] means the query result cannot be trusted.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("failed to advance the series set")]
    SeriesSet {
        #[source]
        source: StorageError,
    },

    #[error("failed to read samples of series {labels}")]
    Series {
        labels: Labels,
        #[source]
        source: StorageError,
    },

    #[error("failed to decode sample {position} of the merged stream (series {labels}, timestamp {timestamp})")]
    Decode {
        labels: Labels,
        timestamp: i64,
        position: usize,
        #[source]
        source: DecodeError,
    },

    #[error("failed to combine profiles of batch {batch}")]
    Combine {
        batch: usize,
        #[source]
        source: CombineError,
    },

    #[error("merge cancelled after {batches_merged} batches ({samples_merged} samples)")]
    Cancelled {
        batches_merged: usize,
        samples_merged: usize,
    },
}

impl MergeError {
    /// Cancellation is the only recoverable outcome; the caller may retry,
    /// e.g. with a narrower time range.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Invalid merge configuration.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {name}")]
    InvalidValue { name: &'static str, value: String },

    #[error("compression level must be between 0 and 9, got {0}")]
    CompressionLevel(u32),
}
