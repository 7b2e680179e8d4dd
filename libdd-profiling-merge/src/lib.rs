// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

//! Merges stored profiling snapshots into a single aggregate profile.
//!
//! A query against profile storage resolves to a [storage::SeriesSet]: a
//! number of label-identified series, each holding time-ordered samples whose
//! payloads are serialized pprof captures. [merge::merge_series_set] walks all
//! of them in global timestamp order through a [batch::BatchIterator],
//! decodes each batch, combines it, and folds the batch result into a running
//! accumulator. Peak decoded memory is bounded by the batch size rather than
//! by the number of samples the query touches.
//!
//! Decoding and combining go through the [codec::ProfileCodec] trait. The
//! pprof implementation, [codec::PprofCodec], interns everything into a
//! deduplicated [profile::Profile] and sums sample values on identical stacks
//! and label sets, which makes combining associative and commutative.

pub mod batch;
pub mod codec;
mod collections;
pub mod config;
pub mod error;
pub mod iter;
pub mod merge;
pub mod pprof;
pub mod profile;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_utils;

pub use batch::{BatchEntry, BatchIterator};
pub use codec::{PprofCodec, ProfileCodec};
pub use config::MergeConfig;
pub use error::{CombineError, DecodeError, MergeError, StorageError};
pub use merge::{merge_series_set, MergeOutput, MergeStats, MergedProfile, Merger};
