// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::batch::BatchIterator;
use crate::codec::{PprofCodec, ProfileCodec};
use crate::config::MergeConfig;
use crate::error::MergeError;
use crate::iter::LendingIterator;
use crate::profile::Profile;
use crate::storage::{SeriesSet, Warning};
use std::num::NonZeroUsize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

/// The result of a merge that ran to completion.
#[derive(Debug)]
pub struct MergeOutput<P> {
    pub profile: MergedProfile<P>,
    /// Storage warnings, passed through unchanged.
    pub warnings: Vec<Warning>,
    pub stats: MergeStats,
}

#[derive(Debug)]
pub enum MergedProfile<P> {
    /// The query matched no samples. Distinct from a profile without
    /// samples, which a stored payload may well be.
    Empty,
    Profile(P),
}

impl<P> MergedProfile<P> {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn into_profile(self) -> Option<P> {
        match self {
            Self::Empty => None,
            Self::Profile(profile) => Some(profile),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MergeStats {
    pub batches: usize,
    pub samples: usize,
}

/// Merges every sample of every series in `set` into one profile.
///
/// Samples are consumed in global timestamp order, `batch_size` at a time:
/// each batch is decoded, combined, and folded into the running result, so
/// at most one batch of decoded profiles is alive at any point.
///
/// Cancellation is checked before each batch is read from storage, so a
/// cancelled merge stops reading within one batch. Once storage is drained
/// the merge runs to completion. A cancelled merge discards its partial
/// result.
/// Storage, decode, and combine failures end the merge.
pub fn merge_series_set<S, C>(
    cancel: &CancellationToken,
    set: S,
    batch_size: NonZeroUsize,
    codec: &C,
) -> Result<MergeOutput<C::Profile>, MergeError>
where
    S: SeriesSet,
    C: ProfileCodec,
{
    let mut stats = MergeStats::default();
    let mut batches = BatchIterator::new(set, batch_size);
    debug!(batch_size = batches.batch_size().get(), "merge started");
    let mut merged: Option<C::Profile> = None;

    loop {
        // Checked before every read, unless nothing is left to read.
        if cancel.is_cancelled() && !batches.is_exhausted() {
            debug!(
                batches = stats.batches,
                samples = stats.samples,
                "merge cancelled"
            );
            return Err(cancelled(stats));
        }
        let Some(batch) = batches.next() else {
            break;
        };
        let batch = batch?;

        let mut profiles = Vec::with_capacity(batch.len());
        for (offset, entry) in batch.iter().enumerate() {
            let profile = codec
                .decode(&entry.payload)
                .map_err(|source| MergeError::Decode {
                    labels: (*entry.labels).clone(),
                    timestamp: entry.timestamp,
                    position: stats.samples + offset,
                    source,
                })?;
            profiles.push(profile);
        }

        let combine_error = |source| MergeError::Combine {
            batch: stats.batches,
            source,
        };
        let combined = codec.combine(profiles).map_err(combine_error)?;
        merged = Some(match merged.take() {
            None => combined,
            Some(acc) => codec.combine(vec![acc, combined]).map_err(combine_error)?,
        });

        trace!(
            batch = stats.batches,
            samples = batch.len(),
            first_timestamp = batch.first().map(|e| e.timestamp),
            last_timestamp = batch.last().map(|e| e.timestamp),
            "merged batch"
        );
        stats.batches += 1;
        stats.samples += batch.len();
    }

    let warnings = batches.warnings();
    for warning in &warnings {
        warn!(%warning, "storage warning");
    }
    debug!(
        batches = stats.batches,
        samples = stats.samples,
        warnings = warnings.len(),
        "merge finished"
    );

    let profile = match merged {
        None => MergedProfile::Empty,
        Some(profile) => MergedProfile::Profile(profile),
    };
    Ok(MergeOutput {
        profile,
        warnings,
        stats,
    })
}

fn cancelled(stats: MergeStats) -> MergeError {
    MergeError::Cancelled {
        batches_merged: stats.batches,
        samples_merged: stats.samples,
    }
}

/// A [PprofCodec] and the settings it merges with.
#[derive(Clone, Debug, Default)]
pub struct Merger {
    config: MergeConfig,
    codec: PprofCodec,
}

impl Merger {
    pub fn new(config: MergeConfig) -> Self {
        let codec = config.codec();
        Self { config, codec }
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    pub fn merge<S: SeriesSet>(
        &self,
        cancel: &CancellationToken,
        set: S,
    ) -> Result<MergeOutput<Profile>, MergeError> {
        merge_series_set(cancel, set, self.config.batch_size, &self.codec)
    }

    /// Serializes a merge result with the configured compression level.
    pub fn serialize(&self, profile: &Profile) -> std::io::Result<Vec<u8>> {
        profile.serialize_into_compressed_pprof(self.config.compression_level)
    }
}
