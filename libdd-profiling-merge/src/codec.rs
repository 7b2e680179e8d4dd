// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::error::{CombineError, DecodeError};
use crate::profile::Profile;

/// Turns stored payloads into profiles and folds profiles together.
///
/// `combine` must be associative and commutative with respect to sample
/// values, so that the merge result depends neither on the batch size nor
/// on how samples are grouped into batches.
pub trait ProfileCodec {
    type Profile;

    fn decode(&self, payload: &[u8]) -> Result<Self::Profile, DecodeError>;

    /// Combines the profiles into one. An empty sequence is an error; a
    /// single profile is returned as is.
    fn combine(&self, profiles: Vec<Self::Profile>) -> Result<Self::Profile, CombineError>;
}

/// Decodes gzip-compressed or raw pprof payloads.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PprofCodec {
    max_payload_bytes: usize,
}

impl PprofCodec {
    /// `max_payload_bytes` is the largest protobuf message accepted, after
    /// decompression.
    pub fn new(max_payload_bytes: usize) -> Self {
        Self { max_payload_bytes }
    }

    pub fn max_payload_bytes(&self) -> usize {
        self.max_payload_bytes
    }
}

impl Default for PprofCodec {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MAX_PAYLOAD_BYTES)
    }
}

impl ProfileCodec for PprofCodec {
    type Profile = Profile;

    fn decode(&self, payload: &[u8]) -> Result<Profile, DecodeError> {
        Profile::decode(payload, self.max_payload_bytes)
    }

    fn combine(&self, profiles: Vec<Profile>) -> Result<Profile, CombineError> {
        let mut profiles = profiles.into_iter();
        let mut merged = profiles.next().ok_or(CombineError::Empty)?;
        for profile in profiles {
            merged.merge(profile)?;
        }
        Ok(merged)
    }
}
