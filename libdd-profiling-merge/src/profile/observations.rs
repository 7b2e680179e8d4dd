// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::*;

/// Sample values aggregated per [Sample]. Every entry holds exactly
/// `obs_len` values, one per sample type.
#[derive(Clone, Debug, Default)]
pub struct Observations {
    obs_len: usize,
    data: FxIndexMap<Sample, Box<[i64]>>,
}

impl Observations {
    pub fn new(obs_len: usize) -> Self {
        Self {
            obs_len,
            data: FxIndexMap::default(),
        }
    }

    /// Adds the values to the ones already recorded for `sample`, saturating
    /// instead of overflowing.
    pub fn add(&mut self, sample: Sample, values: &[i64]) -> Result<(), DecodeError> {
        if values.len() != self.obs_len {
            return Err(DecodeError::ValueCountMismatch {
                expected: self.obs_len,
                actual: values.len(),
            });
        }
        match self.data.get_mut(&sample) {
            Some(acc) => acc
                .iter_mut()
                .zip(values)
                .for_each(|(a, b)| *a = a.saturating_add(*b)),
            None => {
                self.data.insert(sample, values.into());
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Sample, &[i64])> {
        self.data.iter().map(|(sample, values)| (sample, values.as_ref()))
    }

    pub fn into_entries(self) -> impl Iterator<Item = (Sample, Box<[i64]>)> {
        self.data.into_iter()
    }
}
