// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! In-memory [Series] and [SeriesSet], for callers that already hold their
//! samples (tools, tests, small caches) and for exercising storage failures.

use super::{Labels, Sample, Series, SeriesSet, Warning};
use crate::error::StorageError;
use std::collections::VecDeque;

#[derive(Clone, Debug, Default)]
pub struct ListSeries {
    labels: Labels,
    samples: Vec<Sample>,
    fail_after: Option<(usize, String)>,
}

impl ListSeries {
    pub fn new(labels: Labels, samples: Vec<Sample>) -> Self {
        Self {
            labels,
            samples,
            fail_after: None,
        }
    }

    /// Keeps only the samples with `start <= timestamp <= end`.
    pub fn with_time_range(mut self, start: i64, end: i64) -> Self {
        self.samples
            .retain(|sample| sample.timestamp >= start && sample.timestamp <= end);
        self
    }

    /// The cursor fails with `message` once `n` samples have been read.
    pub fn with_failure_after(mut self, n: usize, message: impl Into<String>) -> Self {
        self.fail_after = Some((n, message.into()));
        self
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl Series for ListSeries {
    type Samples = ListSamples;

    fn labels(&self) -> &Labels {
        &self.labels
    }

    fn into_samples(self) -> Self::Samples {
        ListSamples {
            samples: self.samples.into_iter(),
            fail_after: self.fail_after,
            read: 0,
        }
    }
}

pub struct ListSamples {
    samples: std::vec::IntoIter<Sample>,
    fail_after: Option<(usize, String)>,
    read: usize,
}

impl Iterator for ListSamples {
    type Item = Result<Sample, StorageError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some((n, _)) = &self.fail_after {
            if self.read == *n {
                let (_, message) = self.fail_after.take()?;
                // The failure is terminal.
                self.samples = Vec::new().into_iter();
                return Some(Err(StorageError::Other(anyhow::anyhow!(message))));
            }
        }
        let sample = self.samples.next()?;
        self.read += 1;
        Some(Ok(sample))
    }
}

#[derive(Debug, Default)]
pub struct ListSeriesSet {
    series: VecDeque<ListSeries>,
    warnings: Vec<Warning>,
    fail_after: Option<(usize, String)>,
    yielded: usize,
}

impl ListSeriesSet {
    pub fn new(series: Vec<ListSeries>) -> Self {
        Self {
            series: series.into(),
            ..Default::default()
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<Warning>) -> Self {
        self.warnings = warnings;
        self
    }

    /// The cursor fails with `message` once `n` series have been yielded.
    pub fn with_failure_after(mut self, n: usize, message: impl Into<String>) -> Self {
        self.fail_after = Some((n, message.into()));
        self
    }
}

impl SeriesSet for ListSeriesSet {
    type Series = ListSeries;

    fn next_series(&mut self) -> Option<Result<Self::Series, StorageError>> {
        if let Some((n, _)) = &self.fail_after {
            if self.yielded == *n {
                let (_, message) = self.fail_after.take()?;
                self.series.clear();
                return Some(Err(StorageError::Other(anyhow::anyhow!(message))));
            }
        }
        let series = self.series.pop_front()?;
        self.yielded += 1;
        Some(Ok(series))
    }

    fn warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }
}

impl FromIterator<ListSeries> for ListSeriesSet {
    fn from_iter<T: IntoIterator<Item = ListSeries>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
