// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Interleaves every series of a [SeriesSet] into one timestamp-ordered
//! stream and hands it out in fixed-size batches.

use crate::error::MergeError;
use crate::iter::LendingIterator;
use crate::storage::{Labels, Sample, Series, SeriesSet, Warning};
use bytes::Bytes;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::trace;

/// One payload of the merged stream, along with where it came from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BatchEntry {
    pub labels: Arc<Labels>,
    pub timestamp: i64,
    pub payload: Bytes,
}

/// The head sample of one series, plus the rest of its cursor.
struct HeapEntry<I> {
    head: Sample,
    /// Discovery order of the series within the set. Breaks timestamp ties.
    source: usize,
    labels: Arc<Labels>,
    samples: I,
}

impl<I> PartialEq for HeapEntry<I> {
    fn eq(&self, other: &Self) -> bool {
        self.head.timestamp == other.head.timestamp && self.source == other.source
    }
}

impl<I> Eq for HeapEntry<I> {}

impl<I> PartialOrd for HeapEntry<I> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// [BinaryHeap] is a max-heap, so the earliest timestamp, and then the
/// first-discovered series, compare as the greatest.
impl<I> Ord for HeapEntry<I> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .head
            .timestamp
            .cmp(&self.head.timestamp)
            .then_with(|| other.source.cmp(&self.source))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum State {
    /// The series set has not been read yet.
    Unopened,
    Merging,
    /// Exhausted or failed. Only `None` is yielded from here on.
    Done,
}

/// A streaming k-way merge over all series of a set.
///
/// Emitted payloads are in ascending timestamp order; samples sharing a
/// timestamp are emitted in series discovery order, so the stream is
/// reproducible for a given series set. Every batch holds exactly
/// `batch_size` entries except the last, which holds the non-empty remainder.
///
/// The set is drained on the first call to [LendingIterator::next], because
/// a series discovered late may still hold the earliest sample. Only the head
/// sample of each series is buffered, so memory grows with the number of
/// series, not the number of samples.
pub struct BatchIterator<S: SeriesSet> {
    set: S,
    batch_size: NonZeroUsize,
    heap: BinaryHeap<HeapEntry<<S::Series as Series>::Samples>>,
    batch: Vec<BatchEntry>,
    state: State,
    samples_read: usize,
}

impl<S: SeriesSet> BatchIterator<S> {
    pub fn new(set: S, batch_size: NonZeroUsize) -> Self {
        Self {
            set,
            batch_size,
            heap: BinaryHeap::new(),
            batch: Vec::new(),
            state: State::Unopened,
            samples_read: 0,
        }
    }

    pub fn batch_size(&self) -> NonZeroUsize {
        self.batch_size
    }

    /// The number of samples emitted in batches so far.
    pub fn samples_read(&self) -> usize {
        self.samples_read
    }

    /// True once no further batch can be yielded. After the set has been
    /// opened, an empty heap means every series is drained, so this never
    /// touches storage.
    pub fn is_exhausted(&self) -> bool {
        match self.state {
            State::Unopened => false,
            State::Merging => self.heap.is_empty(),
            State::Done => true,
        }
    }

    /// Takes the warnings reported by the underlying series set.
    pub fn warnings(&mut self) -> Vec<Warning> {
        self.set.warnings()
    }

    fn open(&mut self) -> Result<(), MergeError> {
        let mut discovered = 0;
        while let Some(series) = self.set.next_series() {
            let series = series.map_err(|source| MergeError::SeriesSet { source })?;
            let labels = Arc::new(series.labels().clone());
            let mut samples = series.into_samples();
            match samples.next() {
                Some(Ok(head)) => self.heap.push(HeapEntry {
                    head,
                    source: discovered,
                    labels,
                    samples,
                }),
                Some(Err(source)) => {
                    return Err(MergeError::Series {
                        labels: Labels::clone(&labels),
                        source,
                    })
                }
                None => trace!(series = %labels, "skipping series without samples"),
            }
            discovered += 1;
        }
        trace!(series = discovered, active = self.heap.len(), "opened series set");
        self.batch.reserve_exact(self.batch_size.get());
        Ok(())
    }

    fn fill(&mut self) -> Result<(), MergeError> {
        self.batch.clear();
        while self.batch.len() < self.batch_size.get() {
            let Some(mut entry) = self.heap.pop() else {
                break;
            };
            let sample = match entry.samples.next() {
                Some(Ok(next)) => {
                    let sample = std::mem::replace(&mut entry.head, next);
                    let labels = Arc::clone(&entry.labels);
                    self.heap.push(entry);
                    BatchEntry {
                        labels,
                        timestamp: sample.timestamp,
                        payload: sample.payload,
                    }
                }
                Some(Err(source)) => {
                    return Err(MergeError::Series {
                        labels: Labels::clone(&entry.labels),
                        source,
                    })
                }
                None => BatchEntry {
                    labels: entry.labels,
                    timestamp: entry.head.timestamp,
                    payload: entry.head.payload,
                },
            };
            self.batch.push(sample);
        }
        self.samples_read += self.batch.len();
        Ok(())
    }

    fn fail(&mut self, err: MergeError) -> Option<Result<&[BatchEntry], MergeError>> {
        self.state = State::Done;
        self.batch.clear();
        self.heap.clear();
        Some(Err(err))
    }
}

impl<S: SeriesSet> LendingIterator for BatchIterator<S> {
    type Item<'a>
        = Result<&'a [BatchEntry], MergeError>
    where
        Self: 'a;

    fn next(&mut self) -> Option<Self::Item<'_>> {
        match self.state {
            State::Done => return None,
            State::Unopened => {
                self.state = State::Merging;
                if let Err(err) = self.open() {
                    return self.fail(err);
                }
            }
            State::Merging => {}
        }

        if let Err(err) = self.fill() {
            return self.fail(err);
        }
        if self.batch.is_empty() {
            self.state = State::Done;
            return None;
        }
        Some(Ok(&self.batch))
    }
}
