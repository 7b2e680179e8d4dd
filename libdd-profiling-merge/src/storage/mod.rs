// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The read side of profile storage, as consumed by the merge.
//!
//! The storage engine resolves a query (time range plus label matchers) into
//! a [SeriesSet]. The merge only ever advances these cursors; it never
//! mutates storage and holds at most one sample per series at a time.

mod labels;
mod list;

pub use labels::*;
pub use list::*;

use crate::error::StorageError;
use bytes::Bytes;
use std::borrow::Cow;
use std::fmt;

/// One stored profiling snapshot. The payload is an opaque serialized
/// profile; the merge hands it to a [crate::codec::ProfileCodec] untouched.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Sample {
    pub timestamp: i64,
    pub payload: Bytes,
}

impl Sample {
    pub fn new(timestamp: i64, payload: impl Into<Bytes>) -> Self {
        Self {
            timestamp,
            payload: payload.into(),
        }
    }
}

/// A label-identified sequence of samples in non-decreasing timestamp order.
pub trait Series {
    type Samples: Iterator<Item = Result<Sample, StorageError>>;

    fn labels(&self) -> &Labels;

    /// Turns the series into its forward-only sample cursor. A yielded
    /// error is terminal for the series.
    fn into_samples(self) -> Self::Samples;
}

/// A forward-only cursor over the series matching a query. Series are
/// discovered lazily, in an order chosen by storage.
pub trait SeriesSet {
    type Series: Series;

    /// Advances to the next series. `None` at the end; an error is terminal.
    fn next_series(&mut self) -> Option<Result<Self::Series, StorageError>>;

    /// Takes the non-fatal warnings gathered so far, such as a partial read.
    fn warnings(&mut self) -> Vec<Warning>;
}

/// An advisory note from storage. Warnings travel alongside a successful
/// result and never abort a merge.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Warning(Cow<'static, str>);

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Warning {
    fn from(message: &'static str) -> Self {
        Self(Cow::Borrowed(message))
    }
}

impl From<String> for Warning {
    fn from(message: String) -> Self {
        Self(Cow::Owned(message))
    }
}
