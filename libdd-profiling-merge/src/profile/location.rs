// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::*;

/// Represents a [pprof::Location] with some space-saving changes:
///  - The id is not stored on the struct. It's stored in the container that holds the struct.
///  - ids for linked objects use 32-bit numbers instead of 64 bit ones.
///
/// Stored profiles come from many profilers, so unlike a freshly recorded
/// profile a location may hold several lines (inlined frames, leaf first).
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Location {
    pub mapping_id: Option<MappingId>,
    pub address: u64,
    pub lines: Box<[Line]>,
    pub is_folded: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Line {
    pub function_id: FunctionId,
    pub line: i64,
}

impl From<&Line> for pprof::Line {
    fn from(line: &Line) -> Self {
        Self {
            function_id: line.function_id.to_raw_id(),
            line: line.line,
        }
    }
}

impl Item for Location {
    type Id = LocationId;
}

impl PprofItem for Location {
    type PprofMessage = pprof::Location;

    fn to_pprof(&self, id: Self::Id) -> Self::PprofMessage {
        pprof::Location {
            id: id.to_raw_id(),
            mapping_id: self.mapping_id.map(MappingId::into_raw_id).unwrap_or(0),
            address: self.address,
            lines: self.lines.iter().map(pprof::Line::from).collect(),
            is_folded: self.is_folded,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct LocationId(NonZeroU32);

impl Id for LocationId {
    type RawId = u64;

    fn from_offset(offset: usize) -> Self {
        #[allow(clippy::expect_used)]
        Self(small_non_zero_pprof_id(offset).expect("LocationId to fit into a u32"))
    }

    fn to_offset(&self) -> usize {
        (self.0.get() - 1) as usize
    }

    fn to_raw_id(&self) -> Self::RawId {
        self.0.get().into()
    }
}
