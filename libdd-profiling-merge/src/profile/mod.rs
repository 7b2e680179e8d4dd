// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! A decoded, deduplicated pprof profile that other profiles can be merged
//! into.
//!
//! Strings, functions, mappings, locations, labels, label sets and stack
//! traces are interned by content, so two profiles captured independently
//! can be combined by translating the ids of one into the other. Sample
//! values are kept per (label set, stack trace) and summed on insertion.

mod encode;
mod function;
mod import;
mod label;
mod location;
mod mapping;
mod observations;
mod remap;
mod resolved;
mod sample;
mod stack_trace;
mod value_type;

use function::*;
use label::*;
use location::*;
use mapping::*;
use observations::*;
use sample::*;
use stack_trace::*;
use value_type::*;

pub use resolved::*;

use crate::collections::identifiable::*;
use crate::collections::string_table::StringTable;
use crate::error::DecodeError;
use crate::pprof;
use std::num::NonZeroU32;

pub struct Profile {
    sample_types: Box<[ValueType]>,
    period_type: Option<ValueType>,
    period: i64,
    strings: StringTable,
    functions: FxIndexSet<Function>,
    mappings: FxIndexSet<Mapping>,
    locations: FxIndexSet<Location>,
    labels: FxIndexSet<Label>,
    label_sets: FxIndexSet<LabelSet>,
    stack_traces: FxIndexSet<StackTrace>,
    observations: Observations,
    /// Unique, in order of first appearance.
    comments: Vec<StringId>,
    drop_frames: StringId,
    keep_frames: StringId,
    default_sample_type: StringId,
    time_nanos: i64,
    duration_nanos: i64,
}

impl Profile {
    /// Inflates and decodes a stored payload. `max_payload_bytes` bounds the
    /// size of the protobuf message after decompression.
    pub fn decode(payload: &[u8], max_payload_bytes: usize) -> Result<Self, DecodeError> {
        let message = pprof::decode_message(payload, max_payload_bytes)?;
        Self::try_from_pprof(&message)
    }

    /// `(type, unit)` of every value each sample carries, in order.
    pub fn sample_types(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.sample_types.iter().map(|vt| self.value_type(vt))
    }

    pub fn period_type(&self) -> Option<(&str, &str)> {
        self.period_type.as_ref().map(|vt| self.value_type(vt))
    }

    pub fn period(&self) -> i64 {
        self.period
    }

    /// The number of distinct (stack trace, label set) pairs.
    pub fn samples_len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn time_nanos(&self) -> i64 {
        self.time_nanos
    }

    pub fn duration_nanos(&self) -> i64 {
        self.duration_nanos
    }

    pub fn comments(&self) -> impl Iterator<Item = &str> + '_ {
        self.comments.iter().map(|id| self.strings.resolve(*id))
    }

    pub fn default_sample_type(&self) -> &str {
        self.strings.resolve(self.default_sample_type)
    }

    pub fn drop_frames(&self) -> &str {
        self.strings.resolve(self.drop_frames)
    }

    pub fn keep_frames(&self) -> &str {
        self.strings.resolve(self.keep_frames)
    }

    fn with_sample_types(len: usize) -> Self {
        Self {
            sample_types: Box::default(),
            period_type: None,
            period: 0,
            strings: StringTable::new(),
            functions: FxIndexSet::default(),
            mappings: FxIndexSet::default(),
            locations: FxIndexSet::default(),
            labels: FxIndexSet::default(),
            label_sets: FxIndexSet::default(),
            stack_traces: FxIndexSet::default(),
            observations: Observations::new(len),
            comments: Vec::new(),
            drop_frames: StringId::ZERO,
            keep_frames: StringId::ZERO,
            default_sample_type: StringId::ZERO,
            time_nanos: 0,
            duration_nanos: 0,
        }
    }

    fn value_type(&self, vt: &ValueType) -> (&str, &str) {
        (self.strings.resolve(vt.r#type), self.strings.resolve(vt.unit))
    }

    fn stack_trace(&self, id: StackTraceId) -> &[LocationId] {
        get_item(&self.stack_traces, id)
            .map(|st| st.locations.as_ref())
            .unwrap_or_default()
    }

    fn sample_labels(&self, id: LabelSetId) -> impl Iterator<Item = &Label> + '_ {
        get_item(&self.label_sets, id)
            .into_iter()
            .flat_map(LabelSet::iter)
            .filter_map(|label| get_item(&self.labels, *label))
    }
}

impl std::fmt::Debug for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Profile")
            .field("sample_types", &self.sample_types().collect::<Vec<_>>())
            .field("samples", &self.samples_len())
            .field("locations", &self.locations.len())
            .field("strings", &self.strings.len())
            .field("time_nanos", &self.time_nanos)
            .field("duration_nanos", &self.duration_nanos)
            .finish_non_exhaustive()
    }
}
