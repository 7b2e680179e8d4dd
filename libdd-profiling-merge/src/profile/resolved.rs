// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Samples with every id replaced by what it refers to. Two profiles that
//! differ only in how their tables are laid out resolve to the same samples.

use super::*;

#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ResolvedSample {
    /// Leaf first.
    pub locations: Vec<ResolvedLocation>,
    /// Sorted by key, then value.
    pub labels: Vec<ResolvedLabel>,
    pub values: Vec<i64>,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ResolvedLocation {
    /// The filename of the mapping, if the location has one.
    pub mapping: Option<String>,
    pub address: u64,
    pub lines: Vec<ResolvedLine>,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ResolvedLine {
    pub function: String,
    pub filename: String,
    pub line: i64,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum ResolvedLabelValue {
    Str(String),
    Num { num: i64, unit: Option<String> },
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ResolvedLabel {
    pub key: String,
    pub value: ResolvedLabelValue,
}

impl Profile {
    /// Every sample, resolved and sorted, for diagnostics and comparisons.
    pub fn resolved_samples(&self) -> Vec<ResolvedSample> {
        let mut samples: Vec<_> = self
            .observations
            .iter()
            .map(|(sample, values)| ResolvedSample {
                locations: self
                    .stack_trace(sample.stacktrace)
                    .iter()
                    .filter_map(|id| get_item(&self.locations, *id))
                    .map(|location| self.resolve_location(location))
                    .collect(),
                labels: self.resolve_labels(sample.labels),
                values: values.to_vec(),
            })
            .collect();
        samples.sort_unstable();
        samples
    }

    fn resolve_location(&self, location: &Location) -> ResolvedLocation {
        let mapping = location
            .mapping_id
            .and_then(|id| get_item(&self.mappings, id))
            .map(|mapping| self.strings.resolve(mapping.filename).to_owned());
        let lines = location
            .lines
            .iter()
            .filter_map(|line| {
                let function = get_item(&self.functions, line.function_id)?;
                Some(ResolvedLine {
                    function: self.strings.resolve(function.name).to_owned(),
                    filename: self.strings.resolve(function.filename).to_owned(),
                    line: line.line,
                })
            })
            .collect();
        ResolvedLocation {
            mapping,
            address: location.address,
            lines,
        }
    }

    fn resolve_labels(&self, id: LabelSetId) -> Vec<ResolvedLabel> {
        let mut labels: Vec<_> = self
            .sample_labels(id)
            .map(|label| ResolvedLabel {
                key: self.strings.resolve(label.get_key()).to_owned(),
                value: match *label.get_value() {
                    LabelValue::Str(s) => ResolvedLabelValue::Str(self.strings.resolve(s).to_owned()),
                    LabelValue::Num { num, num_unit } => ResolvedLabelValue::Num {
                        num,
                        unit: num_unit.map(|unit| self.strings.resolve(unit).to_owned()),
                    },
                },
            })
            .collect();
        labels.sort_unstable();
        labels
    }
}
