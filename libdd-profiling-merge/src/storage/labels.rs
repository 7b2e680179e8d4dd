// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::error::LabelsError;
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Label {
    pub name: String,
    pub value: String,
}

impl Label {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Parses `name=value`. The value may be empty, the name may not.
impl FromStr for Label {
    type Err = LabelsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some(("", _)) => Err(LabelsError::EmptyName),
            Some((name, value)) => Ok(Label::new(name.trim(), value.trim())),
            None => Err(LabelsError::Malformed(s.to_string())),
        }
    }
}

/// The identity of a series: label pairs that are unique by name.
/// Guaranteed to be sorted by name by [Labels::new].
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Labels {
    sorted_labels: Box<[Label]>,
}

impl Labels {
    pub fn new(mut labels: Vec<Label>) -> Result<Self, LabelsError> {
        labels.sort_unstable();
        for pair in labels.windows(2) {
            if pair[0].name == pair[1].name {
                return Err(LabelsError::DuplicateName(pair[0].name.clone()));
            }
        }
        if labels.iter().any(|label| label.name.is_empty()) {
            return Err(LabelsError::EmptyName);
        }
        Ok(Self {
            sorted_labels: labels.into_boxed_slice(),
        })
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, LabelsError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(name, value)| Label::new(name, value))
                .collect(),
        )
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.sorted_labels
            .binary_search_by(|label| label.name.as_str().cmp(name))
            .ok()
            .map(|offset| self.sorted_labels[offset].value.as_str())
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Label> {
        self.sorted_labels.iter()
    }

    pub fn len(&self) -> usize {
        self.sorted_labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted_labels.is_empty()
    }
}

/// Formats like a Prometheus series selector: `{instance="a", job="b"}`.
impl fmt::Display for Labels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (offset, label) in self.sorted_labels.iter().enumerate() {
            if offset > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={:?}", label.name, label.value)?;
        }
        f.write_str("}")
    }
}
