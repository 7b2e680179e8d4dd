// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::*;

/// The aggregation key of a profile: observations with the same stack and
/// the same label set are summed.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Sample {
    /// label includes additional context for this sample. It can include
    /// things like a thread id, allocation size, etc
    pub labels: LabelSetId,
    pub stacktrace: StackTraceId,
}

impl Sample {
    pub fn new(labels: LabelSetId, stacktrace: StackTraceId) -> Self {
        Self { labels, stacktrace }
    }
}
