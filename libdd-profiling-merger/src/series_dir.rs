// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Series kept as plain files: one directory per series, one file per
//! sample, named `<timestamp>[.<ext>]`.

use anyhow::Context;
use libdd_profiling_merge::error::StorageError;
use libdd_profiling_merge::storage::{Label, Labels, Sample, Series, SeriesSet, Warning};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::{fs, vec};
use tracing::debug;

/// Every series carries its directory name under this label.
pub const INSTANCE_LABEL: &str = "instance";

/// Directories are listed only when the merge reaches them, and files are
/// read one sample at a time.
pub struct DirSeriesSet {
    dirs: VecDeque<PathBuf>,
    extra_labels: Vec<Label>,
    start: i64,
    end: i64,
    warnings: Vec<Warning>,
}

impl DirSeriesSet {
    pub fn new(dirs: impl IntoIterator<Item = PathBuf>, extra_labels: Vec<Label>) -> Self {
        Self {
            dirs: dirs.into_iter().collect(),
            extra_labels,
            start: i64::MIN,
            end: i64::MAX,
            warnings: Vec::new(),
        }
    }

    /// Keeps only the samples with `start <= timestamp <= end`. A missing
    /// bound leaves that side open.
    pub fn with_time_range(mut self, start: Option<i64>, end: Option<i64>) -> Self {
        self.start = start.unwrap_or(i64::MIN);
        self.end = end.unwrap_or(i64::MAX);
        self
    }

    fn open(&mut self, dir: &Path) -> Result<DirSeries, StorageError> {
        let name = dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| dir.display().to_string());
        let mut labels = self.extra_labels.clone();
        labels.push(Label::new(INSTANCE_LABEL, name));
        let labels = Labels::new(labels)
            .with_context(|| format!("invalid labels for series {}", dir.display()))?;

        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type()?.is_file() {
                self.skip(&path, "not a regular file");
                continue;
            }
            match timestamp_of(&path) {
                Some(timestamp) if (self.start..=self.end).contains(&timestamp) => {
                    files.push((timestamp, path))
                }
                Some(_) => {}
                None => self.skip(&path, "file name is not a timestamp"),
            }
        }
        // Same timestamp, different extensions: order by path for determinism.
        files.sort();

        debug!(series = %labels, samples = files.len(), "opened series directory");
        Ok(DirSeries {
            labels,
            files: files.into_iter(),
        })
    }

    fn skip(&mut self, path: &Path, reason: &str) {
        self.warnings
            .push(Warning::from(format!("skipped {}: {reason}", path.display())));
    }
}

/// `1700000000.pb.gz` and `1700000000` both name timestamp 1700000000.
fn timestamp_of(path: &Path) -> Option<i64> {
    let name = path.file_name()?.to_str()?;
    let stem = name.split('.').next()?;
    stem.parse().ok()
}

impl SeriesSet for DirSeriesSet {
    type Series = DirSeries;

    fn next_series(&mut self) -> Option<Result<DirSeries, StorageError>> {
        let dir = self.dirs.pop_front()?;
        Some(self.open(&dir))
    }

    fn warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }
}

pub struct DirSeries {
    labels: Labels,
    files: vec::IntoIter<(i64, PathBuf)>,
}

impl Series for DirSeries {
    type Samples = DirSamples;

    fn labels(&self) -> &Labels {
        &self.labels
    }

    fn into_samples(self) -> DirSamples {
        DirSamples { files: self.files }
    }
}

pub struct DirSamples {
    files: vec::IntoIter<(i64, PathBuf)>,
}

impl Iterator for DirSamples {
    type Item = Result<Sample, StorageError>;

    fn next(&mut self) -> Option<Self::Item> {
        let (timestamp, path) = self.files.next()?;
        Some(
            fs::read(&path)
                .map(|payload| Sample::new(timestamp, payload))
                .map_err(StorageError::from),
        )
    }
}
