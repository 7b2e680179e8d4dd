// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::*;
use crate::pprof::{profile_tag, CompressedProtobufSerializer};
use std::io;

impl Profile {
    /// Builds the pprof message. Ids are dense and start at one; string
    /// offsets follow the interning order.
    pub fn to_pprof(&self) -> pprof::Profile {
        pprof::Profile {
            sample_types: self.sample_types.iter().map(pprof::ValueType::from).collect(),
            samples: self
                .observations
                .iter()
                .map(|(sample, values)| self.pprof_sample(sample, values))
                .collect(),
            mappings: pprof_iter(&self.mappings).collect(),
            locations: pprof_iter(&self.locations).collect(),
            functions: pprof_iter(&self.functions).collect(),
            string_table: self.strings.iter().map(String::from).collect(),
            drop_frames: self.drop_frames.to_raw_id(),
            keep_frames: self.keep_frames.to_raw_id(),
            time_nanos: self.time_nanos,
            duration_nanos: self.duration_nanos,
            period_type: self.period_type.as_ref().map(pprof::ValueType::from),
            period: self.period,
            comment: self.comments.iter().map(Id::to_raw_id).collect(),
            default_sample_type: self.default_sample_type.to_raw_id(),
        }
    }

    /// Serializes the profile into gzip-compressed pprof, the format stored
    /// payloads use and query results are returned in. `compression_level`
    /// is a gzip level between 0 and 9.
    ///
    /// Fields are written one at a time, so the uncompressed message is never
    /// materialized.
    pub fn serialize_into_compressed_pprof(&self, compression_level: u32) -> io::Result<Vec<u8>> {
        // Merged profiles are rarely small, and profiles compress well.
        // Starting at 32 KiB avoids most of the early reallocations.
        const INITIAL_PPROF_BUFFER_SIZE: usize = 32 * 1024;
        let mut encoder =
            CompressedProtobufSerializer::with_capacity(INITIAL_PPROF_BUFFER_SIZE, compression_level);

        for (sample, values) in self.observations.iter() {
            encoder.encode(profile_tag::SAMPLES, &self.pprof_sample(sample, values))?;
        }
        for sample_type in self.sample_types.iter() {
            encoder.encode(profile_tag::SAMPLE_TYPES, &pprof::ValueType::from(sample_type))?;
        }
        for item in pprof_iter(&self.mappings) {
            encoder.encode(profile_tag::MAPPINGS, &item)?;
        }
        for item in pprof_iter(&self.locations) {
            encoder.encode(profile_tag::LOCATIONS, &item)?;
        }
        for item in pprof_iter(&self.functions) {
            encoder.encode(profile_tag::FUNCTIONS, &item)?;
        }
        for item in self.strings.iter() {
            encoder.encode_str(profile_tag::STRING_TABLE, item)?;
        }

        encoder.encode_int64(profile_tag::DROP_FRAMES, self.drop_frames.to_raw_id())?;
        encoder.encode_int64(profile_tag::KEEP_FRAMES, self.keep_frames.to_raw_id())?;
        encoder.encode_int64(profile_tag::TIME_NANOS, self.time_nanos)?;
        encoder.encode_int64(profile_tag::DURATION_NANOS, self.duration_nanos)?;
        if let Some(period_type) = &self.period_type {
            encoder.encode(profile_tag::PERIOD_TYPE, &pprof::ValueType::from(period_type))?;
        }
        encoder.encode_int64(profile_tag::PERIOD, self.period)?;
        for comment in &self.comments {
            encoder.encode_int64_unconditionally(profile_tag::COMMENT, comment.to_raw_id())?;
        }
        encoder.encode_int64(
            profile_tag::DEFAULT_SAMPLE_TYPE,
            self.default_sample_type.to_raw_id(),
        )?;

        encoder.finish()
    }

    fn pprof_sample(&self, sample: &Sample, values: &[i64]) -> pprof::Sample {
        pprof::Sample {
            location_ids: self
                .stack_trace(sample.stacktrace)
                .iter()
                .map(Id::to_raw_id)
                .collect(),
            values: values.to_vec(),
            labels: self.sample_labels(sample.labels).map(pprof::Label::from).collect(),
        }
    }
}
