// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::pprof::{Function, Label, Line, Location, Mapping, Profile, Sample, ValueType};
use crate::profile::{self, ResolvedSample};
use flate2::write::GzEncoder;
use flate2::Compression;
use prost::Message;
use std::io::Write;

/// Two php frames, `{main}` and `test` called from it, sampled with
/// `samples/count` and `wall-time/nanoseconds`.
pub fn simple_pprof() -> Profile {
    let string_table = [
        "",
        "samples",
        "count",
        "wall-time",
        "nanoseconds",
        "php",
        "{main}",
        "index.php",
        "test",
    ]
    .map(String::from)
    .to_vec();

    Profile {
        sample_types: vec![
            ValueType { r#type: 1, unit: 2 },
            ValueType { r#type: 3, unit: 4 },
        ],
        samples: vec![
            Sample {
                location_ids: vec![1],
                values: vec![1, 10],
                labels: vec![],
            },
            Sample {
                location_ids: vec![2, 1],
                values: vec![2, 20],
                labels: vec![],
            },
        ],
        mappings: vec![Mapping {
            id: 1,
            filename: 5,
            ..Default::default()
        }],
        locations: vec![
            Location {
                id: 1,
                mapping_id: 1,
                address: 0,
                lines: vec![Line {
                    function_id: 1,
                    line: 0,
                }],
                is_folded: false,
            },
            Location {
                id: 2,
                mapping_id: 1,
                address: 0,
                lines: vec![Line {
                    function_id: 2,
                    line: 4,
                }],
                is_folded: false,
            },
        ],
        functions: vec![
            Function {
                id: 1,
                name: 6,
                system_name: 6,
                filename: 7,
                start_line: 0,
            },
            Function {
                id: 2,
                name: 8,
                system_name: 8,
                filename: 7,
                start_line: 3,
            },
        ],
        string_table,
        period_type: Some(ValueType { r#type: 3, unit: 4 }),
        period: 10,
        ..Default::default()
    }
}

/// The same content as [simple_pprof], with the string table reversed and
/// different, unordered ids.
pub fn shuffled_simple_pprof() -> Profile {
    let string_table = [
        "",
        "test",
        "index.php",
        "{main}",
        "php",
        "nanoseconds",
        "wall-time",
        "count",
        "samples",
    ]
    .map(String::from)
    .to_vec();

    Profile {
        sample_types: vec![
            ValueType { r#type: 8, unit: 7 },
            ValueType { r#type: 6, unit: 5 },
        ],
        samples: vec![
            Sample {
                location_ids: vec![3],
                values: vec![1, 10],
                labels: vec![],
            },
            Sample {
                location_ids: vec![5, 3],
                values: vec![2, 20],
                labels: vec![],
            },
        ],
        mappings: vec![Mapping {
            id: 7,
            filename: 4,
            ..Default::default()
        }],
        locations: vec![
            Location {
                id: 5,
                mapping_id: 7,
                address: 0,
                lines: vec![Line {
                    function_id: 20,
                    line: 4,
                }],
                is_folded: false,
            },
            Location {
                id: 3,
                mapping_id: 7,
                address: 0,
                lines: vec![Line {
                    function_id: 10,
                    line: 0,
                }],
                is_folded: false,
            },
        ],
        functions: vec![
            Function {
                id: 20,
                name: 1,
                system_name: 1,
                filename: 2,
                start_line: 3,
            },
            Function {
                id: 10,
                name: 3,
                system_name: 3,
                filename: 2,
                start_line: 0,
            },
        ],
        string_table,
        period_type: Some(ValueType { r#type: 6, unit: 5 }),
        period: 10,
        ..Default::default()
    }
}

/// Returns the string table offset of `s`, adding it if needed.
pub fn intern(profile: &mut Profile, s: &str) -> i64 {
    let offset = match profile.string_table.iter().position(|x| x == s) {
        Some(offset) => offset,
        None => {
            profile.string_table.push(s.to_owned());
            profile.string_table.len() - 1
        }
    };
    offset as i64
}

/// Adds a string label to every sample.
pub fn with_label(mut profile: Profile, key: &str, value: &str) -> Profile {
    let key = intern(&mut profile, key);
    let str = intern(&mut profile, value);
    for sample in &mut profile.samples {
        sample.labels.push(Label {
            key,
            str,
            ..Default::default()
        });
    }
    profile
}

pub fn gzip(message: &Profile) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&message.encode_to_vec()).unwrap();
    encoder.finish().unwrap()
}

/// Everything observable about a profile, independent of table layout.
#[derive(Debug, Eq, PartialEq)]
pub struct Canonical {
    pub sample_types: Vec<(String, String)>,
    pub period_type: Option<(String, String)>,
    pub period: i64,
    pub samples: Vec<ResolvedSample>,
    pub time_nanos: i64,
    pub duration_nanos: i64,
    pub comments: Vec<String>,
    pub drop_frames: String,
    pub keep_frames: String,
    pub default_sample_type: String,
}

fn owned((kind, unit): (&str, &str)) -> (String, String) {
    (kind.to_owned(), unit.to_owned())
}

pub fn canonical(profile: &profile::Profile) -> Canonical {
    Canonical {
        sample_types: profile.sample_types().map(owned).collect(),
        period_type: profile.period_type().map(owned),
        period: profile.period(),
        samples: profile.resolved_samples(),
        time_nanos: profile.time_nanos(),
        duration_nanos: profile.duration_nanos(),
        comments: profile.comments().map(String::from).collect(),
        drop_frames: profile.drop_frames().to_owned(),
        keep_frames: profile.keep_frames().to_owned(),
        default_sample_type: profile.default_sample_type().to_owned(),
    }
}
