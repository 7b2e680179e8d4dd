// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Builders for stored pprof payloads and series.

use flate2::write::GzEncoder;
use flate2::Compression;
use libdd_profiling_merge::pprof;
use libdd_profiling_merge::profile::Profile;
use libdd_profiling_merge::storage::{Labels, ListSeries, Sample};
use prost::Message;
use std::collections::BTreeMap;
use std::io::Write;

/// A cpu profile with one sample per stack. Each stack is a list of
/// function names, leaf first; functions all live in `app.go`.
pub fn cpu_profile(stacks: &[(&[&str], i64)], time_nanos: i64) -> pprof::Profile {
    let mut strings = vec![String::new()];
    let mut intern = |s: &str| -> i64 {
        let offset = strings.iter().position(|x| x == s).unwrap_or_else(|| {
            strings.push(s.to_owned());
            strings.len() - 1
        });
        offset as i64
    };

    let sample_types = vec![pprof::ValueType {
        r#type: intern("cpu"),
        unit: intern("nanoseconds"),
    }];
    let period_type = Some(sample_types[0]);
    let filename = intern("app.go");

    let mut functions: Vec<pprof::Function> = Vec::new();
    let mut locations: Vec<pprof::Location> = Vec::new();
    let mut samples = Vec::new();
    for (stack, value) in stacks {
        let mut location_ids = Vec::new();
        for name in stack.iter() {
            let name = intern(name);
            let id = match functions.iter().find(|f| f.name == name) {
                Some(function) => function.id,
                None => {
                    let id = functions.len() as u64 + 1;
                    functions.push(pprof::Function {
                        id,
                        name,
                        system_name: name,
                        filename,
                        start_line: 0,
                    });
                    locations.push(pprof::Location {
                        id,
                        lines: vec![pprof::Line {
                            function_id: id,
                            line: 10,
                        }],
                        ..Default::default()
                    });
                    id
                }
            };
            location_ids.push(id);
        }
        samples.push(pprof::Sample {
            location_ids,
            values: vec![*value],
            labels: vec![],
        });
    }

    pprof::Profile {
        sample_types,
        samples,
        locations,
        functions,
        string_table: strings,
        time_nanos,
        duration_nanos: 10_000_000_000,
        period_type,
        period: 10_000_000,
        ..Default::default()
    }
}

pub fn gzip(message: &pprof::Profile) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&message.encode_to_vec()).unwrap();
    encoder.finish().unwrap()
}

pub fn labels(instance: &str) -> Labels {
    Labels::from_pairs([("instance", instance)]).unwrap()
}

pub fn series(instance: &str, samples: Vec<(i64, Vec<u8>)>) -> ListSeries {
    ListSeries::new(
        labels(instance),
        samples
            .into_iter()
            .map(|(timestamp, payload)| Sample::new(timestamp, payload))
            .collect(),
    )
}

/// Summed values by stack, the stack being function names leaf first.
pub fn totals(profile: &Profile) -> BTreeMap<Vec<String>, Vec<i64>> {
    let mut totals = BTreeMap::new();
    for sample in profile.resolved_samples() {
        let stack = sample
            .locations
            .iter()
            .flat_map(|location| location.lines.iter().map(|line| line.function.clone()))
            .collect();
        let previous = totals.insert(stack, sample.values);
        assert!(previous.is_none(), "stacks must be aggregated");
    }
    totals
}

/// A profile's resolved samples plus its metadata, independent of how its
/// tables happen to be laid out.
#[allow(dead_code)]
pub fn canonical(profile: &Profile) -> String {
    format!(
        "{:?} {:?} {} {} {} {:?} {:?}",
        profile.sample_types().collect::<Vec<_>>(),
        profile.period_type(),
        profile.period(),
        profile.time_nanos(),
        profile.duration_nanos(),
        profile.comments().collect::<Vec<_>>(),
        profile.resolved_samples(),
    )
}
