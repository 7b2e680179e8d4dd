// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::*;
use crate::error::CombineError;

impl Profile {
    /// Merges `other` into `self`.
    ///
    /// Both profiles must record the same sample types and the same period
    /// type. Samples of `other` whose stack and label set already exist in
    /// `self` are summed into them. The start time becomes the earliest
    /// non-zero start, durations add up, and the period is the larger of the
    /// two. Comments are unioned; `drop_frames`, `keep_frames` and
    /// `default_sample_type` keep the first non-empty value.
    pub fn merge(&mut self, other: Profile) -> Result<(), CombineError> {
        self.ensure_compatible(&other)?;

        let Profile {
            strings,
            functions,
            mappings,
            locations,
            labels,
            label_sets,
            stack_traces,
            observations,
            comments,
            drop_frames,
            keep_frames,
            default_sample_type,
            time_nanos,
            duration_nanos,
            period,
            ..
        } = other;

        let mut remapper = Remapper {
            strings: strings.iter().map(|s| self.strings.intern(s)).collect(),
            ..Default::default()
        };
        remapper.functions = functions
            .iter()
            .map(|f| self.functions.dedup(remapper.function(f)))
            .collect();
        remapper.mappings = mappings
            .iter()
            .map(|m| {
                let mapping = remapper.mapping(m);
                let id = self.mappings.dedup(mapping);
                let rebase = get_item(&self.mappings, id)
                    .map(|kept| mapping.rebase_onto(kept))
                    .unwrap_or_default();
                (id, rebase)
            })
            .collect();
        remapper.locations = locations
            .iter()
            .map(|l| self.locations.dedup(remapper.location(l)))
            .collect();
        remapper.labels = labels
            .iter()
            .map(|l| self.labels.dedup(remapper.label(l)))
            .collect();
        remapper.label_sets = label_sets
            .iter()
            .map(|set| self.label_sets.dedup(remapper.label_set(set)))
            .collect();
        remapper.stack_traces = stack_traces
            .iter()
            .map(|st| self.stack_traces.dedup(remapper.stack_trace(st)))
            .collect();

        for (sample, values) in observations.into_entries() {
            let sample = Sample::new(
                remapper.label_set_id(sample.labels),
                remapper.stack_trace_id(sample.stacktrace),
            );
            self.observations
                .add(sample, &values)
                .map_err(|err| CombineError::Other(err.into()))?;
        }

        for comment in comments {
            let comment = remapper.string(comment);
            if !self.comments.contains(&comment) {
                self.comments.push(comment);
            }
        }
        for (field, theirs) in [
            (&mut self.drop_frames, drop_frames),
            (&mut self.keep_frames, keep_frames),
            (&mut self.default_sample_type, default_sample_type),
        ] {
            if field.is_zero() {
                *field = remapper.string(theirs);
            }
        }

        self.time_nanos = match (self.time_nanos, time_nanos) {
            (0, t) | (t, 0) => t,
            (a, b) => a.min(b),
        };
        self.duration_nanos = self.duration_nanos.saturating_add(duration_nanos);
        self.period = self.period.max(period);
        Ok(())
    }

    fn ensure_compatible(&self, other: &Profile) -> Result<(), CombineError> {
        if !self.sample_types().eq(other.sample_types()) {
            return Err(CombineError::IncompatibleSampleTypes {
                left: describe_all(self.sample_types()),
                right: describe_all(other.sample_types()),
            });
        }
        let (ours, theirs) = (self.period_type(), other.period_type());
        if ours != theirs {
            return Err(CombineError::IncompatiblePeriodTypes {
                left: describe_period(ours),
                right: describe_period(theirs),
            });
        }
        Ok(())
    }
}

fn describe((kind, unit): (&str, &str)) -> String {
    format!("{kind}/{unit}")
}

fn describe_all<'a>(value_types: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    value_types.map(describe).collect::<Vec<_>>().join(", ")
}

fn describe_period(period_type: Option<(&str, &str)>) -> String {
    period_type.map_or_else(|| "none".to_owned(), describe)
}

/// Translates ids of a profile being merged into ids of the profile it is
/// merged into. Each table is indexed by the offset of the incoming id.
#[derive(Default)]
struct Remapper {
    strings: Vec<StringId>,
    functions: Vec<FunctionId>,
    mappings: Vec<(MappingId, Rebase)>,
    locations: Vec<LocationId>,
    labels: Vec<LabelId>,
    label_sets: Vec<LabelSetId>,
    stack_traces: Vec<StackTraceId>,
}

impl Remapper {
    fn string(&self, id: StringId) -> StringId {
        self.strings[id.to_offset()]
    }

    fn label_set_id(&self, id: LabelSetId) -> LabelSetId {
        self.label_sets[id.to_offset()]
    }

    fn stack_trace_id(&self, id: StackTraceId) -> StackTraceId {
        self.stack_traces[id.to_offset()]
    }

    fn function(&self, function: &Function) -> Function {
        Function {
            name: self.string(function.name),
            system_name: self.string(function.system_name),
            filename: self.string(function.filename),
            start_line: function.start_line,
        }
    }

    fn mapping(&self, mapping: &Mapping) -> Mapping {
        Mapping {
            filename: self.string(mapping.filename),
            build_id: self.string(mapping.build_id),
            ..*mapping
        }
    }

    fn location(&self, location: &Location) -> Location {
        let (mapping_id, address) = match location.mapping_id {
            None => (None, location.address),
            Some(id) => {
                let (id, rebase) = self.mappings[id.to_offset()];
                (Some(id), rebase.apply(location.address))
            }
        };
        Location {
            mapping_id,
            address,
            lines: location
                .lines
                .iter()
                .map(|line| Line {
                    function_id: self.functions[line.function_id.to_offset()],
                    line: line.line,
                })
                .collect(),
            is_folded: location.is_folded,
        }
    }

    fn label(&self, label: &Label) -> Label {
        let key = self.string(label.get_key());
        match *label.get_value() {
            LabelValue::Str(s) => Label::str(key, self.string(s)),
            LabelValue::Num { num, num_unit } => {
                Label::num(key, num, num_unit.map(|unit| self.string(unit)))
            }
        }
    }

    fn label_set(&self, set: &LabelSet) -> LabelSet {
        LabelSet::new(set.iter().map(|id| self.labels[id.to_offset()]).collect())
    }

    fn stack_trace(&self, stack_trace: &StackTrace) -> StackTrace {
        StackTrace {
            locations: stack_trace
                .locations
                .iter()
                .map(|id| self.locations[id.to_offset()])
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    fn decode(message: &pprof::Profile) -> Profile {
        Profile::try_from_pprof(message).unwrap()
    }

    #[test]
    fn merge_sums_identical_stacks() {
        let mut profile = decode(&simple_pprof());
        profile.merge(decode(&simple_pprof())).unwrap();

        assert_eq!(2, profile.samples_len());
        assert_eq!(2, profile.locations.len());
        let mut values: Vec<_> = profile
            .resolved_samples()
            .into_iter()
            .map(|s| s.values)
            .collect();
        values.sort();
        assert_eq!(vec![vec![2, 20], vec![4, 40]], values);
    }

    #[test]
    fn merge_translates_ids() {
        // Same content, but strings and ids are laid out differently.
        let mut profile = decode(&simple_pprof());
        profile.merge(decode(&shuffled_simple_pprof())).unwrap();
        assert_eq!(2, profile.samples_len());
        assert_eq!(2, profile.functions.len());
        assert_eq!(1, profile.mappings.len());
    }

    /// [simple_pprof] with its binary loaded at `base`, and each location at
    /// `base + 0x40 + id`.
    fn loaded_at(base: u64, size: u64) -> pprof::Profile {
        let mut message = simple_pprof();
        message.mappings[0].memory_start = base;
        message.mappings[0].memory_limit = base + size;
        for location in &mut message.locations {
            location.address = base + 0x40 + location.id;
        }
        message
    }

    #[test]
    fn merge_normalizes_mapping_base_addresses() {
        let mut profile = decode(&loaded_at(0x40_0000, 0x1000));
        profile.merge(decode(&loaded_at(0x7f_0000, 0xf80))).unwrap();

        assert_eq!(1, profile.mappings.len());
        assert_eq!(2, profile.locations.len());
        assert_eq!(2, profile.samples_len());
        let mut values: Vec<_> = profile
            .resolved_samples()
            .into_iter()
            .map(|s| s.values)
            .collect();
        values.sort();
        assert_eq!(vec![vec![2, 20], vec![4, 40]], values);

        let encoded = profile.to_pprof();
        assert_eq!(0x40_0000, encoded.mappings[0].memory_start);
        let mut addresses: Vec<_> = encoded.locations.iter().map(|l| l.address).collect();
        addresses.sort();
        assert_eq!(vec![0x40_0041, 0x40_0042], addresses);
    }

    #[test]
    fn mappings_of_different_binaries_stay_apart() {
        let mut other = loaded_at(0x7f_0000, 0x1000);
        other.mappings[0].build_id = intern(&mut other, "f00d");
        let mut profile = decode(&loaded_at(0x40_0000, 0x1000));
        profile.merge(decode(&other)).unwrap();

        assert_eq!(2, profile.mappings.len());
        assert_eq!(4, profile.locations.len());
        assert_eq!(4, profile.samples_len());
    }

    #[test]
    fn label_sets_distinguish_samples() {
        let mut profile = decode(&simple_pprof());
        profile
            .merge(decode(&with_label(simple_pprof(), "thread", "worker")))
            .unwrap();
        assert_eq!(4, profile.samples_len());
    }

    #[test]
    fn merge_metadata() {
        let mut left = simple_pprof();
        left.time_nanos = 2_000;
        left.duration_nanos = 10;
        left.period = 10;
        let mut right = simple_pprof();
        right.time_nanos = 1_000;
        right.duration_nanos = 5;
        right.period = 20;

        let mut profile = decode(&left);
        profile.merge(decode(&right)).unwrap();
        assert_eq!(1_000, profile.time_nanos());
        assert_eq!(15, profile.duration_nanos());
        assert_eq!(20, profile.period());

        let mut unset = simple_pprof();
        unset.time_nanos = 0;
        profile.merge(decode(&unset)).unwrap();
        assert_eq!(1_000, profile.time_nanos());
    }

    #[test]
    fn comments_union_and_first_non_empty_wins() {
        let mut left = simple_pprof();
        let a = intern(&mut left, "a");
        left.comment = vec![a];

        let mut right = simple_pprof();
        let b = intern(&mut right, "b");
        let a = intern(&mut right, "a");
        let drop = intern(&mut right, "runtime\\..*");
        right.comment = vec![b, a];
        right.drop_frames = drop;
        right.default_sample_type = intern(&mut right, "wall-time");

        let mut profile = decode(&left);
        profile.merge(decode(&right)).unwrap();
        assert_eq!(vec!["a", "b"], profile.comments().collect::<Vec<_>>());
        assert_eq!("runtime\\..*", profile.drop_frames());
        assert_eq!("", profile.keep_frames());
        assert_eq!("wall-time", profile.default_sample_type());

        let mut other = simple_pprof();
        other.default_sample_type = intern(&mut other, "samples");
        profile.merge(decode(&other)).unwrap();
        assert_eq!("wall-time", profile.default_sample_type());
    }

    #[test]
    fn rejects_different_sample_types() {
        let mut right = simple_pprof();
        right.sample_types.pop();
        for sample in &mut right.samples {
            sample.values.pop();
        }
        let mut profile = decode(&simple_pprof());
        let err = profile.merge(decode(&right)).unwrap_err();
        match err {
            CombineError::IncompatibleSampleTypes { left, right } => {
                assert_eq!("samples/count, wall-time/nanoseconds", left);
                assert_eq!("samples/count", right);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn rejects_different_period_types() {
        let mut right = simple_pprof();
        right.period_type = None;
        let mut profile = decode(&simple_pprof());
        let err = profile.merge(decode(&right)).unwrap_err();
        match err {
            CombineError::IncompatiblePeriodTypes { left, right } => {
                assert_eq!("wall-time/nanoseconds", left);
                assert_eq!("none", right);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
