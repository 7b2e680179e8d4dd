// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::*;

impl Profile {
    /// Validates every reference of the message and interns its contents.
    ///
    /// Only what samples reach is kept: a function no location uses, or a
    /// string nothing points at, is dropped. Strings are interned in a fixed
    /// order (sample types, period type, samples, then the remaining
    /// metadata) so equal messages produce equal profiles.
    pub fn try_from_pprof(message: &pprof::Profile) -> Result<Self, DecodeError> {
        Importer::new(message)?.import()
    }
}

struct Importer<'a> {
    message: &'a pprof::Profile,
    profile: Profile,
    strings: Vec<Option<StringId>>,
    functions: FxHashMap<u64, &'a pprof::Function>,
    mappings: FxHashMap<u64, &'a pprof::Mapping>,
    locations: FxHashMap<u64, &'a pprof::Location>,
    function_ids: FxHashMap<u64, FunctionId>,
    mapping_ids: FxHashMap<u64, (MappingId, Rebase)>,
    location_ids: FxHashMap<u64, LocationId>,
}

fn index_by_id<'a, T>(
    kind: &'static str,
    items: &'a [T],
    id: impl Fn(&T) -> u64,
) -> Result<FxHashMap<u64, &'a T>, DecodeError> {
    let mut index = FxHashMap::default();
    index.reserve(items.len());
    for item in items {
        let id = id(item);
        if index.insert(id, item).is_some() {
            return Err(DecodeError::DuplicateId { kind, id });
        }
    }
    Ok(index)
}

impl<'a> Importer<'a> {
    fn new(message: &'a pprof::Profile) -> Result<Self, DecodeError> {
        if message.string_table.first().is_some_and(|s| !s.is_empty()) {
            return Err(DecodeError::Other(anyhow::anyhow!(
                "string table must start with the empty string"
            )));
        }
        Ok(Self {
            message,
            profile: Profile::with_sample_types(message.sample_types.len()),
            strings: vec![None; message.string_table.len()],
            functions: index_by_id("function", &message.functions, |f| f.id)?,
            mappings: index_by_id("mapping", &message.mappings, |m| m.id)?,
            locations: index_by_id("location", &message.locations, |l| l.id)?,
            function_ids: FxHashMap::default(),
            mapping_ids: FxHashMap::default(),
            location_ids: FxHashMap::default(),
        })
    }

    fn import(mut self) -> Result<Profile, DecodeError> {
        let message = self.message;

        let sample_types = message
            .sample_types
            .iter()
            .map(|vt| self.value_type(vt))
            .collect::<Result<Vec<_>, _>>()?;
        self.profile.sample_types = sample_types.into_boxed_slice();
        self.profile.period_type = message
            .period_type
            .as_ref()
            .map(|vt| self.value_type(vt))
            .transpose()?;

        for sample in &message.samples {
            self.sample(sample)?;
        }

        self.profile.drop_frames = self.string(message.drop_frames)?;
        self.profile.keep_frames = self.string(message.keep_frames)?;
        for comment in &message.comment {
            let comment = self.string(*comment)?;
            if !self.profile.comments.contains(&comment) {
                self.profile.comments.push(comment);
            }
        }
        self.profile.default_sample_type = self.string(message.default_sample_type)?;
        self.profile.period = message.period;
        self.profile.time_nanos = message.time_nanos;
        self.profile.duration_nanos = message.duration_nanos;
        Ok(self.profile)
    }

    fn string(&mut self, index: i64) -> Result<StringId, DecodeError> {
        if index == 0 {
            return Ok(StringId::ZERO);
        }
        let message = self.message;
        let table = &message.string_table;
        let out_of_range = DecodeError::StringIndexOutOfRange {
            index,
            len: table.len(),
        };
        let Some(offset) = usize::try_from(index).ok().filter(|o| *o < table.len()) else {
            return Err(out_of_range);
        };
        if let Some(Some(id)) = self.strings.get(offset) {
            return Ok(*id);
        }
        let Some(s) = table.get(offset) else {
            return Err(out_of_range);
        };
        let id = self.profile.strings.intern(s);
        if let Some(slot) = self.strings.get_mut(offset) {
            *slot = Some(id);
        }
        Ok(id)
    }

    fn value_type(&mut self, vt: &pprof::ValueType) -> Result<ValueType, DecodeError> {
        Ok(ValueType {
            r#type: self.string(vt.r#type)?,
            unit: self.string(vt.unit)?,
        })
    }

    fn sample(&mut self, sample: &pprof::Sample) -> Result<(), DecodeError> {
        let expected = self.profile.sample_types.len();
        if sample.values.len() != expected {
            return Err(DecodeError::ValueCountMismatch {
                expected,
                actual: sample.values.len(),
            });
        }

        let locations = sample
            .location_ids
            .iter()
            .map(|id| self.location(*id))
            .collect::<Result<Box<[_]>, _>>()?;
        let stacktrace = self.profile.stack_traces.dedup(StackTrace { locations });

        let mut labels = Vec::with_capacity(sample.labels.len());
        for label in &sample.labels {
            if let Some(label) = self.label(label)? {
                labels.push(self.profile.labels.dedup(label));
            }
        }
        let labels = self.profile.label_sets.dedup(LabelSet::new(labels));

        self.profile
            .observations
            .add(Sample::new(labels, stacktrace), &sample.values)
    }

    /// A label with neither a string, a number nor a unit carries nothing and
    /// is dropped.
    fn label(&mut self, label: &pprof::Label) -> Result<Option<Label>, DecodeError> {
        let key = self.string(label.key)?;
        if label.str != 0 {
            return Ok(Some(Label::str(key, self.string(label.str)?)));
        }
        let num_unit = match label.num_unit {
            0 if label.num == 0 => return Ok(None),
            0 => None,
            unit => Some(self.string(unit)?),
        };
        Ok(Some(Label::num(key, label.num, num_unit)))
    }

    fn location(&mut self, id: u64) -> Result<LocationId, DecodeError> {
        if let Some(location_id) = self.location_ids.get(&id) {
            return Ok(*location_id);
        }
        let location = *self
            .locations
            .get(&id)
            .ok_or(DecodeError::MissingLocation(id))?;

        let (mapping_id, address) = match location.mapping_id {
            0 => (None, location.address),
            mapping => {
                let (mapping_id, rebase) = self.mapping(mapping)?;
                (Some(mapping_id), rebase.apply(location.address))
            }
        };
        let lines = location
            .lines
            .iter()
            .map(|line| -> Result<Line, DecodeError> {
                Ok(Line {
                    function_id: self.function(line.function_id)?,
                    line: line.line,
                })
            })
            .collect::<Result<Box<[_]>, _>>()?;

        let location_id = self.profile.locations.dedup(Location {
            mapping_id,
            address,
            lines,
            is_folded: location.is_folded,
        });
        self.location_ids.insert(id, location_id);
        Ok(location_id)
    }

    /// Mappings of the same binary collapse into the first one seen, and the
    /// returned [Rebase] moves addresses onto it.
    fn mapping(&mut self, id: u64) -> Result<(MappingId, Rebase), DecodeError> {
        if let Some(imported) = self.mapping_ids.get(&id) {
            return Ok(*imported);
        }
        let mapping = *self
            .mappings
            .get(&id)
            .ok_or(DecodeError::MissingMapping(id))?;
        let filename = self.string(mapping.filename)?;
        let build_id = self.string(mapping.build_id)?;
        let mapping = Mapping {
            memory_start: mapping.memory_start,
            memory_limit: mapping.memory_limit,
            file_offset: mapping.file_offset,
            filename,
            build_id,
            has_functions: mapping.has_functions,
            has_filenames: mapping.has_filenames,
            has_line_numbers: mapping.has_line_numbers,
            has_inline_frames: mapping.has_inline_frames,
        };
        let mapping_id = self.profile.mappings.dedup(mapping);
        let rebase = get_item(&self.profile.mappings, mapping_id)
            .map(|kept| mapping.rebase_onto(kept))
            .unwrap_or_default();
        self.mapping_ids.insert(id, (mapping_id, rebase));
        Ok((mapping_id, rebase))
    }

    fn function(&mut self, id: u64) -> Result<FunctionId, DecodeError> {
        if let Some(function_id) = self.function_ids.get(&id) {
            return Ok(*function_id);
        }
        let function = *self
            .functions
            .get(&id)
            .ok_or(DecodeError::MissingFunction(id))?;
        let name = self.string(function.name)?;
        let system_name = self.string(function.system_name)?;
        let filename = self.string(function.filename)?;
        let function_id = self.profile.functions.dedup(Function {
            name,
            system_name,
            filename,
            start_line: function.start_line,
        });
        self.function_ids.insert(id, function_id);
        Ok(function_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn interns_and_aggregates() {
        let mut message = simple_pprof();
        // The same stack again, which aggregates into the first sample.
        let first = message.samples[0].clone();
        message.samples.push(first);

        let profile = Profile::try_from_pprof(&message).unwrap();
        assert_eq!(
            vec![("samples", "count"), ("wall-time", "nanoseconds")],
            profile.sample_types().collect::<Vec<_>>()
        );
        assert_eq!(2, profile.samples_len());
        assert_eq!(2, profile.locations.len());
        assert_eq!(2, profile.functions.len());
        assert_eq!(1, profile.mappings.len());

        let resolved = profile.resolved_samples();
        let main = resolved
            .iter()
            .find(|s| s.locations.len() == 1)
            .expect("sample with just main");
        assert_eq!(vec![2, 20], main.values);
    }

    #[test]
    fn empty_labels_are_dropped() {
        let mut message = simple_pprof();
        let key = intern(&mut message, "thread id");
        let first = message.samples[0].clone();
        message.samples.push(first);
        message.samples[2].labels.push(pprof::Label {
            key,
            ..Default::default()
        });

        let profile = Profile::try_from_pprof(&message).unwrap();
        assert_eq!(2, profile.samples_len());
        assert_eq!(0, profile.labels.len());
        let main = profile
            .resolved_samples()
            .into_iter()
            .find(|s| s.locations.len() == 1)
            .expect("sample with just main");
        assert!(main.labels.is_empty());
        assert_eq!(vec![2, 20], main.values);

        // The key is still checked.
        message.samples[2].labels[0].key = 1000;
        let err = Profile::try_from_pprof(&message).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::StringIndexOutOfRange { index: 1000, .. }
        ));
    }

    #[test]
    fn same_binary_at_two_addresses_is_one_mapping() {
        let mut message = simple_pprof();
        message.mappings[0].memory_start = 0x40_0000;
        message.mappings[0].memory_limit = 0x40_1000;
        message.mappings.push(pprof::Mapping {
            id: 2,
            memory_start: 0x7f_0000,
            memory_limit: 0x7f_1000,
            ..message.mappings[0]
        });
        message.locations[0].address = 0x40_0042;
        // The same code as location 1, seen through the second mapping.
        message.locations.push(pprof::Location {
            id: 3,
            mapping_id: 2,
            address: 0x7f_0042,
            ..message.locations[0].clone()
        });
        message.samples.push(pprof::Sample {
            location_ids: vec![3],
            values: vec![3, 30],
            labels: vec![],
        });

        let profile = Profile::try_from_pprof(&message).unwrap();
        assert_eq!(1, profile.mappings.len());
        assert_eq!(2, profile.locations.len());
        assert_eq!(2, profile.samples_len());

        let encoded = profile.to_pprof();
        assert_eq!(0x40_0000, encoded.mappings[0].memory_start);
        assert!(encoded.locations.iter().any(|l| l.address == 0x40_0042));
        let main = profile
            .resolved_samples()
            .into_iter()
            .find(|s| s.locations.len() == 1)
            .expect("sample with just main");
        assert_eq!(vec![4, 40], main.values);
    }

    #[test]
    fn unreferenced_items_are_dropped() {
        let mut message = simple_pprof();
        message.functions.push(pprof::Function {
            id: 99,
            name: message.string_table.len() as i64,
            ..Default::default()
        });
        message.string_table.push("unused".to_owned());

        let profile = Profile::try_from_pprof(&message).unwrap();
        assert_eq!(2, profile.functions.len());
        assert!(profile.strings.iter().all(|s| s != "unused"));
    }

    #[test]
    fn rejects_string_index_out_of_range() {
        let mut message = simple_pprof();
        message.functions[0].name = 1000;
        let err = Profile::try_from_pprof(&message).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::StringIndexOutOfRange { index: 1000, .. }
        ));

        message.functions[0].name = -1;
        let err = Profile::try_from_pprof(&message).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::StringIndexOutOfRange { index: -1, .. }
        ));
    }

    #[test]
    fn rejects_dangling_references() {
        let mut message = simple_pprof();
        message.samples[0].location_ids.push(42);
        let err = Profile::try_from_pprof(&message).unwrap_err();
        assert!(matches!(err, DecodeError::MissingLocation(42)));

        let mut message = simple_pprof();
        message.locations[0].lines[0].function_id = 42;
        let err = Profile::try_from_pprof(&message).unwrap_err();
        assert!(matches!(err, DecodeError::MissingFunction(42)));

        let mut message = simple_pprof();
        message.locations[0].mapping_id = 42;
        let err = Profile::try_from_pprof(&message).unwrap_err();
        assert!(matches!(err, DecodeError::MissingMapping(42)));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let mut message = simple_pprof();
        let duplicate = message.functions[0];
        message.functions.push(duplicate);
        let err = Profile::try_from_pprof(&message).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::DuplicateId {
                kind: "function",
                id: 1
            }
        ));
    }

    #[test]
    fn rejects_value_count_mismatch() {
        let mut message = simple_pprof();
        message.samples[1].values.pop();
        let err = Profile::try_from_pprof(&message).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::ValueCountMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn rejects_non_empty_first_string() {
        let mut message = simple_pprof();
        message.string_table[0] = "oops".to_owned();
        let err = Profile::try_from_pprof(&message).unwrap_err();
        assert!(matches!(err, DecodeError::Other(_)));
    }

    #[test]
    fn duplicate_comments_collapse() {
        let mut message = simple_pprof();
        let comment = message.string_table.len() as i64;
        message.string_table.push("note".to_owned());
        message.comment = vec![comment, comment];
        let profile = Profile::try_from_pprof(&message).unwrap();
        assert_eq!(vec!["note"], profile.comments().collect::<Vec<_>>());
    }
}
