// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::*;
use std::hash::{Hash, Hasher};

/// Represents a [pprof::Mapping] with some space-saving changes:
///  - The id is not stored on the struct. It's stored in the container that holds the struct.
///  - ids for linked objects use 32-bit numbers instead of 64 bit ones.
///
/// Two mappings are equal when they map the same part of the same binary,
/// wherever it was loaded: equality and hashing only look at the size
/// rounded up to whole pages, the file offset, and the build id (or the
/// filename when there is no build id).
#[derive(Copy, Clone, Debug)]
pub struct Mapping {
    pub memory_start: u64,
    pub memory_limit: u64,
    pub file_offset: u64,
    pub filename: StringId,
    pub build_id: StringId,
    pub has_functions: bool,
    pub has_filenames: bool,
    pub has_line_numbers: bool,
    pub has_inline_frames: bool,
}

const PAGE_SIZE: u64 = 0x1000;

impl Mapping {
    fn key(&self) -> (u64, u64, StringId) {
        let size = self.memory_limit.wrapping_sub(self.memory_start);
        let size = size.wrapping_add(PAGE_SIZE - 1) & !(PAGE_SIZE - 1);
        let binary = if self.build_id.is_zero() {
            self.filename
        } else {
            self.build_id
        };
        (size, self.file_offset, binary)
    }

    /// How far addresses inside `self` move to land on the same spot inside
    /// `kept`, an equal mapping that may be loaded elsewhere.
    pub fn rebase_onto(&self, kept: &Mapping) -> Rebase {
        Rebase(kept.memory_start.wrapping_sub(self.memory_start))
    }
}

/// The distance between two equal mappings.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Rebase(u64);

impl Rebase {
    /// Address 0 means the address is unknown and stays 0.
    pub fn apply(self, address: u64) -> u64 {
        if address == 0 {
            return 0;
        }
        address.wrapping_add(self.0)
    }
}

impl PartialEq for Mapping {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Mapping {}

impl Hash for Mapping {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state)
    }
}

impl Item for Mapping {
    type Id = MappingId;
}

impl PprofItem for Mapping {
    type PprofMessage = pprof::Mapping;

    fn to_pprof(&self, id: Self::Id) -> Self::PprofMessage {
        pprof::Mapping {
            id: id.to_raw_id(),
            memory_start: self.memory_start,
            memory_limit: self.memory_limit,
            file_offset: self.file_offset,
            filename: self.filename.to_raw_id(),
            build_id: self.build_id.to_raw_id(),
            has_functions: self.has_functions,
            has_filenames: self.has_filenames,
            has_line_numbers: self.has_line_numbers,
            has_inline_frames: self.has_inline_frames,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct MappingId(NonZeroU32);

impl Id for MappingId {
    type RawId = u64;

    fn from_offset(offset: usize) -> Self {
        #[allow(clippy::expect_used)]
        Self(small_non_zero_pprof_id(offset).expect("MappingId to fit into a u32"))
    }

    fn to_offset(&self) -> usize {
        (self.0.get() - 1) as usize
    }

    fn to_raw_id(&self) -> Self::RawId {
        self.0.get().into()
    }
}
