// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::*;

/// An offset into a pprof string table. Offset zero is always the empty
/// string.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct StringId(u32);

impl StringId {
    pub const ZERO: StringId = StringId(0);

    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl Id for StringId {
    type RawId = i64;

    fn from_offset(inner: usize) -> Self {
        #[allow(clippy::expect_used)]
        let offset: u32 = inner.try_into().expect("StringId to fit into a u32");
        Self(offset)
    }

    fn to_offset(&self) -> usize {
        self.0 as usize
    }

    fn to_raw_id(&self) -> Self::RawId {
        Self::RawId::from(self.0)
    }
}
