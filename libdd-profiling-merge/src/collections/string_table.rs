// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::identifiable::{FxIndexSet, Id, StringId};

/// Holds unique strings and provides [StringId]s that correspond to the
/// order that the strings were inserted. The empty string is always
/// [StringId::ZERO], as pprof requires.
pub struct StringTable {
    strings: FxIndexSet<Box<str>>,
}

impl Default for StringTable {
    fn default() -> Self {
        Self::new()
    }
}

impl StringTable {
    pub fn new() -> Self {
        let mut strings = FxIndexSet::default();
        strings.insert(Box::<str>::from(""));
        Self { strings }
    }

    /// Returns the number of strings currently held in the string table.
    #[inline]
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Adds the string to the string table if it isn't present already, and
    /// returns a [StringId] that corresponds to the order that this string
    /// was originally inserted.
    pub fn intern(&mut self, s: &str) -> StringId {
        if s.is_empty() {
            return StringId::ZERO;
        }
        match self.strings.get_index_of(s) {
            Some(offset) => StringId::from_offset(offset),
            None => {
                let (offset, _) = self.strings.insert_full(Box::from(s));
                StringId::from_offset(offset)
            }
        }
    }

    pub fn get(&self, id: StringId) -> Option<&str> {
        self.strings.get_index(id.to_offset()).map(Box::as_ref)
    }

    /// Like [StringTable::get], but ids that aren't in the table resolve to
    /// the empty string. Only used with ids this table handed out.
    pub fn resolve(&self, id: StringId) -> &str {
        self.get(id).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.strings.iter().map(Box::as_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_is_zero() {
        let mut table = StringTable::new();
        assert_eq!(1, table.len());
        assert_eq!(StringId::ZERO, table.intern(""));
        assert_eq!(Some(""), table.get(StringId::ZERO));
    }

    #[test]
    fn intern_is_stable() {
        let mut table = StringTable::new();
        let main = table.intern("main");
        let test = table.intern("test");
        assert_eq!(main, table.intern("main"));
        assert_ne!(main, test);
        assert_eq!(vec!["", "main", "test"], table.iter().collect::<Vec<_>>());
        assert_eq!("test", table.resolve(test));
    }
}
