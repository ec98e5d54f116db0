//! Defined names
//!
//! A defined name maps an identifier to formula text, e.g. `TaxRate` to
//! `Sheet1!$B$1` or `0.0725`. Names are case-insensitive and may be scoped to a
//! single sheet, in which case they shadow a workbook-wide name of the same spelling.

use crate::error::{Error, Result};
use std::collections::HashMap;

/// Scope of a defined name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameScope {
    /// Visible from every sheet
    Workbook,
    /// Visible only from the sheet with this index
    Sheet(usize),
}

/// A defined name and the formula text it stands for
#[derive(Debug, Clone, PartialEq)]
pub struct NamedRange {
    /// Name as originally spelled
    pub name: String,
    /// Where the name is visible
    pub scope: NameScope,
    /// Formula text without a leading `=` (e.g. `Sheet1!$A$1:$A$10`)
    pub refers_to: String,
}

impl NamedRange {
    /// Create a new defined name, stripping a leading `=` from `refers_to`
    pub fn new(name: impl Into<String>, refers_to: impl Into<String>, scope: NameScope) -> Self {
        let refers_to = refers_to.into();
        let refers_to = match refers_to.strip_prefix('=') {
            Some(rest) => rest.to_string(),
            None => refers_to,
        };
        Self {
            name: name.into(),
            scope,
            refers_to,
        }
    }

    /// Formula text for the name, with a leading `=`
    pub fn formula(&self) -> String {
        format!("={}", self.refers_to)
    }
}

/// Check that a name is usable as a defined name
///
/// The first character must be a letter, `_` or `\`; the rest letters, digits, `_` or `.`.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_alphabetic() || first == '_' || first == '\\')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '.')
        && !name.eq_ignore_ascii_case("TRUE")
        && !name.eq_ignore_ascii_case("FALSE")
}

/// Case-insensitive store of defined names
#[derive(Debug, Default, Clone)]
pub struct NamedRangeCollection {
    ranges: HashMap<(String, NameScope), NamedRange>,
}

impl NamedRangeCollection {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    fn key(name: &str, scope: NameScope) -> (String, NameScope) {
        (name.to_lowercase(), scope)
    }

    /// Add a name, failing if it is malformed or already defined in the same scope
    pub fn define(&mut self, range: NamedRange) -> Result<()> {
        if !is_valid_name(&range.name) {
            return Err(Error::InvalidName(range.name));
        }
        let key = Self::key(&range.name, range.scope);
        if self.ranges.contains_key(&key) {
            return Err(Error::InvalidName(format!(
                "'{}' is already defined in this scope",
                range.name
            )));
        }
        self.ranges.insert(key, range);
        Ok(())
    }

    /// Look a name up as seen from `current_sheet`
    ///
    /// A sheet-scoped definition wins over the workbook-wide one.
    pub fn get(&self, name: &str, current_sheet: usize) -> Option<&NamedRange> {
        self.ranges
            .get(&Self::key(name, NameScope::Sheet(current_sheet)))
            .or_else(|| self.ranges.get(&Self::key(name, NameScope::Workbook)))
    }

    /// Remove a name from a scope
    pub fn remove(&mut self, name: &str, scope: NameScope) -> Option<NamedRange> {
        self.ranges.remove(&Self::key(name, scope))
    }

    /// Iterate over all names (unordered)
    pub fn iter(&self) -> impl Iterator<Item = &NamedRange> {
        self.ranges.values()
    }

    /// Number of defined names
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Whether no names are defined
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refers_to_strips_equals() {
        let name = NamedRange::new("Total", "=SUM(A1:A3)", NameScope::Workbook);
        assert_eq!(name.refers_to, "SUM(A1:A3)");
        assert_eq!(name.formula(), "=SUM(A1:A3)");
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let mut names = NamedRangeCollection::new();
        names
            .define(NamedRange::new("TaxRate", "0.07", NameScope::Workbook))
            .unwrap();
        assert_eq!(names.get("TAXRATE", 0).unwrap().refers_to, "0.07");
        assert!(names.get("Other", 0).is_none());
    }

    #[test]
    fn test_sheet_scope_shadows_workbook_scope() {
        let mut names = NamedRangeCollection::new();
        names
            .define(NamedRange::new("Rate", "1", NameScope::Workbook))
            .unwrap();
        names
            .define(NamedRange::new("Rate", "2", NameScope::Sheet(1)))
            .unwrap();

        assert_eq!(names.get("rate", 0).unwrap().refers_to, "1");
        assert_eq!(names.get("rate", 1).unwrap().refers_to, "2");
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn test_define_rejects_duplicates_and_bad_names() {
        let mut names = NamedRangeCollection::new();
        names
            .define(NamedRange::new("x", "1", NameScope::Workbook))
            .unwrap();
        assert!(names
            .define(NamedRange::new("X", "2", NameScope::Workbook))
            .is_err());
        assert!(names
            .define(NamedRange::new("1abc", "2", NameScope::Workbook))
            .is_err());
        assert!(names
            .define(NamedRange::new("true", "2", NameScope::Workbook))
            .is_err());
        assert!(names
            .define(NamedRange::new("my name", "2", NameScope::Workbook))
            .is_err());
    }

    #[test]
    fn test_valid_names() {
        assert!(is_valid_name("_private"));
        assert!(is_valid_name("Sales.2024"));
        assert!(!is_valid_name(""));
    }
}
