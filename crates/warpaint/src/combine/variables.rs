//! Per-combine variable table.
//!
//! Most schema fields are [VarField]s: a literal string, a reference into
//! this table, or both. The table is rebuilt for every combine from four
//! layers in falling precedence: item-instance data, the item definition's
//! per-wear assignments, the item definition's header, and the paint kit's
//! header. A later layer only fills names still unset, except that a header
//! variable marked non-inheritable always overwrites.
use std::collections::HashMap;

use crate::schema::{Assignment, HeaderVariable, VarField};

/// Name to value map resolving variable-indirected schema fields.
#[derive(Debug, Clone, Default)]
pub struct VariableTable {
    values: HashMap<String, String>,
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` unconditionally.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Sets `name` only when no earlier layer claimed it.
    pub fn set_default(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.entry(name.into()).or_insert_with(|| value.into());
    }

    /// Header-variable write: inheritable values defer to earlier layers,
    /// non-inheritable values overwrite.
    pub fn declare(&mut self, name: impl Into<String>, value: impl Into<String>, inherit: Option<bool>) {
        if inherit == Some(false) {
            self.set(name, value);
        } else {
            self.set_default(name, value);
        }
    }

    /// Applies item-instance assignments, overwriting prior values. Entries
    /// missing a name or a value are skipped.
    pub fn assign(&mut self, assignments: &[Assignment]) {
        for assignment in assignments {
            if let (Some(name), Some(value)) = (&assignment.variable, &assignment.string) {
                self.set(name.clone(), value.clone());
            }
        }
    }

    /// Applies assignments that yield to anything already set.
    pub fn assign_defaults(&mut self, assignments: &[Assignment]) {
        for assignment in assignments {
            if let (Some(name), Some(value)) = (&assignment.variable, &assignment.string) {
                self.set_default(name.clone(), value.clone());
            }
        }
    }

    /// Applies a header's variable list via [declare](Self::declare).
    pub fn declare_headers(&mut self, variables: &[HeaderVariable]) {
        for variable in variables {
            if let (Some(name), Some(value)) = (&variable.name, &variable.value) {
                self.declare(name.clone(), value.clone(), variable.inherit);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Resolves a literal-or-variable field.
    ///
    /// A named variable wins when the table holds a non-empty value for it;
    /// anything else falls back to the field's literal, which may itself be
    /// absent. An absent field resolves to nothing.
    pub fn resolve(&self, field: Option<&VarField>) -> Option<String> {
        let field = field?;
        if let Some(name) = field.variable.as_deref() {
            if !name.is_empty() {
                if let Some(value) = self.values.get(name) {
                    if !value.is_empty() {
                        return Some(value.clone());
                    }
                }
            }
        }
        field.string.clone()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment(name: &str, value: &str) -> Assignment {
        Assignment {
            variable: Some(name.to_owned()),
            string: Some(value.to_owned()),
        }
    }

    fn header_variable(name: &str, value: &str, inherit: Option<bool>) -> HeaderVariable {
        HeaderVariable {
            name: Some(name.to_owned()),
            value: Some(value.to_owned()),
            inherit,
        }
    }

    #[test]
    fn set_default_keeps_the_first_value() {
        let mut table = VariableTable::new();
        table.set("x", "1");
        table.set_default("x", "2");
        table.set_default("y", "3");
        assert_eq!(table.get("x"), Some("1"));
        assert_eq!(table.get("y"), Some("3"));
    }

    #[test]
    fn non_inheritable_header_overwrites() {
        let mut table = VariableTable::new();
        table.assign(&[assignment("x", "1")]);
        table.declare_headers(&[header_variable("x", "2", Some(true))]);
        assert_eq!(table.get("x"), Some("1"));

        table.declare_headers(&[header_variable("x", "3", Some(false))]);
        assert_eq!(table.get("x"), Some("3"));
    }

    #[test]
    fn all_inheritable_layers_keep_the_first_set() {
        let mut table = VariableTable::new();
        table.assign(&[assignment("x", "1")]);
        table.declare_headers(&[header_variable("x", "2", None)]);
        table.declare_headers(&[header_variable("x", "3", Some(true))]);
        assert_eq!(table.get("x"), Some("1"));
    }

    #[test]
    fn incomplete_entries_are_skipped() {
        let mut table = VariableTable::new();
        table.assign(&[Assignment {
            variable: Some("x".to_owned()),
            string: None,
        }]);
        table.declare_headers(&[HeaderVariable {
            name: None,
            value: Some("7".to_owned()),
            inherit: None,
        }]);
        assert!(table.is_empty());

        table.declare_headers(&[header_variable("x", "header", None)]);
        assert_eq!(table.get("x"), Some("header"));
    }

    #[test]
    fn resolve_prefers_the_table_value() {
        let mut table = VariableTable::new();
        table.set("tint", "0 128");

        let field = VarField {
            variable: Some("tint".to_owned()),
            string: Some("0 255".to_owned()),
        };
        assert_eq!(table.resolve(Some(&field)), Some("0 128".to_owned()));
        assert_eq!(
            table.resolve(Some(&VarField::reference("missing"))),
            None
        );
        assert_eq!(table.resolve(None), None);
    }

    #[test]
    fn empty_table_values_fall_back_to_the_literal() {
        let mut table = VariableTable::new();
        table.set("tint", "");

        let field = VarField {
            variable: Some("tint".to_owned()),
            string: Some("0 255".to_owned()),
        };
        assert_eq!(table.resolve(Some(&field)), Some("0 255".to_owned()));
    }

    #[test]
    fn empty_variable_names_are_ignored() {
        let mut table = VariableTable::new();
        table.set("", "never");

        let field = VarField {
            variable: Some(String::new()),
            string: Some("literal".to_owned()),
        };
        assert_eq!(table.resolve(Some(&field)), Some("literal".to_owned()));
    }
}
