#![forbid(unsafe_code)]

//! Declarative layout documents.
//!
//! A layout is a TOML document with one optional `[keyboard]` table of
//! defaults and a `[[row]]` array, each row holding a `[[row.key]]` array:
//!
//! ```toml
//! [keyboard]
//! key_width = "10%p"
//! key_height = 50
//!
//! [[row]]
//! mode = 0
//!
//! [[row.key]]
//! label = "q"
//! popup_characters = "1"
//! ```
//!
//! Structure is validated once, when the document is loaded: unknown
//! elements, keys outside a row, and wrongly shaped elements are
//! [`LayoutParseError`]s. Attribute values are only read when a keyboard is
//! built, and a value that does not parse silently yields the inherited
//! default (see [`Attrs`]).

use std::path::Path;

use tapboard_core::codes::{self, KeyCode};
use tapboard_core::geometry::EdgeFlags;
use toml::{Table, Value};

use crate::dimension::Dimension;
use crate::error::{LayoutParseError, Result};

const KEYBOARD: &str = "keyboard";
const ROW: &str = "row";
const KEY: &str = "key";

/// A structurally valid layout document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayoutSource {
    pub(crate) keyboard: Table,
    pub(crate) rows: Vec<RowSource>,
}

/// One `[[row]]` element.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct RowSource {
    pub(crate) attrs: Table,
    pub(crate) keys: Vec<Table>,
}

impl LayoutSource {
    /// Parse and validate a layout document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let document: Table = s.parse()?;
        Self::from_table(document)
    }

    /// Load a layout document from disk.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    fn from_table(document: Table) -> Result<Self> {
        let mut source = LayoutSource::default();
        for (name, value) in document {
            match name.as_str() {
                KEYBOARD => {
                    let Value::Table(table) = value else {
                        return Err(malformed(KEYBOARD, "a table"));
                    };
                    source.keyboard = attributes_only(KEYBOARD, table)?;
                }
                ROW => {
                    let Value::Array(rows) = value else {
                        return Err(malformed(ROW, "an array of tables"));
                    };
                    for row in rows {
                        let Value::Table(table) = row else {
                            return Err(malformed(ROW, "an array of tables"));
                        };
                        source.rows.push(RowSource::from_table(table)?);
                    }
                }
                KEY => return Err(LayoutParseError::KeyOutsideRow),
                _ if is_element(&value) => {
                    return Err(LayoutParseError::UnknownElement {
                        parent: "layout".into(),
                        name,
                    });
                }
                _ => {
                    tracing::trace!(attribute = %name, "ignoring top-level attribute");
                }
            }
        }
        Ok(source)
    }

    /// Number of rows declared, before mode filtering.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

impl RowSource {
    fn from_table(table: Table) -> Result<Self> {
        let mut row = RowSource::default();
        for (name, value) in table {
            if name == KEY {
                let Value::Array(keys) = value else {
                    return Err(malformed("row.key", "an array of tables"));
                };
                for key in keys {
                    let Value::Table(key) = key else {
                        return Err(malformed("row.key", "an array of tables"));
                    };
                    row.keys.push(attributes_only("row.key", key)?);
                }
            } else if is_element(&value) {
                return Err(LayoutParseError::UnknownElement {
                    parent: ROW.into(),
                    name,
                });
            } else {
                row.attrs.insert(name, value);
            }
        }
        Ok(row)
    }
}

/// Tables and arrays of tables are elements; everything else is an attribute.
fn is_element(value: &Value) -> bool {
    match value {
        Value::Table(_) => true,
        Value::Array(items) => !items.is_empty() && items.iter().all(Value::is_table),
        _ => false,
    }
}

fn attributes_only(parent: &str, table: Table) -> Result<Table> {
    if let Some((name, _)) = table.iter().find(|(_, value)| is_element(value)) {
        if name == KEY {
            return Err(LayoutParseError::KeyOutsideRow);
        }
        return Err(LayoutParseError::UnknownElement {
            parent: parent.into(),
            name: name.clone(),
        });
    }
    Ok(table)
}

fn malformed(name: &str, expected: &'static str) -> LayoutParseError {
    LayoutParseError::MalformedElement {
        name: name.into(),
        expected,
    }
}

// ---------------------------------------------------------------------------
// Attribute access with silent fallback
// ---------------------------------------------------------------------------

/// Typed, forgiving view over an element's attributes.
///
/// Every accessor takes the value to use when the attribute is missing or
/// does not parse; a present-but-malformed value is logged at trace level
/// and otherwise ignored.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Attrs<'a> {
    table: &'a Table,
    element: &'static str,
}

impl<'a> Attrs<'a> {
    pub(crate) fn new(table: &'a Table, element: &'static str) -> Self {
        Self { table, element }
    }

    fn fallback(&self, name: &str, value: &Value) {
        tracing::trace!(
            element = self.element,
            attribute = name,
            value = %value,
            "malformed attribute, using default"
        );
    }

    pub(crate) fn dimension(&self, name: &str, reference: i32, default: i32) -> i32 {
        let Some(value) = self.table.get(name) else {
            return default;
        };
        match Dimension::from_value(value) {
            Some(dimension) => dimension.resolve(reference),
            None => {
                self.fallback(name, value);
                default
            }
        }
    }

    pub(crate) fn int(&self, name: &str, default: i64) -> i64 {
        match self.table.get(name) {
            None => default,
            Some(Value::Integer(n)) => *n,
            Some(value @ Value::String(s)) => s.trim().parse().unwrap_or_else(|_| {
                self.fallback(name, value);
                default
            }),
            Some(other) => {
                self.fallback(name, other);
                default
            }
        }
    }

    pub(crate) fn flag(&self, name: &str, default: bool) -> bool {
        match self.table.get(name) {
            None => default,
            Some(Value::Boolean(b)) => *b,
            Some(Value::String(s)) => match s.trim() {
                "true" => true,
                "false" => false,
                _ => {
                    self.fallback(name, &Value::String(s.clone()));
                    default
                }
            },
            Some(other) => {
                self.fallback(name, other);
                default
            }
        }
    }

    pub(crate) fn string(&self, name: &str) -> Option<String> {
        match self.table.get(name)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::String(_) => None,
            other => {
                self.fallback(name, other);
                None
            }
        }
    }

    /// `codes` as an integer, a comma-separated string, or an integer array.
    pub(crate) fn codes(&self) -> Vec<KeyCode> {
        let Some(value) = self.table.get("codes") else {
            return Vec::new();
        };
        let codes: Vec<KeyCode> = match value {
            Value::Integer(n) => i32::try_from(*n).into_iter().collect(),
            Value::String(s) => codes::parse_code_list(s),
            Value::Array(items) => items
                .iter()
                .filter_map(Value::as_integer)
                .filter_map(|n| i32::try_from(n).ok())
                .collect(),
            _ => Vec::new(),
        };
        if codes.is_empty() {
            self.fallback("codes", value);
        }
        codes
    }

    /// `edge` as one name, a `|`/`,` separated string, or an array of names.
    pub(crate) fn edges(&self) -> EdgeFlags {
        let Some(value) = self.table.get("edge") else {
            return EdgeFlags::empty();
        };
        let mut flags = EdgeFlags::empty();
        let mut add = |name: &str| match EdgeFlags::parse_edge(name) {
            Some(edge) => flags |= edge,
            None => self.fallback("edge", value),
        };
        match value {
            Value::String(s) => s
                .split(['|', ','])
                .filter(|part| !part.trim().is_empty())
                .for_each(&mut add),
            Value::Array(items) => items.iter().filter_map(Value::as_str).for_each(&mut add),
            other => self.fallback("edge", other),
        }
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rows_and_keys() {
        let source = LayoutSource::from_toml_str(
            r#"
            [keyboard]
            key_width = "10%p"

            [[row]]
            mode = 1
            [[row.key]]
            label = "q"
            [[row.key]]
            label = "w"

            [[row]]
            [[row.key]]
            codes = -5
            "#,
        )
        .unwrap();
        assert_eq!(source.row_count(), 2);
        assert_eq!(source.rows[0].keys.len(), 2);
        assert_eq!(source.rows[1].keys.len(), 1);
        assert!(source.keyboard.contains_key("key_width"));
    }

    #[test]
    fn syntax_errors_abort() {
        let err = LayoutSource::from_toml_str("[[row]\n[[row.key]]\nlabel = \"a\"").unwrap_err();
        assert!(matches!(err, LayoutParseError::Syntax(_)));
    }

    #[test]
    fn unknown_elements_abort() {
        let err = LayoutSource::from_toml_str("[[column]]\nx = 1\n").unwrap_err();
        assert!(matches!(
            err,
            LayoutParseError::UnknownElement { ref name, .. } if name == "column"
        ));

        let err = LayoutSource::from_toml_str("[[row]]\n[[row.button]]\nlabel = \"a\"\n")
            .unwrap_err();
        assert!(matches!(
            err,
            LayoutParseError::UnknownElement { ref parent, ref name } if parent == "row" && name == "button"
        ));

        let err =
            LayoutSource::from_toml_str("[[row]]\n[[row.key]]\n[row.key.extra]\nx = 1\n")
                .unwrap_err();
        assert!(matches!(err, LayoutParseError::UnknownElement { .. }));
    }

    #[test]
    fn keys_outside_rows_abort() {
        let err = LayoutSource::from_toml_str("[[key]]\nlabel = \"a\"\n").unwrap_err();
        assert!(matches!(err, LayoutParseError::KeyOutsideRow));

        let err = LayoutSource::from_toml_str("[keyboard]\n[[keyboard.key]]\nlabel = \"a\"\n")
            .unwrap_err();
        assert!(matches!(err, LayoutParseError::KeyOutsideRow));
    }

    #[test]
    fn wrongly_shaped_elements_abort() {
        let err = LayoutSource::from_toml_str("row = 3\n").unwrap_err();
        assert!(matches!(err, LayoutParseError::MalformedElement { .. }));
        let err = LayoutSource::from_toml_str("keyboard = \"qwerty\"\n").unwrap_err();
        assert!(matches!(err, LayoutParseError::MalformedElement { .. }));
        let err = LayoutSource::from_toml_str("[[row]]\nkey = \"a\"\n").unwrap_err();
        assert!(matches!(err, LayoutParseError::MalformedElement { .. }));
    }

    #[test]
    fn attributes_fall_back_silently() {
        let table: Table = r#"
            key_width = "wide"
            key_height = 40
            horizontal_gap = "5%"
            sticky = "yes"
            repeatable = "true"
            mode = "2"
            label = 7
            codes = "nope"
            edge = ["left", "sideways"]
        "#
        .parse()
        .unwrap();
        let attrs = Attrs::new(&table, "key");
        assert_eq!(attrs.dimension("key_width", 400, 33), 33);
        assert_eq!(attrs.dimension("key_height", 400, 33), 40);
        assert_eq!(attrs.dimension("horizontal_gap", 400, 0), 20);
        assert_eq!(attrs.dimension("missing", 400, 9), 9);
        assert!(!attrs.flag("sticky", false));
        assert!(attrs.flag("repeatable", false));
        assert_eq!(attrs.int("mode", 0), 2);
        assert_eq!(attrs.string("label"), None);
        assert!(attrs.codes().is_empty());
        assert_eq!(attrs.edges(), EdgeFlags::LEFT);
    }

    #[test]
    fn code_forms() {
        let table: Table = "codes = [97, 225]".parse().unwrap();
        assert_eq!(Attrs::new(&table, "key").codes(), vec![97, 225]);
        let table: Table = "codes = \"97,225,224\"".parse().unwrap();
        assert_eq!(Attrs::new(&table, "key").codes(), vec![97, 225, 224]);
        let table: Table = "codes = -1".parse().unwrap();
        assert_eq!(Attrs::new(&table, "key").codes(), vec![codes::SHIFT]);
    }

    #[test]
    fn edge_string_forms() {
        let table: Table = "edge = \"top|left\"".parse().unwrap();
        assert_eq!(
            Attrs::new(&table, "row").edges(),
            EdgeFlags::TOP | EdgeFlags::LEFT
        );
    }
}
