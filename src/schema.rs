//! Record schema configuration.
//!
//! The engine does not define records. Its host supplies two things, both
//! immutable after construction and shared by reference across evaluation
//! calls:
//!
//! - a [`Schema`]: the fixed set of named attributes with their kinds,
//!   human-friendly aliases, and per-attribute label-normalization tables;
//! - a [`Record`] implementation: the attribute-name-to-value resolver for
//!   whatever concrete record type the host stores.
//!
//! Field-name lookup is case-insensitive and ignores separator characters,
//! so `credit_limit`, `CreditLimit`, and `creditlimit` all resolve to the
//! same attribute.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::ResolveError;

/// Attribute type in the record schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Decimal,
}

/// A single attribute value as handed back by a record resolver.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Decimal(Decimal),
}

impl FieldValue {
    /// String form, used by substring predicates, term grouping, and as the
    /// fallback sort key.
    pub fn as_string(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Integer(n) => n.to_string(),
            FieldValue::Decimal(d) => d.to_string(),
        }
    }

    /// Numeric form if the value is numeric or parses as a number.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            FieldValue::Integer(n) => Some(Decimal::from(*n)),
            FieldValue::Decimal(d) => Some(*d),
            FieldValue::Text(s) => Decimal::from_str(s.trim()).ok(),
        }
    }
}

/// Fold a field name or label for lookup: lowercase, separators stripped.
fn fold(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Bidirectional label-normalization table for one attribute.
///
/// Maps localized or alternate labels to a canonical label so that, e.g.,
/// a low-risk label in one language equals the low-risk label in another.
/// Canonical labels always map to themselves. Numeric attributes carry no
/// table and bypass normalization entirely.
#[derive(Debug, Clone, Default)]
pub struct LabelTable {
    canonical: HashMap<String, String>,
}

impl LabelTable {
    pub fn new<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut canonical = HashMap::new();
        for (label, target) in entries {
            canonical.insert(fold(label), target.to_string());
            canonical.insert(fold(target), target.to_string());
        }
        LabelTable { canonical }
    }

    /// Canonical form of a raw label; labels outside the table pass through
    /// unchanged.
    pub fn normalize(&self, raw: &str) -> String {
        match self.canonical.get(&fold(raw)) {
            Some(target) => target.clone(),
            None => raw.to_string(),
        }
    }
}

/// Definition of one attribute in the schema.
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Canonical attribute name, as passed to [`Record::field`]
    pub name: String,
    pub kind: FieldKind,
    aliases: Vec<String>,
    labels: Option<LabelTable>,
}

impl FieldDef {
    pub fn labels(&self) -> Option<&LabelTable> {
        self.labels.as_ref()
    }
}

/// Immutable per-deployment schema: attribute names, aliases, and label
/// tables. Built once at startup and passed by reference into evaluators.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<FieldDef>,
    lookup: HashMap<String, usize>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder { fields: Vec::new() }
    }

    /// Resolve a free-text field name from a query to its definition.
    /// Lookup folds case and separators and honors configured aliases.
    pub fn resolve(&self, name: &str) -> Option<&FieldDef> {
        self.lookup.get(&fold(name)).map(|&idx| &self.fields[idx])
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }
}

/// Fluent builder for [`Schema`]. `alias` and `labels` apply to the most
/// recently added field.
#[derive(Debug)]
pub struct SchemaBuilder {
    fields: Vec<FieldDef>,
}

impl SchemaBuilder {
    pub fn field(mut self, name: &str, kind: FieldKind) -> Self {
        self.fields.push(FieldDef {
            name: name.to_string(),
            kind,
            aliases: Vec::new(),
            labels: None,
        });
        self
    }

    pub fn alias(mut self, alias: &str) -> Self {
        if let Some(last) = self.fields.last_mut() {
            last.aliases.push(alias.to_string());
        }
        self
    }

    pub fn labels<'a>(mut self, entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        if let Some(last) = self.fields.last_mut() {
            last.labels = Some(LabelTable::new(entries));
        }
        self
    }

    pub fn build(self) -> Schema {
        let mut lookup = HashMap::new();
        for (idx, field) in self.fields.iter().enumerate() {
            lookup.insert(fold(&field.name), idx);
            for alias in &field.aliases {
                lookup.insert(fold(alias), idx);
            }
        }
        Schema {
            fields: self.fields,
            lookup,
        }
    }
}

/// Host-supplied attribute resolver for one record type.
///
/// The evaluator calls this with the canonical attribute name from the
/// schema. Returning `Ok(None)` means the attribute is absent for this
/// record; an `Err` aborts the whole evaluation as an
/// [`EvalError`](crate::error::EvalError).
pub trait Record {
    fn field(&self, attribute: &str) -> Result<Option<FieldValue>, ResolveError>;
}

/// Simple map-backed record used by the CLI and tests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatRecord {
    values: BTreeMap<String, FieldValue>,
}

impl FlatRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style attribute insertion.
    pub fn with(mut self, name: &str, value: FieldValue) -> Self {
        self.values.insert(name.to_string(), value);
        self
    }

    pub fn insert(&mut self, name: &str, value: FieldValue) {
        self.values.insert(name.to_string(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.values.iter()
    }
}

impl Record for FlatRecord {
    fn field(&self, attribute: &str) -> Result<Option<FieldValue>, ResolveError> {
        Ok(self.values.get(attribute).cloned())
    }
}

#[test]
fn test_field_name_folding() {
    let schema = Schema::builder()
        .field("credit_limit", FieldKind::Decimal)
        .alias("limit")
        .build();
    for name in ["credit_limit", "CreditLimit", "creditlimit", "LIMIT", "limit"] {
        assert_eq!(schema.resolve(name).map(|f| f.name.as_str()), Some("credit_limit"), "{name}");
    }
    assert!(schema.resolve("risk").is_none());
}

#[test]
fn test_label_normalization_is_bidirectional() {
    let table = LabelTable::new([("Basso", "Low"), ("Medio", "Medium"), ("Alto", "High")]);
    assert_eq!(table.normalize("basso"), "Low");
    assert_eq!(table.normalize("Low"), "Low");
    assert_eq!(table.normalize("LOW"), "Low");
    assert_eq!(table.normalize("unrelated"), "unrelated");
}
