// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use crate::ids::*;

/// A single cell value. Date-valued columns carry their dates as text; the
/// column-level semantic type records that they parse as calendar dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Value {
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// One data record: column name to scalar value, in document order.
///
/// Key order matters for schema synthesis (columns are discovered in
/// first-seen order), so rows keep their own entry list instead of a
/// sorted map.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row(Vec<(String, Value)>);

impl Row {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(known, _)| known == &name) {
            Some(entry) => entry.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0
            .iter()
            .find(|(known, _)| known == name)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RowVisitor;

        impl<'de> Visitor<'de> for RowVisitor {
            type Value = Row;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a map of column names to scalar values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Row, A::Error> {
                let mut row = Row::new();
                while let Some((name, value)) = access.next_entry::<String, Value>()? {
                    row.insert(name, value);
                }
                Ok(row)
            }
        }

        deserializer.deserialize_map(RowVisitor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SemanticType {
    String,
    Number,
    Boolean,
    Date,
}

impl SemanticType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Date => "date",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            "date" => Some(Self::Date),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldSource {
    Original,
    Custom,
    Derived,
}

impl FieldSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Custom => "custom",
            Self::Derived => "derived",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "original" => Some(Self::Original),
            "custom" => Some(Self::Custom),
            "derived" => Some(Self::Derived),
            _ => None,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    X,
    Y,
    Color,
    Size,
    Shape,
    Detail,
}

impl Channel {
    /// Binding priority for positional suggestion fields: axes first, then
    /// legend-backed channels.
    pub const PRIORITY: [Self; 6] = [
        Self::X,
        Self::Y,
        Self::Color,
        Self::Size,
        Self::Shape,
        Self::Detail,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Color => "color",
            Self::Size => "size",
            Self::Shape => "shape",
            Self::Detail => "detail",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "x" => Some(Self::X),
            "y" => Some(Self::Y),
            "color" => Some(Self::Color),
            "size" => Some(Self::Size),
            "shape" => Some(Self::Shape),
            "detail" => Some(Self::Detail),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregate {
    Count,
    Sum,
    Mean,
    Median,
    Min,
    Max,
}

impl Aggregate {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Sum => "sum",
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Min => "min",
            Self::Max => "max",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "count" => Some(Self::Count),
            "sum" => Some(Self::Sum),
            "mean" => Some(Self::Mean),
            "median" => Some(Self::Median),
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub id: TableId,
    /// User-facing label; unlike `id`, it may collide across tables.
    pub display_id: String,
    pub names: Vec<String>,
    pub types: Vec<SemanticType>,
    pub rows: Vec<Row>,
    pub anchored: bool,
}

impl Table {
    pub fn validate(&self) -> Result<()> {
        if self.names.len() != self.types.len() {
            bail!(
                "table {} has {} column names but {} types",
                self.id,
                self.names.len(),
                self.types.len()
            );
        }
        for (index, name) in self.names.iter().enumerate() {
            if self.names[..index].contains(name) {
                bail!("table {} repeats column name {name:?}", self.id);
            }
        }
        for (row_index, row) in self.rows.iter().enumerate() {
            for (key, _) in row.iter() {
                if !self.names.iter().any(|name| name == key) {
                    bail!(
                        "row {row_index} of table {} carries unknown column {key:?}",
                        self.id
                    );
                }
            }
        }
        Ok(())
    }

    pub fn column_type(&self, name: &str) -> Option<SemanticType> {
        self.names
            .iter()
            .position(|known| known == name)
            .map(|index| self.types[index])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldItem {
    pub id: FieldId,
    pub name: String,
    pub semantic_type: SemanticType,
    pub source: FieldSource,
    /// Weak reference: the owning table may be gone; look up, never assume.
    pub table_ref: TableId,
    pub description: Option<String>,
    /// Distinct observed values, first-appearance order.
    pub domain: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelBinding {
    pub field_id: FieldId,
    pub aggregate: Option<Aggregate>,
}

pub type EncodingMap = BTreeMap<Channel, ChannelBinding>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub id: ChartId,
    pub table_ref: TableId,
    /// Open tag: external producers stray outside the documented set, so
    /// validation happens at assembly time, not here.
    pub chart_type: String,
    pub encoding: EncodingMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub message: String,
    pub severity: Severity,
}

/// Chart proposal from the agent service. Every field degrades to an empty
/// default so a sparse payload still deserializes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(default)]
    pub chart_type: String,
    #[serde(default)]
    pub visualization_fields: Vec<String>,
    #[serde(default)]
    pub recommendation: String,
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub output_fields: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::{
        Aggregate, Channel, FieldSource, Row, SemanticType, Suggestion, Table, Value,
    };
    use crate::ids::TableId;
    use anyhow::Result;

    #[test]
    fn row_serde_preserves_key_order() -> Result<()> {
        let decoded: Row = serde_json::from_str(r#"{"b":1,"a":"x","c":true}"#)?;
        let keys: Vec<&str> = decoded.iter().map(|(name, _)| name).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);

        let encoded = serde_json::to_string(&decoded)?;
        assert_eq!(encoded, r#"{"b":1.0,"a":"x","c":true}"#);
        Ok(())
    }

    #[test]
    fn row_decodes_scalar_variants() -> Result<()> {
        let decoded: Row = serde_json::from_str(r#"{"n":null,"f":2.5,"s":"hi","b":false}"#)?;
        assert_eq!(decoded.get("n"), Some(&Value::Null));
        assert_eq!(decoded.get("f"), Some(&Value::Number(2.5)));
        assert_eq!(decoded.get("s"), Some(&Value::Text("hi".to_owned())));
        assert_eq!(decoded.get("b"), Some(&Value::Bool(false)));
        assert_eq!(decoded.get("missing"), None);
        Ok(())
    }

    #[test]
    fn row_insert_overwrites_existing_key_in_place() {
        let mut row = Row::new();
        row.insert("a", 1_i64);
        row.insert("b", 2_i64);
        row.insert("a", 3_i64);
        assert_eq!(row.len(), 2);
        assert_eq!(row.get("a"), Some(&Value::Number(3.0)));
        let keys: Vec<&str> = row.iter().map(|(name, _)| name).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn table_validate_rejects_mismatched_schema() {
        let table = Table {
            id: TableId::numbered(1),
            display_id: "broken".to_owned(),
            names: vec!["a".to_owned(), "b".to_owned()],
            types: vec![SemanticType::Number],
            rows: Vec::new(),
            anchored: true,
        };
        let error = table.validate().expect_err("length mismatch should fail");
        assert!(error.to_string().contains("2 column names but 1 types"));
    }

    #[test]
    fn table_validate_rejects_unknown_row_keys() {
        let mut row = Row::new();
        row.insert("a", 1_i64);
        row.insert("stray", 2_i64);
        let table = Table {
            id: TableId::numbered(1),
            display_id: "broken".to_owned(),
            names: vec!["a".to_owned()],
            types: vec![SemanticType::Number],
            rows: vec![row],
            anchored: false,
        };
        let error = table.validate().expect_err("stray key should fail");
        assert!(error.to_string().contains("unknown column \"stray\""));
    }

    #[test]
    fn table_validate_rejects_duplicate_column_names() {
        let table = Table {
            id: TableId::numbered(1),
            display_id: "broken".to_owned(),
            names: vec!["a".to_owned(), "a".to_owned()],
            types: vec![SemanticType::Number, SemanticType::Number],
            rows: Vec::new(),
            anchored: false,
        };
        let error = table.validate().expect_err("duplicate name should fail");
        assert!(error.to_string().contains("repeats column name"));
    }

    #[test]
    fn channel_priority_starts_with_axes() {
        assert_eq!(Channel::PRIORITY[0], Channel::X);
        assert_eq!(Channel::PRIORITY[1], Channel::Y);
        assert_eq!(Channel::parse("color"), Some(Channel::Color));
        assert_eq!(Channel::parse("theta"), None);
    }

    #[test]
    fn closed_set_round_trips() {
        for source in [FieldSource::Original, FieldSource::Custom, FieldSource::Derived] {
            assert_eq!(FieldSource::parse(source.as_str()), Some(source));
        }
        for semantic in [
            SemanticType::String,
            SemanticType::Number,
            SemanticType::Boolean,
            SemanticType::Date,
        ] {
            assert_eq!(SemanticType::parse(semantic.as_str()), Some(semantic));
        }
        assert_eq!(Aggregate::parse("mean"), Some(Aggregate::Mean));
        assert_eq!(Aggregate::parse("mode"), None);
    }

    #[test]
    fn sparse_suggestion_decodes_with_defaults() -> Result<()> {
        let decoded: Suggestion = serde_json::from_str(r#"{"chart_type":"bar"}"#)?;
        assert_eq!(decoded.chart_type, "bar");
        assert!(decoded.visualization_fields.is_empty());
        assert!(decoded.recommendation.is_empty());
        assert!(decoded.mode.is_empty());
        assert!(decoded.output_fields.is_empty());
        Ok(())
    }
}
