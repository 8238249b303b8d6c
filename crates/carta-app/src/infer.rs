// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::Date;
use time::macros::format_description;

use crate::ids::{FieldId, TableId};
use crate::model::{FieldItem, FieldSource, Row, SemanticType, Value};

/// Schema and per-column value domains observed in one pass over a row set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowScan {
    pub names: Vec<String>,
    pub types: Vec<SemanticType>,
    pub domains: Vec<Vec<Value>>,
}

/// Scans rows once, collecting the column union in first-seen order, a
/// best-effort semantic type per column, and each column's distinct values
/// in first-appearance order.
///
/// The type heuristic trusts the first non-null value that defines a key;
/// it does not unify conflicting later rows. Columns that never see a
/// non-null value fall back to String.
pub fn scan_rows(rows: &[Row]) -> RowScan {
    let mut names: Vec<String> = Vec::new();
    let mut types: Vec<Option<SemanticType>> = Vec::new();
    let mut domains: Vec<Vec<Value>> = Vec::new();

    for row in rows {
        for (name, value) in row.iter() {
            let index = match names.iter().position(|known| known == name) {
                Some(index) => index,
                None => {
                    names.push(name.to_owned());
                    types.push(None);
                    domains.push(Vec::new());
                    names.len() - 1
                }
            };
            if types[index].is_none() {
                types[index] = infer_value_type(value);
            }
            if !domains[index].contains(value) {
                domains[index].push(value.clone());
            }
        }
    }

    RowScan {
        names,
        types: types
            .into_iter()
            .map(|slot| slot.unwrap_or(SemanticType::String))
            .collect(),
        domains,
    }
}

/// Builds a value-free scan from declared column names, deduplicated in
/// first-seen order. Used when a suggestion arrives with no data rows.
pub fn schema_from_names<S: AsRef<str>>(declared: &[S]) -> RowScan {
    let mut scan = RowScan::default();
    for name in declared {
        let name = name.as_ref();
        if name.is_empty() || scan.names.iter().any(|known| known == name) {
            continue;
        }
        scan.names.push(name.to_owned());
        scan.types.push(SemanticType::String);
        scan.domains.push(Vec::new());
    }
    scan
}

/// One field item per scanned column, owned by `table_id` and tagged as
/// original source data.
pub fn field_items_for_scan(table_id: &TableId, scan: &RowScan) -> Vec<FieldItem> {
    scan.names
        .iter()
        .zip(&scan.types)
        .zip(&scan.domains)
        .map(|((name, semantic_type), domain)| FieldItem {
            id: FieldId::compose(FieldSource::Original, table_id, name),
            name: name.clone(),
            semantic_type: *semantic_type,
            source: FieldSource::Original,
            table_ref: table_id.clone(),
            description: None,
            domain: domain.clone(),
        })
        .collect()
}

pub fn infer_value_type(value: &Value) -> Option<SemanticType> {
    match value {
        Value::Null => None,
        Value::Bool(_) => Some(SemanticType::Boolean),
        Value::Number(_) => Some(SemanticType::Number),
        Value::Text(text) => Some(if parses_as_date(text) {
            SemanticType::Date
        } else {
            SemanticType::String
        }),
    }
}

fn parses_as_date(raw: &str) -> bool {
    let trimmed = raw.trim();
    Date::parse(trimmed, &format_description!("[year]-[month]-[day]")).is_ok()
        || Date::parse(trimmed, &format_description!("[month]/[day]/[year]")).is_ok()
}

#[cfg(test)]
mod tests {
    use super::{field_items_for_scan, infer_value_type, scan_rows, schema_from_names};
    use crate::ids::TableId;
    use crate::model::{FieldSource, Row, SemanticType, Value};

    fn row(pairs: &[(&str, Value)]) -> Row {
        let mut row = Row::new();
        for (name, value) in pairs {
            row.insert(*name, value.clone());
        }
        row
    }

    #[test]
    fn scan_unions_keys_in_first_seen_order() {
        let rows = vec![
            row(&[("b", Value::from(1_i64)), ("a", Value::from("x"))]),
            row(&[("c", Value::from(true)), ("a", Value::from("y"))]),
            row(&[("a", Value::from("x")), ("b", Value::from(2_i64))]),
        ];
        let scan = scan_rows(&rows);
        assert_eq!(scan.names, vec!["b", "a", "c"]);
        assert_eq!(scan.types.len(), scan.names.len());
        assert_eq!(
            scan.types,
            vec![
                SemanticType::Number,
                SemanticType::String,
                SemanticType::Boolean,
            ]
        );
    }

    #[test]
    fn scan_domains_deduplicate_in_first_appearance_order() {
        let rows = vec![
            row(&[("city", Value::from("Austin"))]),
            row(&[("city", Value::from("Denver"))]),
            row(&[("city", Value::from("Austin"))]),
        ];
        let scan = scan_rows(&rows);
        assert_eq!(
            scan.domains[0],
            vec![Value::from("Austin"), Value::from("Denver")]
        );
    }

    #[test]
    fn scan_types_column_from_first_non_null_value() {
        let rows = vec![
            row(&[("score", Value::Null)]),
            row(&[("score", Value::from(7_i64))]),
        ];
        let scan = scan_rows(&rows);
        assert_eq!(scan.types, vec![SemanticType::Number]);
        assert_eq!(scan.domains[0], vec![Value::Null, Value::Number(7.0)]);
    }

    #[test]
    fn scan_defaults_all_null_columns_to_string() {
        let rows = vec![row(&[("empty", Value::Null)])];
        let scan = scan_rows(&rows);
        assert_eq!(scan.types, vec![SemanticType::String]);
    }

    #[test]
    fn date_strings_are_detected() {
        assert_eq!(
            infer_value_type(&Value::from("2024-02-29")),
            Some(SemanticType::Date)
        );
        assert_eq!(
            infer_value_type(&Value::from("02/29/2024")),
            Some(SemanticType::Date)
        );
        assert_eq!(
            infer_value_type(&Value::from("2024-13-01")),
            Some(SemanticType::String)
        );
        assert_eq!(
            infer_value_type(&Value::from("not a date")),
            Some(SemanticType::String)
        );
    }

    #[test]
    fn schema_from_names_deduplicates_and_skips_blanks() {
        let scan = schema_from_names(&["a", "", "b", "a"]);
        assert_eq!(scan.names, vec!["a", "b"]);
        assert_eq!(scan.types, vec![SemanticType::String, SemanticType::String]);
        assert!(scan.domains.iter().all(Vec::is_empty));
    }

    #[test]
    fn field_items_cover_every_scanned_column() {
        let table = TableId::numbered(5);
        let rows = vec![row(&[
            ("age", Value::from(25_i64)),
            ("city", Value::from("Austin")),
        ])];
        let items = field_items_for_scan(&table, &scan_rows(&rows));
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|item| item.table_ref == table));
        assert!(items.iter().all(|item| item.source == FieldSource::Original));
        assert_eq!(items[0].id.as_str(), "original--table-5--age");
        assert_eq!(items[0].domain, vec![Value::Number(25.0)]);
    }
}
