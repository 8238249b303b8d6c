// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde_json::{Map, Value as JsonValue, json};

use crate::model::{EncodingMap, FieldItem, Row, SemanticType};

/// Assembles a renderable chart specification from a chart's pieces, or
/// `None` when no preview is possible: empty data, an unrecognized chart
/// type, or an encoding whose field references all dangle. Individual
/// dangling bindings are skipped channel by channel.
pub fn assemble_chart_spec(
    chart_type: &str,
    encoding: &EncodingMap,
    field_items: &[FieldItem],
    rows: &[Row],
) -> Option<JsonValue> {
    if rows.is_empty() {
        return None;
    }
    let mark = mark_for(chart_type)?;

    let mut channels = Map::new();
    for (channel, binding) in encoding {
        let Some(item) = field_items.iter().find(|item| item.id == binding.field_id) else {
            continue;
        };
        let mut definition = Map::new();
        definition.insert("field".to_owned(), json!(item.name));
        definition.insert(
            "type".to_owned(),
            json!(measurement_for(item.semantic_type)),
        );
        if let Some(aggregate) = binding.aggregate {
            definition.insert("aggregate".to_owned(), json!(aggregate.as_str()));
        }
        channels.insert(channel.as_str().to_owned(), JsonValue::Object(definition));
    }
    if channels.is_empty() {
        return None;
    }

    let values: Vec<JsonValue> = rows
        .iter()
        .map(|row| serde_json::to_value(row).unwrap_or(JsonValue::Null))
        .collect();

    Some(json!({
        "mark": mark,
        "encoding": channels,
        "data": { "values": values },
    }))
}

fn mark_for(chart_type: &str) -> Option<&'static str> {
    match chart_type {
        "point" | "scatter" => Some("point"),
        "bar" | "histogram" => Some("bar"),
        "line" => Some("line"),
        "area" => Some("area"),
        "boxplot" => Some("boxplot"),
        _ => None,
    }
}

fn measurement_for(semantic_type: SemanticType) -> &'static str {
    match semantic_type {
        SemanticType::Number => "quantitative",
        SemanticType::Date => "temporal",
        SemanticType::String | SemanticType::Boolean => "nominal",
    }
}

#[cfg(test)]
mod tests {
    use super::assemble_chart_spec;
    use crate::ids::{FieldId, TableId};
    use crate::model::{
        Aggregate, Channel, ChannelBinding, EncodingMap, FieldItem, FieldSource, Row,
        SemanticType, Value,
    };

    fn sample_rows() -> Vec<Row> {
        let mut first = Row::new();
        first.insert("age", 25_i64);
        first.insert("count_val", 10_i64);
        let mut second = Row::new();
        second.insert("age", 30_i64);
        second.insert("count_val", 15_i64);
        vec![first, second]
    }

    fn sample_fields(table: &TableId) -> Vec<FieldItem> {
        ["age", "count_val"]
            .iter()
            .map(|name| FieldItem {
                id: FieldId::compose(FieldSource::Original, table, name),
                name: (*name).to_owned(),
                semantic_type: SemanticType::Number,
                source: FieldSource::Original,
                table_ref: table.clone(),
                description: None,
                domain: vec![Value::Number(25.0)],
            })
            .collect()
    }

    fn binding(table: &TableId, name: &str, aggregate: Option<Aggregate>) -> ChannelBinding {
        ChannelBinding {
            field_id: FieldId::compose(FieldSource::Original, table, name),
            aggregate,
        }
    }

    #[test]
    fn assembles_bar_spec_with_bound_channels() {
        let table = TableId::numbered(1);
        let mut encoding = EncodingMap::new();
        encoding.insert(Channel::X, binding(&table, "age", None));
        encoding.insert(Channel::Y, binding(&table, "count_val", Some(Aggregate::Sum)));

        let spec = assemble_chart_spec("histogram", &encoding, &sample_fields(&table), &sample_rows())
            .expect("spec assembles");

        assert_eq!(spec["mark"], "bar");
        assert_eq!(spec["encoding"]["x"]["field"], "age");
        assert_eq!(spec["encoding"]["x"]["type"], "quantitative");
        assert_eq!(spec["encoding"]["y"]["aggregate"], "sum");
        assert_eq!(spec["data"]["values"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn unknown_chart_type_yields_no_preview() {
        let table = TableId::numbered(1);
        let mut encoding = EncodingMap::new();
        encoding.insert(Channel::X, binding(&table, "age", None));

        let spec =
            assemble_chart_spec("hexbin", &encoding, &sample_fields(&table), &sample_rows());
        assert!(spec.is_none());
    }

    #[test]
    fn empty_rows_yield_no_preview() {
        let table = TableId::numbered(1);
        let mut encoding = EncodingMap::new();
        encoding.insert(Channel::X, binding(&table, "age", None));

        let spec = assemble_chart_spec("bar", &encoding, &sample_fields(&table), &[]);
        assert!(spec.is_none());
    }

    #[test]
    fn dangling_bindings_are_skipped_channel_by_channel() {
        let table = TableId::numbered(1);
        let mut encoding = EncodingMap::new();
        encoding.insert(Channel::X, binding(&table, "age", None));
        encoding.insert(Channel::Y, binding(&table, "deleted_field", None));

        let spec = assemble_chart_spec("line", &encoding, &sample_fields(&table), &sample_rows())
            .expect("spec assembles without the dangling channel");
        assert!(spec["encoding"]["x"].is_object());
        assert!(spec["encoding"].get("y").is_none());
    }

    #[test]
    fn fully_dangling_encoding_yields_no_preview() {
        let table = TableId::numbered(1);
        let mut encoding = EncodingMap::new();
        encoding.insert(Channel::X, binding(&table, "deleted_field", None));

        let spec = assemble_chart_spec("bar", &encoding, &sample_fields(&table), &sample_rows());
        assert!(spec.is_none());
    }

    #[test]
    fn date_columns_map_to_temporal() {
        let table = TableId::numbered(1);
        let mut fields = sample_fields(&table);
        fields[0].semantic_type = SemanticType::Date;
        let mut encoding = EncodingMap::new();
        encoding.insert(Channel::X, binding(&table, "age", None));

        let spec = assemble_chart_spec("line", &encoding, &fields, &sample_rows())
            .expect("spec assembles");
        assert_eq!(spec["encoding"]["x"]["type"], "temporal");
    }
}
