// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde_json::json;

use carta_app::{Row, Suggestion, WorkspaceAction, WorkspaceState};

pub const DEMO_TABLE_NAME: &str = "city_sales";

const CITIES: [&str; 6] = [
    "Austin", "Seattle", "Denver", "Madison", "Portland", "Boise",
];
const REGIONS: [&str; 3] = ["south", "west", "mountain"];
const SALE_DATES: [&str; 6] = [
    "2025-01-15",
    "2025-02-15",
    "2025-03-15",
    "2025-04-15",
    "2025-05-15",
    "2025-06-15",
];

/// Deterministic sales corpus: one row per city, with a region label, a
/// numeric unit count, an online flag, and an ISO sale date so every
/// semantic type shows up in inference.
pub fn demo_rows() -> Vec<Row> {
    CITIES
        .iter()
        .enumerate()
        .map(|(index, city)| {
            let mut row = Row::new();
            row.insert("city", *city);
            row.insert("region", REGIONS[index % REGIONS.len()]);
            row.insert("units", 40 + (index as i64) * 17);
            row.insert("online", index % 2 == 0);
            row.insert("sale_date", SALE_DATES[index]);
            row
        })
        .collect()
}

pub fn demo_sql_query() -> String {
    format!("SELECT city, region, units, online, sale_date FROM {DEMO_TABLE_NAME}")
}

pub fn demo_suggestions() -> Vec<Suggestion> {
    vec![
        Suggestion {
            chart_type: "bar".to_owned(),
            visualization_fields: vec!["city".to_owned(), "units".to_owned()],
            recommendation: "Compares unit sales across cities.".to_owned(),
            mode: "summary".to_owned(),
            output_fields: vec!["city".to_owned(), "units".to_owned()],
        },
        Suggestion {
            chart_type: "line".to_owned(),
            visualization_fields: vec!["sale_date".to_owned(), "units".to_owned()],
            recommendation: "Shows unit sales over the spring season.".to_owned(),
            mode: "overview".to_owned(),
            output_fields: vec![
                "sale_date".to_owned(),
                "units".to_owned(),
                "city".to_owned(),
            ],
        },
    ]
}

/// Success envelope the agent service would return for the demo corpus;
/// handy as a mock-server response body.
pub fn demo_dashboard_payload() -> String {
    json!({
        "token": "",
        "status": "ok",
        "results": {
            "sql_query": demo_sql_query(),
            "data_content": {
                "rows": demo_rows(),
                "virtual": { "table_name": "view_demo", "row_count": demo_rows().len() },
            },
            "dashboard_suggestions": demo_suggestions(),
        },
    })
    .to_string()
}

/// Workspace with the demo corpus already imported and focused.
pub fn workspace_with_demo_import() -> WorkspaceState {
    let mut state = WorkspaceState::default();
    state.dispatch(WorkspaceAction::ImportTable {
        display_id: DEMO_TABLE_NAME.to_owned(),
        rows: demo_rows(),
    });
    state
}
