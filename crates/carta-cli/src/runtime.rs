// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use carta_agent::Client;
use carta_app::{Chart, WorkspaceAction, WorkspaceState, assemble_chart_spec};

pub struct AgentRuntime<'a> {
    client: &'a Client,
}

impl<'a> AgentRuntime<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Runs one fetch cycle against the agent service. Failures land in the
    /// workspace's auto-dashboard cell, never in the process exit path.
    pub fn refresh_dashboard(&self, state: &mut WorkspaceState, table_name: &str) {
        state.dispatch(WorkspaceAction::AutoDashboardStarted);
        match self.client.fetch_dashboard(table_name) {
            Ok(bundle) => {
                state.dispatch(WorkspaceAction::AutoDashboardLoaded {
                    query: bundle.sql_query,
                    rows: bundle.rows,
                    suggestions: bundle.suggestions,
                });
            }
            Err(error) => {
                state.dispatch(WorkspaceAction::AutoDashboardFailed {
                    message: format!("{error:#}"),
                });
            }
        }
    }
}

/// Adopts the indexed suggestion from the loaded auto-dashboard results.
/// The absence guards live here: the transition itself assumes resolved
/// inputs.
pub fn apply_suggestion(state: &mut WorkspaceState, index: usize) -> Result<()> {
    let Some(suggestions) = state.auto_dashboard.suggestions.clone() else {
        bail!("no dashboard suggestions loaded -- fetch them with --table or --demo first");
    };
    let Some(rows) = state.auto_dashboard.data_rows.clone() else {
        bail!("no dashboard data loaded -- fetch it with --table or --demo first");
    };
    let Some(suggestion) = suggestions.get(index) else {
        bail!(
            "suggestion index {index} is out of range ({} available)",
            suggestions.len()
        );
    };

    state.dispatch(WorkspaceAction::ApplyDashboardSuggestion {
        suggestion: suggestion.clone(),
        rows,
    });
    Ok(())
}

pub fn render_workspace(state: &WorkspaceState) -> String {
    let mut out = String::new();

    out.push_str("## Tables\n");
    if state.tables.is_empty() {
        out.push_str("(none)\n");
    }
    for table in &state.tables {
        let focus = if state.focused_table_id.as_ref() == Some(&table.id) {
            " *"
        } else {
            ""
        };
        let kind = if table.anchored { "anchored" } else { "derived" };
        out.push_str(&format!(
            "{} {:?} [{kind}] {} columns, {} rows{focus}\n",
            table.id,
            table.display_id,
            table.names.len(),
            table.rows.len(),
        ));
        for (name, semantic_type) in table.names.iter().zip(&table.types) {
            out.push_str(&format!("  {name}: {}\n", semantic_type.as_str()));
        }
    }

    out.push_str("\n## Concepts\n");
    if state.concept_shelf_items.is_empty() {
        out.push_str("(none)\n");
    }
    for item in &state.concept_shelf_items {
        out.push_str(&format!(
            "{} ({}, {}) from {} -- {} distinct values\n",
            item.name,
            item.semantic_type.as_str(),
            item.source.as_str(),
            item.table_ref,
            item.domain.len(),
        ));
    }

    out.push_str("\n## Charts\n");
    if state.charts.is_empty() {
        out.push_str("(none)\n");
    }
    for chart in &state.charts {
        let focus = if state.focused_chart_id.as_ref() == Some(&chart.id) {
            " *"
        } else {
            ""
        };
        out.push_str(&format!(
            "{} [{}] on {}{focus}\n",
            chart.id,
            if chart.chart_type.is_empty() {
                "untyped"
            } else {
                chart.chart_type.as_str()
            },
            chart.table_ref,
        ));
        for (channel, binding) in &chart.encoding {
            let field = state
                .field_item(&binding.field_id)
                .map(|item| item.name.as_str())
                .unwrap_or("(dangling)");
            out.push_str(&format!("  {} <- {field}\n", channel.as_str()));
        }
    }

    if !state.current_goal_description.is_empty() {
        out.push_str(&format!("\n## Goal\n{}\n", state.current_goal_description));
    }

    out.push_str("\n## Messages\n");
    if state.messages.is_empty() {
        out.push_str("(none)\n");
    }
    for message in &state.messages {
        out.push_str(&format!(
            "[{}] {}\n",
            message.severity.as_str(),
            message.message
        ));
    }

    if let Some(chart) = state.focused_chart() {
        out.push_str("\n## Preview\n");
        out.push_str(&render_preview(state, chart));
    }

    out
}

pub fn render_suggestions(state: &WorkspaceState) -> String {
    let mut out = String::new();
    let dashboard = &state.auto_dashboard;

    if dashboard.is_loading {
        out.push_str("dashboard request in flight\n");
        return out;
    }
    if let Some(error) = &dashboard.error {
        out.push_str(&format!("dashboard request failed: {error}\n"));
        return out;
    }

    match &dashboard.suggestions {
        None => out.push_str("no suggestions fetched yet\n"),
        Some(suggestions) if suggestions.is_empty() => {
            out.push_str("the agent returned no suggestions for this table\n");
        }
        Some(suggestions) => {
            for (index, suggestion) in suggestions.iter().enumerate() {
                out.push_str(&format!(
                    "{index}: {} [{}] {}\n",
                    if suggestion.chart_type.is_empty() {
                        "untyped"
                    } else {
                        suggestion.chart_type.as_str()
                    },
                    suggestion.visualization_fields.join(", "),
                    suggestion.recommendation,
                ));
            }
            if let Some(query) = &dashboard.query
                && !query.is_empty()
            {
                out.push_str(&format!("query: {query}\n"));
            }
        }
    }
    out
}

fn render_preview(state: &WorkspaceState, chart: &Chart) -> String {
    let spec = state.table(&chart.table_ref).and_then(|table| {
        assemble_chart_spec(
            &chart.chart_type,
            &chart.encoding,
            &state.concept_shelf_items,
            &table.rows,
        )
    });
    match spec.and_then(|spec| serde_json::to_string_pretty(&spec).ok()) {
        Some(rendered) => format!("{rendered}\n"),
        None => "(preview unavailable)\n".to_owned(),
    }
}
