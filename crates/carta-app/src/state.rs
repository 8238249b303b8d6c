// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

use crate::ids::{ChartId, FieldId, TableId};
use crate::infer::{field_items_for_scan, scan_rows, schema_from_names};
use crate::model::{
    Channel, ChannelBinding, Chart, EncodingMap, FieldItem, Row, Severity, StatusMessage,
    Suggestion, Table,
};

/// Result cell for the auto-dashboard fetch: pending while a request is in
/// flight, then exactly one of results or error. The last terminal write
/// wins; there is no request fencing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AutoDashboardState {
    pub query: Option<String>,
    pub data_rows: Option<Vec<Row>>,
    pub suggestions: Option<Vec<Suggestion>>,
    pub error: Option<String>,
    pub is_loading: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkspaceState {
    pub tables: Vec<Table>,
    pub concept_shelf_items: Vec<FieldItem>,
    pub charts: Vec<Chart>,
    pub focused_table_id: Option<TableId>,
    pub focused_chart_id: Option<ChartId>,
    pub current_goal_description: String,
    /// Append-only; transitions add entries, nothing removes them.
    pub messages: Vec<StatusMessage>,
    pub auto_dashboard: AutoDashboardState,
    next_table_seq: u64,
    next_chart_seq: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkspaceAction {
    ImportTable {
        display_id: String,
        rows: Vec<Row>,
    },
    ApplyDashboardSuggestion {
        suggestion: Suggestion,
        rows: Vec<Row>,
    },
    SetGoalDescription(String),
    FocusTable(TableId),
    FocusChart(ChartId),
    AutoDashboardStarted,
    AutoDashboardLoaded {
        query: String,
        rows: Vec<Row>,
        suggestions: Vec<Suggestion>,
    },
    AutoDashboardFailed {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceEvent {
    TableAdded(TableId),
    FieldItemsAdded { table: TableId, count: usize },
    ChartAdded(ChartId),
    ChartRewritten(ChartId),
    TableFocused(TableId),
    ChartFocused(ChartId),
    GoalUpdated,
    MessageLogged(Severity),
    AutoDashboardPending,
    AutoDashboardFulfilled { suggestions: usize },
    AutoDashboardRejected,
}

impl WorkspaceState {
    pub fn dispatch(&mut self, action: WorkspaceAction) -> Vec<WorkspaceEvent> {
        match action {
            WorkspaceAction::ImportTable { display_id, rows } => {
                self.import_table(display_id, rows)
            }
            WorkspaceAction::ApplyDashboardSuggestion { suggestion, rows } => {
                self.apply_dashboard_suggestion(suggestion, rows)
            }
            WorkspaceAction::SetGoalDescription(text) => {
                self.current_goal_description = text;
                vec![WorkspaceEvent::GoalUpdated]
            }
            WorkspaceAction::FocusTable(id) => {
                if self.table(&id).is_none() {
                    return Vec::new();
                }
                self.focused_table_id = Some(id.clone());
                vec![WorkspaceEvent::TableFocused(id)]
            }
            WorkspaceAction::FocusChart(id) => {
                if self.chart(&id).is_none() {
                    return Vec::new();
                }
                self.focused_chart_id = Some(id.clone());
                vec![WorkspaceEvent::ChartFocused(id)]
            }
            WorkspaceAction::AutoDashboardStarted => {
                self.auto_dashboard = AutoDashboardState {
                    is_loading: true,
                    ..AutoDashboardState::default()
                };
                vec![WorkspaceEvent::AutoDashboardPending]
            }
            WorkspaceAction::AutoDashboardLoaded {
                query,
                rows,
                suggestions,
            } => {
                let count = suggestions.len();
                self.auto_dashboard = AutoDashboardState {
                    query: Some(query),
                    data_rows: Some(rows),
                    suggestions: Some(suggestions),
                    error: None,
                    is_loading: false,
                };
                vec![WorkspaceEvent::AutoDashboardFulfilled { suggestions: count }]
            }
            WorkspaceAction::AutoDashboardFailed { message } => {
                self.auto_dashboard = AutoDashboardState {
                    error: Some(message),
                    is_loading: false,
                    ..AutoDashboardState::default()
                };
                vec![WorkspaceEvent::AutoDashboardRejected]
            }
        }
    }

    pub fn table(&self, id: &TableId) -> Option<&Table> {
        self.tables.iter().find(|table| &table.id == id)
    }

    pub fn chart(&self, id: &ChartId) -> Option<&Chart> {
        self.charts.iter().find(|chart| &chart.id == id)
    }

    pub fn field_item(&self, id: &FieldId) -> Option<&FieldItem> {
        self.concept_shelf_items.iter().find(|item| &item.id == id)
    }

    pub fn focused_table(&self) -> Option<&Table> {
        self.focused_table_id.as_ref().and_then(|id| self.table(id))
    }

    pub fn focused_chart(&self) -> Option<&Chart> {
        self.focused_chart_id.as_ref().and_then(|id| self.chart(id))
    }

    pub fn concepts_for_table(&self, id: &TableId) -> Vec<&FieldItem> {
        self.concept_shelf_items
            .iter()
            .filter(|item| &item.table_ref == id)
            .collect()
    }

    pub fn latest_message(&self) -> Option<&StatusMessage> {
        self.messages.last()
    }

    fn import_table(&mut self, display_id: String, rows: Vec<Row>) -> Vec<WorkspaceEvent> {
        let scan = scan_rows(&rows);
        let table_id = self.fresh_table_id();
        let items = field_items_for_scan(&table_id, &scan);
        let count = items.len();

        self.tables.push(Table {
            id: table_id.clone(),
            display_id: display_id.clone(),
            names: scan.names,
            types: scan.types,
            rows,
            anchored: true,
        });
        self.concept_shelf_items.extend(items);
        self.focused_table_id = Some(table_id.clone());
        let logged = self.log(
            Severity::Info,
            format!("Imported table {display_id:?} ({count} columns)"),
        );

        vec![
            WorkspaceEvent::TableAdded(table_id.clone()),
            WorkspaceEvent::FieldItemsAdded {
                table: table_id.clone(),
                count,
            },
            WorkspaceEvent::TableFocused(table_id),
            logged,
        ]
    }

    /// Adopts an agent suggestion into the workspace: synthesizes a derived
    /// table and its field items from the supplied rows, binds suggestion
    /// fields positionally onto visual channels, and rewrites (or creates)
    /// the focused chart. Total: unknown field names are skipped, never
    /// errors.
    fn apply_dashboard_suggestion(
        &mut self,
        suggestion: Suggestion,
        rows: Vec<Row>,
    ) -> Vec<WorkspaceEvent> {
        let mut events = Vec::new();

        let scan = if rows.is_empty() {
            // No data: fall back to the declared output schema so downstream
            // bindings still have names to resolve against.
            if suggestion.output_fields.is_empty() {
                schema_from_names(&suggestion.visualization_fields)
            } else {
                schema_from_names(&suggestion.output_fields)
            }
        } else {
            scan_rows(&rows)
        };

        let table_id = self.fresh_table_id();
        let display_id = if suggestion.mode.is_empty() {
            "suggestion".to_owned()
        } else {
            suggestion.mode.clone()
        };
        let items = field_items_for_scan(&table_id, &scan);
        let count = items.len();

        self.tables.push(Table {
            id: table_id.clone(),
            display_id,
            names: scan.names,
            types: scan.types,
            rows,
            anchored: false,
        });
        events.push(WorkspaceEvent::TableAdded(table_id.clone()));

        let mut encoding = EncodingMap::new();
        for (channel, field_name) in Channel::PRIORITY.iter().zip(&suggestion.visualization_fields)
        {
            if let Some(item) = items.iter().find(|item| &item.name == field_name) {
                encoding.insert(
                    *channel,
                    ChannelBinding {
                        field_id: item.id.clone(),
                        aggregate: None,
                    },
                );
            }
        }

        self.concept_shelf_items.extend(items);
        events.push(WorkspaceEvent::FieldItemsAdded {
            table: table_id.clone(),
            count,
        });

        // A dangling focus pointer counts as "no focused chart".
        let focused = self
            .focused_chart_id
            .as_ref()
            .and_then(|id| self.charts.iter().position(|chart| &chart.id == id));
        match focused {
            Some(index) => {
                let chart = &mut self.charts[index];
                chart.table_ref = table_id.clone();
                chart.chart_type = suggestion.chart_type.clone();
                chart.encoding = encoding;
                events.push(WorkspaceEvent::ChartRewritten(chart.id.clone()));
            }
            None => {
                let chart_id = self.fresh_chart_id();
                self.charts.push(Chart {
                    id: chart_id.clone(),
                    table_ref: table_id.clone(),
                    chart_type: suggestion.chart_type.clone(),
                    encoding,
                });
                self.focused_chart_id = Some(chart_id.clone());
                events.push(WorkspaceEvent::ChartAdded(chart_id.clone()));
                events.push(WorkspaceEvent::ChartFocused(chart_id));
            }
        }

        self.focused_table_id = Some(table_id.clone());
        events.push(WorkspaceEvent::TableFocused(table_id));

        self.current_goal_description = suggestion.recommendation.clone();
        events.push(WorkspaceEvent::GoalUpdated);

        let label = if suggestion.chart_type.is_empty() {
            "Applied suggested chart".to_owned()
        } else {
            format!("Applied suggested chart: {}", suggestion.chart_type)
        };
        events.push(self.log(Severity::Info, label));

        events
    }

    fn fresh_table_id(&mut self) -> TableId {
        self.next_table_seq += 1;
        TableId::numbered(self.next_table_seq)
    }

    fn fresh_chart_id(&mut self) -> ChartId {
        self.next_chart_seq += 1;
        ChartId::numbered(self.next_chart_seq)
    }

    fn log(&mut self, severity: Severity, message: impl Into<String>) -> WorkspaceEvent {
        self.messages.push(StatusMessage {
            message: message.into(),
            severity,
        });
        WorkspaceEvent::MessageLogged(severity)
    }
}
