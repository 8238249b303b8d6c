// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use carta_app::{Row, Suggestion};

/// Provider settings forwarded verbatim to the agent service, which proxies
/// the actual model call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub endpoint: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
}

impl ModelConfig {
    pub fn new(endpoint: &str, model: &str) -> Self {
        Self {
            endpoint: endpoint.to_owned(),
            model: model.to_owned(),
            api_key: None,
            api_base: None,
            api_version: None,
        }
    }
}

/// Everything one dashboard request produces: the query the agent ran, the
/// transformed rows, and the chart proposals over those rows.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardBundle {
    pub sql_query: String,
    pub rows: Vec<Row>,
    pub suggestions: Vec<Suggestion>,
}

#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    model: ModelConfig,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, model: ModelConfig, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("agent.base_url must not be empty");
        }
        Url::parse(&base_url)
            .with_context(|| format!("agent.base_url {base_url:?} is not a valid URL"))?;
        if model.model.trim().is_empty() {
            bail!("model.model must not be empty");
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            model,
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &ModelConfig {
        &self.model
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Asks the service for chart suggestions over a named dataset. The
    /// request is aborted client-side when `timeout` expires.
    pub fn fetch_dashboard(&self, table_name: &str) -> Result<DashboardBundle> {
        if table_name.trim().is_empty() {
            bail!("table name must not be empty");
        }

        let request = DashboardRequest {
            token: "",
            table_name,
            model: &self.model,
        };
        let response = self
            .http
            .post(format!("{}/api/agent/auto_dashboard", self.base_url))
            .json(&request)
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        let parsed: DashboardResponse = response.json().context("decode dashboard response")?;
        if parsed.status != "ok" {
            bail!(
                "agent rejected dashboard request: {}",
                parsed
                    .message
                    .unwrap_or_else(|| "no message provided".to_owned())
            );
        }
        let results = parsed
            .results
            .ok_or_else(|| anyhow!("agent response is missing results"))?;

        Ok(DashboardBundle {
            sql_query: results.sql_query.unwrap_or_default(),
            rows: results
                .data_content
                .map(|content| content.rows)
                .unwrap_or_default(),
            suggestions: results.dashboard_suggestions,
        })
    }

    /// Round-trips the configured model through the service. Errors carry
    /// the service's sanitized message.
    pub fn test_model(&self) -> Result<()> {
        let request = TestModelRequest { model: &self.model };
        let response = self
            .http
            .post(format!("{}/api/agent/test-model", self.base_url))
            .json(&request)
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        let parsed: TestModelResponse = response.json().context("decode test-model response")?;
        if parsed.status != "ok" {
            bail!(
                "model check failed: {}",
                parsed
                    .message
                    .filter(|message| !message.is_empty())
                    .unwrap_or_else(|| format!("model {:?} rejected by agent", self.model.model))
            );
        }
        Ok(())
    }
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    anyhow!(
        "cannot reach {} -- start the carta agent service and retry ({})",
        base_url,
        error
    )
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(message) = parsed.message
        && !message.is_empty()
    {
        if let Some(detail) = parsed.detail
            && !detail.is_empty()
        {
            return anyhow!("agent error ({}): {message} -- {detail}", status.as_u16());
        }
        return anyhow!("agent error ({}): {message}", status.as_u16());
    }

    if body.len() < 100 && !body.contains('{') && !body.trim().is_empty() {
        return anyhow!("agent error ({}): {}", status.as_u16(), body.trim());
    }

    anyhow!("agent returned {}", status.as_u16())
}

#[derive(Debug, Serialize)]
struct DashboardRequest<'a> {
    token: &'a str,
    table_name: &'a str,
    model: &'a ModelConfig,
}

#[derive(Debug, Serialize)]
struct TestModelRequest<'a> {
    model: &'a ModelConfig,
}

#[derive(Debug, Deserialize)]
struct DashboardResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    results: Option<DashboardResults>,
}

#[derive(Debug, Deserialize)]
struct DashboardResults {
    #[serde(default)]
    sql_query: Option<String>,
    #[serde(default)]
    data_content: Option<DataContent>,
    #[serde(default)]
    dashboard_suggestions: Vec<Suggestion>,
}

#[derive(Debug, Deserialize)]
struct DataContent {
    #[serde(default)]
    rows: Vec<Row>,
}

#[derive(Debug, Deserialize)]
struct TestModelResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::{Client, DashboardRequest, ModelConfig, clean_error_response};
    use anyhow::Result;
    use reqwest::StatusCode;
    use std::time::Duration;

    #[test]
    fn client_rejects_invalid_base_url() {
        let error = Client::new(
            "not a url",
            ModelConfig::new("ollama", "qwen3"),
            Duration::from_secs(1),
        )
        .expect_err("invalid URL should fail");
        assert!(error.to_string().contains("not a valid URL"));
    }

    #[test]
    fn client_rejects_empty_model_name() {
        let error = Client::new(
            "http://127.0.0.1:5000",
            ModelConfig::new("ollama", "  "),
            Duration::from_secs(1),
        )
        .expect_err("empty model should fail");
        assert!(error.to_string().contains("model.model must not be empty"));
    }

    #[test]
    fn client_trims_trailing_slashes() -> Result<()> {
        let client = Client::new(
            "http://127.0.0.1:5000///",
            ModelConfig::new("ollama", "qwen3"),
            Duration::from_secs(1),
        )?;
        assert_eq!(client.base_url(), "http://127.0.0.1:5000");
        Ok(())
    }

    #[test]
    fn dashboard_request_omits_absent_credentials() -> Result<()> {
        let model = ModelConfig::new("ollama", "qwen3");
        let request = DashboardRequest {
            token: "",
            table_name: "sales",
            model: &model,
        };
        let encoded = serde_json::to_string(&request)?;
        assert!(encoded.contains("\"table_name\":\"sales\""));
        assert!(encoded.contains("\"endpoint\":\"ollama\""));
        assert!(!encoded.contains("api_key"));
        Ok(())
    }

    #[test]
    fn dashboard_request_carries_credentials_when_present() -> Result<()> {
        let mut model = ModelConfig::new("azure", "gpt-4o");
        model.api_key = Some("secret".to_owned());
        model.api_version = Some("2024-06-01".to_owned());
        let request = DashboardRequest {
            token: "",
            table_name: "sales",
            model: &model,
        };
        let encoded = serde_json::to_string(&request)?;
        assert!(encoded.contains("\"api_key\":\"secret\""));
        assert!(encoded.contains("\"api_version\":\"2024-06-01\""));
        Ok(())
    }

    #[test]
    fn error_envelope_message_and_detail_are_surfaced() {
        let error = clean_error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"status":"error","message":"Agent failed to generate dashboard suggestions.","detail":"no candidates"}"#,
        );
        let message = error.to_string();
        assert!(message.contains("500"));
        assert!(message.contains("Agent failed to generate dashboard suggestions."));
        assert!(message.contains("no candidates"));
    }

    #[test]
    fn short_plain_bodies_are_quoted_verbatim() {
        let error = clean_error_response(StatusCode::BAD_GATEWAY, "upstream offline\n");
        assert!(error.to_string().contains("upstream offline"));
    }

    #[test]
    fn opaque_bodies_collapse_to_status_code() {
        let error = clean_error_response(StatusCode::BAD_GATEWAY, r#"{"weird":true}"#);
        assert_eq!(error.to_string(), "agent returned 502");
    }
}
