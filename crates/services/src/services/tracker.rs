use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Tracker is not configured for this user")]
    NotConfigured,
    #[error("Invalid tracker base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("Tracker request failed: {0}")]
    Upstream(String),
}

/// Connection settings for one user's tracker account.
#[derive(Debug, Clone)]
pub struct TrackerCredentials {
    pub base_url: String,
    pub account_email: String,
    pub api_token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    ExactKey,
    ProjectKeyPattern,
    ProjectText,
    GlobalText,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerIssue {
    pub key: String,
    pub summary: String,
    pub status: Option<String>,
    pub assignee: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub strategy: SearchStrategy,
    pub issues: Vec<TrackerIssue>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    issues: Vec<RawIssue>,
}

#[derive(Debug, Deserialize)]
struct RawIssue {
    key: String,
    #[serde(default)]
    fields: RawFields,
}

#[derive(Debug, Default, Deserialize)]
struct RawFields {
    #[serde(default)]
    summary: String,
    status: Option<RawNamed>,
    assignee: Option<RawAssignee>,
}

#[derive(Debug, Deserialize)]
struct RawNamed {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawAssignee {
    #[serde(rename = "displayName")]
    display_name: Option<String>,
}

fn escape_jql(term: &str) -> String {
    term.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Ordered waterfall of search attempts. Kept pure so the ordering and JQL
/// shapes are unit-testable without a live tracker.
pub fn search_strategies(project_key: &str, term: &str) -> Vec<(SearchStrategy, String)> {
    let key_shaped = Regex::new(r"^[A-Za-z][A-Za-z0-9]*-\d+$").expect("static pattern");
    let escaped = escape_jql(term.trim());
    let project = escape_jql(project_key.trim());

    let mut strategies = Vec::with_capacity(4);
    if key_shaped.is_match(term.trim()) {
        strategies.push((
            SearchStrategy::ExactKey,
            format!("key = \"{escaped}\""),
        ));
    }
    strategies.push((
        SearchStrategy::ProjectKeyPattern,
        format!("project = \"{project}\" AND key ~ \"{escaped}\""),
    ));
    strategies.push((
        SearchStrategy::ProjectText,
        format!(
            "project = \"{project}\" AND (summary ~ \"{escaped}\" OR description ~ \"{escaped}\")"
        ),
    ));
    strategies.push((
        SearchStrategy::GlobalText,
        format!("summary ~ \"{escaped}\" OR description ~ \"{escaped}\" OR key ~ \"{escaped}\""),
    ));
    strategies
}

/// Thin REST client for the external issue tracker. One-shot requests, no
/// retries; a failing search strategy is skipped and the next one runs.
#[derive(Clone)]
pub struct TrackerClient {
    client: reqwest::Client,
}

impl TrackerClient {
    pub fn new(request_timeout: Duration) -> Self {
        // Static configuration, the builder cannot fail here.
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .expect("tracker http client");
        Self { client }
    }

    fn api_url(credentials: &TrackerCredentials, path: &str) -> Result<Url, TrackerError> {
        let base = Url::parse(&credentials.base_url)
            .map_err(|e| TrackerError::InvalidBaseUrl(e.to_string()))?;
        base.join(path)
            .map_err(|e| TrackerError::InvalidBaseUrl(e.to_string()))
    }

    async fn run_jql(
        &self,
        credentials: &TrackerCredentials,
        jql: &str,
    ) -> Result<Vec<TrackerIssue>, TrackerError> {
        let url = Self::api_url(credentials, "rest/api/2/search")?;
        let response = self
            .client
            .get(url)
            .basic_auth(&credentials.account_email, Some(&credentials.api_token))
            .query(&[("jql", jql), ("maxResults", "50")])
            .send()
            .await
            .map_err(|e| TrackerError::Upstream(e.to_string()))?
            .error_for_status()
            .map_err(|e| TrackerError::Upstream(e.to_string()))?;
        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| TrackerError::Upstream(e.to_string()))?;
        Ok(body
            .issues
            .into_iter()
            .map(|issue| TrackerIssue {
                key: issue.key,
                summary: issue.fields.summary,
                status: issue.fields.status.and_then(|s| s.name),
                assignee: issue.fields.assignee.and_then(|a| a.display_name),
            })
            .collect())
    }

    /// Runs the strategy waterfall. The first strategy returning a non-empty
    /// result wins; strategies that error are logged and skipped. Only when
    /// every strategy fails does the whole search fail.
    pub async fn search(
        &self,
        credentials: &TrackerCredentials,
        project_key: &str,
        term: &str,
    ) -> Result<SearchOutcome, TrackerError> {
        let strategies = search_strategies(project_key, term);
        let mut last_error: Option<TrackerError> = None;
        let mut all_failed = true;

        for (strategy, jql) in &strategies {
            match self.run_jql(credentials, jql).await {
                Ok(issues) => {
                    all_failed = false;
                    if !issues.is_empty() {
                        return Ok(SearchOutcome {
                            strategy: *strategy,
                            issues,
                        });
                    }
                }
                Err(err) => {
                    tracing::warn!(strategy = ?strategy, "tracker search strategy failed: {err}");
                    last_error = Some(err);
                }
            }
        }

        if all_failed {
            return Err(last_error
                .unwrap_or_else(|| TrackerError::Upstream("no strategies ran".to_string())));
        }
        // Every strategy ran clean but nothing matched.
        Ok(SearchOutcome {
            strategy: strategies
                .last()
                .map(|(s, _)| *s)
                .unwrap_or(SearchStrategy::GlobalText),
            issues: Vec::new(),
        })
    }

    pub async fn create_issue(
        &self,
        credentials: &TrackerCredentials,
        project_key: &str,
        summary: &str,
        description: Option<&str>,
    ) -> Result<String, TrackerError> {
        let url = Self::api_url(credentials, "rest/api/2/issue")?;
        let payload = json!({
            "fields": {
                "project": { "key": project_key },
                "summary": summary,
                "description": description,
                "issuetype": { "name": "Task" },
            }
        });
        let response = self
            .client
            .post(url)
            .basic_auth(&credentials.account_email, Some(&credentials.api_token))
            .json(&payload)
            .send()
            .await
            .map_err(|e| TrackerError::Upstream(e.to_string()))?
            .error_for_status()
            .map_err(|e| TrackerError::Upstream(e.to_string()))?;
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| TrackerError::Upstream(e.to_string()))?;
        body.get("key")
            .and_then(|k| k.as_str())
            .map(str::to_string)
            .ok_or_else(|| TrackerError::Upstream("create response had no key".to_string()))
    }

    pub async fn update_issue(
        &self,
        credentials: &TrackerCredentials,
        issue_key: &str,
        summary: Option<&str>,
        description: Option<&str>,
    ) -> Result<(), TrackerError> {
        let url = Self::api_url(credentials, &format!("rest/api/2/issue/{issue_key}"))?;
        let mut fields = serde_json::Map::new();
        if let Some(summary) = summary {
            fields.insert("summary".to_string(), json!(summary));
        }
        if let Some(description) = description {
            fields.insert("description".to_string(), json!(description));
        }
        self.client
            .put(url)
            .basic_auth(&credentials.account_email, Some(&credentials.api_token))
            .json(&json!({ "fields": fields }))
            .send()
            .await
            .map_err(|e| TrackerError::Upstream(e.to_string()))?
            .error_for_status()
            .map_err(|e| TrackerError::Upstream(e.to_string()))?;
        Ok(())
    }
}
