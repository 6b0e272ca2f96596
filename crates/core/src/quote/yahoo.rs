//! Yahoo Finance quoteSummary client.
//!
//! quoteSummary needs a session cookie plus a matching crumb. Both are obtained on
//! first use and kept for the life of the process; an auth failure drops the crumb
//! so the next lookup fetches a fresh one.

use crate::config::Settings;
use crate::domain::company::CompanyInfo;
use crate::quote::error::QuoteDiagnosticsError;
use crate::quote::QuoteProvider;
use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;

const DEFAULT_MODULES: &str = "summaryDetail,price,assetProfile,defaultKeyStatistics,financialData";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

#[derive(Debug)]
pub struct YahooQuoteProvider {
    http: reqwest::Client,
    base_url: String,
    cookie_url: String,
    modules: String,
    crumb: tokio::sync::Mutex<Option<String>>,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryEnvelope {
    #[serde(rename = "quoteSummary")]
    quote_summary: QuoteSummary,
}

#[derive(Debug, Deserialize)]
struct QuoteSummary {
    #[serde(default)]
    result: Option<Vec<Map<String, Value>>>,
    #[serde(default)]
    error: Option<QuoteSummaryError>,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

impl YahooQuoteProvider {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.http_timeout_secs))
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build quote http client")?;

        Ok(Self {
            http,
            base_url: settings.quote_base_url.clone(),
            cookie_url: settings.quote_cookie_url.clone(),
            modules: DEFAULT_MODULES.to_string(),
            crumb: tokio::sync::Mutex::new(None),
        })
    }

    fn summary_url(&self, symbol: &str) -> String {
        format!(
            "{}/v10/finance/quoteSummary/{}",
            self.base_url.trim_end_matches('/'),
            provider_symbol(symbol)
        )
    }

    async fn crumb(&self, symbol: &str) -> Result<String> {
        let mut guard = self.crumb.lock().await;
        if let Some(crumb) = guard.as_ref() {
            return Ok(crumb.clone());
        }

        // The cookie endpoint answers 404 but still sets the session cookie.
        self.http
            .get(&self.cookie_url)
            .send()
            .await
            .map_err(|e| QuoteDiagnosticsError::new(symbol, "crumb", format!("cookie request: {e}")))?;

        let url = format!("{}/v1/test/getcrumb", self.base_url.trim_end_matches('/'));
        let res = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| QuoteDiagnosticsError::new(symbol, "crumb", format!("crumb request: {e}")))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| QuoteDiagnosticsError::new(symbol, "crumb", format!("crumb body: {e}")))?;
        let crumb = text.trim();

        if !status.is_success() || crumb.is_empty() || crumb.contains('<') {
            return Err(QuoteDiagnosticsError::new(symbol, "crumb", format!("status={status}"))
                .with_raw_output(text)
                .into());
        }

        tracing::debug!("quote session crumb acquired");
        *guard = Some(crumb.to_string());
        Ok(crumb.to_string())
    }

    async fn invalidate_crumb(&self) {
        *self.crumb.lock().await = None;
    }
}

#[async_trait::async_trait]
impl QuoteProvider for YahooQuoteProvider {
    fn provider_name(&self) -> &'static str {
        "yahoo"
    }

    async fn fetch_company_info(&self, symbol: &str) -> Result<CompanyInfo> {
        let crumb = self.crumb(symbol).await?;

        let res = self
            .http
            .get(self.summary_url(symbol))
            .query(&[("modules", self.modules.as_str()), ("crumb", crumb.as_str())])
            .send()
            .await
            .map_err(|e| QuoteDiagnosticsError::new(symbol, "http", e.to_string()))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| QuoteDiagnosticsError::new(symbol, "http", format!("body: {e}")))?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            self.invalidate_crumb().await;
            return Err(QuoteDiagnosticsError::new(symbol, "http", format!("status={status}"))
                .with_raw_output(text)
                .into());
        }

        let envelope = match serde_json::from_str::<QuoteSummaryEnvelope>(&text) {
            Ok(env) => env,
            Err(e) if status.is_success() => {
                return Err(QuoteDiagnosticsError::new(symbol, "decode", e.to_string())
                    .with_raw_output(text)
                    .into());
            }
            Err(_) => {
                return Err(QuoteDiagnosticsError::new(symbol, "http", format!("status={status}"))
                    .with_raw_output(text)
                    .into());
            }
        };

        parse_quote_summary(symbol, envelope)
    }
}

/// Provider spelling of a roster symbol (class shares use a dash: `BRK.B` -> `BRK-B`).
pub fn provider_symbol(symbol: &str) -> String {
    symbol.trim().replace('.', "-")
}

fn parse_quote_summary(symbol: &str, envelope: QuoteSummaryEnvelope) -> Result<CompanyInfo> {
    let summary = envelope.quote_summary;
    if let Some(err) = summary.error {
        return Err(QuoteDiagnosticsError::new(
            symbol,
            "provider",
            format!("{}: {}", err.code, err.description),
        )
        .into());
    }

    let modules = summary
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| QuoteDiagnosticsError::new(symbol, "provider", "empty result"))?;

    let mut info = flatten_modules(&modules);
    if info.get("symbol").is_none() {
        info.insert("symbol", Value::String(symbol.to_string()));
    }
    Ok(info)
}

/// Merges every module object into one flat map. The first module defining a key wins.
pub fn flatten_modules(modules: &Map<String, Value>) -> CompanyInfo {
    let mut info = CompanyInfo::new();
    for module in modules.values() {
        let Value::Object(fields) = module else {
            continue;
        };
        for (key, value) in fields {
            if key == "maxAge" || info.get(key).is_some() {
                continue;
            }
            info.insert(key.clone(), collapse(value));
        }
    }
    info
}

/// `{raw, fmt}` number wrappers become the raw value; `{}` becomes null.
fn collapse(value: &Value) -> Value {
    match value {
        Value::Object(m) if m.contains_key("raw") => m["raw"].clone(),
        Value::Object(m) if m.is_empty() => Value::Null,
        Value::Object(m) if m.len() == 1 && m.contains_key("fmt") => m["fmt"].clone(),
        Value::Object(m) => Value::Object(
            m.iter()
                .map(|(k, v)| (k.clone(), collapse(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(collapse).collect()),
        other => other.clone(),
    }
}
