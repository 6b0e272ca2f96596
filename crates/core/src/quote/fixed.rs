use crate::domain::company::CompanyInfo;
use crate::quote::error::QuoteDiagnosticsError;
use crate::quote::QuoteProvider;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory provider keyed by symbol. Unknown symbols and symbols registered with
/// `with_failure` return an error. Every call is recorded in order.
/// Backs the scanner and command-loop tests.
#[derive(Debug, Default)]
pub struct FixedQuoteProvider {
    entries: HashMap<String, Option<CompanyInfo>>,
    calls: Mutex<Vec<String>>,
}

impl FixedQuoteProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers metadata for `symbol`. Non-object values are stored as an empty info.
    pub fn with_info(mut self, symbol: &str, info: Value) -> Self {
        let info = CompanyInfo::try_from(info).unwrap_or_default();
        self.entries.insert(symbol.to_string(), Some(info));
        self
    }

    /// Shorthand for an info carrying only a dividend yield (`None` stores a null).
    pub fn with_yield(self, symbol: &str, dividend_yield: Option<f64>) -> Self {
        self.with_info(symbol, serde_json::json!({ "dividendYield": dividend_yield }))
    }

    pub fn with_failure(mut self, symbol: &str) -> Self {
        self.entries.insert(symbol.to_string(), None);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl QuoteProvider for FixedQuoteProvider {
    fn provider_name(&self) -> &'static str {
        "fixed"
    }

    async fn fetch_company_info(&self, symbol: &str) -> anyhow::Result<CompanyInfo> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(symbol.to_string());
        }

        match self.entries.get(symbol) {
            Some(Some(info)) => Ok(info.clone()),
            Some(None) => Err(QuoteDiagnosticsError::new(symbol, "provider", "simulated failure").into()),
            None => Err(QuoteDiagnosticsError::new(symbol, "provider", "unknown symbol").into()),
        }
    }
}
