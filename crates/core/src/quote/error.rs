use std::fmt;

#[derive(Debug, Clone)]
pub struct QuoteDiagnosticsError {
    pub symbol: String,
    pub stage: &'static str,
    pub detail: String,
    pub raw_output: Option<String>,
}

impl QuoteDiagnosticsError {
    pub fn new(symbol: &str, stage: &'static str, detail: impl Into<String>) -> Self {
        Self {
            symbol: symbol.to_string(),
            stage,
            detail: detail.into(),
            raw_output: None,
        }
    }

    pub fn with_raw_output(mut self, raw: impl Into<String>) -> Self {
        self.raw_output = Some(raw.into());
        self
    }
}

impl fmt::Display for QuoteDiagnosticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "quote lookup failed (symbol={}, stage={}): {}",
            self.symbol, self.stage, self.detail
        )
    }
}

impl std::error::Error for QuoteDiagnosticsError {}
