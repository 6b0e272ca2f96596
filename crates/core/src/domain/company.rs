use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DIVIDEND_YIELD_KEY: &str = "dividendYield";

/// Provider metadata for one company, keyed the way the provider names fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyInfo(pub Map<String, Value>);

impl CompanyInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Dividend yield as a fraction. Absent, null, and non-numeric values are `None`.
    pub fn dividend_yield(&self) -> Option<f64> {
        self.0
            .get(DIVIDEND_YIELD_KEY)
            .and_then(Value::as_f64)
            .filter(|v| v.is_finite())
    }
}

impl From<Map<String, Value>> for CompanyInfo {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for CompanyInfo {
    type Error = anyhow::Error;

    fn try_from(value: Value) -> anyhow::Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => anyhow::bail!("company info must be a JSON object (got {other})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn info(v: Value) -> CompanyInfo {
        CompanyInfo::try_from(v).unwrap()
    }

    #[test]
    fn numeric_yield_is_read() {
        assert_eq!(info(json!({"dividendYield": 0.0345})).dividend_yield(), Some(0.0345));
        assert_eq!(info(json!({"dividendYield": 2})).dividend_yield(), Some(2.0));
    }

    #[test]
    fn missing_null_or_malformed_yield_is_not_a_candidate() {
        assert_eq!(info(json!({})).dividend_yield(), None);
        assert_eq!(info(json!({"dividendYield": null})).dividend_yield(), None);
        assert_eq!(info(json!({"dividendYield": "3.4%"})).dividend_yield(), None);
        assert_eq!(info(json!({"dividendYield": {"raw": 0.01}})).dividend_yield(), None);
    }

    #[test]
    fn non_object_is_rejected() {
        assert!(CompanyInfo::try_from(json!([1, 2])).is_err());
    }
}
