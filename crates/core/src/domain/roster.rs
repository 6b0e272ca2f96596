use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One constituent row: symbol, company name and sector, plus whatever columns
/// the source carries after them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub symbol: String,
    pub name: String,
    pub sector: String,
    pub extra: Vec<String>,
}

impl RosterEntry {
    /// Builds an entry positionally. Missing columns become empty strings.
    pub fn from_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut it = fields.into_iter().map(|s| s.as_ref().trim().to_string());
        let symbol = it.next().unwrap_or_default();
        let name = it.next().unwrap_or_default();
        let sector = it.next().unwrap_or_default();
        Self {
            symbol,
            name,
            sector,
            extra: it.collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Roster {
    pub columns: Vec<String>,
    pub entries: Vec<RosterEntry>,
    pub source_url: String,
    pub fetched_at: DateTime<Utc>,
}

impl Roster {
    pub fn new(columns: Vec<String>, entries: Vec<RosterEntry>, source_url: impl Into<String>) -> Self {
        Self {
            columns,
            entries,
            source_url: source_url.into(),
            fetched_at: Utc::now(),
        }
    }

    /// Symbols in roster order.
    pub fn symbols(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.symbol.clone()).collect()
    }

    pub fn symbol_at(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|e| e.symbol.as_str())
    }

    pub fn get(&self, symbol: &str) -> Option<&RosterEntry> {
        self.entries.iter().find(|e| e.symbol == symbol)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
