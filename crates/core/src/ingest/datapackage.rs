//! Roster loading from a tabular data package (datahub.io `datapackage.json`).
//!
//! The descriptor lists several resources; the roster comes from the one tagged
//! `derived/csv`. Descriptors without datahub tags fall back to the first plain
//! CSV resource.

use crate::config::Settings;
use crate::domain::roster::{Roster, RosterEntry};
use anyhow::{Context, Result};
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;

const DERIVED_CSV: &str = "derived/csv";

#[derive(Debug, Clone, Deserialize)]
pub struct PackageDescriptor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub resources: Vec<ResourceDescriptor>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceDescriptor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub path: Option<ResourcePath>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub datahub: Option<DatahubMeta>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ResourcePath {
    Single(String),
    Chunked(Vec<String>),
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatahubMeta {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl ResourceDescriptor {
    fn first_path(&self) -> Option<&str> {
        match self.path.as_ref()? {
            ResourcePath::Single(p) => Some(p.as_str()),
            ResourcePath::Chunked(ps) => ps.first().map(String::as_str),
        }
    }

    fn is_derived_csv(&self) -> bool {
        self.datahub
            .as_ref()
            .and_then(|d| d.kind.as_deref())
            .is_some_and(|k| k == DERIVED_CSV)
    }

    fn looks_like_csv(&self) -> bool {
        let by_format = self
            .format
            .as_deref()
            .is_some_and(|f| f.eq_ignore_ascii_case("csv"));
        let by_path = self
            .first_path()
            .is_some_and(|p| p.to_ascii_lowercase().ends_with(".csv"));
        by_format || by_path
    }
}

/// Picks the roster resource. When several are tagged `derived/csv` the last one wins.
pub fn select_csv_resource(pkg: &PackageDescriptor) -> Option<&ResourceDescriptor> {
    pkg.resources
        .iter()
        .rev()
        .find(|r| r.is_derived_csv() && r.first_path().is_some())
        .or_else(|| {
            pkg.resources
                .iter()
                .find(|r| r.looks_like_csv() && r.first_path().is_some())
        })
}

/// Resolves a resource path against the descriptor URL (absolute paths pass through).
pub fn resolve_resource_url(descriptor_url: &str, path: &str) -> Result<String> {
    let base = Url::parse(descriptor_url)
        .with_context(|| format!("invalid data package URL: {descriptor_url}"))?;
    let joined = base
        .join(path)
        .with_context(|| format!("invalid resource path {path} for {descriptor_url}"))?;
    Ok(joined.to_string())
}

pub fn parse_roster_csv(text: &str, source_url: &str) -> Result<Roster> {
    let text = text.trim_start_matches('\u{feff}');
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let columns: Vec<String> = rdr
        .headers()
        .context("failed to read roster CSV header")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut entries = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("malformed roster CSV row {}", row + 1))?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        entries.push(RosterEntry::from_fields(record.iter()));
    }

    anyhow::ensure!(!entries.is_empty(), "roster CSV has no rows: {source_url}");
    Ok(Roster::new(columns, entries, source_url))
}

pub fn http_client(settings: &Settings) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.http_timeout_secs))
        .build()
        .context("failed to build roster http client")
}

async fn fetch_text(http: &reqwest::Client, url: &str, what: &str) -> Result<String> {
    let res = http
        .get(url)
        .send()
        .await
        .with_context(|| format!("{what} request failed: {url}"))?;

    let status = res.status();
    let text = res
        .text()
        .await
        .with_context(|| format!("failed to read {what} response body"))?;

    if !status.is_success() {
        anyhow::bail!("{what} HTTP {status}: {url}");
    }
    Ok(text)
}

/// Fetches the descriptor, then its CSV resource, and parses the roster.
pub async fn load_roster(http: &reqwest::Client, url: &str) -> Result<Roster> {
    tracing::info!(%url, "getting roster data package");

    let text = fetch_text(http, url, "data package descriptor").await?;
    let pkg = serde_json::from_str::<PackageDescriptor>(&text)
        .with_context(|| format!("data package descriptor is not valid JSON: {url}"))?;

    let resource = select_csv_resource(&pkg)
        .with_context(|| format!("data package has no CSV resource: {url}"))?;
    let path = resource
        .first_path()
        .context("selected resource has no path")?;
    let csv_url = resolve_resource_url(url, path)?;

    tracing::debug!(
        package = pkg.name.as_deref().unwrap_or("-"),
        resource = resource.name.as_deref().unwrap_or("-"),
        %csv_url,
        "selected roster resource"
    );

    let csv_text = fetch_text(http, &csv_url, "roster CSV").await?;
    let roster = parse_roster_csv(&csv_text, &csv_url)?;

    tracing::info!(entries = roster.len(), %csv_url, "roster loaded");
    Ok(roster)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn descriptor(v: serde_json::Value) -> PackageDescriptor {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn picks_last_derived_csv_resource() {
        let pkg = descriptor(json!({
            "name": "s-and-p-500-companies",
            "resources": [
                {"name": "validation_report", "path": "data/validation.json", "datahub": {"type": "derived/report"}},
                {"name": "constituents_csv", "path": "data/constituents_csv.csv", "datahub": {"type": "derived/csv"}},
                {"name": "constituents_json", "path": "data/constituents_json.json", "datahub": {"type": "derived/json"}},
                {"name": "constituents_csv_v2", "path": "data/v2.csv", "datahub": {"type": "derived/csv"}},
                {"name": "constituents", "path": "data/constituents.csv", "format": "csv", "datahub": {"type": "original"}}
            ]
        }));

        let r = select_csv_resource(&pkg).unwrap();
        assert_eq!(r.name.as_deref(), Some("constituents_csv_v2"));
    }

    #[test]
    fn falls_back_to_plain_csv_resource() {
        let pkg = descriptor(json!({
            "resources": [
                {"name": "readme", "path": "README.md"},
                {"name": "constituents", "path": ["data/constituents.csv"], "format": "csv"}
            ]
        }));

        let r = select_csv_resource(&pkg).unwrap();
        assert_eq!(r.first_path(), Some("data/constituents.csv"));

        let none = descriptor(json!({"resources": [{"name": "readme", "path": "README.md"}]}));
        assert!(select_csv_resource(&none).is_none());
    }

    #[test]
    fn resolves_relative_and_absolute_paths() {
        let base = "https://datahub.io/core/s-and-p-500-companies/datapackage.json";
        assert_eq!(
            resolve_resource_url(base, "r/constituents.csv").unwrap(),
            "https://datahub.io/core/s-and-p-500-companies/r/constituents.csv"
        );
        assert_eq!(
            resolve_resource_url(base, "https://pkgstore.example/c.csv").unwrap(),
            "https://pkgstore.example/c.csv"
        );
    }

    #[test]
    fn parses_roster_rows_without_header() {
        let text = "\u{feff}Symbol,Security,GICS Sector,Headquarters Location\n\
                    MMM,3M,Industrials,\"Saint Paul, Minnesota\"\n\
                    \n\
                    BRK.B,Berkshire Hathaway,Financials,\"Omaha, Nebraska\"\n";

        let roster = parse_roster_csv(text, "https://example.test/c.csv").unwrap();
        assert_eq!(roster.columns[0], "Symbol");
        assert_eq!(roster.symbols(), vec!["MMM", "BRK.B"]);
        assert_eq!(roster.entries[1].sector, "Financials");
        assert_eq!(roster.entries[0].extra, vec!["Saint Paul, Minnesota".to_string()]);
    }

    #[test]
    fn header_only_csv_is_an_error() {
        assert!(parse_roster_csv("Symbol,Name,Sector\n", "x").is_err());
    }

    #[tokio::test]
    async fn loads_roster_through_relative_csv_resource() {
        use httpmock::prelude::*;

        let server = MockServer::start_async().await;
        let descriptor = server
            .mock_async(|when, then| {
                when.method(GET).path("/core/s-and-p-500-companies/datapackage.json");
                then.status(200).json_body(json!({
                    "name": "s-and-p-500-companies",
                    "resources": [
                        {"name": "constituents_csv", "path": "r/constituents.csv", "datahub": {"type": "derived/csv"}},
                        {"name": "constituents_json", "path": "r/constituents.json", "datahub": {"type": "derived/json"}}
                    ]
                }));
            })
            .await;
        let csv = server
            .mock_async(|when, then| {
                when.method(GET).path("/core/s-and-p-500-companies/r/constituents.csv");
                then.status(200)
                    .header("content-type", "text/csv")
                    .body("Symbol,Security,GICS Sector\nMMM,3M,Industrials\nBRK.B,Berkshire Hathaway,Financials\n");
            })
            .await;

        let http = http_client(&Settings::default()).unwrap();
        let roster = load_roster(&http, &server.url("/core/s-and-p-500-companies/datapackage.json"))
            .await
            .unwrap();

        assert_eq!(roster.symbols(), vec!["MMM", "BRK.B"]);
        assert_eq!(roster.entries[1].name, "Berkshire Hathaway");
        assert_eq!(
            roster.source_url,
            server.url("/core/s-and-p-500-companies/r/constituents.csv")
        );
        assert_eq!(descriptor.calls_async().await, 1);
        assert_eq!(csv.calls_async().await, 1);
    }

    #[tokio::test]
    async fn non_success_descriptor_is_an_error() {
        use httpmock::prelude::*;

        let server = MockServer::start_async().await;
        let descriptor = server
            .mock_async(|when, then| {
                when.method(GET).path("/datapackage.json");
                then.status(503).body("unavailable");
            })
            .await;

        let http = http_client(&Settings::default()).unwrap();
        let err = load_roster(&http, &server.url("/datapackage.json"))
            .await
            .unwrap_err();

        assert!(format!("{err:#}").contains("data package descriptor HTTP 503"));
        assert_eq!(descriptor.calls_async().await, 1);
    }

    #[tokio::test]
    async fn non_success_csv_is_an_error() {
        use httpmock::prelude::*;

        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/datapackage.json");
                then.status(200).json_body(json!({
                    "resources": [{"name": "constituents", "path": "constituents.csv", "format": "csv"}]
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/constituents.csv");
                then.status(404);
            })
            .await;

        let http = http_client(&Settings::default()).unwrap();
        let err = load_roster(&http, &server.url("/datapackage.json"))
            .await
            .unwrap_err();

        assert!(format!("{err:#}").contains("roster CSV HTTP 404"));
    }
}
