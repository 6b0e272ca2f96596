pub mod error;
pub mod fixed;
pub mod yahoo;

use crate::domain::company::CompanyInfo;

#[async_trait::async_trait]
pub trait QuoteProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn fetch_company_info(&self, symbol: &str) -> anyhow::Result<CompanyInfo>;
}

/// Single best-effort lookup. Any provider error is logged and turned into `None`
/// so callers can skip the symbol and keep going.
pub async fn lookup_company_info<P>(provider: &P, symbol: &str) -> Option<CompanyInfo>
where
    P: QuoteProvider + ?Sized,
{
    match provider.fetch_company_info(symbol).await {
        Ok(info) => Some(info),
        Err(err) => {
            tracing::warn!(
                provider = provider.provider_name(),
                %symbol,
                error = %err,
                "company info lookup failed"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixed::FixedQuoteProvider;
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn failures_become_none() {
        let provider = FixedQuoteProvider::new()
            .with_info("AAA", json!({"dividendYield": 0.02}))
            .with_failure("BBB");

        assert!(lookup_company_info(&provider, "AAA").await.is_some());
        assert!(lookup_company_info(&provider, "BBB").await.is_none());
        assert!(lookup_company_info(&provider, "NOPE").await.is_none());
    }
}
