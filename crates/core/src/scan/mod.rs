use crate::domain::company::CompanyInfo;
use crate::quote::{lookup_company_info, QuoteProvider};
use anyhow::Result;
use serde::Serialize;

/// Outcome of one scan. The default (`0.0`, `0`, `""`, `{}`) means no symbol had a
/// positive yield.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScanResult {
    pub dividend_yield: f64,
    /// Position of `symbol` within the scanned sequence.
    pub index: usize,
    pub symbol: String,
    pub info: CompanyInfo,
    /// Symbols whose lookup succeeded.
    pub evaluated: usize,
    /// Symbols whose lookup failed and were skipped.
    pub failed: usize,
}

impl ScanResult {
    pub fn has_winner(&self) -> bool {
        !self.symbol.is_empty()
    }
}

/// Looks every symbol up in order and keeps the strictly greatest dividend yield.
/// Ties go to the first symbol seen; failed lookups and missing yields are skipped.
pub async fn find_highest_dividend_yield<P>(provider: &P, symbols: &[String]) -> ScanResult
where
    P: QuoteProvider + ?Sized,
{
    let mut best = ScanResult::default();

    for (index, symbol) in symbols.iter().enumerate() {
        tracing::info!(%symbol, index, "evaluating");

        let Some(info) = lookup_company_info(provider, symbol).await else {
            best.failed += 1;
            continue;
        };
        best.evaluated += 1;

        let Some(dividend_yield) = info.dividend_yield() else {
            continue;
        };

        if dividend_yield > best.dividend_yield {
            tracing::info!(%symbol, dividend_yield, "new company with top dividend yield");
            best.dividend_yield = dividend_yield;
            best.index = index;
            best.symbol = symbol.clone();
            best.info = info;
        }
    }

    tracing::info!(
        symbol = %best.symbol,
        dividend_yield = best.dividend_yield,
        evaluated = best.evaluated,
        failed = best.failed,
        "scan finished"
    );
    best
}

/// Splits at `symbol`: the back half starts with it.
pub fn split_by_symbol<'a>(
    symbols: &'a [String],
    symbol: &str,
) -> Result<(&'a [String], &'a [String])> {
    let at = symbols
        .iter()
        .position(|s| s == symbol)
        .ok_or_else(|| anyhow::anyhow!("symbol {symbol} is not in the symbol list"))?;
    Ok(symbols.split_at(at))
}

pub async fn full_scan<P>(provider: &P, symbols: &[String]) -> ScanResult
where
    P: QuoteProvider + ?Sized,
{
    find_highest_dividend_yield(provider, symbols).await
}

/// Scans from `start` (inclusive) to the end of the list.
pub async fn partial_scan<P>(provider: &P, symbols: &[String], start: &str) -> Result<ScanResult>
where
    P: QuoteProvider + ?Sized,
{
    let (_front, back) = split_by_symbol(symbols, start)?;
    Ok(find_highest_dividend_yield(provider, back).await)
}
