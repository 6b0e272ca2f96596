use anyhow::Context;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use topyield_core::domain::roster::Roster;
use topyield_core::quote::{lookup_company_info, QuoteProvider};
use topyield_core::scan::{self, ScanResult};

const BAR: &str = "#########################";

const HELP: &str = "\t1. exit\n\t2. full\n\t3. partial\n\t4. company\n\t5. market\n\t6. symbol";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Exit,
    Full,
    Partial,
    Company,
    Market,
    Symbol,
    Help,
}

impl Command {
    pub fn parse(input: &str) -> Self {
        match input.trim() {
            "exit" => Self::Exit,
            "full" => Self::Full,
            "partial" => Self::Partial,
            "company" => Self::Company,
            "market" => Self::Market,
            "symbol" => Self::Symbol,
            _ => Self::Help,
        }
    }
}

/// One interactive session over a roster loaded at startup.
pub struct Session<P, R, W> {
    provider: P,
    roster: Roster,
    symbols: Vec<String>,
    input: Lines<R>,
    out: W,
}

impl<P, R, W> Session<P, R, W>
where
    P: QuoteProvider,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(provider: P, roster: Roster, input: R, out: W) -> Self {
        let symbols = roster.symbols();
        Self {
            provider,
            roster,
            symbols,
            input: input.lines(),
            out,
        }
    }

    #[cfg(test)]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.out
    }

    /// Prompts and dispatches until `exit` or end of input.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            self.banner("COMMAND")?;
            let Some(line) = self.prompt().await? else {
                tracing::info!("input closed");
                return Ok(());
            };
            if !self.handle(Command::parse(&line)).await? {
                return Ok(());
            }
        }
    }

    /// Runs one command. Returns `false` when the loop should stop.
    pub async fn handle(&mut self, command: Command) -> anyhow::Result<bool> {
        match command {
            Command::Exit => return Ok(false),
            Command::Full => {
                self.banner("FULL")?;
                let res = scan::full_scan(&self.provider, &self.symbols).await;
                self.print_scan(&res)?;
            }
            Command::Partial => {
                self.banner("PARTIAL")?;
                let Some(symbol) = self.prompt_symbol().await? else {
                    return Ok(false);
                };
                let res = scan::partial_scan(&self.provider, &self.symbols, &symbol)
                    .await
                    .with_context(|| format!("partial scan from {symbol} failed"))?;
                self.print_scan(&res)?;
            }
            Command::Company => {
                self.banner("COMPANY")?;
                let Some(symbol) = self.prompt_symbol().await? else {
                    return Ok(false);
                };
                match lookup_company_info(&self.provider, &symbol).await {
                    Some(info) => {
                        let text = serde_json::to_string_pretty(&info)?;
                        writeln!(self.out, "{text}")?;
                    }
                    None => writeln!(self.out, "No info found")?,
                }
            }
            Command::Market => {
                self.banner("MARKET")?;
                self.print_market()?;
            }
            Command::Symbol => {
                self.banner("SYMBOL")?;
                writeln!(self.out, "{}", self.symbols.join(", "))?;
            }
            Command::Help => {
                self.banner("HELP")?;
                writeln!(self.out, "{HELP}")?;
            }
        }

        self.out.flush()?;
        Ok(true)
    }

    fn banner(&mut self, title: &str) -> anyhow::Result<()> {
        write!(self.out, "\n\n{BAR}\n#        {title:<15}#\n{BAR}\n\n")?;
        Ok(())
    }

    async fn prompt(&mut self) -> anyhow::Result<Option<String>> {
        write!(self.out, "> ")?;
        self.out.flush()?;
        self.input
            .next_line()
            .await
            .context("failed to read from stdin")
    }

    async fn prompt_symbol(&mut self) -> anyhow::Result<Option<String>> {
        writeln!(self.out, "Input the company symbol")?;
        Ok(self.prompt().await?.map(|s| s.trim().to_uppercase()))
    }

    fn print_scan(&mut self, res: &ScanResult) -> anyhow::Result<()> {
        if !res.has_winner() {
            writeln!(self.out, "No company with a positive dividend yield found")?;
            return Ok(());
        }

        let name = self
            .roster
            .get(&res.symbol)
            .map(|e| e.name.as_str())
            .unwrap_or("");
        writeln!(self.out, "{} {}", res.symbol, name)?;
        writeln!(
            self.out,
            "dividend yield: {:.2}% (scan position {}, {} evaluated, {} failed)",
            res.dividend_yield * 100.0,
            res.index,
            res.evaluated,
            res.failed
        )?;
        Ok(())
    }

    fn print_market(&mut self) -> anyhow::Result<()> {
        writeln!(
            self.out,
            "{} companies from {} (fetched {})",
            self.roster.len(),
            self.roster.source_url,
            self.roster.fetched_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        if !self.roster.columns.is_empty() {
            writeln!(self.out, "{}", self.roster.columns.join(" | "))?;
        }
        for e in &self.roster.entries {
            write!(self.out, "{} | {} | {}", e.symbol, e.name, e.sector)?;
            for field in &e.extra {
                write!(self.out, " | {field}")?;
            }
            writeln!(self.out)?;
        }
        Ok(())
    }
}
