// src/report.rs

use crate::analyze::Mover;
use crate::session::{MarketSummary, Panel};
use chrono::{DateTime, Local};
use std::fmt;

/// Two decimals and a percent sign; gainers always carry an explicit sign.
pub fn format_change(change: f64, gainer: bool) -> String {
    if gainer {
        format!("{:+.2}%", change)
    } else {
        format!("{:.2}%", change)
    }
}

pub fn format_last_update(last_refresh: Option<DateTime<Local>>) -> String {
    match last_refresh {
        Some(t) => format!("Last Update: {}", t.format("%Y-%m-%d %H:%M:%S")),
        None => "Last Update: No data loaded".to_string(),
    }
}

fn write_movers(
    f: &mut fmt::Formatter<'_>,
    title: &str,
    movers: &[Mover],
    gainer: bool,
) -> fmt::Result {
    writeln!(f, "  Top {} {}", movers.len(), title)?;
    let width = movers
        .iter()
        .map(|m| m.symbol.len())
        .chain(std::iter::once("Symbol".len()))
        .max()
        .unwrap_or(0);
    writeln!(f, "    {:<width$}  Change", "Symbol", width = width)?;
    for m in movers {
        writeln!(
            f,
            "    {:<width$}  {:>8}",
            m.symbol,
            format_change(m.change, gainer),
            width = width
        )?;
    }
    Ok(())
}

impl fmt::Display for Panel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "#### {}", self.title)?;
        write_movers(f, "Gainers", &self.ranking.gainers, true)?;
        write_movers(f, "Decliners", &self.ranking.decliners, false)
    }
}

impl fmt::Display for MarketSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for panel in &self.panels {
            write!(f, "\n{}", panel)?;
        }
        Ok(())
    }
}

/// Plain-text market summary, one block per panel.
pub fn render_summary(summary: &MarketSummary, last_refresh: Option<DateTime<Local>>) -> String {
    format!("Market Summary\n{}\n{}", format_last_update(last_refresh), summary)
}
