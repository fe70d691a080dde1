//! Plain-text rendering of aggregated metrics for the terminal.

use adpulse_core::{
    format_currency, format_number, format_percentage, format_roas, AggregateResult,
    DailyAggregate, FormatError, MetricRecord,
};
use rust_decimal::Decimal;
use serde::Deserialize;

/// A metrics input file: either a bare array of records or a server response
/// envelope saved with `curl`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecordsFile {
    Records(Vec<MetricRecord>),
    Envelope { data: Vec<MetricRecord> },
}

/// Parse metric records from JSON.
///
/// # Errors
///
/// Returns the `serde_json` error if the document is neither an array of
/// records nor an object with a `data` array.
pub fn parse_records(json: &str) -> Result<Vec<MetricRecord>, serde_json::Error> {
    let file: RecordsFile = serde_json::from_str(json)?;
    Ok(match file {
        RecordsFile::Records(records) | RecordsFile::Envelope { data: records } => records,
    })
}

/// Two-column summary table.
///
/// # Errors
///
/// Returns [`FormatError::InvalidCurrency`] if `currency` is malformed.
pub fn render_summary(summary: &AggregateResult, currency: &str) -> Result<String, FormatError> {
    let rows = [
        ("Impressions", format_number(Decimal::from(summary.total_impressions))),
        ("Clicks", format_number(Decimal::from(summary.total_clicks))),
        ("Conversions", format_number(Decimal::from(summary.total_conversions))),
        ("Spend", format_currency(summary.total_spend, currency)?),
        ("Revenue", format_currency(summary.total_revenue, currency)?),
        ("CTR", format_percentage(summary.average_ctr)),
        ("Conversion Rate", format_percentage(summary.conversion_rate)),
        ("CPC", format_currency(summary.cost_per_click, currency)?),
        ("CPA", format_currency(summary.cost_per_acquisition, currency)?),
        ("AOV", format_currency(summary.average_order_value, currency)?),
        ("ROAS", format_roas(summary.average_roas)),
    ];

    let mut lines = vec![format!("{:<18}VALUE", "METRIC")];
    lines.extend(rows.iter().map(|(label, value)| format!("{label:<18}{value}")));
    Ok(join_lines(&lines))
}

fn join_lines(lines: &[String]) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// One row per day, oldest first.
///
/// # Errors
///
/// Returns [`FormatError::InvalidCurrency`] if `currency` is malformed.
pub fn render_daily(days: &[DailyAggregate], currency: &str) -> Result<String, FormatError> {
    if days.is_empty() {
        return Ok("no metric records in range\n".to_string());
    }

    let mut lines = vec![format!(
        "{:<12}{:>12}{:>10}{:>14}{:>14}{:>8}{:>8}",
        "DATE", "IMPRESSIONS", "CLICKS", "SPEND", "REVENUE", "CTR", "ROAS"
    )];
    for day in days {
        let m = &day.metrics;
        lines.push(format!(
            "{:<12}{:>12}{:>10}{:>14}{:>14}{:>8}{:>8}",
            day.date.format("%Y-%m-%d"),
            format_number(Decimal::from(m.total_impressions)),
            format_number(Decimal::from(m.total_clicks)),
            format_currency(m.total_spend, currency)?,
            format_currency(m.total_revenue, currency)?,
            format_percentage(m.average_ctr),
            format_roas(m.average_roas),
        ));
    }
    Ok(join_lines(&lines))
}
