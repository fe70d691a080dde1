//! Tabular exports of aggregated metrics.

use std::io::Write;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use thiserror::Error;

use crate::aggregate::{aggregate, AggregateResult};
use crate::campaigns::Campaign;
use crate::format::{format_currency, format_percentage, format_roas, FormatError};
use crate::metrics::MetricRecord;

/// Number of campaigns embedded in the overview.
pub const OVERVIEW_CAMPAIGN_LIMIT: usize = 5;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error during export: {0}")]
    Io(#[from] std::io::Error),

    #[error("export produced invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error(transparent)]
    Format(#[from] FormatError),
}

/// Dashboard headline numbers across every campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_revenue: Decimal,
    pub total_spend: Decimal,
    pub total_conversions: i64,
    /// ROAS rounded to one decimal place.
    pub roas: Decimal,
    pub active_campaigns: usize,
    pub impressions: i64,
    pub clicks: i64,
    /// CTR percentage rounded to one decimal place.
    pub ctr: Decimal,
    pub campaigns: Vec<Campaign>,
}

fn round_to(value: Decimal, dp: u32) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(dp);
    rounded
}

impl Overview {
    /// Build the overview from every known campaign and metric record.
    #[must_use]
    pub fn build(campaigns: &[Campaign], records: &[MetricRecord]) -> Self {
        let totals = aggregate(records);
        Self {
            total_revenue: round_to(totals.total_revenue, 2),
            total_spend: round_to(totals.total_spend, 2),
            total_conversions: totals.total_conversions,
            roas: round_to(totals.average_roas, 1),
            active_campaigns: campaigns.iter().filter(|c| c.is_active()).count(),
            impressions: totals.total_impressions,
            clicks: totals.total_clicks,
            ctr: round_to(totals.average_ctr, 1),
            campaigns: campaigns
                .iter()
                .take(OVERVIEW_CAMPAIGN_LIMIT)
                .cloned()
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    #[serde(rename = "Metric")]
    pub metric: &'static str,
    #[serde(rename = "Value")]
    pub value: String,
    #[serde(rename = "Period")]
    pub period: &'static str,
}

/// One labeled row per headline metric.
#[must_use]
pub fn overview_rows(overview: &Overview) -> Vec<ExportRow> {
    let all_time = |metric, value: String| ExportRow {
        metric,
        value,
        period: "All Time",
    };
    vec![
        all_time("Total Revenue", overview.total_revenue.to_string()),
        all_time("Total Spend", overview.total_spend.to_string()),
        all_time("Total Conversions", overview.total_conversions.to_string()),
        all_time("ROAS", overview.roas.to_string()),
        ExportRow {
            metric: "Active Campaigns",
            value: overview.active_campaigns.to_string(),
            period: "Current",
        },
        all_time("Impressions", overview.impressions.to_string()),
        all_time("Clicks", overview.clicks.to_string()),
        all_time("CTR", format_percentage(overview.ctr)),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CampaignExportRow {
    #[serde(rename = "Campaign Name")]
    pub name: String,
    #[serde(rename = "Platform")]
    pub platform: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Budget")]
    pub budget: String,
    #[serde(rename = "Spent")]
    pub spent: String,
    #[serde(rename = "Impressions")]
    pub impressions: i64,
    #[serde(rename = "Clicks")]
    pub clicks: i64,
    #[serde(rename = "CTR")]
    pub ctr: String,
    #[serde(rename = "Conversions")]
    pub conversions: i64,
    #[serde(rename = "ROAS")]
    pub roas: String,
    #[serde(rename = "Created Date")]
    pub created_date: NaiveDate,
}

/// Display-formatted rows for each campaign and its rollup.
///
/// # Errors
///
/// Returns [`ExportError::Format`] if `currency` is not a valid currency code.
pub fn campaign_rows(
    campaigns: &[(Campaign, AggregateResult)],
    currency: &str,
) -> Result<Vec<CampaignExportRow>, ExportError> {
    campaigns
        .iter()
        .map(|(campaign, metrics)| -> Result<CampaignExportRow, ExportError> {
            let budget = match campaign.budget {
                Some(budget) => format_currency(budget, currency)?,
                None => String::new(),
            };
            Ok(CampaignExportRow {
                name: campaign.name.clone(),
                platform: campaign.platform.clone(),
                status: campaign.status.to_string(),
                budget,
                spent: format_currency(campaign.spent, currency)?,
                impressions: metrics.total_impressions,
                clicks: metrics.total_clicks,
                ctr: format_percentage(metrics.average_ctr),
                conversions: metrics.total_conversions,
                roas: format_roas(metrics.average_roas),
                created_date: campaign.created_at.date_naive(),
            })
        })
        .collect()
}

/// Serialize `rows` as CSV with a header row taken from the field names.
///
/// An empty slice writes nothing at all.
///
/// # Errors
///
/// Returns [`ExportError::Csv`] if a row cannot be serialized or written.
pub fn write_csv<W: Write, R: Serialize>(writer: W, rows: &[R]) -> Result<(), ExportError> {
    if rows.is_empty() {
        return Ok(());
    }
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// [`write_csv`] into an in-memory string.
///
/// # Errors
///
/// Returns [`ExportError`] if serialization fails.
pub fn to_csv_string<R: Serialize>(rows: &[R]) -> Result<String, ExportError> {
    let mut buf = Vec::new();
    write_csv(&mut buf, rows)?;
    Ok(String::from_utf8(buf)?)
}

/// `<prefix>-YYYY-MM-DD.csv`
#[must_use]
pub fn export_filename(prefix: &str, date: NaiveDate) -> String {
    format!("{prefix}-{}.csv", date.format("%Y-%m-%d"))
}
