//! Roll-up of raw per-period metric records into campaign KPIs.
//!
//! Every function here is a pure reduction over its input: no I/O, no shared
//! state, safe to call from any thread or task.
//!
//! Malformed numeric values (for example `revenue: "n/a"`) contribute zero to
//! the totals instead of failing the aggregation. Callers that need to detect
//! bad source data must validate records before aggregating them.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::metrics::{MetricRecord, RawNumber};

/// Totals and derived ratios for a set of metric records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    pub total_revenue: Decimal,
    pub total_spend: Decimal,
    pub total_conversions: i64,
    pub total_impressions: i64,
    pub total_clicks: i64,
    /// Clicks per impression, as a percentage.
    #[serde(rename = "averageCTR")]
    pub average_ctr: Decimal,
    /// Revenue per unit of spend.
    #[serde(rename = "averageROAS")]
    pub average_roas: Decimal,
    /// Conversions per click, as a percentage.
    pub conversion_rate: Decimal,
    pub cost_per_click: Decimal,
    pub cost_per_acquisition: Decimal,
    /// Revenue per conversion.
    pub average_order_value: Decimal,
}

/// Aggregate for one UTC calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub metrics: AggregateResult,
}

#[derive(Debug, Default, Clone, Copy)]
struct Totals {
    revenue: Decimal,
    spend: Decimal,
    conversions: i64,
    impressions: i64,
    clicks: i64,
}

impl Totals {
    fn add(&mut self, record: &MetricRecord) {
        self.revenue = self
            .revenue
            .saturating_add(amount(record.revenue.as_ref(), "revenue"));
        self.spend = self
            .spend
            .saturating_add(amount(record.spend.as_ref(), "spend"));
        self.conversions = self
            .conversions
            .saturating_add(count(record.conversions.as_ref(), "conversions"));
        self.impressions = self
            .impressions
            .saturating_add(count(record.impressions.as_ref(), "impressions"));
        self.clicks = self
            .clicks
            .saturating_add(count(record.clicks.as_ref(), "clicks"));
    }

    fn finish(self) -> AggregateResult {
        let impressions = Decimal::from(self.impressions);
        let clicks = Decimal::from(self.clicks);
        let conversions = Decimal::from(self.conversions);

        AggregateResult {
            total_revenue: self.revenue,
            total_spend: self.spend,
            total_conversions: self.conversions,
            total_impressions: self.impressions,
            total_clicks: self.clicks,
            average_ctr: ratio(clicks, impressions).saturating_mul(Decimal::ONE_HUNDRED),
            average_roas: ratio(self.revenue, self.spend),
            conversion_rate: ratio(conversions, clicks).saturating_mul(Decimal::ONE_HUNDRED),
            cost_per_click: ratio(self.spend, clicks),
            cost_per_acquisition: ratio(self.spend, conversions),
            average_order_value: ratio(self.revenue, conversions),
        }
    }
}

/// Zero unless the denominator is strictly positive. A quotient too large for
/// `Decimal` saturates to `Decimal::MAX` (or `MIN` for a negative numerator).
fn ratio(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    numerator.checked_div(denominator).unwrap_or_else(|| {
        tracing::debug!(%numerator, %denominator, "ratio overflowed, saturating");
        if numerator.is_sign_negative() {
            Decimal::MIN
        } else {
            Decimal::MAX
        }
    })
}

fn amount(value: Option<&RawNumber>, field: &'static str) -> Decimal {
    match value {
        None => Decimal::ZERO,
        Some(raw) => raw.to_amount().unwrap_or_else(|| {
            tracing::debug!(field, value = ?raw, "malformed amount treated as zero");
            Decimal::ZERO
        }),
    }
}

fn count(value: Option<&RawNumber>, field: &'static str) -> i64 {
    match value {
        None => 0,
        Some(raw) => raw.to_count().unwrap_or_else(|| {
            tracing::debug!(field, value = ?raw, "malformed count treated as zero");
            0
        }),
    }
}

/// Sum the records and derive CTR, ROAS, AOV and the cost/conversion ratios.
///
/// Input order does not matter. An empty input yields all zeros. Ratios whose
/// denominator is zero are reported as zero.
#[must_use]
pub fn aggregate<'a, I>(records: I) -> AggregateResult
where
    I: IntoIterator<Item = &'a MetricRecord>,
{
    let mut totals = Totals::default();
    for record in records {
        totals.add(record);
    }
    totals.finish()
}

/// Aggregate records per UTC calendar day, ascending by date.
#[must_use]
pub fn aggregate_by_day<'a, I>(records: I) -> Vec<DailyAggregate>
where
    I: IntoIterator<Item = &'a MetricRecord>,
{
    let mut days: BTreeMap<NaiveDate, Totals> = BTreeMap::new();
    for record in records {
        days.entry(record.day()).or_default().add(record);
    }
    days.into_iter()
        .map(|(date, totals)| DailyAggregate {
            date,
            metrics: totals.finish(),
        })
        .collect()
}

/// A record whose funnel counts are out of order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunnelWarning {
    ClicksExceedImpressions { clicks: i64, impressions: i64 },
    ConversionsExceedClicks { conversions: i64, clicks: i64 },
}

impl fmt::Display for FunnelWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClicksExceedImpressions {
                clicks,
                impressions,
            } => write!(f, "clicks ({clicks}) exceed impressions ({impressions})"),
            Self::ConversionsExceedClicks {
                conversions,
                clicks,
            } => write!(f, "conversions ({conversions}) exceed clicks ({clicks})"),
        }
    }
}

/// Check the impressions ≥ clicks ≥ conversions funnel for one record.
///
/// Purely advisory: [`aggregate`] never consults it and sums such records as-is.
#[must_use]
pub fn validate_funnel(record: &MetricRecord) -> Vec<FunnelWarning> {
    let impressions = record.impressions.as_ref().and_then(RawNumber::to_count).unwrap_or(0);
    let clicks = record.clicks.as_ref().and_then(RawNumber::to_count).unwrap_or(0);
    let conversions = record.conversions.as_ref().and_then(RawNumber::to_count).unwrap_or(0);

    let mut warnings = Vec::new();
    if clicks > impressions {
        warnings.push(FunnelWarning::ClicksExceedImpressions {
            clicks,
            impressions,
        });
    }
    if conversions > clicks {
        warnings.push(FunnelWarning::ConversionsExceedClicks {
            conversions,
            clicks,
        });
    }
    warnings
}

#[cfg(test)]
#[path = "aggregate_test.rs"]
mod tests;
