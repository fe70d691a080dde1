use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// A numeric field exactly as it arrived on the wire.
///
/// Ad platforms and the storage layer serialize counters and currency amounts
/// either as JSON numbers or as decimal strings (`"100.00"`). The value is kept
/// raw so that a malformed string never fails deserialization of the whole
/// record; it is coerced when the record is aggregated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl RawNumber {
    /// Interpret the value as an exact decimal amount.
    ///
    /// Returns `None` for empty or unparseable strings and for non-finite floats.
    #[must_use]
    pub fn to_amount(&self) -> Option<Decimal> {
        match self {
            Self::Integer(n) => Some(Decimal::from(*n)),
            Self::Float(f) => Decimal::try_from(*f).ok(),
            Self::Text(s) => parse_decimal_text(s),
        }
    }

    /// Interpret the value as an integer count.
    ///
    /// Fractional values are truncated toward zero and values outside the `i64`
    /// range saturate. Returns `None` when the value cannot be read as a number.
    #[must_use]
    pub fn to_count(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            Self::Float(f) if f.is_finite() => Some(
                Decimal::try_from(*f)
                    .map_or_else(|_| saturated_count(f.is_sign_negative()), truncate_count),
            ),
            Self::Float(_) => None,
            Self::Text(s) => {
                let trimmed = s.trim();
                trimmed
                    .parse::<i64>()
                    .ok()
                    .or_else(|| parse_decimal_text(trimmed).map(truncate_count))
            }
        }
    }
}

fn truncate_count(value: Decimal) -> i64 {
    let whole = value.trunc();
    whole
        .to_i64()
        .unwrap_or_else(|| saturated_count(whole.is_sign_negative()))
}

fn saturated_count(negative: bool) -> i64 {
    if negative {
        i64::MIN
    } else {
        i64::MAX
    }
}

fn parse_decimal_text(s: &str) -> Option<Decimal> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}

impl From<i64> for RawNumber {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<Decimal> for RawNumber {
    fn from(value: Decimal) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<&str> for RawNumber {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// One period's raw performance counters for a campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricRecord {
    /// Assigned by the store; absent on records that have not been persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub campaign_id: Option<Uuid>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub impressions: Option<RawNumber>,
    #[serde(default)]
    pub clicks: Option<RawNumber>,
    #[serde(default)]
    pub conversions: Option<RawNumber>,
    #[serde(default)]
    pub spend: Option<RawNumber>,
    #[serde(default)]
    pub revenue: Option<RawNumber>,
}

/// Create payload for a metric record. Identical to [`MetricRecord`]; any `id`
/// supplied by a client is replaced by the store.
pub type NewMetricRecord = MetricRecord;

impl MetricRecord {
    /// An empty record for `date`, with every counter unset.
    #[must_use]
    pub fn new(campaign_id: Option<Uuid>, date: DateTime<Utc>) -> Self {
        Self {
            id: None,
            campaign_id,
            date,
            impressions: None,
            clicks: None,
            conversions: None,
            spend: None,
            revenue: None,
        }
    }

    #[must_use]
    pub fn with_counts(mut self, impressions: i64, clicks: i64, conversions: i64) -> Self {
        self.impressions = Some(RawNumber::Integer(impressions));
        self.clicks = Some(RawNumber::Integer(clicks));
        self.conversions = Some(RawNumber::Integer(conversions));
        self
    }

    #[must_use]
    pub fn with_amounts(mut self, spend: impl Into<RawNumber>, revenue: impl Into<RawNumber>) -> Self {
        self.spend = Some(spend.into());
        self.revenue = Some(revenue.into());
        self
    }

    /// UTC calendar day the record belongs to.
    #[must_use]
    pub fn day(&self) -> NaiveDate {
        self.date.date_naive()
    }
}

/// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!(
            "invalid date '{raw}': expected RFC 3339 timestamp or YYYY-MM-DD"
        ))
    })
}
