//! Deterministic sample data for local development.

use adpulse_core::{CampaignStatus, MetricRecord, NewCampaign, RawNumber, SeedCampaign, SeedFile};
use chrono::{Days, NaiveDate, NaiveTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

struct Profile {
    name: &'static str,
    platform: &'static str,
    budget_cents: i64,
    spent_cents: i64,
    objective: &'static str,
}

const PROFILES: [Profile; 2] = [
    Profile {
        name: "Holiday Shopping Campaign",
        platform: "Google Ads",
        budget_cents: 5_000_000,
        spent_cents: 3_245_000,
        objective: "conversions",
    },
    Profile {
        name: "Black Friday Sale",
        platform: "Facebook",
        budget_cents: 2_500_000,
        spent_cents: 1_524_000,
        objective: "traffic",
    },
];

/// Two active campaigns, each with one metric record per day for the `days`
/// days ending on `last_day`.
///
/// The same `rng_seed` always yields the same numbers. Amounts are two-decimal
/// strings, the way the dashboard API stores them.
#[must_use]
pub fn generate(days: u32, rng_seed: u64, last_day: NaiveDate) -> SeedFile {
    let mut rng = StdRng::seed_from_u64(rng_seed);
    let first_day = last_day
        .checked_sub_days(Days::new(u64::from(days.saturating_sub(1))))
        .unwrap_or(NaiveDate::MIN);

    let campaigns = PROFILES
        .iter()
        .map(|profile| SeedCampaign {
            campaign: NewCampaign {
                name: profile.name.to_string(),
                platform: profile.platform.to_string(),
                status: CampaignStatus::Active,
                budget: Some(Decimal::new(profile.budget_cents, 2)),
                spent: Some(Decimal::new(profile.spent_cents, 2)),
                start_date: Some(first_day.and_time(NaiveTime::MIN).and_utc()),
                end_date: Some(last_day.and_time(NaiveTime::MIN).and_utc()),
                objective: Some(profile.objective.to_string()),
            },
            metrics: first_day
                .iter_days()
                .take_while(|day| *day <= last_day)
                .map(|day| daily_record(&mut rng, day))
                .collect(),
        })
        .collect();

    SeedFile { campaigns }
}

fn daily_record(rng: &mut StdRng, day: NaiveDate) -> MetricRecord {
    let impressions: i64 = rng.random_range(5_000..15_000);
    let clicks: i64 = rng.random_range(100..600);
    let conversions: i64 = rng.random_range(10..60);
    let spend = Decimal::new(rng.random_range(50_000..150_000), 2);
    let revenue = Decimal::new(rng.random_range(200_000..700_000), 2);

    MetricRecord::new(None, day.and_time(NaiveTime::MIN).and_utc())
        .with_counts(impressions, clicks, conversions)
        .with_amounts(RawNumber::from(spend), RawNumber::from(revenue))
}
