use std::collections::HashMap;
use std::sync::RwLock;

use adpulse_core::{
    validate_funnel, Campaign, CampaignPatch, MetricRecord, NewCampaign, SeedFile,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{MetricsFilter, Repository, StoreError};

/// Process-local [`Repository`]. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    campaigns: RwLock<HashMap<Uuid, Campaign>>,
    metrics: RwLock<Vec<MetricRecord>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store holding every campaign and metric record in `seed`.
    ///
    /// Each campaign gets a fresh id, and its metric records are linked to it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] if a seeded campaign is invalid.
    pub fn from_seed(seed: SeedFile) -> Result<Self, StoreError> {
        let now = Utc::now();
        let mut campaigns = HashMap::with_capacity(seed.campaigns.len());
        let mut metrics = Vec::new();

        for entry in seed.campaigns {
            let campaign = entry.campaign.into_campaign(Uuid::new_v4(), now)?;
            for mut record in entry.metrics {
                record.campaign_id = Some(campaign.id);
                record.id.get_or_insert_with(Uuid::new_v4);
                metrics.push(record);
            }
            campaigns.insert(campaign.id, campaign);
        }

        tracing::info!(
            campaigns = campaigns.len(),
            metrics = metrics.len(),
            "store seeded"
        );

        Ok(Self {
            campaigns: RwLock::new(campaigns),
            metrics: RwLock::new(metrics),
        })
    }
}

impl Repository for MemoryStore {
    fn list_campaigns(&self) -> Result<Vec<Campaign>, StoreError> {
        let campaigns = self.campaigns.read().map_err(|_| StoreError::Poisoned)?;
        let mut list: Vec<Campaign> = campaigns.values().cloned().collect();
        list.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(list)
    }

    fn get_campaign(&self, id: Uuid) -> Result<Option<Campaign>, StoreError> {
        let campaigns = self.campaigns.read().map_err(|_| StoreError::Poisoned)?;
        Ok(campaigns.get(&id).cloned())
    }

    fn create_campaign(&self, new: NewCampaign) -> Result<Campaign, StoreError> {
        let campaign = new.into_campaign(Uuid::new_v4(), Utc::now())?;
        let mut campaigns = self.campaigns.write().map_err(|_| StoreError::Poisoned)?;
        campaigns.insert(campaign.id, campaign.clone());
        tracing::debug!(id = %campaign.id, name = %campaign.name, "campaign created");
        Ok(campaign)
    }

    fn update_campaign(&self, id: Uuid, patch: &CampaignPatch) -> Result<Campaign, StoreError> {
        let mut campaigns = self.campaigns.write().map_err(|_| StoreError::Poisoned)?;
        let current = campaigns
            .get_mut(&id)
            .ok_or(StoreError::CampaignNotFound(id))?;
        let updated = patch.apply(current, Utc::now())?;
        current.clone_from(&updated);
        Ok(updated)
    }

    fn delete_campaign(&self, id: Uuid) -> Result<(), StoreError> {
        let mut campaigns = self.campaigns.write().map_err(|_| StoreError::Poisoned)?;
        campaigns
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::CampaignNotFound(id))
    }

    fn list_metrics(&self, filter: &MetricsFilter) -> Result<Vec<MetricRecord>, StoreError> {
        filter.validate()?;
        let metrics = self.metrics.read().map_err(|_| StoreError::Poisoned)?;
        let mut matching: Vec<MetricRecord> = metrics
            .iter()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect();
        matching.sort_by_key(|record| record.date);
        Ok(matching)
    }

    fn create_metric(&self, mut record: MetricRecord) -> Result<MetricRecord, StoreError> {
        record.id.get_or_insert_with(Uuid::new_v4);
        for warning in validate_funnel(&record) {
            tracing::warn!(id = ?record.id, %warning, "implausible funnel in metric record");
        }
        let mut metrics = self.metrics.write().map_err(|_| StoreError::Poisoned)?;
        metrics.push(record.clone());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use adpulse_core::{aggregate, seed::parse_seed, CampaignStatus};
    use chrono::{NaiveDate, TimeZone};
    use rust_decimal::Decimal;

    use super::*;

    const SEED: &str = r#"
campaigns:
  - name: Holiday Shopping Campaign
    platform: Google Ads
    status: active
    budget: "50000.00"
    metrics:
      - date: 2024-11-02
        impressions: 2000
        clicks: 100
        conversions: 10
        spend: "200.00"
        revenue: "800.00"
      - date: 2024-11-01
        impressions: 1000
        clicks: 50
        conversions: 5
        spend: "100.00"
        revenue: "500.00"
  - name: Black Friday Sale
    platform: Facebook
    metrics:
      - date: 2024-11-03
        impressions: 500
        clicks: 10
        spend: "50.00"
"#;

    fn seeded() -> MemoryStore {
        MemoryStore::from_seed(parse_seed(SEED).expect("seed")).expect("store")
    }

    fn new_campaign(name: &str) -> NewCampaign {
        NewCampaign {
            name: name.to_string(),
            platform: "Google Ads".to_string(),
            status: CampaignStatus::Draft,
            budget: None,
            spent: None,
            start_date: None,
            end_date: None,
            objective: None,
        }
    }

    fn campaign_id(store: &MemoryStore, name: &str) -> Uuid {
        store
            .list_campaigns()
            .expect("list")
            .into_iter()
            .find(|c| c.name == name)
            .expect("campaign present")
            .id
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 11, d).expect("date")
    }

    #[test]
    fn from_seed_links_metrics_to_campaigns() {
        let store = seeded();
        assert_eq!(store.list_campaigns().expect("list").len(), 2);

        let holiday = campaign_id(&store, "Holiday Shopping Campaign");
        let records = store
            .list_metrics(&MetricsFilter::for_campaign(holiday))
            .expect("metrics");
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.campaign_id == Some(holiday)));
        assert!(records.iter().all(|r| r.id.is_some()));
    }

    #[test]
    fn list_metrics_sorts_by_date() {
        let store = seeded();
        let records = store.list_metrics(&MetricsFilter::default()).expect("metrics");
        let days: Vec<NaiveDate> = records.iter().map(MetricRecord::day).collect();
        assert_eq!(days, vec![day(1), day(2), day(3)]);
    }

    #[test]
    fn date_range_is_inclusive() {
        let store = seeded();
        let filter = MetricsFilter {
            campaign_id: None,
            start: Some(day(2)),
            end: Some(day(3)),
        };
        let records = store.list_metrics(&filter).expect("metrics");
        assert_eq!(records.len(), 2);

        let totals = aggregate(&records);
        assert_eq!(totals.total_impressions, 2500);
        assert_eq!(totals.total_spend, Decimal::new(25000, 2));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let store = seeded();
        let filter = MetricsFilter {
            campaign_id: None,
            start: Some(day(3)),
            end: Some(day(1)),
        };
        assert!(matches!(
            store.list_metrics(&filter),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn create_get_update_delete_campaign() {
        let store = MemoryStore::new();
        let created = store.create_campaign(new_campaign("Spring Launch")).expect("create");
        assert_eq!(
            store.get_campaign(created.id).expect("get"),
            Some(created.clone())
        );

        let patch = CampaignPatch {
            status: Some(CampaignStatus::Active),
            budget: Some(Some(Decimal::from(1000))),
            ..CampaignPatch::default()
        };
        let updated = store.update_campaign(created.id, &patch).expect("update");
        assert_eq!(updated.status, CampaignStatus::Active);
        assert_eq!(updated.budget, Some(Decimal::from(1000)));
        assert_eq!(updated.name, "Spring Launch");

        store.delete_campaign(created.id).expect("delete");
        assert!(store.get_campaign(created.id).expect("get").is_none());
        assert!(matches!(
            store.delete_campaign(created.id),
            Err(StoreError::CampaignNotFound(id)) if id == created.id
        ));
    }

    #[test]
    fn invalid_update_leaves_campaign_unchanged() {
        let store = MemoryStore::new();
        let created = store.create_campaign(new_campaign("Spring Launch")).expect("create");
        let patch = CampaignPatch {
            name: Some("   ".to_string()),
            ..CampaignPatch::default()
        };
        assert!(matches!(
            store.update_campaign(created.id, &patch),
            Err(StoreError::Validation(_))
        ));
        assert_eq!(
            store.get_campaign(created.id).expect("get").map(|c| c.name),
            Some("Spring Launch".to_string())
        );
    }

    #[test]
    fn update_unknown_campaign_is_not_found() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        assert!(matches!(
            store.update_campaign(id, &CampaignPatch::default()),
            Err(StoreError::CampaignNotFound(_))
        ));
    }

    #[test]
    fn invalid_campaign_is_rejected() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.create_campaign(new_campaign("")),
            Err(StoreError::Validation(_))
        ));
        assert!(store.list_campaigns().expect("list").is_empty());
    }

    #[test]
    fn deleting_campaign_keeps_its_metrics() {
        let store = seeded();
        let holiday = campaign_id(&store, "Holiday Shopping Campaign");
        store.delete_campaign(holiday).expect("delete");
        let records = store
            .list_metrics(&MetricsFilter::for_campaign(holiday))
            .expect("metrics");
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn create_metric_assigns_id_and_keeps_raw_values() {
        let store = MemoryStore::new();
        let date = Utc.with_ymd_and_hms(2024, 11, 5, 0, 0, 0).single().expect("ts");
        let record = MetricRecord::new(None, date)
            .with_counts(100, 500, 1)
            .with_amounts("abc", "10.00");
        let stored = store.create_metric(record).expect("create");
        assert!(stored.id.is_some());

        let all = store.list_metrics(&MetricsFilter::default()).expect("metrics");
        assert_eq!(all, vec![stored]);
        assert_eq!(aggregate(&all).total_spend, Decimal::ZERO);
        assert_eq!(aggregate(&all).total_clicks, 500);
    }
}
