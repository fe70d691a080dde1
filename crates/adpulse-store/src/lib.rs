//! Campaign and metric persistence behind the [`Repository`] interface.

pub mod demo;
pub mod memory;

pub use memory::MemoryStore;

use adpulse_core::{Campaign, CampaignPatch, CoreError, MetricRecord, NewCampaign};
use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("campaign not found: {0}")]
    CampaignNotFound(Uuid),
    #[error(transparent)]
    Validation(#[from] CoreError),
    #[error("store lock poisoned")]
    Poisoned,
}

/// Selects metric records by campaign and inclusive calendar-date range (UTC).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsFilter {
    pub campaign_id: Option<Uuid>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl MetricsFilter {
    #[must_use]
    pub fn for_campaign(campaign_id: Uuid) -> Self {
        Self {
            campaign_id: Some(campaign_id),
            ..Self::default()
        }
    }

    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] when `start` is after `end`.
    pub fn validate(&self) -> Result<(), CoreError> {
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start > end {
                return Err(CoreError::Validation(format!(
                    "startDate ({start}) is after endDate ({end})"
                )));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn matches(&self, record: &MetricRecord) -> bool {
        if self
            .campaign_id
            .is_some_and(|id| record.campaign_id != Some(id))
        {
            return false;
        }
        let day = record.day();
        self.start.is_none_or(|start| day >= start) && self.end.is_none_or(|end| day <= end)
    }
}

/// Storage for campaigns and their metric history.
///
/// Implementations must be shareable across request handlers.
pub trait Repository: Send + Sync {
    /// All campaigns, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing store is unavailable.
    fn list_campaigns(&self) -> Result<Vec<Campaign>, StoreError>;

    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing store is unavailable.
    fn get_campaign(&self, id: Uuid) -> Result<Option<Campaign>, StoreError>;

    /// Validate and store a new campaign with a fresh id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] if the payload is invalid.
    fn create_campaign(&self, new: NewCampaign) -> Result<Campaign, StoreError>;

    /// # Errors
    ///
    /// Returns [`StoreError::CampaignNotFound`] for an unknown id and
    /// [`StoreError::Validation`] if the patched campaign is invalid.
    fn update_campaign(&self, id: Uuid, patch: &CampaignPatch) -> Result<Campaign, StoreError>;

    /// Remove a campaign. Its metric records are kept.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::CampaignNotFound`] for an unknown id.
    fn delete_campaign(&self, id: Uuid) -> Result<(), StoreError>;

    /// Matching records sorted by date ascending.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] if the filter range is inverted.
    fn list_metrics(&self, filter: &MetricsFilter) -> Result<Vec<MetricRecord>, StoreError>;

    /// Store a record, assigning an id when it has none.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing store is unavailable.
    fn create_metric(&self, record: MetricRecord) -> Result<MetricRecord, StoreError>;
}
