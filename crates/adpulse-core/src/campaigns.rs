use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Active,
    Paused,
    #[default]
    Draft,
    Completed,
}

impl std::fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CampaignStatus::Active => write!(f, "active"),
            CampaignStatus::Paused => write!(f, "paused"),
            CampaignStatus::Draft => write!(f, "draft"),
            CampaignStatus::Completed => write!(f, "completed"),
        }
    }
}

impl FromStr for CampaignStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "draft" => Ok(Self::Draft),
            "completed" => Ok(Self::Completed),
            other => Err(CoreError::Validation(format!(
                "status must be one of active, paused, draft, completed; got '{other}'"
            ))),
        }
    }
}

/// An advertising campaign as held by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: Uuid,
    pub name: String,
    /// Ad platform label, e.g. `"Google Ads"` or `"Facebook"`.
    pub platform: String,
    pub status: CampaignStatus,
    pub budget: Option<Decimal>,
    pub spent: Decimal,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    /// e.g. `brand_awareness`, `traffic`, `conversions`.
    pub objective: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    /// Check field-level invariants.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] describing the first violated rule.
    pub fn validate(&self) -> Result<(), CoreError> {
        let name_len = self.name.chars().count();
        if name_len == 0 || name_len > 200 {
            return Err(CoreError::Validation(
                "name must be 1-200 characters".to_string(),
            ));
        }
        if self.platform.trim().is_empty() {
            return Err(CoreError::Validation(
                "platform must be non-empty".to_string(),
            ));
        }
        if self.budget.is_some_and(|b| b.is_sign_negative() && !b.is_zero()) {
            return Err(CoreError::Validation(
                "budget must not be negative".to_string(),
            ));
        }
        if self.spent.is_sign_negative() && !self.spent.is_zero() {
            return Err(CoreError::Validation(
                "spent must not be negative".to_string(),
            ));
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(CoreError::Validation(format!(
                    "endDate ({end}) is before startDate ({start})"
                )));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == CampaignStatus::Active
    }
}

/// Create payload for a campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCampaign {
    pub name: String,
    pub platform: String,
    #[serde(default)]
    pub status: CampaignStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spent: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objective: Option<String>,
}

impl NewCampaign {
    /// Build and validate a stored campaign from this payload.
    ///
    /// The name is trimmed; `spent` defaults to zero.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] if the resulting campaign is invalid.
    pub fn into_campaign(self, id: Uuid, now: DateTime<Utc>) -> Result<Campaign, CoreError> {
        let campaign = Campaign {
            id,
            name: self.name.trim().to_string(),
            platform: self.platform.trim().to_string(),
            status: self.status,
            budget: self.budget,
            spent: self.spent.unwrap_or(Decimal::ZERO),
            start_date: self.start_date,
            end_date: self.end_date,
            objective: self.objective,
            created_at: now,
            updated_at: now,
        };
        campaign.validate()?;
        Ok(campaign)
    }
}

// Option<Option<T>>: outer None = field absent (keep current),
// Some(None) = explicit null (clear), Some(Some(v)) = set.
#[allow(clippy::option_option)]
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignPatch {
    pub name: Option<String>,
    pub platform: Option<String>,
    pub status: Option<CampaignStatus>,
    #[serde(default, deserialize_with = "present")]
    pub budget: Option<Option<Decimal>>,
    pub spent: Option<Decimal>,
    #[serde(default, deserialize_with = "present")]
    pub start_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "present")]
    pub end_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "present")]
    pub objective: Option<Option<String>>,
}

/// Distinguish an explicit `null` from an absent field.
#[allow(clippy::option_option)]
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl CampaignPatch {
    /// Apply the patch to a copy of `current`, validate, and return the result.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] if the patched campaign is invalid;
    /// `current` is left untouched in that case.
    pub fn apply(&self, current: &Campaign, now: DateTime<Utc>) -> Result<Campaign, CoreError> {
        let mut next = current.clone();
        if let Some(name) = &self.name {
            next.name = name.trim().to_string();
        }
        if let Some(platform) = &self.platform {
            next.platform = platform.trim().to_string();
        }
        if let Some(status) = self.status {
            next.status = status;
        }
        if let Some(budget) = self.budget {
            next.budget = budget;
        }
        if let Some(spent) = self.spent {
            next.spent = spent;
        }
        if let Some(start) = self.start_date {
            next.start_date = start;
        }
        if let Some(end) = self.end_date {
            next.end_date = end;
        }
        if let Some(objective) = &self.objective {
            next.objective.clone_from(objective);
        }
        next.updated_at = now;
        next.validate()?;
        Ok(next)
    }
}
