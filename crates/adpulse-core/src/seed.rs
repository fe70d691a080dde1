use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::campaigns::NewCampaign;
use crate::metrics::MetricRecord;
use crate::ConfigError;

/// A campaign in a seed file together with its metric history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedCampaign {
    #[serde(flatten)]
    pub campaign: NewCampaign,
    #[serde(default)]
    pub metrics: Vec<MetricRecord>,
}

/// Initial store contents, loaded from YAML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeedFile {
    pub campaigns: Vec<SeedCampaign>,
}

/// Load and validate a seed file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_seed_file(path: &Path) -> Result<SeedFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SeedFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let seed = parse_seed(&content)?;
    tracing::debug!(
        path = %path.display(),
        campaigns = seed.campaigns.len(),
        "loaded seed file"
    );
    Ok(seed)
}

/// Parse and validate seed YAML.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_seed(yaml: &str) -> Result<SeedFile, ConfigError> {
    let seed: SeedFile = serde_yaml::from_str(yaml).map_err(ConfigError::SeedFileParse)?;
    validate_seed(&seed)?;
    Ok(seed)
}

fn validate_seed(seed: &SeedFile) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();

    for entry in &seed.campaigns {
        let name = entry.campaign.name.trim();
        if name.is_empty() {
            return Err(ConfigError::Validation(
                "campaign name must be non-empty".to_string(),
            ));
        }

        if !seen_names.insert(name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate campaign name: '{name}'"
            )));
        }

        if entry.metrics.iter().any(|m| m.campaign_id.is_some()) {
            return Err(ConfigError::Validation(format!(
                "campaign '{name}': metrics must not set campaignId; it is assigned on load"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::campaigns::CampaignStatus;
    use crate::metrics::RawNumber;

    const SAMPLE: &str = r#"
campaigns:
  - name: Holiday Shopping Campaign
    platform: Google Ads
    status: active
    budget: "50000.00"
    spent: "32450.00"
    startDate: 2024-11-01T00:00:00Z
    endDate: 2024-12-31T00:00:00Z
    objective: conversions
    metrics:
      - date: 2024-11-01
        impressions: 1000
        clicks: 50
        conversions: 5
        spend: "100.00"
        revenue: "500.00"
      - date: 2024-11-02
        impressions: 2000
        clicks: 100
        conversions: 10
        spend: 200
        revenue: n/a
  - name: Black Friday Sale
    platform: Facebook
"#;

    #[test]
    fn parses_campaigns_with_metrics() {
        let seed = parse_seed(SAMPLE).expect("parse");
        assert_eq!(seed.campaigns.len(), 2);

        let holiday = &seed.campaigns[0];
        assert_eq!(holiday.campaign.status, CampaignStatus::Active);
        assert_eq!(holiday.campaign.budget, Some(Decimal::new(5_000_000, 2)));
        assert_eq!(holiday.metrics.len(), 2);
        assert_eq!(holiday.metrics[1].spend, Some(RawNumber::Integer(200)));
        assert_eq!(
            holiday.metrics[1].revenue,
            Some(RawNumber::Text("n/a".to_string()))
        );

        let friday = &seed.campaigns[1];
        assert_eq!(friday.campaign.status, CampaignStatus::Draft);
        assert!(friday.metrics.is_empty());
    }

    #[test]
    fn rejects_duplicate_names_case_insensitively() {
        let yaml = r"
campaigns:
  - name: Launch
    platform: Google Ads
  - name: launch
    platform: Facebook
";
        let err = parse_seed(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref m) if m.contains("duplicate")));
    }

    #[test]
    fn rejects_blank_name() {
        let yaml = r#"
campaigns:
  - name: "  "
    platform: Google Ads
"#;
        assert!(matches!(
            parse_seed(yaml),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn rejects_preassigned_campaign_id() {
        let yaml = r"
campaigns:
  - name: Launch
    platform: Google Ads
    metrics:
      - date: 2024-11-01
        campaignId: 6f1c1d7e-8a4b-4c1e-9b9e-2f8d2c3a4b5c
";
        assert!(matches!(
            parse_seed(yaml),
            Err(ConfigError::Validation(ref m)) if m.contains("campaignId")
        ));
    }

    #[test]
    fn reports_parse_errors() {
        assert!(matches!(
            parse_seed("campaigns: 12"),
            Err(ConfigError::SeedFileParse(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = load_seed_file(Path::new("/nonexistent/adpulse-seed.yaml"));
        assert!(matches!(result, Err(ConfigError::SeedFileIo { .. })));
    }

    #[test]
    fn seed_round_trips_through_yaml() {
        let seed = parse_seed(SAMPLE).expect("parse");
        let yaml = serde_yaml::to_string(&seed).expect("serialize");
        let reparsed = parse_seed(&yaml).expect("reparse");
        assert_eq!(reparsed.campaigns.len(), seed.campaigns.len());
        assert_eq!(reparsed.campaigns[0].metrics.len(), 2);
    }
}
