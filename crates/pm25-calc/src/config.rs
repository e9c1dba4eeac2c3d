use std::path::Path;

use anyhow::Context;
use pm25_core::{FailureThreshold, KeyBy, SamplingPlan};
use serde::{Deserialize, Serialize};

/// Sampling settings, optionally loaded from a JSON file.
///
/// Missing fields take their default value; command line flags override the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct Settings {
    /// Samples per minute
    pub frequency: f64,
    /// Minutes
    pub duration: f64,
    pub key_by: KeyBy,
    pub failure_threshold: f64,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            frequency: SamplingPlan::DEFAULT_FREQUENCY,
            duration: SamplingPlan::DEFAULT_DURATION,
            key_by: KeyBy::default(),
            failure_threshold: FailureThreshold::DEFAULT_RATIO,
            base_url: pm25_waqi::DEFAULT_BASE_URL.to_string(),
            timeout_secs: pm25_waqi::DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file '{}'", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.frequency, 5.0);
        assert_eq!(settings.duration, 1.0);
        assert_eq!(settings.key_by, KeyBy::StationName);
        assert_eq!(settings.failure_threshold, 0.01);
        assert_eq!(settings.base_url, "https://api.waqi.info/");
        assert_eq!(settings.timeout_secs, 10);
    }

    #[test]
    fn test_json_deserialization() {
        let json = r#"
        {
          "frequency": 8,
          "duration": 2,
          "keyBy": "id",
          "failureThreshold": 0.05
        }
        "#;

        let settings: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.frequency, 8.0);
        assert_eq!(settings.duration, 2.0);
        assert_eq!(settings.key_by, KeyBy::StationId);
        assert_eq!(settings.failure_threshold, 0.05);
        // Unset fields keep their defaults
        assert_eq!(settings.base_url, Settings::default().base_url);
        assert_eq!(settings.timeout_secs, 10);
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let result = serde_json::from_str::<Settings>(r#"{"frequncy": 3}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = Settings::load(Path::new("/nonexistent/pm25.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
