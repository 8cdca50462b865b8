//! Session configuration.
//!
//! Every field has a default, so an empty document is a valid config:
//!
//! ```yaml
//! current_user: "Dana"
//! readiness_threshold: 0.75
//! confidence_scale: auto      # auto | fraction | percent
//! write_failure: tolerate     # tolerate | revert
//! retry:
//!   max_retries: 1
//!   initial_delay_ms: 100
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use discovery_core::{Confidence, ConfidenceScale, DEFAULT_READINESS_THRESHOLD};

use crate::error::{EngineError, Result};
use crate::retry::RetryConfig;

/// Placeholder assignee when a task is created without one
pub const DEFAULT_ASSIGNEE: &str = "Me";

/// What to do with local state when a write is finally dropped
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteFailurePolicy {
    /// Keep the optimistic local value; the next confidence change reconciles
    #[default]
    Tolerate,
    /// Restore the previous local value unless something newer replaced it
    Revert,
}

/// Configuration for a discovery session
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub current_user: String,
    pub readiness_threshold: f64,
    pub confidence_scale: ConfidenceScale,
    pub write_failure: WriteFailurePolicy,
    pub retry: RetryConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            current_user: DEFAULT_ASSIGNEE.to_string(),
            readiness_threshold: DEFAULT_READINESS_THRESHOLD,
            confidence_scale: ConfidenceScale::Auto,
            write_failure: WriteFailurePolicy::Tolerate,
            retry: RetryConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: EngineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = tokio::fs::read_to_string(path.as_ref()).await?;
        Self::from_yaml_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        self.threshold()?;
        if self.current_user.trim().is_empty() {
            return Err(EngineError::Config("current_user must not be empty".into()));
        }
        if self.retry.backoff_factor.is_nan() || self.retry.backoff_factor < 1.0 {
            return Err(EngineError::Config(format!(
                "retry.backoff_factor must be at least 1, got {}",
                self.retry.backoff_factor
            )));
        }
        Ok(())
    }

    /// Readiness threshold as a validated fraction
    pub fn threshold(&self) -> Result<Confidence> {
        Confidence::new(self.readiness_threshold).map_err(|e| {
            EngineError::Config(format!("readiness_threshold: {}", e))
        })
    }

    pub fn with_current_user(mut self, user: impl Into<String>) -> Self {
        self.current_user = user.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_write_failure(mut self, policy: WriteFailurePolicy) -> Self {
        self.write_failure = policy;
        self
    }

    pub fn with_confidence_scale(mut self, scale: ConfidenceScale) -> Self {
        self.confidence_scale = scale;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.current_user, "Me");
        assert_eq!(config.readiness_threshold, 0.75);
        assert_eq!(config.confidence_scale, ConfidenceScale::Auto);
        assert_eq!(config.write_failure, WriteFailurePolicy::Tolerate);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config = EngineConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = r#"
current_user: Dana
confidence_scale: percent
write_failure: revert
retry:
  max_retries: 3
"#;
        let config = EngineConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.current_user, "Dana");
        assert_eq!(config.confidence_scale, ConfidenceScale::Percent);
        assert_eq!(config.write_failure, WriteFailurePolicy::Revert);
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.initial_delay_ms, 100);
    }

    #[test]
    fn test_rejects_bad_threshold() {
        let err = EngineConfig::from_yaml_str("readiness_threshold: 75").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn test_rejects_shrinking_backoff() {
        let err = EngineConfig::from_yaml_str("retry:\n  backoff_factor: 0.5").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn test_rejects_unknown_scale() {
        let err = EngineConfig::from_yaml_str("confidence_scale: basis_points").unwrap_err();
        assert!(matches!(err, EngineError::Yaml(_)));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("discovery.yaml");
        tokio::fs::write(&path, "current_user: Sam\n").await.unwrap();

        let config = EngineConfig::load(&path).await.unwrap();
        assert_eq!(config.current_user, "Sam");
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = EngineConfig::load("/definitely/not/here.yaml").await.unwrap_err();
        assert!(matches!(err, EngineError::Io(_)));
    }
}
