use std::path::Path;
use serde::{Deserialize, Serialize};
use crate::embedding::EmbedConfig;
use crate::error::{EvalError, Result};
use crate::evaluation::ClusteringConfig;
use crate::ml::{BoostingConfig, ClassifierBank, EdgeFeatureMode, LogisticConfig};
use crate::sampling::SplitOptions;

/// Settings for a whole harness run. Every field has a default, so a JSON
/// file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Master seed; each stage derives its own seed from it.
    pub seed: u64,
    /// Fraction of edges held out for link prediction.
    pub testing_ratio: f64,
    /// Negatives per held-out positive.
    pub negative_ratio: f64,
    /// Fraction of samples the classifiers are scored on.
    pub test_size: f64,
    pub feature_mode: EdgeFeatureMode,
    pub split: SplitOptions,
    pub logistic: LogisticConfig,
    pub boosting: BoostingConfig,
    pub clustering: ClusteringConfig,
    pub embed: EmbedConfig,
    /// Threads for `evaluate_many`.
    pub workers: usize,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            testing_ratio: 0.5,
            negative_ratio: 1.0,
            test_size: 0.5,
            feature_mode: EdgeFeatureMode::default(),
            split: SplitOptions::default(),
            logistic: LogisticConfig::default(),
            boosting: BoostingConfig::default(),
            clustering: ClusteringConfig::default(),
            embed: EmbedConfig::default(),
            workers: num_cpus::get(),
        }
    }
}

fn open_unit_interval(name: &str, value: f64) -> Result<()> {
    if !(value > 0.0 && value < 1.0) {
        return Err(EvalError::invalid_parameter(format!(
            "{} must be in (0, 1), got {}", name, value
        )));
    }
    Ok(())
}

impl HarnessConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn bank(&self) -> ClassifierBank {
        ClassifierBank::new(self.logistic.clone(), self.boosting.clone())
    }

    /// Range checks on every numeric setting.
    pub fn validate(&self) -> Result<()> {
        open_unit_interval("testing_ratio", self.testing_ratio)?;
        open_unit_interval("test_size", self.test_size)?;

        if !(self.negative_ratio > 0.0 && self.negative_ratio.is_finite()) {
            return Err(EvalError::invalid_parameter(format!(
                "negative_ratio must be positive, got {}", self.negative_ratio
            )));
        }
        if self.workers == 0 {
            return Err(EvalError::invalid_parameter("workers must be at least 1"));
        }
        if self.embed.n_components == 0 {
            return Err(EvalError::invalid_parameter("embed.n_components must be at least 1"));
        }
        if !(self.logistic.c > 0.0) || self.logistic.max_iter == 0 {
            return Err(EvalError::invalid_parameter("logistic needs c > 0 and max_iter >= 1"));
        }
        if self.boosting.n_estimators == 0
            || !(self.boosting.learning_rate > 0.0)
            || self.boosting.min_samples_leaf == 0
        {
            return Err(EvalError::invalid_parameter(
                "boosting needs n_estimators >= 1, learning_rate > 0 and min_samples_leaf >= 1"
            ));
        }
        if self.clustering.n_clusters == Some(0) {
            return Err(EvalError::invalid_parameter("clustering.n_clusters must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::Linkage;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = HarnessConfig::default();

        assert_eq!(config.seed, 42);
        assert_eq!(config.testing_ratio, 0.5);
        assert_eq!(config.feature_mode, EdgeFeatureMode::Hadamard);
        assert_eq!(config.clustering.linkage, Linkage::Ward);
        assert_eq!(config.workers, num_cpus::get());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config = HarnessConfig::from_json_str(
            r#"{"seed": 7, "feature_mode": "concat", "clustering": {"linkage": "average"}, "boosting": {"n_estimators": 10}}"#
        ).unwrap();

        assert_eq!(config.seed, 7);
        assert_eq!(config.feature_mode, EdgeFeatureMode::Concat);
        assert_eq!(config.clustering.linkage, Linkage::Average);
        assert_eq!(config.boosting.n_estimators, 10);
        assert_eq!(config.boosting.max_depth, 3);
        assert_eq!(config.testing_ratio, 0.5);
    }

    #[test]
    fn test_invalid_values_rejected() {
        for json in [
            r#"{"testing_ratio": 1.0}"#,
            r#"{"test_size": 0.0}"#,
            r#"{"negative_ratio": -1.0}"#,
            r#"{"workers": 0}"#,
            r#"{"clustering": {"n_clusters": 0}}"#,
        ] {
            assert!(
                matches!(HarnessConfig::from_json_str(json), Err(EvalError::InvalidParameter(_))),
                "{}", json
            );
        }
        assert!(matches!(HarnessConfig::from_json_str("{"), Err(EvalError::Serialization(_))));
    }

    #[test]
    fn test_file_round_trip() {
        let mut config = HarnessConfig::default();
        config.seed = 99;
        config.workers = 2;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(config.to_json_pretty().unwrap().as_bytes()).unwrap();

        let loaded = HarnessConfig::from_json_file(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.json");
        assert!(matches!(HarnessConfig::from_json_file(missing), Err(EvalError::Io(_))));
    }
}
