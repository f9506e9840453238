//! Run configuration, resolved once from the environment at startup.

use std::env;

use crate::distance::DistanceMetric;
use crate::error::{EmbedCloudError, EmbedCloudResult};
use crate::projection::ProjectionMethod;

pub const ENV_PROJECT_ID: &str = "EMBEDCLOUD_PROJECT_ID";
pub const ENV_TEAM_ID: &str = "EMBEDCLOUD_TEAM_ID";
pub const ENV_MODEL_NAME: &str = "EMBEDCLOUD_MODEL_NAME";
pub const ENV_PROJECTION_METHOD: &str = "EMBEDCLOUD_PROJECTION_METHOD";
pub const ENV_METRIC: &str = "EMBEDCLOUD_METRIC";
pub const ENV_UMAP_MIN_DIST: &str = "EMBEDCLOUD_UMAP_MIN_DIST";
pub const ENV_FORCE_RECALCULATE: &str = "EMBEDCLOUD_FORCE_RECALCULATE";
pub const ENV_SEED: &str = "EMBEDCLOUD_SEED";

pub const DEFAULT_MODEL_NAME: &str = "facebook/convnext-tiny-224";
pub const DEFAULT_UMAP_MIN_DIST: f32 = 0.05;

/// Configuration for a single visualization run.
///
/// All fields are resolved up front; an invalid projection method or metric
/// is a reported configuration error rather than a silent fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualizerConfig {
    /// Project whose embeddings are visualized.
    pub project_id: i64,
    /// Team scope for remote file storage. When `None`, the caller resolves
    /// a default (the first team visible through the platform API).
    pub team_id: Option<i64>,
    /// Name of the upstream model that produced the embeddings.
    pub model_name: String,
    pub projection_method: ProjectionMethod,
    pub metric: DistanceMetric,
    /// UMAP minimum-distance spread control.
    pub umap_min_dist: f32,
    /// When set, any cached projection artifact is ignored and overwritten.
    pub force_recalculate: bool,
    /// Seed for the projection engine RNG. `None` uses entropy.
    pub seed: Option<u64>,
}

impl VisualizerConfig {
    /// Creates a configuration with default settings for the given project.
    pub fn new(project_id: i64) -> Self {
        VisualizerConfig {
            project_id,
            team_id: None,
            model_name: DEFAULT_MODEL_NAME.to_string(),
            projection_method: ProjectionMethod::Umap,
            metric: DistanceMetric::Euclidean,
            umap_min_dist: DEFAULT_UMAP_MIN_DIST,
            force_recalculate: false,
            seed: None,
        }
    }

    /// Resolves the configuration from environment variables.
    ///
    /// `EMBEDCLOUD_PROJECT_ID` is required; everything else has a default.
    pub fn from_env() -> EmbedCloudResult<Self> {
        let project_id = match env::var(ENV_PROJECT_ID) {
            Ok(raw) => raw.parse::<i64>().map_err(|_| {
                EmbedCloudError::Configuration(format!(
                    "{} must be an integer, got '{}'",
                    ENV_PROJECT_ID, raw
                ))
            })?,
            Err(_) => {
                return Err(EmbedCloudError::Configuration(format!(
                    "{} is required",
                    ENV_PROJECT_ID
                )))
            }
        };

        let mut config = VisualizerConfig::new(project_id);

        if let Ok(raw) = env::var(ENV_TEAM_ID) {
            config.team_id = Some(raw.parse::<i64>().map_err(|_| {
                EmbedCloudError::Configuration(format!(
                    "{} must be an integer, got '{}'",
                    ENV_TEAM_ID, raw
                ))
            })?);
        }
        if let Ok(raw) = env::var(ENV_MODEL_NAME) {
            config.model_name = raw;
        }
        if let Ok(raw) = env::var(ENV_PROJECTION_METHOD) {
            config.projection_method = raw.parse()?;
        }
        if let Ok(raw) = env::var(ENV_METRIC) {
            config.metric = raw.parse()?;
        }
        if let Ok(raw) = env::var(ENV_UMAP_MIN_DIST) {
            config.umap_min_dist = raw.parse::<f32>().map_err(|_| {
                EmbedCloudError::Configuration(format!(
                    "{} must be a number, got '{}'",
                    ENV_UMAP_MIN_DIST, raw
                ))
            })?;
        }
        if let Ok(raw) = env::var(ENV_FORCE_RECALCULATE) {
            config.force_recalculate = parse_bool(ENV_FORCE_RECALCULATE, &raw)?;
        }
        if let Ok(raw) = env::var(ENV_SEED) {
            config.seed = Some(raw.parse::<u64>().map_err(|_| {
                EmbedCloudError::Configuration(format!(
                    "{} must be an unsigned integer, got '{}'",
                    ENV_SEED, raw
                ))
            })?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> EmbedCloudResult<()> {
        if self.model_name.is_empty() {
            return Err(EmbedCloudError::Configuration(
                "model name must not be empty".to_string(),
            ));
        }
        if !(self.umap_min_dist.is_finite() && self.umap_min_dist > 0.0) {
            return Err(EmbedCloudError::Configuration(format!(
                "umap_min_dist must be a positive number, got {}",
                self.umap_min_dist
            )));
        }
        Ok(())
    }

    /// Artifact file stem derived from the model name.
    pub fn save_name(&self) -> String {
        self.model_name.replace('/', "_")
    }
}

fn parse_bool(var: &str, raw: &str) -> EmbedCloudResult<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        other => Err(EmbedCloudError::Configuration(format!(
            "{} must be a boolean, got '{}'",
            var, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = VisualizerConfig::new(42);
        assert_eq!(config.project_id, 42);
        assert_eq!(config.team_id, None);
        assert_eq!(config.model_name, DEFAULT_MODEL_NAME);
        assert_eq!(config.projection_method, ProjectionMethod::Umap);
        assert_eq!(config.metric, DistanceMetric::Euclidean);
        assert_eq!(config.umap_min_dist, DEFAULT_UMAP_MIN_DIST);
        assert!(!config.force_recalculate);
        config.validate().unwrap();
    }

    #[test]
    fn test_save_name_replaces_slashes() {
        let config = VisualizerConfig::new(1);
        assert_eq!(config.save_name(), "facebook_convnext-tiny-224");
    }

    #[test]
    fn test_validate_rejects_bad_min_dist() {
        let mut config = VisualizerConfig::new(1);
        config.umap_min_dist = 0.0;
        assert!(matches!(config.validate(), Err(EmbedCloudError::Configuration(_))));
        config.umap_min_dist = f32::NAN;
        assert!(matches!(config.validate(), Err(EmbedCloudError::Configuration(_))));
    }

    #[test]
    fn test_parse_bool_values() {
        assert!(parse_bool("X", "true").unwrap());
        assert!(parse_bool("X", "1").unwrap());
        assert!(!parse_bool("X", "false").unwrap());
        assert!(!parse_bool("X", "0").unwrap());
        assert!(parse_bool("X", "maybe").is_err());
    }
}
