use std::path::PathBuf;

use thiserror::Error;

use crate::flags::flag_models::FeatureKey;

#[derive(Error, Debug)]
pub enum FlagError {
    /// Every [`FeatureKey`] must have an entry in the table it is evaluated against.
    /// Hitting this means the deployed table and the compiled feature list disagree,
    /// so callers should let it surface instead of treating the flag as off.
    #[error("no rollout config for feature {0}")]
    ConfigNotFound(FeatureKey),
    #[error("unknown feature {0:?} in rollout config")]
    UnknownFeature(String),
    #[error("rollout percent {percent} for feature {feature} is outside 0..=100")]
    InvalidPercent { feature: String, percent: u32 },
    #[error("failed to parse rollout config: {0}")]
    ConfigParsing(#[from] serde_json::Error),
    #[error("failed to read rollout config from {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
