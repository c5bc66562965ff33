use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};
use tracing::instrument;

use crate::errors::FlagError;

pub const MAX_ROLLOUT_PERCENT: u8 = 100;

/// Features that can be rolled out gradually.
///
/// The label of each variant is part of the bucketing hash input, so it is pinned with an
/// explicit `serialize` attribute. Reordering or inserting variants must never change a label,
/// otherwise every subject gets reshuffled into a different bucket.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
pub enum FeatureKey {
    #[strum(serialize = "HistogramTimelineV2")]
    HistogramTimelineV2,
    #[strum(serialize = "AiSessionInsights")]
    AiSessionInsights,
    #[strum(serialize = "Analytics")]
    Analytics,
    #[strum(serialize = "Metrics")]
    Metrics,
}

impl FeatureKey {
    pub fn label(&self) -> &'static str {
        self.into()
    }

    pub fn from_label(label: &str) -> Result<Self, FlagError> {
        label
            .parse()
            .map_err(|_| FlagError::UnknownFeature(label.to_string()))
    }

    pub fn all() -> impl Iterator<Item = FeatureKey> {
        FeatureKey::iter()
    }
}

/// Which identity a percentage rollout is bucketed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RolloutScope {
    Project,
    Workspace,
    // entries that name neither a project nor a workspace roll out per admin
    #[default]
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagConfig {
    percent: u8,
    scope: RolloutScope,
    project_override: HashSet<String>,
    workspace_override: HashSet<String>,
}

impl FlagConfig {
    pub fn new(percent: u8, scope: RolloutScope) -> Self {
        FlagConfig {
            percent,
            scope,
            project_override: HashSet::new(),
            workspace_override: HashSet::new(),
        }
    }

    pub fn with_project_override<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.project_override.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn with_workspace_override<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.workspace_override
            .extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn percent(&self) -> u8 {
        self.percent
    }

    pub fn scope(&self) -> RolloutScope {
        self.scope
    }

    pub fn project_override(&self) -> &HashSet<String> {
        &self.project_override
    }

    pub fn workspace_override(&self) -> &HashSet<String> {
        &self.workspace_override
    }

    pub fn is_project_overridden(&self, project_id: &str) -> bool {
        self.project_override.contains(project_id)
    }

    pub fn is_workspace_overridden(&self, workspace_id: &str) -> bool {
        self.workspace_override.contains(workspace_id)
    }

    fn validate(&self, feature: &str) -> Result<(), FlagError> {
        if self.percent > MAX_ROLLOUT_PERCENT {
            return Err(FlagError::InvalidPercent {
                feature: feature.to_string(),
                percent: u32::from(self.percent),
            });
        }
        Ok(())
    }
}

/// Serialized form of a single table entry.
#[derive(Debug, Deserialize, Serialize)]
struct FlagConfigEntry {
    percent: u32,
    #[serde(default)]
    scope: RolloutScope,
    #[serde(default)]
    project_override: Vec<String>,
    #[serde(default)]
    workspace_override: Vec<String>,
}

impl FlagConfigEntry {
    fn into_config(self, feature: &str) -> Result<FlagConfig, FlagError> {
        let percent = u8::try_from(self.percent)
            .ok()
            .filter(|p| *p <= MAX_ROLLOUT_PERCENT)
            .ok_or_else(|| FlagError::InvalidPercent {
                feature: feature.to_string(),
                percent: self.percent,
            })?;

        Ok(FlagConfig::new(percent, self.scope)
            .with_project_override(self.project_override)
            .with_workspace_override(self.workspace_override))
    }
}

/// Read-only rollout configuration, built once and shared by every evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagConfigTable {
    configs: HashMap<FeatureKey, FlagConfig>,
}

#[derive(Debug, Default)]
pub struct FlagConfigTableBuilder {
    configs: HashMap<FeatureKey, FlagConfig>,
}

impl FlagConfigTableBuilder {
    pub fn insert(mut self, feature: FeatureKey, config: FlagConfig) -> Self {
        self.configs.insert(feature, config);
        self
    }

    pub fn build(self) -> Result<FlagConfigTable, FlagError> {
        for (feature, config) in &self.configs {
            config.validate(feature.label())?;
        }
        Ok(FlagConfigTable {
            configs: self.configs,
        })
    }
}

impl FlagConfigTable {
    pub fn builder() -> FlagConfigTableBuilder {
        FlagConfigTableBuilder::default()
    }

    /// The rollout currently shipped to production.
    pub fn default_rollout() -> Self {
        let configs = HashMap::from([
            (
                FeatureKey::HistogramTimelineV2,
                FlagConfig::new(100, RolloutScope::Workspace).with_project_override([
                    // Portal
                    "79",
                    // Impira
                    "122", "153", "172",
                    // Sunsama
                    "657",
                    // Synder
                    "1031",
                ]),
            ),
            (
                FeatureKey::AiSessionInsights,
                FlagConfig::new(100, RolloutScope::Workspace),
            ),
            (
                FeatureKey::Analytics,
                FlagConfig::new(0, RolloutScope::Workspace).with_workspace_override([
                    // Numero
                    "701",
                    // MediaJel
                    "9634",
                ]),
            ),
            (
                FeatureKey::Metrics,
                FlagConfig::new(100, RolloutScope::Workspace),
            ),
        ]);
        FlagConfigTable { configs }
    }

    #[instrument(skip_all)]
    pub fn from_json_str(json: &str) -> Result<Self, FlagError> {
        let entries: HashMap<String, FlagConfigEntry> = serde_json::from_str(json)?;

        let mut configs = HashMap::with_capacity(entries.len());
        for (label, entry) in entries {
            let feature = FeatureKey::from_label(&label)?;
            configs.insert(feature, entry.into_config(&label)?);
        }

        tracing::info!(features = configs.len(), "loaded rollout config");
        Ok(FlagConfigTable { configs })
    }

    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FlagError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| {
            tracing::error!("failed to read rollout config: {}", source);
            FlagError::ConfigRead {
                path: path.to_path_buf(),
                source,
            }
        })?;

        Self::from_json_str(&json).inspect_err(|e| {
            tracing::error!("invalid rollout config: {}", e);
        })
    }

    pub fn get(&self, feature: FeatureKey) -> Result<&FlagConfig, FlagError> {
        self.configs
            .get(&feature)
            .ok_or(FlagError::ConfigNotFound(feature))
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    /// Fails on the first feature without an entry.
    pub fn validate_complete(&self) -> Result<(), FlagError> {
        match FeatureKey::all().find(|feature| !self.configs.contains_key(feature)) {
            Some(missing) => Err(FlagError::ConfigNotFound(missing)),
            None => Ok(()),
        }
    }
}
