use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::instrument;

use crate::{
    errors::FlagError,
    flags::{
        flag_match_reason::FlagDecisionReason,
        flag_matching_utils::is_in_rollout_bucket,
        flag_models::{FeatureKey, FlagConfig, FlagConfigTable, MAX_ROLLOUT_PERCENT, RolloutScope},
    },
};

/// Subject used when the identity a feature is scoped on is unknown.
pub const DEMO_SUBJECT: &str = "demo";

/// Identity a feature is evaluated for. Any field may be unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct FlagIdentity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_id: Option<String>,
}

impl FlagIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn with_workspace(mut self, workspace_id: impl Into<String>) -> Self {
        self.workspace_id = Some(workspace_id.into());
        self
    }

    pub fn with_admin(mut self, admin_id: impl Into<String>) -> Self {
        self.admin_id = Some(admin_id.into());
        self
    }

    /// Picks the identity `scope` buckets on. Other fields are never looked at.
    pub fn bucketing_subject(&self, scope: RolloutScope) -> BucketingSubject<'_> {
        match scope {
            RolloutScope::Project => self
                .project_id
                .as_deref()
                .map_or(BucketingSubject::Demo, BucketingSubject::Project),
            RolloutScope::Workspace => self
                .workspace_id
                .as_deref()
                .map_or(BucketingSubject::Demo, BucketingSubject::Workspace),
            RolloutScope::Admin => self
                .admin_id
                .as_deref()
                .map_or(BucketingSubject::Demo, BucketingSubject::Admin),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketingSubject<'a> {
    Project(&'a str),
    Workspace(&'a str),
    Admin(&'a str),
    /// The scoped identity is unknown.
    Demo,
}

impl BucketingSubject<'_> {
    pub fn as_str(&self) -> &str {
        match self {
            BucketingSubject::Project(id)
            | BucketingSubject::Workspace(id)
            | BucketingSubject::Admin(id) => id,
            BucketingSubject::Demo => DEMO_SUBJECT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagDecision {
    pub feature: FeatureKey,
    pub enabled: bool,
    pub reason: FlagDecisionReason,
}

/// Empty ids count as unknown when checking overrides.
fn present(id: &Option<String>) -> Option<&str> {
    id.as_deref().filter(|id| !id.is_empty())
}

fn evaluate_config(
    feature: FeatureKey,
    config: &FlagConfig,
    identity: &FlagIdentity,
) -> FlagDecision {
    let decided = |enabled, reason| FlagDecision {
        feature,
        enabled,
        reason,
    };

    if present(&identity.project_id).is_some_and(|id| config.is_project_overridden(id)) {
        return decided(true, FlagDecisionReason::ProjectOverride);
    }
    if present(&identity.workspace_id).is_some_and(|id| config.is_workspace_overridden(id)) {
        return decided(true, FlagDecisionReason::WorkspaceOverride);
    }
    if config.percent() >= MAX_ROLLOUT_PERCENT {
        return decided(true, FlagDecisionReason::FullRollout);
    }
    if config.percent() == 0 {
        return decided(false, FlagDecisionReason::ZeroRollout);
    }

    let subject = identity.bucketing_subject(config.scope());
    if is_in_rollout_bucket(feature, subject.as_str(), config.percent()) {
        decided(true, FlagDecisionReason::InRolloutBucket)
    } else {
        decided(false, FlagDecisionReason::OutOfRolloutBucket)
    }
}

#[instrument(skip_all, fields(feature = %feature))]
fn evaluate_in_table(
    table: &FlagConfigTable,
    feature: FeatureKey,
    identity: &FlagIdentity,
) -> Result<FlagDecision, FlagError> {
    let config = table.get(feature)?;
    let decision = evaluate_config(feature, config, identity);
    tracing::debug!(
        enabled = decision.enabled,
        reason = %decision.reason,
        "evaluated feature flag"
    );
    Ok(decision)
}

/// Decides feature flags against an injected, read-only [`FlagConfigTable`].
///
/// Evaluation is a pure function of the feature, the identity and the table, so a single
/// evaluator can be shared freely between threads and tasks.
#[derive(Debug, Clone)]
pub struct FlagEvaluator {
    table: Arc<FlagConfigTable>,
}

impl FlagEvaluator {
    pub fn new(table: Arc<FlagConfigTable>) -> Self {
        FlagEvaluator { table }
    }

    pub fn decide(&self, feature: FeatureKey, identity: &FlagIdentity) -> Result<bool, FlagError> {
        Ok(self.evaluate(feature, identity)?.enabled)
    }

    pub fn evaluate(
        &self,
        feature: FeatureKey,
        identity: &FlagIdentity,
    ) -> Result<FlagDecision, FlagError> {
        evaluate_in_table(&self.table, feature, identity)
    }

    /// Like [`FlagEvaluator::evaluate`], but a `forced` value from the caller replaces the
    /// computed result. The lookup still runs so a missing config is never masked.
    pub fn evaluate_with_override(
        &self,
        feature: FeatureKey,
        identity: &FlagIdentity,
        forced: Option<bool>,
    ) -> Result<FlagDecision, FlagError> {
        let decision = self.evaluate(feature, identity)?;
        Ok(match forced {
            Some(enabled) => FlagDecision {
                enabled,
                reason: FlagDecisionReason::Forced,
                ..decision
            },
            None => decision,
        })
    }

    pub fn evaluate_all(
        &self,
        identity: &FlagIdentity,
    ) -> Result<BTreeMap<FeatureKey, bool>, FlagError> {
        FeatureKey::all()
            .map(|feature| {
                self.decide(feature, identity)
                    .map(|enabled| (feature, enabled))
            })
            .collect()
    }

    /// Decides every feature, applying `forced` to each, and renders
    /// `{"featureFlags": {"<label>": bool, ...}}`.
    pub fn feature_flags_response(
        &self,
        identity: &FlagIdentity,
        forced: Option<bool>,
    ) -> Result<Value, FlagError> {
        let mut feature_flags = Map::new();
        for feature in FeatureKey::all() {
            let decision = self.evaluate_with_override(feature, identity, forced)?;
            feature_flags.insert(feature.label().to_string(), Value::Bool(decision.enabled));
        }
        Ok(json!({ "featureFlags": feature_flags }))
    }
}

/// One-shot form of [`FlagEvaluator::decide`] taking the identity fields directly.
pub fn decide(
    table: &FlagConfigTable,
    feature: FeatureKey,
    project_id: Option<&str>,
    workspace_id: Option<&str>,
    admin_id: Option<&str>,
) -> Result<bool, FlagError> {
    let identity = FlagIdentity {
        project_id: project_id.map(str::to_string),
        workspace_id: workspace_id.map(str::to_string),
        admin_id: admin_id.map(str::to_string),
    };
    Ok(evaluate_in_table(table, feature, &identity)?.enabled)
}
