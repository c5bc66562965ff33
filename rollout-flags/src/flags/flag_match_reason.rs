use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
pub enum FlagDecisionReason {
    #[strum(serialize = "forced")]
    Forced,
    #[strum(serialize = "project_override")]
    ProjectOverride,
    #[strum(serialize = "workspace_override")]
    WorkspaceOverride,
    #[strum(serialize = "full_rollout")]
    FullRollout,
    #[strum(serialize = "in_rollout_bucket")]
    InRolloutBucket,
    #[strum(serialize = "out_of_rollout_bucket")]
    OutOfRolloutBucket,
    #[strum(serialize = "zero_rollout")]
    ZeroRollout,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_display() {
        assert_eq!(FlagDecisionReason::Forced.to_string(), "forced");
        assert_eq!(
            FlagDecisionReason::ProjectOverride.to_string(),
            "project_override"
        );
        assert_eq!(
            FlagDecisionReason::WorkspaceOverride.to_string(),
            "workspace_override"
        );
        assert_eq!(FlagDecisionReason::FullRollout.to_string(), "full_rollout");
        assert_eq!(
            FlagDecisionReason::InRolloutBucket.to_string(),
            "in_rollout_bucket"
        );
        assert_eq!(
            FlagDecisionReason::OutOfRolloutBucket.to_string(),
            "out_of_rollout_bucket"
        );
        assert_eq!(FlagDecisionReason::ZeroRollout.to_string(), "zero_rollout");
    }

    #[test]
    fn test_from_str() {
        assert_eq!(
            FlagDecisionReason::from_str("workspace_override").unwrap(),
            FlagDecisionReason::WorkspaceOverride
        );
        assert!(FlagDecisionReason::from_str("condition_match").is_err());
    }
}
