pub mod config;
pub mod errors;
pub mod flags;

pub use errors::FlagError;
pub use flags::flag_match_reason::FlagDecisionReason;
pub use flags::flag_matching::{decide, FlagDecision, FlagEvaluator, FlagIdentity};
pub use flags::flag_models::{FeatureKey, FlagConfig, FlagConfigTable, RolloutScope};
