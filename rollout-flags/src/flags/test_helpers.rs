/* Test Helpers specifically for the flags module */

use std::sync::Arc;

use crate::flags::{
    flag_matching::FlagEvaluator,
    flag_models::{FeatureKey, FlagConfig, FlagConfigTable, RolloutScope},
};

pub fn single_feature_table(feature: FeatureKey, config: FlagConfig) -> Arc<FlagConfigTable> {
    let table = FlagConfigTable::builder()
        .insert(feature, config)
        .build()
        .expect("Failed to build test table");
    Arc::new(table)
}

pub fn test_evaluator(feature: FeatureKey, percent: u8, scope: RolloutScope) -> FlagEvaluator {
    FlagEvaluator::new(single_feature_table(
        feature,
        FlagConfig::new(percent, scope),
    ))
}
