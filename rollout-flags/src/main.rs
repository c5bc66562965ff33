use std::sync::Arc;

use anyhow::Context;
use envconfig::Envconfig;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use rollout_flags::config::Config;
use rollout_flags::flags::flag_matching::FlagEvaluator;
use rollout_flags::flags::flag_models::FeatureKey;

fn main() -> anyhow::Result<()> {
    let config = Config::init_from_env().context("Invalid configuration")?;

    // logs go to stderr with a level configured by the RUST_LOG envvar, stdout carries the flags
    let log_layer = {
        let base_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true);

        if *config.debug {
            base_layer
                .with_ansi(true)
                .with_filter(EnvFilter::from_default_env())
                .boxed()
        } else {
            base_layer
                .json()
                .with_filter(EnvFilter::from_default_env())
                .boxed()
        }
    };
    tracing_subscriber::registry().with(log_layer).init();

    let table = config.load_table()?;
    table.validate_complete()?;

    let evaluator = FlagEvaluator::new(Arc::new(table));
    let identity = config.identity();
    let forced = config.forced_value();

    let response = evaluator.feature_flags_response(&identity, forced)?;
    tracing::info!(
        forced = ?forced,
        features = FeatureKey::all().count(),
        "feature flags decided"
    );

    println!("{}", response);
    Ok(())
}
