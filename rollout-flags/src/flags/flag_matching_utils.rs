use sha2::{Digest, Sha256};

use crate::flags::flag_models::{FeatureKey, MAX_ROLLOUT_PERCENT};

/// Builds the hash input `"<feature label>-<subject>"`.
pub fn hash_message(feature: FeatureKey, subject: &str) -> String {
    format!("{}-{}", feature.label(), subject)
}

/// Sums the bytes of the SHA-256 digest of `message`.
///
/// The result lies in `0..=8160` (32 bytes of at most 255 each). This is a coarse reduction
/// of the digest and is not uniform, but existing rollouts depend on it, so it has to stay
/// exactly as is.
pub fn digest_sum(message: &str) -> u32 {
    Sha256::digest(message.as_bytes())
        .iter()
        .map(|byte| u32::from(*byte))
        .sum()
}

/// Number of buckets a subject is spread over for a given rollout percentage, i.e.
/// `ceil(100 / percent)`. A zero percent rollout has no active bucket at all.
pub fn bucket_width(percent: u8) -> Option<u32> {
    match percent {
        0 => None,
        p => Some(u32::from(MAX_ROLLOUT_PERCENT).div_ceil(u32::from(p))),
    }
}

/// Returns true when `subject` falls into the active bucket of `feature` at `percent`.
pub fn is_in_rollout_bucket(feature: FeatureKey, subject: &str, percent: u8) -> bool {
    let Some(width) = bucket_width(percent) else {
        return false;
    };
    digest_sum(&hash_message(feature, subject)) % width == 0
}
