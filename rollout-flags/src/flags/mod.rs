pub mod flag_match_reason;
pub mod flag_matching;
pub mod flag_matching_utils;
pub mod flag_models;

#[cfg(test)]
pub mod test_helpers;
