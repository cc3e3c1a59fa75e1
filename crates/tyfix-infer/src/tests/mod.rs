//! Completion engine tests

pub mod test_config;
pub mod test_fixation;
pub mod test_scenarios;

/// Routes `log` output through the test harness. Safe to call repeatedly.
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
