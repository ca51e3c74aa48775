/// Initialises `env_logger` for tests. Output is captured by the test harness
/// and the log level is taken from `RUST_LOG` as usual.
pub fn test_logger() {
    // Tests run in parallel, so another test may have installed the logger already.
    let _ = env_logger::builder().is_test(true).try_init();
}
