use std::sync::Once;
use tracing_subscriber::EnvFilter;

/// Installs a test-friendly global subscriber once per test binary. Filter with `RUST_LOG`.
pub fn init() {
	static INIT: Once = Once::new();
	INIT.call_once(|| {
		tracing_subscriber::fmt()
			.with_env_filter(EnvFilter::from_default_env())
			.with_test_writer()
			.try_init()
			.ok();
	});
}
