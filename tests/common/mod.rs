#![allow(dead_code)]

pub mod asserts;
pub mod fixtures;

#[allow(unused_imports)]
pub use asserts::*;
#[allow(unused_imports)]
pub use fixtures::*;

/// Initialise test logging once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}
