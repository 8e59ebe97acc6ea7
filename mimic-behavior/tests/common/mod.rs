use std::sync::OnceLock;

use mimic_common::observability::{LogConfig, LogFormat};

static INIT_PATH: OnceLock<std::path::PathBuf> = OnceLock::new();

/// Route test logs to a throwaway directory; `RUST_LOG` still wins.
pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "mimic-tests",
            log_dir: Some(std::env::temp_dir().join("mimic-tests")),
            emit_stderr: std::env::var("MIMIC_TEST_STDERR").is_ok(),
            format: LogFormat::Text,
            default_filter: "debug".to_string(),
        };

        mimic_common::observability::init_logging(config).unwrap_or_default()
    });
}
