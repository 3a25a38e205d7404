use std::sync::Once;

use log::LevelFilter;

/// Logger configuration for the demo runner.
///
/// `env_filter` uses `env_logger` directives, e.g. `"debug"` or
/// `"nabu_engine=debug,wgpu_hal=info"`. When set it replaces `RUST_LOG`.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

/// Levels applied before any user filter.
///
/// Adapter enumeration and shader translation in wgpu log several lines per
/// demo at info; the demos' own output stays at info.
const BASE_DIRECTIVES: &[(Option<&str>, LevelFilter)] = &[
    (None, LevelFilter::Info),
    (Some("wgpu_core"), LevelFilter::Warn),
    (Some("wgpu_hal"), LevelFilter::Warn),
    (Some("naga"), LevelFilter::Warn),
];

static INIT: Once = Once::new();

/// Installs the `env_logger` backend. Only the first call has an effect.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();
        for &(module, level) in BASE_DIRECTIVES {
            builder.filter(module, level);
        }

        let env = std::env::var("RUST_LOG").ok();
        if let Some(filter) = user_filter(config.env_filter.as_deref(), env.as_deref()) {
            builder.parse_filters(filter);
        }

        builder.write_style(config.write_style);
        builder.init();

        log::debug!("logging initialized");
    });
}

/// `--log` wins over `RUST_LOG`; blank values count as unset.
fn user_filter<'a>(configured: Option<&'a str>, env: Option<&'a str>) -> Option<&'a str> {
    configured
        .filter(|f| !f.trim().is_empty())
        .or_else(|| env.filter(|f| !f.trim().is_empty()))
}
