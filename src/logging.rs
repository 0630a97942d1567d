use std::env;

/// Sets up `env_logger`. Level comes from `RUST_LOG`, `info` when unset.
pub fn init_logging() {
    let level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

    env_logger::Builder::new()
        .parse_filters(&level)
        .format_timestamp_secs()
        .format_module_path(true)
        .format_target(false)
        .init();

    log::debug!("logging initialised at '{}'", level);
}
