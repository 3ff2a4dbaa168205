use env_logger::Env;

/// Logs to stderr. `RUST_LOG` wins over `default_level`.
pub fn init_logging(default_level: &str) -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level))
        .format_target(false)
        .try_init()?;
    Ok(())
}
