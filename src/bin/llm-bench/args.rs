use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "llm-bench",
    about = "Benchmark language models against expected answers"
)]
pub struct CliArgs {
    /// Benchmark configuration (.yaml, .yml or .toml)
    #[arg(index = 1)]
    pub config: PathBuf,
    /// Results CSV, overriding `results_file`
    #[arg(long)]
    pub results: Option<PathBuf>,
    /// Diagnostics file, overriding `diagnostics_file`
    #[arg(long)]
    pub diagnostics: Option<PathBuf>,
    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    pub log_level: String,
    /// Hide progress lines
    #[arg(long)]
    pub quiet: bool,
}
