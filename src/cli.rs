use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "bench-keys",
    version,
    about = "Inspect and drive the benchmark API key pool",
    long_about = "Loads the key rotation configuration, restores persisted key health and lets you \
                  select keys, report call outcomes and inspect the health of every pool."
)]
pub struct Cli {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        env = "KEY_ROTATION_CONFIG",
        default_value = "key_rotation.yaml"
    )]
    pub config: PathBuf,

    /// Log level used when RUST_LOG is not set
    #[arg(short, long, default_value = "warn")]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long, env = "KEY_ROTATION_JSON_LOGS")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate the configuration and list categories
    Validate,

    /// Print the persisted health of every key as JSON
    Status,

    /// Select a key and record the selection
    Select {
        /// Key category, e.g. GEMINI_API
        #[arg(long)]
        category: String,

        /// Run identifier; repeated calls in one process reuse the same key
        #[arg(long)]
        run_id: Option<String>,

        /// Print the secret instead of its preview
        #[arg(long)]
        reveal: bool,
    },

    /// Report the outcome of a call made with a key
    #[command(group(ArgGroup::new("outcome").required(true).args(["success", "error"])))]
    Report {
        /// Key category
        #[arg(long)]
        category: String,

        /// Key id as printed by `select`
        #[arg(long)]
        id: usize,

        /// The call succeeded
        #[arg(long)]
        success: bool,

        /// The call failed with this error message
        #[arg(long, value_name = "MESSAGE")]
        error: Option<String>,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_requires_an_outcome() {
        let res = Cli::try_parse_from(["bench-keys", "report", "--category", "GEMINI_API", "--id", "0"]);
        assert!(res.is_err());
    }

    #[test]
    fn report_rejects_both_outcomes() {
        let res = Cli::try_parse_from([
            "bench-keys", "report", "--category", "GEMINI_API", "--id", "0", "--success", "--error", "429",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn select_parses_run_id() {
        let cli = Cli::try_parse_from([
            "bench-keys", "--config", "keys.yaml", "select", "--category", "GEMINI_API", "--run-id", "r1",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("keys.yaml"));
        match cli.command {
            Commands::Select { category, run_id, reveal } => {
                assert_eq!(category, "GEMINI_API");
                assert_eq!(run_id.as_deref(), Some("r1"));
                assert!(!reveal);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
