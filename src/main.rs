// src/main.rs

use anyhow::Context;
use bench_key_rotation::cli::{Cli, Commands};
use bench_key_rotation::config::{self, KeyRotationConfig};
use bench_key_rotation::{KeyCategory, KeyManager};
use tracing::{debug, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(cli: &Cli) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    let registry = tracing_subscriber::registry().with(env_filter);

    // Logs go to stderr so stdout stays machine-readable.
    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn print_categories(config: &KeyRotationConfig) {
    for category in &config.categories {
        let keys = category
            .keys
            .as_deref()
            .map_or(0, |raw| config::parse_key_pool(raw).len());
        println!(
            "{:<24} {:>3} key(s)  (env: {})",
            category.name,
            keys,
            category.env_var_name()
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_args();
    init_tracing(&cli);

    let config = config::load_config(&cli.config)
        .with_context(|| format!("Failed to load configuration from '{}'", cli.config.display()))?;
    debug!(?config, "Configuration loaded");

    match cli.command {
        Commands::Validate => {
            println!(
                "Configuration OK: {} categories, state file '{}'",
                config.categories.len(),
                config.state_file.display()
            );
            print_categories(&config);
        }
        Commands::Status => {
            let manager = init_manager(&config).await?;
            let states = manager.key_states().await;
            println!("{}", serde_json::to_string_pretty(&states)?);
        }
        Commands::Select {
            category,
            run_id,
            reveal,
        } => {
            let manager = init_manager(&config).await?;
            select(&manager, KeyCategory::from(category), run_id.as_deref(), reveal).await?;
        }
        Commands::Report {
            category,
            id,
            success,
            error,
        } => {
            let manager = init_manager(&config).await?;
            report(&manager, KeyCategory::from(category), id, success, error.as_deref()).await?;
        }
    }

    Ok(())
}

async fn init_manager(config: &KeyRotationConfig) -> anyhow::Result<KeyManager> {
    KeyManager::new(config)
        .await
        .context("Failed to initialize key manager")
}

async fn select(
    manager: &KeyManager,
    category: KeyCategory,
    run_id: Option<&str>,
    reveal: bool,
) -> anyhow::Result<()> {
    let selected = match run_id {
        Some(run_id) => manager.get_key_for_run(run_id, &category).await?,
        None => manager.select_key(&category).await?,
    };
    let shown = if reveal {
        selected.expose_secret().to_string()
    } else {
        selected.preview()
    };
    println!("{}\t{}", selected.id, shown);
    Ok(())
}

async fn report(
    manager: &KeyManager,
    category: KeyCategory,
    id: usize,
    success: bool,
    error: Option<&str>,
) -> anyhow::Result<()> {
    if manager.key_count(&category).await <= id {
        anyhow::bail!("Category '{category}' has no key with id {id}");
    }
    manager.report_result(&category, id, success, error).await;
    info!(%category, id, success, "Outcome recorded");

    let states = manager.key_states().await;
    if let Some(health) = states.get(category.as_str(), id) {
        println!("{}", serde_json::to_string_pretty(health)?);
    }
    Ok(())
}
