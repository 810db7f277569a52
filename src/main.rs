use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value, json};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use watchtower::{
    config::AppConfig,
    initialization::InitializationService,
    persistence::{sqlite::SqliteWatchtowerRepository, traits::WatchtowerRepository},
    plugins::PluginKind,
    runner::Runner,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding `app.yaml` and `watchtowers.yaml`.
    #[arg(short, long, global = true)]
    config_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stores the watchtowers from `watchtowers.yaml` that are not stored yet.
    Init,
    /// Runs one stored watchtower, or all of them.
    Run(RunArgs),
    /// Prints the JSON schema of every registered plugin.
    Schema,
    /// Prints the stored status of a watchtower.
    Status {
        /// The watchtower's name template.
        name: String,
    },
}

#[derive(Args)]
struct RunArgs {
    /// The watchtower's name template.
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    name: Option<String>,
    /// Run every stored watchtower.
    #[arg(long)]
    all: bool,
}

#[tokio::main]
#[tracing::instrument(level = "info")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    let subscriber =
        FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let cli = Cli::parse();

    tracing::debug!("Loading application configuration...");
    let config = AppConfig::new(cli.config_dir.as_deref())?;
    tracing::debug!(
        database_url = %config.database_url,
        plugin_locations = ?config.plugin_locations,
        "Configuration loaded."
    );

    let repo = Arc::new(SqliteWatchtowerRepository::new(&config.database_url).await?);
    repo.run_migrations().await?;

    let runner = Runner::builder()
        .config(config.clone())
        .repository(Arc::clone(&repo) as Arc<dyn WatchtowerRepository>)
        .build()?;

    let result: Result<(), Box<dyn std::error::Error>> = match cli.command {
        Commands::Init => {
            let service = InitializationService::new(
                config,
                Arc::clone(&repo) as Arc<dyn WatchtowerRepository>,
                Arc::clone(runner.registry()),
            );
            let added = service.run().await?;
            println!("{added} watchtower(s) added");
            Ok(())
        }
        Commands::Run(args) => run(&runner, args).await,
        Commands::Schema => print_schemas(&runner),
        Commands::Status { name } => match repo.get_status(&name).await? {
            Some(status) => {
                println!("{}", serde_json::to_string_pretty(&status)?);
                Ok(())
            }
            None => Err(format!("Watchtower not found: {name}").into()),
        },
    };

    repo.close().await;
    result
}

async fn run(runner: &Runner, args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(name) = args.name {
        let outcome = runner.run_one(&name).await?;
        println!("{}", serde_json::to_string_pretty(&outcome.record)?);
        println!("run_id: {}, monitor success: {}", outcome.run_id, outcome.monitor_success);
        return Ok(());
    }

    let results = runner.run_all().await?;
    let mut failed = 0;
    for (name, result) in &results {
        match result {
            Ok(outcome) => {
                let failed_validators = outcome.record.failed_validators();
                if failed_validators.is_empty() {
                    println!(
                        "{name}: all validators passed, monitor success: {}",
                        outcome.monitor_success
                    );
                } else {
                    println!(
                        "{name}: failed validators: {}, monitor success: {}",
                        failed_validators.join(", "),
                        outcome.monitor_success
                    );
                }
            }
            Err(e) => {
                failed += 1;
                println!("{name}: error: {e}");
            }
        }
    }
    if failed > 0 {
        return Err(format!("{failed} of {} watchtower run(s) failed", results.len()).into());
    }
    Ok(())
}

fn print_schemas(runner: &Runner) -> Result<(), Box<dyn std::error::Error>> {
    let registry = runner.registry().get()?;
    let mut output = Map::new();
    for (key, kind) in [("validators", PluginKind::Validator), ("loaders", PluginKind::Loader)] {
        let schemas: Map<String, Value> = registry
            .schemas(kind)
            .into_iter()
            .map(|(name, schema)| match schema {
                Ok(schema) => (name, schema.to_json_schema()),
                Err(e) => (name, json!({ "error": e.to_string() })),
            })
            .collect();
        output.insert(key.to_string(), Value::Object(schemas));
    }
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
