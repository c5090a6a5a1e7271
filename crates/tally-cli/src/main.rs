use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Team tally and scoreboard CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Database commands
    Db {
        #[command(subcommand)]
        cmd: DbCmd,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> overrides)
        #[arg(required = true)]
        paths: Vec<String>,

        /// Fail when the CLI would ignore some config keys
        #[arg(long, default_value_t = false)]
        strict: bool,
    },

    /// Print the per-event breakdown for every team
    Standings {
        /// Layered config paths in merge order (defaults to TALLY_CONFIG)
        #[arg(long = "config")]
        config_paths: Vec<String>,

        /// Read teams/events/logs from a JSON snapshot instead of the database
        #[arg(long)]
        snapshot: Option<String>,

        /// Emit JSON instead of a table
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum DbCmd {
    Status,

    /// Apply SQL migrations.
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Silent if the file does not exist; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Db { cmd } => {
            let pool = commands::connect_configured(&[]).await?;
            match cmd {
                DbCmd::Status => {
                    let s = tally_db::status(&pool).await?;
                    println!(
                        "db_ok={} has_teams_table={} has_events_table={}",
                        s.ok, s.has_teams_table, s.has_events_table
                    );
                }
                DbCmd::Migrate => {
                    tally_db::migrate(&pool).await?;
                    println!("migrations_applied=true");
                }
            }
        }

        Commands::ConfigHash { paths, strict } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = tally_config::load_layered_yaml(&path_refs)?;
            commands::check_unused_keys(&loaded, strict)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Standings {
            config_paths,
            snapshot,
            json,
        } => {
            commands::standings::run(&config_paths, snapshot.as_deref(), json).await?;
        }
    }

    Ok(())
}

fn init_tracing() {
    // Logs go to stderr so stdout stays machine-readable.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();
}
