use core::sync::atomic::{AtomicU32, Ordering};

use clap::{Parser, Subcommand};
use sparkhub::{seed, serve, Config, PasswordHasher, Repositories};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sparkhub", version, about = "From Classroom Concept to Real-World Creation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API.
    Serve {
        /// Keep everything in memory instead of connecting to MongoDB.
        #[arg(long)]
        in_memory: bool,
    },
    /// Replace the database contents with demo data.
    Seed,
}

async fn async_main(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load()?;

    match cli.command {
        Command::Serve { in_memory } => serve(config, in_memory).await,
        Command::Seed => {
            let repos = Repositories::mongo(&config.mongodb_uri, &config.mongodb_db).await?;
            seed(&repos, PasswordHasher::new(config.bcrypt_cost)).await
        },
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("sparkhub=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name_fn(|| {
            let num = NUM.fetch_add(1, Ordering::Relaxed);
            format!("sparkhub-worker-{}", num)
        })
        .build()
    {
        Ok(r) => r,
        Err(e) => return tracing::error!("cannot build tokio runtime: {}", e),
    };

    if let Err(e) = rt.block_on(async_main(cli)) {
        tracing::error!("{:?}", e);
        std::process::exit(1);
    }
}

static NUM: AtomicU32 = AtomicU32::new(0);
