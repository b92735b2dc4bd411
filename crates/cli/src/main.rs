use anyhow::Context;
use catalog_app::Catalog;
use catalog_kernel::settings::Settings;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "catalog")]
#[command(about = "Local library catalog", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Override the configured port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Fill an empty store with a sample catalog
    Seed,
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load().context("failed to load catalog settings")?;
    catalog_telemetry::init(&settings.telemetry)?;

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                settings.server.port = port;
            }
            catalog_app::run(settings).await?;
        }
        Commands::Seed => seed(&settings).await?,
        Commands::Config => println!("{settings:#?}"),
    }

    Ok(())
}

async fn seed(settings: &Settings) -> anyhow::Result<()> {
    let store = catalog_db::connect(&settings.database)
        .await
        .context("failed to open the document store")?;
    let counts = catalog_app::seed::seed(&Catalog::new(store)).await?;
    tracing::info!(endpoint = %settings.database.endpoint, "seed complete");
    println!(
        "seeded {} authors, {} genres, {} books, {} copies",
        counts.author_count, counts.genre_count, counts.book_count, counts.book_instance_count
    );
    Ok(())
}
