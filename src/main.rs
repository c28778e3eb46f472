use clap::Parser;
use dotenvy::dotenv;
use part_db::{
    cli::{self, Cli, CliContext},
    config::{self, database},
    errors::Result,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    // 2. Load .env file, env vars can also be set externally
    dotenv().ok();

    let args = Cli::parse();

    // 3. Load the application configuration
    let app_config = config::load_config(&args.config)
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;

    // 4. Connect and make sure the schema exists
    let db = database::create_connection()
        .await
        .inspect(|_| info!("Database connection established"))
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Run the command
    let context = CliContext::new(db, app_config, args.json);
    let output = cli::run(args.command, &context)
        .await
        .inspect_err(|e| error!("{}", e))?;
    println!("{output}");

    Ok(())
}
