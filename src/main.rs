use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::{error, info, warn};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database};

use mediaport::config::Config;
use mediaport::upload::jobs::spawn_purge;
use mediaport::{router, AppState};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long, short, default_value_t = 3)]
    verbosity: usize,
    #[arg(long, short, default_value_t = false)]
    quiet: bool,
    #[arg(long, short)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(err) = stderrlog::new()
        .verbosity(args.verbosity)
        .quiet(args.quiet)
        .timestamp(stderrlog::Timestamp::Millisecond)
        .init()
    {
        eprintln!("Error initialising logging: {}", err);
        return ExitCode::FAILURE;
    }

    info!("Configuration path: {}", args.config.display());
    let config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(err) => {
            error!("{}", err);
            return ExitCode::FAILURE;
        }
    };

    if config.jwt_secret.is_empty() {
        warn!("No jwt_secret configured, bearer tokens will be ignored");
    }

    let mut options = ConnectOptions::new(config.database.to_owned());
    options
        .max_connections(config.max_connections)
        .sqlx_logging(false);
    let connection = match Database::connect(options).await {
        Ok(connection) => connection,
        Err(err) => {
            error!("Error connecting to database: {}", err);
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = Migrator::up(&connection, None).await {
        error!("Error running migrations: {}", err);
        return ExitCode::FAILURE;
    }
    if let Err(err) = tokio::fs::create_dir_all(&config.upload_root).await {
        error!(
            "Error creating upload root {}: {}",
            config.upload_root.display(),
            err
        );
        return ExitCode::FAILURE;
    }

    let port = config.port;
    let state = AppState {
        connection,
        config: Arc::new(config),
    };
    spawn_purge(state.to_owned());
    let app = router(state);

    let listener = match tokio::net::TcpListener::bind(("0.0.0.0", port)).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("Error binding port {}: {}", port, err);
            return ExitCode::FAILURE;
        }
    };
    info!("Listening on 0.0.0.0:{}", port);
    info!("Welcome to MediaPort!");

    match axum::serve(listener, app).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("Server error: {}", err);
            ExitCode::FAILURE
        }
    }
}
