use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use cineman_reco::{
    api::{create_router, AppState},
    config::Config,
    services::{pipeline, CatalogSource, JsonFileSource, Recommender},
    storage::ArtifactStore,
};

#[derive(Parser, Debug)]
#[command(
    name = "cineman-reco",
    version,
    about = "Recommends currently-showing movies similar to a favorite"
)]
struct Cli {
    /// Artifact directory; overrides the configured one
    #[arg(long, global = true, env = "ARTIFACT_DIR")]
    artifact_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rebuild corpus, embedding model and similarity matrix from the catalogs
    Rebuild,
    /// Serve recommendations over HTTP from the persisted artifacts
    Serve,
    /// Print recommendations for one favorite title
    Recommend {
        title: String,
        #[arg(long, default_value_t = 1)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("cineman_reco=info,tower_http=info")
            }),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(dir) = cli.artifact_dir {
        config.artifact_dir = dir;
    }

    let store = ArtifactStore::new(&config.artifact_dir);

    match cli.command {
        Command::Rebuild => rebuild(&config, &store).await,
        Command::Serve => serve(&config, &store).await,
        Command::Recommend { title, limit } => recommend(&store, &title, limit).await,
    }
}

async fn rebuild(config: &Config, store: &ArtifactStore) -> anyhow::Result<()> {
    let source = JsonFileSource::from_config(config);
    let report = pipeline::rebuild(&source, store, &config.training())
        .await
        .context("Rebuild failed")?;

    println!(
        "Rebuilt {} movies ({} showing, {} tokens) in {:.1?}",
        report.rows, report.showing, report.vocabulary, report.duration
    );
    Ok(())
}

async fn serve(config: &Config, store: &ArtifactStore) -> anyhow::Result<()> {
    let snapshot = store
        .load_snapshot()
        .await
        .with_context(|| format!("Failed to load artifacts from {}", store.dir().display()))?;
    let screenings = JsonFileSource::from_config(config)
        .showtimes()
        .await
        .context("Failed to load showtimes")?;

    let state = Arc::new(AppState::from_snapshot(snapshot, screenings)?);
    let app = create_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!(addr = %addr, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}

async fn recommend(store: &ArtifactStore, title: &str, limit: usize) -> anyhow::Result<()> {
    let snapshot = store.load_snapshot().await?;
    let recommender = Recommender::new(snapshot.merged, snapshot.current, snapshot.matrix)?;

    for candidate in recommender.recommend_ranked(title, limit)? {
        println!("{:.4}\t{}", candidate.score, candidate.title);
    }
    Ok(())
}
