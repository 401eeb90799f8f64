mod config;
mod context;
mod error;
mod models;
mod processor;
mod routes;
mod storage;
mod utils;
mod writethrough;

#[cfg(test)]
mod tests;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use mimalloc::MiMalloc;
use poem::listener::TcpListener;
use poem::Server;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::RuntimeConfig;
use crate::context::StorageContext;
use crate::processor::VariantGenerator;
use crate::writethrough::WriteThroughStore;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Debug, Parser)]
#[clap(
    name = "vitrine",
    about = "A storefront catalog API with write-through caching and automatic image variants.",
    version
)]
struct Args {
    /// The path to the server configuration file.
    #[clap(
        short,
        long,
        env = "VITRINE_CONFIG",
        default_value = "config.yaml"
    )]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,vitrine=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cfg = RuntimeConfig::from_file(&args.config)?;
    let ctx = StorageContext::connect(&cfg).await?;

    let store = WriteThroughStore::new(ctx.tables.clone(), ctx.cache.clone());
    let images = VariantGenerator::new(ctx.objects.clone(), cfg.presets);
    let app = routes::build_route(store, images);

    let addr = format!("{}:{}", cfg.host, cfg.port);
    info!("serving catalog API @ http://{}", addr);
    Server::new(TcpListener::bind(addr)).run(app).await?;

    Ok(())
}
