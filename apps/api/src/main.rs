mod brochure;
mod collaborators;
mod config;
mod errors;
mod layout;
mod render;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::brochure::{BrochureGenerator, BrochureRequest, JobStore, LayoutKind, OutputSettings};
use crate::collaborators::{HttpImageClient, HttpTextClient, RateLimiter, RetryPolicy};
use crate::config::Config;
use crate::layout::{default_font_roles, FontSet};
use crate::routes::build_router;
use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(name = "brochure-api", version, about = "Single-page hotel brochure compositor")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP service (default).
    Serve,
    /// Generate one brochure and print the artifact path.
    Generate {
        #[arg(long)]
        hotel_name: String,
        #[arg(long)]
        location: String,
        #[arg(long, default_value = "full_bleed")]
        layout: String,
        /// Use images already on disk instead of calling the image service.
        #[arg(long)]
        skip_images: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Brochure API v{}", env!("CARGO_PKG_VERSION"));

    let generator = Arc::new(build_generator(&config)?);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&config, generator).await,
        Command::Generate {
            hotel_name,
            location,
            layout,
            skip_images,
        } => {
            let layout: LayoutKind = layout.parse()?;
            let request = BrochureRequest {
                hotel_name,
                location,
                layout,
                generate_images: !skip_images,
            };
            let artifact = generator.generate(&request).await?;
            println!("{}", artifact.path.display());
            Ok(())
        }
    }
}

async fn serve(config: &Config, generator: Arc<BrochureGenerator>) -> Result<()> {
    let state = AppState {
        generator,
        jobs: JobStore::default(),
    };
    let app = build_router(state);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Wires fonts, both collaborator clients and the output directories.
fn build_generator(config: &Config) -> Result<BrochureGenerator> {
    let fonts = match (&config.font_regular_path, &config.font_bold_path) {
        (None, None) => FontSet::embedded(),
        (regular, bold) => FontSet::from_paths(regular.as_deref(), bold.as_deref()),
    }
    .context("Failed to load fonts")?;
    info!("Fonts loaded ({})", fonts.origin());

    let policy = RetryPolicy {
        max_attempts: config.collaborator_max_attempts,
        backoff: config.collaborator_backoff,
        timeout: config.collaborator_timeout,
    };
    let limiter = Arc::new(RateLimiter::with_system_clock(
        config.rate_limit_max_requests,
        config.rate_limit_window,
    ));

    let text = HttpTextClient::new(&config.text_service_url, policy, limiter.clone())
        .context("Failed to build text service client")?;
    let images = HttpImageClient::new(&config.image_service_url, policy, limiter)
        .context("Failed to build image service client")?;
    info!(
        "Collaborators: text={} image={}",
        config.text_service_url, config.image_service_url
    );

    let output = OutputSettings {
        images_dir: config.images_dir.clone(),
        brochures_dir: config.brochures_dir.clone(),
        export_pdf: config.export_pdf,
    };
    info!(
        "Output: images={} brochures={} pdf={}",
        output.images_dir.display(),
        output.brochures_dir.display(),
        output.export_pdf
    );

    Ok(BrochureGenerator::new(
        Arc::new(text),
        Arc::new(images),
        Arc::new(fonts),
        default_font_roles(),
        output,
    ))
}
