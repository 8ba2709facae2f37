use anyhow::Result;
use clap::Parser;
use stageme_engine::app::App;
use stageme_engine::encoding::{detect_image_mime, VisualInput};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "stageme-engine")]
#[command(about = "Composite a photo and pose sketch into a stage scene")]
struct CliArgs {
    /// Captured subject photo (JPEG or PNG).
    #[arg(long, value_name = "FILE")]
    photo: PathBuf,

    /// Pose sketch exported from the drawing canvas.
    #[arg(long, value_name = "FILE")]
    sketch: PathBuf,

    /// Scene identifier, e.g. "Stage 2".
    #[arg(long, default_value = "Stage 1")]
    scene: String,
}

fn read_as_data_url(path: &Path) -> stageme_engine::Result<String> {
    let bytes = std::fs::read(path)?;
    let mime = detect_image_mime(&bytes);
    Ok(VisualInput::new(mime, bytes).to_data_url())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stageme_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting stageme-engine");

    let args = CliArgs::parse();

    let photo = read_as_data_url(&args.photo)?;
    let sketch = read_as_data_url(&args.sketch)?;

    match App::new().await {
        Ok(app) => match app.generate(Some(&photo), Some(&sketch), &args.scene).await {
            Ok(artifact) => {
                if let Some(text) = &artifact.fallback_text {
                    warn!("Backend returned text instead of an image: {}", text);
                }
                println!("{}", artifact.result_url);
                Ok(())
            }
            Err(e) => {
                error!("Generation failed: {}", e);
                std::process::exit(1);
            }
        },
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    }
}
