use std::{
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Arc,
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    ClientConfig, PredictionClient, RequestState, UploadController, UploadedFile,
};
use shared::domain::ClassificationResult;
use url::Url;

/// Uploads a photograph of a book and renders its condition assessment.
#[derive(Parser, Debug)]
struct Cli {
    /// Path to the book photograph.
    image: PathBuf,
    /// Classifier endpoint to upload to.
    #[arg(long, default_value = "http://127.0.0.1:8080/api/classifier")]
    endpoint: Url,
    /// Seconds to wait for the classifier before giving up.
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt().with_env_filter("warn").init();
    let cli = Cli::parse();

    let content = tokio::fs::read(&cli.image)
        .await
        .with_context(|| format!("failed to read {}", cli.image.display()))?;
    let file_name = cli
        .image
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload")
        .to_string();
    let file = UploadedFile::new(content, media_type_for(&cli.image), file_name);

    let config = ClientConfig::new(cli.endpoint)
        .with_request_timeout(Duration::from_secs(cli.timeout_secs));
    let client = PredictionClient::new(config).context("failed to build prediction client")?;
    let controller = UploadController::new(Arc::new(client));
    let mut states = controller.subscribe_states();

    controller.select_file(file).await;

    loop {
        let state = states
            .recv()
            .await
            .context("controller state stream closed")?;
        render(&state);
        if state.is_terminal() {
            return Ok(if matches!(state, RequestState::Failed(_)) {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            });
        }
    }
}

fn render(state: &RequestState) {
    match state {
        RequestState::Idle => println!("Ready for a new photo."),
        RequestState::Previewing => println!("Preparing preview..."),
        RequestState::Analyzing => println!("Analyzing book condition..."),
        RequestState::Succeeded(result) => render_result(result),
        RequestState::Failed(kind) => println!("{}", kind.user_message()),
    }
}

fn render_result(result: &ClassificationResult) {
    println!("Classification Result");
    println!("  Condition:  {}", result.condition.as_str());
    println!("  Confidence: {}%", (result.confidence * 100.0).round());
    println!("Detailed Assessment");
    println!("  Cover:   {}", result.details.cover_condition);
    println!("  Pages:   {}", result.details.page_condition);
    println!("  Binding: {}", result.details.binding_condition);
    if !result.recommendations.is_empty() {
        println!("Recommendations");
        for recommendation in &result.recommendations {
            println!("  - {recommendation}");
        }
    }
}

fn media_type_for(path: &Path) -> String {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("tif" | "tiff") => "image/tiff",
        _ => "application/octet-stream",
    }
    .to_string()
}
