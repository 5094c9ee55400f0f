use clap::Parser;
use genre_proxy::client::{DEFAULT_ENDPOINT, PredictClient};
use genre_proxy::UploadCandidate;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Upload an MP3 or WAV file and print its predicted genre
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Audio file to classify
    file: PathBuf,

    /// Prediction endpoint
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Sent as X-API-KEY when set
    #[arg(long, env = "API_TOKEN")]
    api_key: Option<String>,

    /// Request timeout in seconds
    #[arg(short, long, default_value_t = 120)]
    timeout_secs: u64,

    /// Override the media type guessed from the file extension
    #[arg(short, long)]
    media_type: Option<String>,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_tracing();
    let args = Args::parse();

    let candidate = UploadCandidate::from_path(&args.file, args.media_type.as_deref()).await?;
    let client = PredictClient::new(
        args.endpoint,
        args.api_key,
        Duration::from_secs(args.timeout_secs),
    )?;

    match client.classify(&candidate).await {
        Ok(classification) => {
            if let Some(error) = &classification.error {
                eprintln!("{error}");
            }
            println!("Predicted genre: {classification}");
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            eprintln!("{error}");
            Ok(ExitCode::from(2))
        }
    }
}
