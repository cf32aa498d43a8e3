use addis_speech::domain::batch::{BatchOutcome, BatchService, CancellationToken};
use addis_speech::domain::history::HistoryStore;
use addis_speech::domain::language::LanguageCode;
use addis_speech::domain::record::{RecordKind, ResultRecord};
use addis_speech::error::AppError;
use addis_speech::infrastructure::config::{Config, LogFormat};
use addis_speech::infrastructure::repositories::{AudioInput, BackendVersion, SpeechBackendSet};
use addis_speech::infrastructure::storage::{self, FileKeyValueStore, KeyValueStore};
use addis_speech::infrastructure::{export, import};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "addis-speech",
    about = "Batch TTS/STT client for the Addis AI speech endpoints"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Synthesize texts to speech and store the results
    Tts {
        /// Target language ('am' or 'om')
        #[arg(long)]
        language: LanguageCode,
        /// Backend version to target
        #[arg(long, default_value = "v1")]
        version: BackendVersion,
        /// Read texts from a two-column spreadsheet or csv file
        /// (column A: optional reference, column B: text)
        #[arg(long)]
        import: Option<PathBuf>,
        /// Texts given directly on the command line
        texts: Vec<String>,
    },
    /// Transcribe audio files and store the results
    Stt {
        /// Target language ('am' or 'om')
        #[arg(long)]
        language: LanguageCode,
        /// Backend version to target
        #[arg(long, default_value = "v1")]
        version: BackendVersion,
        /// Audio files to transcribe, in order
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// List stored results, newest first
    History {
        /// Only show one kind ('tts' or 'stt')
        #[arg(long)]
        kind: Option<RecordKind>,
        /// Only show recognition results from this backend version
        #[arg(long)]
        stt_version: Option<String>,
    },
    /// Export stored results to a ZIP archive
    Export {
        #[arg(long, default_value = "speech_results.zip")]
        out: PathBuf,
        /// Only export one kind ('tts' or 'stt')
        #[arg(long)]
        kind: Option<RecordKind>,
    },
    /// Delete all stored results
    Clear,
    /// Store the API key used for backend calls
    SetKey { key: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::from_env()?;
    init_logging(&config);

    let store: Arc<dyn KeyValueStore> = Arc::new(FileKeyValueStore::new(&config.data_dir)?);

    match cli.command {
        Command::Tts {
            language,
            version,
            import,
            texts,
        } => run_tts(&config, store, language, version, import, texts).await?,
        Command::Stt {
            language,
            version,
            files,
        } => run_stt(&config, store, language, version, files).await?,
        Command::History { kind, stt_version } => show_history(store, kind, stt_version),
        Command::Export { out, kind } => export_history(store, &out, kind)?,
        Command::Clear => {
            let mut history = HistoryStore::load(store);
            history.clear()?;
            println!("History cleared.");
        }
        Command::SetKey { key } => {
            storage::store_api_key(store.as_ref(), &key)?;
            println!("API key stored.");
        }
    }

    Ok(())
}

async fn run_tts(
    config: &Config,
    store: Arc<dyn KeyValueStore>,
    language: LanguageCode,
    version: BackendVersion,
    import: Option<PathBuf>,
    mut texts: Vec<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = import {
        let rows = import::read_rows(&path)?;
        texts.extend(rows.into_iter().map(|row| row.text));
    }

    let api_key = config.resolve_api_key(store.as_ref())?.unwrap_or_default();
    let (batch, history, token) = build_batch(config, store)?;

    let outcome = batch
        .run_synthesis(texts, language, version, &api_key, &token)
        .await?;
    report_outcome(&outcome);

    let history = history
        .lock()
        .map_err(|_| AppError::Internal("history lock poisoned".to_string()))?;
    for record in history.records().iter().take(outcome.completed).rev() {
        if let ResultRecord::SpeechGeneration(r) = record {
            println!(
                "  synthesized '{}' ({} bytes)",
                r.source_text,
                r.audio_data.len()
            );
        }
    }
    Ok(())
}

async fn run_stt(
    config: &Config,
    store: Arc<dyn KeyValueStore>,
    language: LanguageCode,
    version: BackendVersion,
    files: Vec<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut inputs = Vec::with_capacity(files.len());
    for path in &files {
        let data = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        inputs.push(AudioInput::new(file_name, data));
    }

    let api_key = config.resolve_api_key(store.as_ref())?.unwrap_or_default();
    let (batch, history, token) = build_batch(config, store)?;

    let outcome = batch
        .run_recognition(inputs, language, version, &api_key, &token)
        .await?;
    report_outcome(&outcome);

    let history = history
        .lock()
        .map_err(|_| AppError::Internal("history lock poisoned".to_string()))?;
    for record in history.records().iter().take(outcome.completed).rev() {
        if let ResultRecord::SpeechRecognition(r) = record {
            let name = r.source_file_name.as_deref().unwrap_or("<unnamed>");
            println!("  {}: {}", name, r.cleaned_transcription);
        }
    }
    Ok(())
}

fn build_batch(
    config: &Config,
    store: Arc<dyn KeyValueStore>,
) -> Result<(BatchService, Arc<Mutex<HistoryStore>>, CancellationToken), AppError> {
    let (v1_base_url, v2_base_url) = config.backend_base_urls()?;
    let backends = Arc::new(SpeechBackendSet::over_http(
        reqwest::Client::new(),
        v1_base_url,
        v2_base_url,
    ));
    let history = Arc::new(Mutex::new(HistoryStore::load(store)));
    let batch = BatchService::new(backends, history.clone());

    // Ctrl-C stops the batch at the next item boundary; the in-flight call
    // still completes
    let token = CancellationToken::new();
    let watch = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Cancellation requested, finishing the current item...");
            watch.cancel();
        }
    });

    Ok((batch, history, token))
}

fn report_outcome(outcome: &BatchOutcome) {
    for failure in &outcome.failures {
        eprintln!("FAILED {}: {}", failure.input, failure.reason);
    }
    if outcome.cancelled {
        println!(
            "Cancelled after {} item(s); {} failed.",
            outcome.completed,
            outcome.failures.len()
        );
    } else {
        println!(
            "Done: {} succeeded, {} failed.",
            outcome.completed,
            outcome.failures.len()
        );
    }
}

fn show_history(
    store: Arc<dyn KeyValueStore>,
    kind: Option<RecordKind>,
    stt_version: Option<String>,
) {
    let history = HistoryStore::load(store);
    let records: Vec<&ResultRecord> = match (&stt_version, kind) {
        (Some(version), _) => history.filter_recognition_by_version(version),
        (None, Some(kind)) => history.filter_by_kind(kind),
        (None, None) => history.records().iter().collect(),
    };

    if records.is_empty() {
        println!("No stored results.");
        return;
    }
    for record in records {
        println!(
            "{}  {:<18}  {}",
            record.created_at().format("%Y-%m-%d %H:%M:%S"),
            record.kind().as_str(),
            record.display_text().lines().next().unwrap_or("")
        );
    }
}

fn export_history(
    store: Arc<dyn KeyValueStore>,
    out: &PathBuf,
    kind: Option<RecordKind>,
) -> Result<(), Box<dyn std::error::Error>> {
    let history = HistoryStore::load(store);
    let records: Vec<&ResultRecord> = match kind {
        Some(kind) => history.filter_by_kind(kind),
        None => history.records().iter().collect(),
    };

    export::export_to_file(&records, out)?;
    println!("Exported {} record(s) to {}", records.len(), out.display());
    Ok(())
}

fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "addis_speech=info".into());
    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
