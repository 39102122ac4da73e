//! Hospital risk scorer entrypoint: train on a dataset, score events, generate
//! synthetic data, or summarize a dataset. The trained state lives in the
//! encrypted store under the configured data directory between invocations.

use clap::{Parser, Subcommand};
use hospital_risk::{
    config::ScorerConfig,
    events::{load_events, write_records, BackendClient},
    logging::{PredictionLine, StructuredLogger},
    report::{heuristic_scored, DatasetSummary},
    service::RiskService,
    storage::SecureStore,
    synth::{DatasetGenerator, GeneratedRiskLevel},
};
use std::io::Write;
use std::path::PathBuf;
use tracing::{info, warn};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Parser)]
#[command(name = "hospital-risk", about = "User-behavior risk scoring")]
struct Cli {
    /// Config file (JSON)
    #[arg(long, env = "HOSPITAL_RISK_CONFIG", default_value = "config.json")]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fit encoders and the anomaly model on a dataset; replaces the saved model
    Train {
        #[arg(long)]
        data: PathBuf,
    },
    /// Score every event in a dataset; one JSON line per scored event
    Predict {
        #[arg(long)]
        data: PathBuf,
        /// Also keep scored events in the local store
        #[arg(long)]
        store: bool,
    },
    /// Write a synthetic dataset
    Generate {
        #[arg(short, long, default_value_t = 10_000)]
        records: usize,
        #[arg(short, long)]
        out: PathBuf,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Pull behavior records from the tracking backend into a dataset file
    Fetch {
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Print a descriptive summary of a dataset
    Summary {
        #[arg(long)]
        data: PathBuf,
    },
    /// Show whether a model is trained and which encoders it has
    Status,
    /// Forget the saved model; scoring needs a new `train` afterwards
    Reset,
}

fn open_store(config: &ScorerConfig) -> Result<SecureStore, BoxError> {
    std::fs::create_dir_all(&config.data_dir)?;
    let secret = std::env::var("HOSPITAL_RISK_SECRET")
        .unwrap_or_else(|_| "device-secret-placeholder".to_string()); // In production: from OS keystore
    Ok(SecureStore::open(&config.store_path(), secret.as_bytes())?)
}

fn run(command: Command, config: ScorerConfig) -> Result<(), BoxError> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match command {
        Command::Train { data } => {
            let store = open_store(&config)?;
            let service = RiskService::new(config);
            let events = load_events(&data)?;
            service.fit(&events)?;
            service.save(&store)?;
            StructuredLogger::emit_json(&service.status(), &mut out);
        }
        Command::Predict { data, store: keep } => {
            let store = open_store(&config)?;
            let service = RiskService::new(config);
            if !service.load(&store) {
                return Err(hospital_risk::ScoringError::NotTrained.into());
            }
            let events = load_events(&data)?;
            let scored = service.score_batch(&events)?;
            if scored.len() < events.len() {
                warn!(
                    dropped = events.len() - scored.len(),
                    "events with invalid timestamps were not scored"
                );
            }
            for s in &scored {
                StructuredLogger::emit_json(&PredictionLine::from_scored(s), &mut out);
                if keep {
                    let payload = serde_json::to_string(&events[s.index])?;
                    store.insert_scored(s, &payload)?;
                }
            }
            // Vocabularies may have grown with "unknown"; keep them.
            service.save(&store)?;
        }
        Command::Generate { records, out: path, seed } => {
            let mut generator = DatasetGenerator::new(seed);
            let rows = generator.generate(records);
            write_records(&path, &rows)?;
            for level in GeneratedRiskLevel::ALL {
                let n = rows.iter().filter(|r| r.risk_level == level).count();
                info!(level = level.as_str(), count = n, "generated risk distribution");
            }
        }
        Command::Fetch { out: path } => {
            let client = BackendClient::new(&config.backend)
                .ok_or("backend is disabled or has no endpoint configured")?;
            info!(endpoint = client.base_url(), "fetching behavior records");
            let events = client.fetch_events()?;
            if events.is_empty() {
                return Err("no behavior data found".into());
            }
            write_records(&path, &events)?;
        }
        Command::Summary { data } => {
            let events = load_events(&data)?;
            let store = open_store(&config)?;
            let service = RiskService::new(config);
            let scored = if service.load(&store) {
                service.score_batch(&events)?
            } else {
                heuristic_scored(&events, service.engine())
            };
            let summary = DatasetSummary::build(&events, &scored);
            writeln!(out, "{}", serde_json::to_string_pretty(&summary)?)?;
        }
        Command::Status => {
            let store = open_store(&config)?;
            let service = RiskService::new(config);
            service.load(&store);
            StructuredLogger::emit_json(&service.status(), &mut out);
        }
        Command::Reset => {
            let store = open_store(&config)?;
            let service = RiskService::new(config);
            service.reset(&store)?;
            StructuredLogger::emit_json(&service.status(), &mut out);
        }
    }
    Ok(())
}

fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();
    let config = ScorerConfig::load(&cli.config);

    StructuredLogger::init(config.log.json, &config.log.level);

    info!(data_dir = ?config.data_dir, "hospital risk scorer starting");
    run(cli.command, config)
}
