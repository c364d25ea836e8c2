//! Spatial-interaction study CLI.
//!
//! Commands:
//! - generate: Write a randomized, counter-balanced trial sequence document
//! - send: Transmit one block to the device as a UDP datagram
//! - listen: Collect telemetry datagrams into the append-only log
//! - analyze: Summarize completed trials per method

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rand::Rng;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use reposition_study::analyzer;
use reposition_study::dispatch::{self, SessionMode};
use reposition_study::listener::{self, ListenerConfig};
use trial_sequence::config::StudyConfig;
use trial_sequence::generator::SequenceGenerator;
use trial_sequence::sequence::SequenceDocument;

#[derive(Parser)]
#[command(name = "reposition-study")]
#[command(version)]
#[command(about = "Trial sequences, dispatch and telemetry for the reposition study")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a randomized trial sequence document
    Generate {
        /// Study variant
        #[arg(long, default_value = "adaptive-depth")]
        variant: String,

        /// Override the preset's participant count
        #[arg(long)]
        participants: Option<usize>,

        /// Random seed (omit for a fresh one)
        #[arg(long)]
        seed: Option<u64>,

        /// Output file
        #[arg(long, default_value = "sequence.json")]
        output: PathBuf,

        /// Pretty-print the document
        #[arg(long)]
        pretty: bool,
    },

    /// Send one block to the device as a UDP datagram
    Send {
        /// Participant ID
        #[arg(long)]
        id: usize,

        /// Block index within the participant's sequence
        #[arg(long)]
        block: usize,

        /// Session mode: t (test) or p (practice)
        #[arg(long, default_value = "t")]
        mode: String,

        /// Sequence file to read
        #[arg(long, default_value = "sequence.json")]
        sequence: PathBuf,

        /// Device address
        #[arg(long, default_value = "192.168.0.192:3003")]
        addr: SocketAddr,
    },

    /// Collect telemetry datagrams into the append-only log
    Listen {
        /// UDP port to bind
        #[arg(long, default_value = "3005")]
        port: u16,

        /// Log file to append to
        #[arg(long, default_value = "log.tsv")]
        log: PathBuf,
    },

    /// Summarize completed trials from the collected log
    Analyze {
        /// Log file to read
        #[arg(long, default_value = "log.tsv")]
        log: PathBuf,

        /// Event type marking a completed trial
        #[arg(long, default_value = analyzer::DEFAULT_SENTINEL)]
        sentinel: String,

        /// Restrict to one participant
        #[arg(long)]
        participant: Option<u32>,

        /// Optional JSON report path
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .init();

    match cli.command {
        Commands::Generate {
            variant,
            participants,
            seed,
            output,
            pretty,
        } => {
            let mut config = parse_variant(&variant)?;
            if let Some(participants) = participants {
                config.participants = participants;
            }
            let seed = seed.unwrap_or_else(|| rand::rng().random());

            info!(variant = %variant, seed = seed, "Generating sequence");
            let mut generator = SequenceGenerator::new(config, seed);
            let document = generator.generate()?;
            document.save(&output, pretty)?;

            let config = generator.config();
            println!("Sequence written to: {}", output.display());
            println!("Participants: {}", config.participants);
            println!("Blocks per participant: {}", config.methods.len());
            println!("Trials per block: {}", config.trials_per_block());
            println!("Seed: {}", seed);
        }

        Commands::Send {
            id,
            block,
            mode,
            sequence,
            addr,
        } => {
            let mode = parse_mode(&mode)?;
            let document = SequenceDocument::load(&sequence)?;

            let blocks = match document.blocks(id) {
                Some(blocks) => blocks,
                None => anyhow::bail!(
                    "valid ID: 0 <= ID <= {}, current ID: {}",
                    document.participant_count().saturating_sub(1),
                    id
                ),
            };
            let selected = match blocks.get(block) {
                Some(selected) => selected,
                None => anyhow::bail!(
                    "valid BLOCK: 0 <= BLOCK <= {}, current BLOCK: {}",
                    blocks.len().saturating_sub(1),
                    block
                ),
            };

            let payload = dispatch::block_payload(selected, id, mode)?;
            let bytes = dispatch::send_datagram(&payload, addr).await?;
            info!(bytes = bytes, addr = %addr, "Datagram sent");

            println!("ID: {} / BLOCK: {} / METHOD: {}", id, block, selected.method);
            println!("{}", mode.describe());
        }

        Commands::Listen { port, log } => {
            listener::run(ListenerConfig { port, log_path: log }).await?;
        }

        Commands::Analyze {
            log,
            sentinel,
            participant,
            output,
        } => {
            let events = analyzer::read_log(&log)?;
            let report = analyzer::analyze(&events, &sentinel, participant);

            for summary in &report.methods {
                println!(
                    "{}, trials: {} / time: {:.3} / dist: {:.3}",
                    summary.method, summary.trials, summary.avg_time, summary.avg_dist
                );
            }

            if let Some(path) = output {
                report.save(&path)?;
                println!("Report written to: {}", path.display());
            }
        }
    }

    Ok(())
}

fn parse_variant(s: &str) -> Result<StudyConfig> {
    match s.to_lowercase().as_str() {
        "adaptive-depth" | "adaptive_depth" | "adaptive" => Ok(StudyConfig::adaptive_depth()),
        "distance-band" | "distance_band" | "bands" => Ok(StudyConfig::distance_band()),
        "wall-comparison" | "wall_comparison" | "wall" => Ok(StudyConfig::wall_comparison()),
        _ => anyhow::bail!(
            "Unknown variant: {}. Valid: adaptive-depth, distance-band, wall-comparison",
            s
        ),
    }
}

fn parse_mode(s: &str) -> Result<SessionMode> {
    match s.to_lowercase().as_str() {
        "t" | "test" => Ok(SessionMode::Test),
        "p" | "practice" => Ok(SessionMode::Practice),
        _ => anyhow::bail!("Unknown mode: {}. Valid: t (test), p (practice)", s),
    }
}
