use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use corpus_prep::{
    aggregate_directory, ctm_to_textgrids, locate_ctm, write_utterances_json, AlignmentInputs,
    BatchConfig, BatchPolicy, EmptyTranscriptPolicy, NormalizeConfig, SourceFormat,
};

#[derive(Parser)]
#[command(name = "corpus-prep")]
#[command(author, version, about = "Speech corpus annotation converters", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by the annotation-to-JSON commands
#[derive(clap::Args)]
struct BatchArgs {
    /// Directory searched recursively for annotation files
    #[arg(short, long)]
    input_dir: PathBuf,

    /// Output JSON file (defaults to <input-dir>/<input-dir name>.json)
    #[arg(short = 'j', long)]
    output_json: Option<PathBuf>,

    /// What to do when a single file fails to convert
    #[arg(long, value_enum, default_value_t = BatchPolicy::Abort)]
    on_error: BatchPolicy,

    /// Drop utterances whose transcript is empty
    #[arg(long)]
    drop_empty: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert Transcriber (.trs) files into an utterance JSON list
    TrsToJson {
        #[command(flatten)]
        batch: BatchArgs,
    },

    /// Convert one tier of ELAN (.eaf) files into an utterance JSON list
    ElanToJson {
        #[command(flatten)]
        batch: BatchArgs,

        /// Tier holding the target language transcription
        #[arg(short, long, default_value = "Phrase")]
        tier: String,
    },

    /// Convert a Kaldi CTM alignment into Praat TextGrid files
    CtmToTextgrid {
        /// CTM file (searched for beside wav.scp when omitted)
        #[arg(long)]
        ctm: Option<PathBuf>,

        /// wav.scp file mapping utterance ids to audio paths
        #[arg(long)]
        wav: PathBuf,

        /// Segment to utterance mapping
        #[arg(long, default_value = "./segments")]
        seg: PathBuf,

        /// Directory for the TextGrid output
        #[arg(short, long = "output-dir", visible_alias = "outdir", default_value = ".")]
        output_dir: PathBuf,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::TrsToJson { batch } => {
            setup_logging(batch.verbose);
            convert_directory(batch, SourceFormat::Transcriber)
        }
        Commands::ElanToJson { batch, tier } => {
            setup_logging(batch.verbose);
            convert_directory(batch, SourceFormat::Elan { tier })
        }
        Commands::CtmToTextgrid {
            ctm,
            wav,
            seg,
            output_dir,
            verbose,
        } => {
            setup_logging(verbose);
            convert_alignment(ctm, wav, seg, output_dir)
        }
    }
}

/// `RUST_LOG` wins over the verbosity flag when set
fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn default_output_json(input_dir: &Path) -> PathBuf {
    let name = input_dir
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "utterances".to_string());
    input_dir.join(format!("{}.json", name))
}

fn convert_directory(args: BatchArgs, source: SourceFormat) -> Result<()> {
    let output = args
        .output_json
        .unwrap_or_else(|| default_output_json(&args.input_dir));

    let config = BatchConfig {
        policy: args.on_error,
        normalize: NormalizeConfig {
            empty_transcripts: if args.drop_empty {
                EmptyTranscriptPolicy::Discard
            } else {
                EmptyTranscriptPolicy::Retain
            },
        },
    };

    info!("Reading {:?} files from {:?}", source.patterns(), args.input_dir);
    let report = aggregate_directory(&args.input_dir, &source, &config)
        .context("Failed to convert annotation files")?;

    write_utterances_json(&report.utterances, &output).context("Failed to write output")?;
    info!(
        "Wrote {} utterances from {} files to {:?}",
        report.utterances.len(),
        report.files_processed,
        output
    );

    if !report.failures.is_empty() {
        info!("{} files were skipped:", report.failures.len());
        for failure in &report.failures {
            info!("  {:?}: {}", failure.path, failure.error);
        }
    }

    Ok(())
}

fn convert_alignment(
    ctm: Option<PathBuf>,
    wav: PathBuf,
    seg: PathBuf,
    output_dir: PathBuf,
) -> Result<()> {
    let ctm = match ctm {
        Some(path) => path,
        None => {
            let dir = wav.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
            locate_ctm(dir).context("No CTM file given and none found beside wav.scp")?
        }
    };
    info!("Converting {:?} to TextGrids", ctm);

    let inputs = AlignmentInputs {
        ctm,
        wav_scp: wav,
        segments: seg,
    };
    ctm_to_textgrids(&inputs, &output_dir).context("Failed to convert CTM")?;

    Ok(())
}
