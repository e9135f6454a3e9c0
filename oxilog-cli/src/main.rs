//! OxiLog CLI - reference-based log compression.
//!
//! Compresses newline-separated log files by delta-encoding each line
//! against a sliding window of recent lines, then wrapping the encoded
//! stream in a general-purpose byte compressor.

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use oxilog_codec::pipeline::{CodecConfig, compress, decompress};
use oxilog_codec::distance::DistanceKind;
use oxilog_core::compressor::Compressor;
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "oxilog")]
#[command(author, version, about = "Reference-based log compression")]
#[command(long_about = "
OxiLog compresses newline-separated log files by expressing each line as
edits against a similar recent line, then running the encoded stream
through a general-purpose byte compressor.

Examples:
  oxilog compress app.log app.oxl
  oxilog compress app.log app.oxl --compressor zstd --distance cosine
  oxilog compress app.log app.oxl --exact --threshold 0.1
  oxilog decompress app.oxl app.log
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a log file
    #[command(alias = "c")]
    Compress {
        /// Input log file
        input: PathBuf,

        /// Output compressed file
        output: PathBuf,

        /// Sliding window size in lines
        #[arg(short, long, default_value_t = 8)]
        window_size: u16,

        /// Distance cutoff in [0, 1] for accepting a reference
        #[arg(short, long, default_value_t = 0.06)]
        threshold: f64,

        /// Maximum records per block
        #[arg(short, long, default_value_t = 32_768)]
        block_size: usize,

        /// Byte compressor applied to the whole file
        #[arg(short, long, value_enum, default_value = "lzma")]
        compressor: CompressorArg,

        /// Similarity measure used to pick references
        #[arg(short, long, value_enum, default_value = "minhash")]
        distance: DistanceArg,

        /// Use the exact substitution aligner instead of the
        /// approximate q-gram aligner
        #[arg(long)]
        exact: bool,

        /// Q-gram length
        #[arg(short, long, default_value_t = 3)]
        q: usize,
    },

    /// Decompress a previously compressed file
    #[command(alias = "d")]
    Decompress {
        /// Input compressed file
        input: PathBuf,

        /// Output log file
        output: PathBuf,
    },

    /// Generate shell completion scripts
    #[command(hide = true)]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Byte compressor (for clap ValueEnum).
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CompressorArg {
    /// No byte-level compression
    None,
    /// XZ container around LZMA2
    Lzma,
    /// GZIP
    Gzip,
    /// Zstandard
    Zstd,
    /// LZ4 frame
    Lz4,
    /// Bzip2
    Bz2,
}

impl From<CompressorArg> for Compressor {
    fn from(arg: CompressorArg) -> Self {
        match arg {
            CompressorArg::None => Compressor::None,
            CompressorArg::Lzma => Compressor::Lzma,
            CompressorArg::Gzip => Compressor::Gzip,
            CompressorArg::Zstd => Compressor::Zstd,
            CompressorArg::Lz4 => Compressor::Lz4,
            CompressorArg::Bz2 => Compressor::Bzip2,
        }
    }
}

/// Similarity measure (for clap ValueEnum).
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DistanceArg {
    /// Cosine distance over q-gram count vectors
    Cosine,
    /// MinHash estimate of Jaccard distance
    Minhash,
    /// Normalized q-gram aligner cost
    Qgram,
}

impl From<DistanceArg> for DistanceKind {
    fn from(arg: DistanceArg) -> Self {
        match arg {
            DistanceArg::Cosine => DistanceKind::Cosine,
            DistanceArg::Minhash => DistanceKind::Minhash,
            DistanceArg::Qgram => DistanceKind::Qgram,
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Compress {
            input,
            output,
            window_size,
            threshold,
            block_size,
            compressor,
            distance,
            exact,
            q,
        } => {
            let config = CodecConfig {
                window_size,
                threshold,
                block_size,
                compressor: compressor.into(),
                distance: distance.into(),
                use_approx: !exact,
                q,
            };
            compress(&input, &output, &config)
                .map(|elapsed| println!("Compressed in {:.3} seconds", elapsed.as_secs_f64()))
        }
        Commands::Decompress { input, output } => decompress(&input, &output)
            .map(|elapsed| println!("Decompressed in {:.3} seconds", elapsed.as_secs_f64())),
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "oxilog", &mut io::stdout());
            return;
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
