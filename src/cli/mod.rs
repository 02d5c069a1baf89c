//! CLI Module
//!
//! Command-line interface for running dissect sessions over WAV files.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Dissect - band solo, spectrum view and looping for a media track
#[derive(Parser, Debug)]
#[command(name = "dissect")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the frequency bands
    #[command(name = "bands")]
    Bands,

    /// Render a file with one band soloed
    #[command(name = "solo")]
    Solo {
        /// Input WAV file
        #[arg(short, long)]
        input: PathBuf,

        /// Band id (low, low-mid, mid, high-mid, high) or "none"
        #[arg(short, long)]
        band: String,

        /// Output WAV file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Show the spectrum at a point in the file
    #[command(name = "spectrum")]
    Spectrum {
        /// Input WAV file
        #[arg(short, long)]
        input: PathBuf,

        /// Playback position in seconds
        #[arg(short, long)]
        at: f64,

        /// Canvas width in pixels
        #[arg(long)]
        width: Option<u32>,

        /// Canvas height in pixels
        #[arg(long)]
        height: Option<u32>,

        /// Write the rendered canvas as a PPM image
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Loop a time range and report each jump back
    #[command(name = "loop")]
    Loop {
        /// Input WAV file
        #[arg(short, long)]
        input: PathBuf,

        /// Loop start in seconds
        #[arg(short, long)]
        start: f64,

        /// Loop end in seconds
        #[arg(short, long)]
        end: f64,

        /// How long to play, in seconds
        #[arg(short, long)]
        run: f64,

        /// Write the rendered audio to a WAV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run a script of JSON messages against a session
    #[command(name = "session")]
    Session {
        /// Input WAV file
        #[arg(short, long)]
        input: PathBuf,

        /// Script with one JSON request per line
        #[arg(short, long)]
        script: PathBuf,
    },
}
