//! mp4mux CLI
//!
//! Command-line frontend for the mp4mux control layer.
//!
//! # Commands
//!
//! - `mux` - Configure a muxer session from elementary streams and run it
//! - `version` - Show version information

mod commands;
mod input_spec;

use clap::{Parser, Subcommand};
use commands::mux::MuxArgs;
use tracing_subscriber::EnvFilter;

const EXAMPLES: &str = "
EXAMPLES:
    To create an audio-only .mp4 file with EC-3 audio:
        mp4mux mux -o output.mp4 -i audio.ec3 --mpeg4-comp-brand mp42,iso6,isom,msdh,dby1

    To multiplex AC-4 audio and H.264 video:
        mp4mux mux -o output.mp4 -i audio.ac4 -i video.h264

    To multiplex a Dolby Vision BL+EL+RPU stream with an EC-3 audio track,
    setting frame rate, track language and name:
        mp4mux mux -i ves_bl_el_rpu.265,fr=24000/1001 \\
            -i \"audio.ec3,lang=rus,name='Dub, Blu-ray'\" \\
            -o output.mp4 --dv-profile 8 --dv-bl-compatible-id 2 --overwrite

    To multiplex a Dolby Vision profile 8.4 stream with 'hvc1' sample entries:
        mp4mux mux -i ves_8.4.265 -o output.mp4 --hvc1flag 0 \\
            --dv-profile 8 --dv-bl-compatible-id 4 --overwrite
";

/// mp4mux command-line frontend.
#[derive(Parser)]
#[command(name = "mp4mux")]
#[command(author, version, about, long_about = None)]
#[command(after_help = EXAMPLES)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure a muxer session from elementary streams and run it
    Mux(MuxArgs),

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Mux(args) => commands::mux::run(&args)?,
        Commands::Version => {
            println!("mp4mux CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("mp4mux Core v{}", mp4mux_core::VERSION);
        }
    }

    Ok(())
}
