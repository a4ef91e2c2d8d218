use clap::Parser;
use std::path::PathBuf;

/// A tilting blur card, drawn in the terminal.
///
/// Drag the card to tilt it, click it to make it bounce.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(version, about)]
pub struct Args {
    /// Directory holding Mojave, noise and texture images and the SpaceGrotesk fonts
    #[arg(long, default_value = "assets")]
    pub assets: PathBuf,

    /// Render one frame to this PNG file instead of running interactively
    #[arg(long, value_name = "PATH")]
    pub snapshot: Option<PathBuf>,

    /// Snapshot width in pixels
    #[arg(long, default_value_t = 600)]
    pub width: u32,

    /// Snapshot height in pixels
    #[arg(long, default_value_t = 800)]
    pub height: u32,

    /// Snapshot rotation about the vertical axis, in degrees
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub rotate_x: f64,

    /// Snapshot rotation about the Z axis, in degrees
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub rotate_y: f64,

    /// Snapshot scale
    #[arg(long, default_value_t = 1.0)]
    pub scale: f64,

    /// Start with the status line visible
    #[arg(short, long)]
    pub debug: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Log filter in env_logger syntax, overrides RUST_LOG
    #[arg(long, value_name = "FILTER")]
    pub log_filter: Option<String>,
}
