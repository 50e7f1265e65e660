use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "cuesync-cli", version)]
#[command(about = "Match, check and shift subtitle cues from the command line.")]
pub struct Args {
    /// Directory holding settings.json (defaults to the platform config dir)
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    /// Log level when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Also write logs to a daily rolling file in this directory
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print target/source rows as the editor lays them out
    Match(MatchCmd),
    /// Report cues that fail the timing and text rules
    Check(CheckCmd),
    /// Move cues by a fixed offset
    Shift(ShiftCmd),
    /// Convert between SRT, VTT and JSON track documents
    Convert(ConvertCmd),
    /// Show or change persisted settings
    Settings(SettingsCmd),
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Track input shared by the read-only subcommands
#[derive(Debug, ClapArgs)]
pub struct TrackInput {
    /// Target track (.srt, .vtt or .json)
    pub target: String,

    /// Source track a translation is written against
    #[arg(long)]
    pub source: Option<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, ClapArgs)]
pub struct MatchCmd {
    #[command(flatten)]
    pub input: TrackInput,

    /// Target cue whose row is reported as the editing row
    #[arg(long, default_value_t = 0)]
    pub editing_index: usize,
}

#[derive(Debug, ClapArgs)]
pub struct CheckCmd {
    #[command(flatten)]
    pub input: TrackInput,

    /// Exit with an error when any violation is found
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, ClapArgs)]
pub struct ShiftCmd {
    /// Track to shift
    pub input: String,

    /// Offset in seconds (negative moves earlier)
    #[arg(long, allow_hyphen_values = true)]
    pub by: f64,

    /// Only shift cues up to and including this index
    #[arg(long, conflicts_with = "after")]
    pub before: Option<usize>,

    /// Only shift cues from this index on
    #[arg(long)]
    pub after: Option<usize>,

    /// Write here instead of overwriting the input
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, ClapArgs)]
pub struct ConvertCmd {
    pub input: String,

    /// Output path; the extension picks the format
    pub output: PathBuf,

    /// Allow overwriting the output file
    #[arg(long)]
    pub overwrite: bool,
}

#[derive(Debug, ClapArgs)]
pub struct SettingsCmd {
    #[command(subcommand)]
    pub action: SettingsAction,
}

#[derive(Debug, Subcommand)]
pub enum SettingsAction {
    /// Print the effective settings as JSON
    Show,
    /// Delete the settings file
    Reset,
    /// Update individual values
    Set(SettingsSet),
}

#[derive(Debug, Default, ClapArgs)]
pub struct SettingsSet {
    /// Turn the subtitle specification on or off
    #[arg(long)]
    pub spec_enabled: Option<bool>,
    #[arg(long)]
    pub min_duration_ms: Option<u64>,
    #[arg(long)]
    pub max_duration_ms: Option<u64>,
    #[arg(long)]
    pub max_lines: Option<u32>,
    #[arg(long)]
    pub max_chars_per_line: Option<u32>,
    /// Allow neighbouring cues to overlap
    #[arg(long)]
    pub overlap: Option<bool>,
    #[arg(long)]
    pub default_step_ms: Option<u64>,
    #[arg(long)]
    pub min_duration_floor_ms: Option<u64>,
    #[arg(long)]
    pub max_history: Option<usize>,
}
