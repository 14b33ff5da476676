use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "mapgen")]
#[command(about = "Render landscape descriptions and map scripts to images")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    Render(RenderArgs),
}

#[derive(Debug, Args)]
pub(crate) struct RenderArgs {
    /// Map script (`.c`) or landscape description (`.txt`).
    pub(crate) input: PathBuf,
    /// Image file for the foreground raster.
    pub(crate) output: PathBuf,
    #[arg(long = "width", default_value_t = mg_api::DEFAULT_MAP_WIDTH)]
    pub(crate) width: u32,
    #[arg(long = "height", default_value_t = mg_api::DEFAULT_MAP_HEIGHT)]
    pub(crate) height: u32,
    #[arg(long = "players", default_value_t = 1)]
    pub(crate) players: u32,
    #[arg(long = "teams", default_value_t = 1)]
    pub(crate) teams: u32,
    /// Directory whose `*.c` files are loaded as system scripts. Also where
    /// `ParameterDefs.txt` is looked up; defaults to the input's directory.
    #[arg(long = "root")]
    pub(crate) root: Option<PathBuf>,
    /// Game script for `algo=script` overlays. Defaults to `Script.c` next to the input.
    #[arg(long = "script-path")]
    pub(crate) script_path: Option<PathBuf>,
    #[arg(long = "materials")]
    pub(crate) materials: Option<PathBuf>,
    #[arg(long = "scenario")]
    pub(crate) scenario: Option<PathBuf>,
    /// `script` or `landscape`; detected from the input extension when omitted.
    #[arg(long = "map-type")]
    pub(crate) map_type: Option<String>,
    #[arg(long = "bg-out")]
    pub(crate) bg_out: Option<PathBuf>,
    /// Render again whenever the input file changes.
    #[arg(long = "watch")]
    pub(crate) watch: bool,
}
