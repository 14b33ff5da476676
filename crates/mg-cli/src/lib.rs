use std::ffi::OsString;

use clap::Parser;
use mg_core::MapGenError;
use tracing_subscriber::EnvFilter;

mod cli_args;
mod config_files;
mod error_map;
mod render;
mod watch;

pub(crate) use cli_args::{Cli, Mode, RenderArgs};
pub(crate) use config_files::{load_materials, load_parameter_defs, load_scenario};
pub(crate) use error_map::{
    emit_error, map_cli_input_read, map_cli_materials_invalid, map_cli_materials_read,
    map_cli_scenario_invalid, map_cli_scenario_read, map_cli_watch,
};
pub(crate) use watch::watch_input;

/// Logs go to stderr so stdout stays machine readable. `RUST_LOG` overrides
/// the default `warn` level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

fn run(cli: Cli) -> Result<i32, MapGenError> {
    match cli.command {
        Mode::Render(args) => render::run_render(args),
    }
}

#[cfg(test)]
pub(crate) mod cli_test_support {
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::time::{SystemTime, UNIX_EPOCH};

    pub(crate) fn temp_path(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time should be monotonic")
            .as_nanos();
        std::env::temp_dir().join(format!("mapgen-rs-{}-{}", nanos, name))
    }

    pub(crate) fn write_file(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("parent dir should be creatable");
        }
        fs::write(path, content).expect("file should be writable");
    }
}

#[cfg(test)]
mod lib_tests {
    use super::*;

    #[test]
    fn run_cli_from_args_rejects_unknown_subcommand() {
        assert_ne!(run_cli_from_args(["mapgen", "explode"]), 0);
    }

    #[test]
    fn run_cli_from_args_reports_missing_input() {
        let missing = cli_test_support::temp_path("missing.c");
        let code = run_cli_from_args([
            "mapgen".to_string(),
            "render".to_string(),
            missing.to_string_lossy().to_string(),
            "out.png".to_string(),
        ]);
        assert_eq!(code, 1);
    }
}
