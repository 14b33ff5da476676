use std::collections::BTreeSet;
use std::path::Path;

use mg_core::{GeneratedMap, LandscapeConfig, LogSink, MapGenError, MaterialResolver};
use mg_landscape::{render, ScriptAlgorithmHost};
use mg_parser::parse_landscape;
use mg_runtime::{ScriptHost, ScriptRuntime};
use tracing::debug;

use crate::generator::{MapGenerator, RENDER_PLAYER_COUNT};
use crate::request::GenerateRequest;

pub const NO_MAP_MESSAGE: &str = "No map definition in source file";
pub const SCRIPT_PATH_MISSING_MESSAGE: &str =
    "For algo=script overlays to work, save the file first at the location of the Script.c file";

/// Answers `ScriptAlgo*` calls from the linked game script. A function that
/// fails once is reported once and treated as unset afterwards.
struct RuntimeAlgorithmHost<'a> {
    runtime: &'a mut ScriptRuntime,
    sink: LogSink,
    failed: BTreeSet<String>,
}

impl ScriptAlgorithmHost for RuntimeAlgorithmHost<'_> {
    fn evaluate(&mut self, function: &str, x: i64, y: i64) -> bool {
        if self.failed.contains(function) {
            return false;
        }
        match self.runtime.call_algorithm(function, x, y) {
            Ok(hit) => hit,
            Err(error) => {
                self.sink.push(error.message);
                self.failed.insert(function.to_string());
                false
            }
        }
    }
}

fn split_script_path(script_path: &Path) -> Result<(&Path, String), MapGenError> {
    let filename = script_path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .ok_or_else(|| {
            MapGenError::new(
                "SCRIPT_PATH_MISSING",
                format!("Script path '{}' has no file name", script_path.display()),
            )
        })?;
    let directory = match script_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    Ok((directory, filename))
}

impl MapGenerator {
    pub(crate) fn generate_from_landscape(
        &mut self,
        request: &GenerateRequest,
        config: &LandscapeConfig,
        resolver: &MaterialResolver,
    ) -> Result<GeneratedMap, MapGenError> {
        let document = parse_landscape(&request.source, &request.filename)?;
        let map = document
            .root_map()
            .ok_or_else(|| MapGenError::new("LANDSCAPE_NO_MAP", NO_MAP_MESSAGE))?;

        let uses_script = map.has_script_overlay();
        debug!(filename = %request.filename, uses_script, "landscape mode");
        if uses_script {
            self.load_overlay_script(request)?;
        }

        self.sink.clear();
        let (foreground, background) = if uses_script {
            let mut host = RuntimeAlgorithmHost {
                runtime: &mut self.runtime,
                sink: self.sink.clone(),
                failed: BTreeSet::new(),
            };
            render(
                map,
                config,
                resolver,
                RENDER_PLAYER_COUNT,
                Some(&mut host),
                &self.sink,
            )
        } else {
            render(map, config, resolver, RENDER_PLAYER_COUNT, None, &self.sink)
        };
        self.check_log("LANDSCAPE_RENDER")?;

        let script_output = if uses_script {
            self.runtime.take_script_output()
        } else {
            Vec::new()
        };
        Ok(GeneratedMap::from_rasters(Some(foreground), Some(background))?
            .with_script_output(script_output))
    }

    /// Loads the game script that sits next to the landscape file and links it.
    fn load_overlay_script(&mut self, request: &GenerateRequest) -> Result<(), MapGenError> {
        let script_path = request
            .script_path
            .as_deref()
            .ok_or_else(|| MapGenError::new("SCRIPT_PATH_MISSING", SCRIPT_PATH_MISSING_MESSAGE))?;

        self.runtime.initialize();

        let (directory, filename) = split_script_path(script_path)?;
        let archive = self.archives.open(directory)?;
        if archive.find_entries(&filename)?.is_empty() {
            return Err(MapGenError::new(
                "ARCHIVE_ENTRY_MISSING",
                format!("Failed to load '{}': No such file", script_path.display()),
            ));
        }
        let source = archive.read_entry_as_text(&filename)?;

        self.sink.clear();
        self.runtime.load_host(ScriptHost::Game, &filename, &source)?;
        self.check_log("SCRIPT_PARSE")?;

        self.sink.clear();
        self.runtime.link()?;
        self.check_link_log()
    }
}
