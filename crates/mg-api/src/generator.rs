use mg_core::{
    GenerationResult, LandscapeConfig, LogSink, MapGenError, MaterialResolver, ScenarioParameters,
};
use mg_runtime::{ArchiveOpener, FsArchiveOpener, ScriptRuntime};
use tracing::{debug, warn};

use crate::request::{GenerateRequest, MapType};

pub const MAP_LIBRARY_NAME: &str = "MapLibrary.c";
pub const MAP_LIBRARY_SOURCE: &str = include_str!("library/MapLibrary.c");

/// Player count both backends render for.
pub(crate) const RENDER_PLAYER_COUNT: u32 = 1;

/// Runs generation requests one at a time against a single script runtime.
pub struct MapGenerator {
    pub(crate) runtime: ScriptRuntime,
    pub(crate) sink: LogSink,
    pub(crate) archives: Box<dyn ArchiveOpener>,
    pub(crate) default_scenario: Option<ScenarioParameters>,
}

impl Default for MapGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl MapGenerator {
    /// Generator with the bundled map library registered as a system script.
    pub fn new() -> Self {
        let mut generator = Self::bare();
        generator
            .runtime
            .register_script(MAP_LIBRARY_NAME, MAP_LIBRARY_SOURCE);
        generator
    }

    /// Generator without any system script.
    pub fn bare() -> Self {
        let sink = LogSink::new();
        Self {
            runtime: ScriptRuntime::new(sink.clone()),
            sink,
            archives: Box::new(FsArchiveOpener),
            default_scenario: None,
        }
    }

    pub fn with_archive_opener(mut self, archives: Box<dyn ArchiveOpener>) -> Self {
        self.archives = archives;
        self
    }

    pub fn runtime(&self) -> &ScriptRuntime {
        &self.runtime
    }

    pub fn runtime_mut(&mut self) -> &mut ScriptRuntime {
        &mut self.runtime
    }

    pub fn log(&self) -> &LogSink {
        &self.sink
    }

    /// Runs one request to completion. Every failure is reported in the
    /// returned result.
    pub fn generate(&mut self, request: &GenerateRequest) -> GenerationResult {
        let config = LandscapeConfig::fixed(request.width, request.height);
        let resolver = MaterialResolver::new(&request.materials, &request.textures);
        self.runtime
            .set_startup_player_count(request.startup_players);
        self.runtime.set_startup_team_count(request.startup_teams);
        debug!(
            map_type = request.map_type.name(),
            filename = %request.filename,
            width = request.width,
            height = request.height,
            "generating map"
        );

        let outcome = match request.map_type {
            MapType::Script => self.generate_from_script(request, &config, &resolver),
            MapType::Landscape => self.generate_from_landscape(request, &config, &resolver),
        };
        if let Err(error) = &outcome {
            warn!(code = %error.code, "map generation failed: {}", error.message);
        }
        GenerationResult::from_outcome(outcome)
    }

    /// Fails with the first buffered diagnostic, if any.
    pub(crate) fn check_log(&self, code: &str) -> Result<(), MapGenError> {
        match self.sink.first_message() {
            Some(message) => Err(MapGenError::new(code, message)),
            None => Ok(()),
        }
    }

    /// Like `check_log`, but tolerates a single diagnostic.
    pub(crate) fn check_link_log(&self) -> Result<(), MapGenError> {
        if self.sink.count() > 1 {
            return self.check_log("SCRIPT_LINK");
        }
        Ok(())
    }
}
