use mg_core::{GeneratedMap, LandscapeConfig, MapGenError, MaterialResolver, ScenarioParameters};
use mg_runtime::ScriptHost;
use tracing::debug;

use crate::generator::{MapGenerator, RENDER_PLAYER_COUNT};
use crate::request::GenerateRequest;

/// Name of the empty game script loaded next to a map script.
pub const GAME_SCRIPT_NAME: &str = "Script.c";

pub const NO_ENTRY_POINT_MESSAGE: &str =
    "No InitializeMap() function present in the script, or it returns false";

impl MapGenerator {
    pub(crate) fn generate_from_script(
        &mut self,
        request: &GenerateRequest,
        config: &LandscapeConfig,
        resolver: &MaterialResolver,
    ) -> Result<GeneratedMap, MapGenError> {
        debug!(filename = %request.filename, "script mode");
        self.runtime.initialize();

        let scenario = match &request.scenario {
            Some(scenario) => scenario,
            None => self
                .default_scenario
                .get_or_insert_with(ScenarioParameters::new),
        };
        scenario.register_script_constants(&mut self.runtime);

        self.sink.clear();
        self.runtime
            .load_host(ScriptHost::Map, &request.filename, &request.source)?;
        self.check_log("SCRIPT_PARSE")?;

        self.runtime.load_host(ScriptHost::Game, GAME_SCRIPT_NAME, "")?;

        self.sink.clear();
        self.runtime.link()?;
        self.check_link_log()?;

        self.sink.clear();
        let outcome = self
            .runtime
            .call_entry_point(config, resolver, RENDER_PLAYER_COUNT)?;
        self.check_log("SCRIPT_RUNTIME")?;
        if !outcome.returned {
            return Err(MapGenError::new(
                "SCRIPT_NO_ENTRY_POINT",
                NO_ENTRY_POINT_MESSAGE,
            ));
        }

        Ok(
            GeneratedMap::from_rasters(Some(outcome.foreground), Some(outcome.background))?
                .with_script_output(self.runtime.take_script_output()),
        )
    }
}
