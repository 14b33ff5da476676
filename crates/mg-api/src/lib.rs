mod generator;
mod landscape_mode;
mod request;
mod save;
mod script_mode;

pub use generator::{MapGenerator, MAP_LIBRARY_NAME, MAP_LIBRARY_SOURCE};
pub use landscape_mode::{NO_MAP_MESSAGE, SCRIPT_PATH_MISSING_MESSAGE};
pub use mg_core::{
    GeneratedMap, GenerationResult, LogSink, MapGenError, MaterialMap, Palette, ParameterDef,
    Raster, ScenarioParameters, TextureMap,
};
pub use request::{GenerateRequest, MapType, DEFAULT_MAP_HEIGHT, DEFAULT_MAP_WIDTH};
pub use save::save_raster;
pub use script_mode::{GAME_SCRIPT_NAME, NO_ENTRY_POINT_MESSAGE};
