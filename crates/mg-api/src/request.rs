use std::path::{Path, PathBuf};

use mg_core::{MaterialMap, ScenarioParameters, TextureMap};

pub const DEFAULT_MAP_WIDTH: u32 = 200;
pub const DEFAULT_MAP_HEIGHT: u32 = 200;

/// Which description language a request carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapType {
    Script,
    Landscape,
}

impl MapType {
    /// Guesses the language from the file extension: `.c` is a map script,
    /// `.txt` a landscape description.
    pub fn detect(filename: &str) -> Option<Self> {
        let extension = Path::new(filename)
            .extension()?
            .to_string_lossy()
            .to_ascii_lowercase();
        match extension.as_str() {
            "c" => Some(Self::Script),
            "txt" => Some(Self::Landscape),
            _ => None,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "script" => Some(Self::Script),
            "landscape" => Some(Self::Landscape),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Landscape => "landscape",
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub map_type: MapType,
    pub source: String,
    pub filename: String,
    /// On-disk location of the game script used by `algo=script` overlays.
    pub script_path: Option<PathBuf>,
    pub scenario: Option<ScenarioParameters>,
    pub materials: MaterialMap,
    pub textures: TextureMap,
    pub width: u32,
    pub height: u32,
    pub startup_players: u32,
    pub startup_teams: u32,
}

impl GenerateRequest {
    pub fn new(map_type: MapType, source: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            map_type,
            source: source.into(),
            filename: filename.into(),
            script_path: None,
            scenario: None,
            materials: MaterialMap::new(),
            textures: TextureMap::new(),
            width: DEFAULT_MAP_WIDTH,
            height: DEFAULT_MAP_HEIGHT,
            startup_players: 1,
            startup_teams: 1,
        }
    }

    pub fn with_script_path(mut self, script_path: impl Into<PathBuf>) -> Self {
        self.script_path = Some(script_path.into());
        self
    }

    pub fn with_scenario(mut self, scenario: ScenarioParameters) -> Self {
        self.scenario = Some(scenario);
        self
    }

    pub fn with_materials(mut self, materials: MaterialMap, textures: TextureMap) -> Self {
        self.materials = materials;
        self.textures = textures;
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_startup_counts(mut self, players: u32, teams: u32) -> Self {
        self.startup_players = players;
        self.startup_teams = teams;
        self
    }
}
