use std::fs;
use std::path::{Path, PathBuf};

use mg_api::{save_raster, GenerateRequest, GeneratedMap, MapGenerator, MapType, Palette};
use mg_core::{MapGenError, MaterialMap, ScenarioParameters, TextureMap};
use mg_runtime::DirectoryArchive;
use tracing::debug;

use crate::{
    load_materials, load_parameter_defs, load_scenario, map_cli_input_read, watch_input,
    RenderArgs,
};

pub(crate) const DEFAULT_SCRIPT_NAME: &str = "Script.c";

pub(crate) fn resolve_map_type(args: &RenderArgs) -> Result<MapType, MapGenError> {
    if let Some(name) = &args.map_type {
        return MapType::from_name(name).ok_or_else(|| {
            MapGenError::new(
                "CLI_MAP_TYPE_INVALID",
                format!("Unknown map type '{}', expected script or landscape", name),
            )
        });
    }
    let filename = args.input.to_string_lossy();
    MapType::detect(&filename).ok_or_else(|| {
        MapGenError::new(
            "CLI_MAP_TYPE_UNKNOWN",
            format!(
                "Cannot tell the map type of '{}', pass --map-type",
                args.input.display()
            ),
        )
    })
}

fn input_dir(args: &RenderArgs) -> &Path {
    match args.input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// `--root` if given, else the input's directory.
pub(crate) fn base_path(args: &RenderArgs) -> &Path {
    args.root.as_deref().unwrap_or_else(|| input_dir(args))
}

/// Explicit `--script-path`, else `Script.c` beside the input if it exists.
pub(crate) fn resolve_script_path(args: &RenderArgs) -> Option<PathBuf> {
    if let Some(path) = &args.script_path {
        return Some(path.clone());
    }
    let sibling = input_dir(args).join(DEFAULT_SCRIPT_NAME);
    sibling.is_file().then_some(sibling)
}

/// Everything `render` resolves once and reuses for every render of the
/// same input.
pub(crate) struct RenderSession {
    args: RenderArgs,
    map_type: MapType,
    materials: MaterialMap,
    textures: TextureMap,
    scenario: Option<ScenarioParameters>,
    generator: MapGenerator,
}

impl RenderSession {
    pub(crate) fn open(args: RenderArgs) -> Result<Self, MapGenError> {
        let map_type = resolve_map_type(&args)?;
        let (materials, textures) = match &args.materials {
            Some(path) => load_materials(path)?,
            None => (MaterialMap::new(), TextureMap::new()),
        };
        let scenario = match &args.scenario {
            Some(path) => Some(load_scenario(path)?),
            None => load_parameter_defs(base_path(&args)),
        };

        let mut generator = MapGenerator::new();
        if let Some(root) = &args.root {
            let archive = DirectoryArchive::open(root)?;
            let count = generator
                .runtime_mut()
                .load_system_scripts_from_archive(&archive)?;
            debug!(root = %root.display(), count, "system scripts loaded");
        }

        Ok(Self {
            args,
            map_type,
            materials,
            textures,
            scenario,
            generator,
        })
    }

    pub(crate) fn input(&self) -> &Path {
        &self.args.input
    }

    pub(crate) fn generator(&self) -> &MapGenerator {
        &self.generator
    }

    fn request(&self, source: String) -> GenerateRequest {
        let filename = self
            .args
            .input
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.args.input.display().to_string());
        let mut request = GenerateRequest::new(self.map_type, source, filename)
            .with_size(self.args.width, self.args.height)
            .with_startup_counts(self.args.players, self.args.teams)
            .with_materials(self.materials.clone(), self.textures.clone());
        if let Some(scenario) = &self.scenario {
            request = request.with_scenario(scenario.clone());
        }
        if let Some(path) = resolve_script_path(&self.args) {
            request = request.with_script_path(path);
        }
        request
    }

    /// Reads the input, generates and writes the images.
    pub(crate) fn render(&mut self) -> Result<GeneratedMap, MapGenError> {
        let source = fs::read_to_string(&self.args.input).map_err(map_cli_input_read)?;
        let request = self.request(source);
        let map = self
            .generator
            .generate(&request)
            .into_result()
            .map_err(|message| MapGenError::new("CLI_GENERATION_FAILED", message))?;

        let palette = Palette::from_maps(&self.materials, &self.textures);
        if let Some(foreground) = &map.foreground {
            save_raster(foreground, &self.args.output, &palette)?;
        }
        if let (Some(path), Some(background)) = (&self.args.bg_out, &map.background) {
            save_raster(background, path, &palette)?;
        }
        Ok(map)
    }

    pub(crate) fn print_success(&self, map: &GeneratedMap) {
        println!("RESULT:OK");
        println!("MAP_TYPE:{}", self.map_type.name());
        println!("WIDTH:{}", map.width);
        println!("HEIGHT:{}", map.height);
        println!("OUTPUT:{}", self.args.output.display());
        for line in &map.script_output {
            println!(
                "SCRIPT_OUTPUT_JSON:{}",
                serde_json::to_string(line).expect("string json")
            );
        }
    }
}

pub(crate) fn run_render(args: RenderArgs) -> Result<i32, MapGenError> {
    let watch = args.watch;
    let mut session = RenderSession::open(args)?;
    let map = session.render()?;
    session.print_success(&map);
    if watch {
        watch_input(&mut session)?;
    }
    Ok(0)
}

#[cfg(test)]
pub(crate) mod render_test_support {
    use std::path::PathBuf;

    use crate::RenderArgs;

    pub(crate) fn render_args(input: PathBuf, output: PathBuf) -> RenderArgs {
        RenderArgs {
            input,
            output,
            width: 8,
            height: 6,
            players: 1,
            teams: 1,
            root: None,
            script_path: None,
            materials: None,
            scenario: None,
            map_type: None,
            bg_out: None,
            watch: false,
        }
    }
}
