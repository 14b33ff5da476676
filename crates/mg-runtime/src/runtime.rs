use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use mg_core::{ConstantSink, LandscapeConfig, LogSink, MapGenError, MaterialResolver, Raster};
use rhai::{Dynamic, Engine, Scope, AST, INT};
use tracing::{debug, info};

use crate::archive::{Archive, SYSTEM_SCRIPT_PATTERN};
use crate::map_layer::{register_map_layer_api, MapLayer, MAP_LAYER_CONSTANTS};
use crate::rhai_bridge::{
    call_script_function, dynamic_to_text, function_signatures, is_truthy, parse_error_message,
    runtime_error_message,
};

pub const MAP_ENTRY_POINT: &str = "InitializeMap";
pub const DEFAULT_STARTUP_COUNT: INT = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptHost {
    Map,
    Game,
}

impl ScriptHost {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Map => "map script",
            Self::Game => "game script",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemScript {
    pub filename: String,
    pub source: String,
}

#[derive(Debug, Clone)]
pub struct EntryPointOutcome {
    /// Whether `InitializeMap` ran and returned a true value.
    pub returned: bool,
    pub foreground: Raster,
    pub background: Raster,
}

#[derive(Debug, Clone)]
struct LoadedHost {
    filename: String,
    ast: AST,
}

struct LinkedProgram {
    program: AST,
    functions: BTreeSet<(String, usize)>,
    scope: Scope<'static>,
}

fn builtin_constants() -> BTreeMap<String, INT> {
    MAP_LAYER_CONSTANTS
        .iter()
        .map(|(name, value)| (name.to_string(), *value))
        .collect()
}

fn engine_state_error(message: &str) -> MapGenError {
    MapGenError::new("SCRIPT_ENGINE_STATE", message)
}

#[allow(deprecated)]
fn install_constant_resolver(engine: &mut Engine, constants: Rc<RefCell<BTreeMap<String, INT>>>) {
    engine.on_var(move |name, _index, _context| {
        Ok(constants.borrow().get(name).map(|value| Dynamic::from_int(*value)))
    });
}

/// Owner of the script engine and everything loaded into it.
///
/// `initialize` replaces the engine with a fresh one and replays the cached
/// system scripts into it; `deinitialize` additionally forgets the cache and
/// the startup counts. Only one generation may use a runtime at a time.
pub struct ScriptRuntime {
    sink: LogSink,
    system_scripts: Vec<SystemScript>,
    engine: Option<Engine>,
    system_hosts: Vec<LoadedHost>,
    map_script: Option<LoadedHost>,
    game_script: Option<LoadedHost>,
    linked: Option<LinkedProgram>,
    pending_constants: Vec<(String, INT)>,
    constants: Rc<RefCell<BTreeMap<String, INT>>>,
    player_count: Rc<Cell<INT>>,
    team_count: Rc<Cell<INT>>,
    output: Rc<RefCell<Vec<String>>>,
    generation: u64,
}

impl ScriptRuntime {
    pub fn new(sink: LogSink) -> Self {
        Self {
            sink,
            system_scripts: Vec::new(),
            engine: None,
            system_hosts: Vec::new(),
            map_script: None,
            game_script: None,
            linked: None,
            pending_constants: Vec::new(),
            constants: Rc::new(RefCell::new(builtin_constants())),
            player_count: Rc::new(Cell::new(DEFAULT_STARTUP_COUNT)),
            team_count: Rc::new(Cell::new(DEFAULT_STARTUP_COUNT)),
            output: Rc::new(RefCell::new(Vec::new())),
            generation: 0,
        }
    }

    pub fn sink(&self) -> &LogSink {
        &self.sink
    }

    pub fn is_initialized(&self) -> bool {
        self.engine.is_some()
    }

    pub fn is_linked(&self) -> bool {
        self.linked.is_some()
    }

    /// Number of `initialize` calls so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn system_scripts(&self) -> &[SystemScript] {
        &self.system_scripts
    }

    pub fn has_host(&self, host: ScriptHost) -> bool {
        match host {
            ScriptHost::Map => self.map_script.is_some(),
            ScriptHost::Game => self.game_script.is_some(),
        }
    }

    pub fn startup_player_count(&self) -> INT {
        self.player_count.get()
    }

    pub fn startup_team_count(&self) -> INT {
        self.team_count.get()
    }

    pub fn set_startup_player_count(&mut self, count: u32) {
        self.player_count.set(INT::from(count));
    }

    pub fn set_startup_team_count(&mut self, count: u32) {
        self.team_count.set(INT::from(count));
    }

    /// Value a linked script sees for `name`.
    pub fn constant(&self, name: &str) -> Option<INT> {
        self.constants.borrow().get(name).copied()
    }

    pub fn initialize(&mut self) {
        self.clear_hosts();
        self.pending_constants.clear();
        *self.constants.borrow_mut() = builtin_constants();
        self.output.borrow_mut().clear();

        let engine = self.build_engine();
        for script in &self.system_scripts {
            match compile_host(&engine, &script.filename, &script.source) {
                Ok(host) => self.system_hosts.push(host),
                Err(message) => self.sink.push(message),
            }
        }
        self.engine = Some(engine);
        self.generation += 1;
        debug!(
            generation = self.generation,
            system_scripts = self.system_hosts.len(),
            "script runtime initialized"
        );
    }

    pub fn deinitialize(&mut self) {
        self.clear_hosts();
        self.engine = None;
        self.system_scripts.clear();
        self.pending_constants.clear();
        *self.constants.borrow_mut() = builtin_constants();
        self.player_count.set(DEFAULT_STARTUP_COUNT);
        self.team_count.set(DEFAULT_STARTUP_COUNT);
        debug!("script runtime deinitialized");
    }

    fn clear_hosts(&mut self) {
        self.system_hosts.clear();
        self.map_script = None;
        self.game_script = None;
        self.linked = None;
    }

    /// Adds every `*.c` entry of `archive` to the system script cache.
    /// Takes effect on the next `initialize`.
    pub fn load_system_scripts_from_archive(
        &mut self,
        archive: &dyn Archive,
    ) -> Result<usize, MapGenError> {
        let entries = archive.find_entries(SYSTEM_SCRIPT_PATTERN)?;
        for entry in &entries {
            let source = archive.read_entry_as_text(entry)?;
            self.register_script(entry, &source);
        }
        debug!(archive = archive.name(), scripts = entries.len(), "loaded system scripts");
        Ok(entries.len())
    }

    /// Caches a system script. Registering a filename again replaces the
    /// cached source in place.
    pub fn register_script(&mut self, filename: &str, source: &str) {
        let script = SystemScript {
            filename: filename.to_string(),
            source: source.to_string(),
        };
        match self
            .system_scripts
            .iter_mut()
            .find(|existing| existing.filename.eq_ignore_ascii_case(filename))
        {
            Some(existing) => {
                debug!(filename, "replacing cached system script");
                *existing = script;
            }
            None => self.system_scripts.push(script),
        }
    }

    /// Compiles `source` into `host`. Syntax errors go to the sink and leave
    /// the host empty.
    pub fn load_host(
        &mut self,
        host: ScriptHost,
        filename: &str,
        source: &str,
    ) -> Result<(), MapGenError> {
        let engine = self
            .engine
            .as_ref()
            .ok_or_else(|| engine_state_error("Script engine is not initialized"))?;
        let loaded = match compile_host(engine, filename, source) {
            Ok(loaded) => Some(loaded),
            Err(message) => {
                self.sink.push(message);
                None
            }
        };
        debug!(host = host.name(), filename, loaded = loaded.is_some(), "loaded script host");
        match host {
            ScriptHost::Map => self.map_script = loaded,
            ScriptHost::Game => self.game_script = loaded,
        }
        self.linked = None;
        Ok(())
    }

    /// Merges system scripts, the game script and the map script (later
    /// definitions win), defines pending constants and runs top-level
    /// statements once. Diagnostics go to the sink.
    pub fn link(&mut self) -> Result<(), MapGenError> {
        let engine = self
            .engine
            .as_ref()
            .ok_or_else(|| engine_state_error("Script engine is not initialized"))?;

        let mut program = AST::empty();
        let mut defined_in = BTreeMap::new();
        let hosts = self
            .system_hosts
            .iter()
            .chain(self.game_script.iter())
            .chain(self.map_script.iter());
        for host in hosts {
            for signature in function_signatures(&host.ast) {
                if let Some(previous) = defined_in.insert(signature.clone(), host.filename.clone()) {
                    info!(
                        target: "mapgen::script",
                        function = %signature.0,
                        file = %host.filename,
                        previous = %previous,
                        "function overrides an earlier definition"
                    );
                }
            }
            program = program.merge(&host.ast);
        }

        {
            let mut constants = self.constants.borrow_mut();
            for (name, value) in self.pending_constants.drain(..) {
                if constants.contains_key(&name) {
                    self.sink
                        .push(format!("constant \"{}\" is already defined", name));
                    continue;
                }
                constants.insert(name, value);
            }
        }

        let mut scope = Scope::new();
        if let Err(error) = engine.run_ast_with_scope(&mut scope, &program) {
            self.sink.push(runtime_error_message("link", &error));
        }

        let functions = function_signatures(&program);
        debug!(functions = functions.len(), "script program linked");
        self.linked = Some(LinkedProgram {
            program,
            functions,
            scope,
        });
        Ok(())
    }

    /// Runs `InitializeMap(map)` on a fresh layer sized by `config`.
    ///
    /// A missing entry point is not logged; it only yields `returned == false`.
    /// Script errors are pushed to the sink. The rasters are returned in
    /// every case so the caller decides what a failed run means.
    pub fn call_entry_point(
        &mut self,
        config: &LandscapeConfig,
        resolver: &MaterialResolver,
        player_count: u32,
    ) -> Result<EntryPointOutcome, MapGenError> {
        let engine = self
            .engine
            .as_ref()
            .ok_or_else(|| engine_state_error("Script engine is not initialized"))?;
        let linked = self
            .linked
            .as_mut()
            .ok_or_else(|| engine_state_error("Script engine is not linked"))?;

        let (width, height) = config.map_size(player_count);
        let layer = MapLayer::new(width, height, Rc::new(resolver.clone()), self.sink.clone());
        let returned = if linked
            .functions
            .contains(&(MAP_ENTRY_POINT.to_string(), 1))
        {
            match call_script_function(
                engine,
                &mut linked.scope,
                &linked.program,
                MAP_ENTRY_POINT,
                (layer.clone(),),
            ) {
                Ok(value) => is_truthy(&value),
                Err(error) => {
                    self.sink
                        .push(runtime_error_message(MAP_ENTRY_POINT, &error));
                    false
                }
            }
        } else {
            debug!("no {} function in linked program", MAP_ENTRY_POINT);
            false
        };

        let (foreground, background) = layer.rasters();
        Ok(EntryPointOutcome {
            returned,
            foreground,
            background,
        })
    }

    /// Calls `function(x, y)` in the linked program for a script overlay pixel.
    pub fn call_algorithm(&mut self, function: &str, x: i64, y: i64) -> Result<bool, MapGenError> {
        let engine = self
            .engine
            .as_ref()
            .ok_or_else(|| engine_state_error("Script engine is not initialized"))?;
        let linked = self
            .linked
            .as_mut()
            .ok_or_else(|| engine_state_error("Script engine is not linked"))?;

        if !linked.functions.contains(&(function.to_string(), 2)) {
            return Err(MapGenError::new(
                "SCRIPT_NO_ENTRY_POINT",
                format!("Script algorithm function {}(x, y) is not defined", function),
            ));
        }
        let value = call_script_function(
            engine,
            &mut linked.scope,
            &linked.program,
            function,
            (x, y),
        )
        .map_err(|error| {
            MapGenError::new("SCRIPT_RUNTIME", runtime_error_message(function, &error))
        })?;
        Ok(is_truthy(&value))
    }

    /// Drains lines written with `Log()` or `print` since the last call.
    pub fn take_script_output(&mut self) -> Vec<String> {
        std::mem::take(&mut *self.output.borrow_mut())
    }

    fn build_engine(&self) -> Engine {
        let mut engine = Engine::new();

        let output = Rc::clone(&self.output);
        engine.on_print(move |text| {
            info!(target: "mapgen::script", "{}", text);
            output.borrow_mut().push(text.to_string());
        });
        engine.on_debug(|text, source, position| {
            debug!(
                target: "mapgen::script",
                source = source.unwrap_or_default(),
                %position,
                "{}",
                text
            );
        });

        let output = Rc::clone(&self.output);
        engine.register_fn("Log", move |message: Dynamic| {
            let text = dynamic_to_text(&message);
            info!(target: "mapgen::script", "{}", text);
            output.borrow_mut().push(text);
        });

        let players = Rc::clone(&self.player_count);
        engine.register_fn("GetStartupPlayerCount", move || players.get());
        let teams = Rc::clone(&self.team_count);
        engine.register_fn("GetStartupTeamCount", move || teams.get());

        install_constant_resolver(&mut engine, Rc::clone(&self.constants));
        register_map_layer_api(&mut engine);
        engine
    }
}

impl ConstantSink for ScriptRuntime {
    /// Queues a constant; it becomes visible at the next `link`.
    fn register_constant(&mut self, name: &str, value: i64) {
        self.pending_constants.push((name.to_string(), value));
    }
}

fn compile_host(engine: &Engine, filename: &str, source: &str) -> Result<LoadedHost, String> {
    let mut ast = engine
        .compile(source)
        .map_err(|error| parse_error_message(filename, &error))?;
    ast.set_source(filename);
    Ok(LoadedHost {
        filename: filename.to_string(),
        ast,
    })
}
