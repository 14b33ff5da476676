mod archive;
mod map_layer;
mod rhai_bridge;
mod runtime;

pub use archive::{
    wildcard_regex, Archive, ArchiveOpener, DirectoryArchive, FsArchiveOpener, MemoryArchive,
    SYSTEM_SCRIPT_PATTERN,
};
pub use map_layer::{MapLayer, MAPALGO_ELLIPSE, MAPALGO_RECT};
pub use runtime::{
    EntryPointOutcome, ScriptHost, ScriptRuntime, SystemScript, DEFAULT_STARTUP_COUNT,
    MAP_ENTRY_POINT,
};
