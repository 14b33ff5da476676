pub mod error;
pub mod log_sink;
pub mod materials;
pub mod parameter_defs;
pub mod scenario;
pub mod types;

pub use error::MapGenError;
pub use log_sink::LogSink;
pub use materials::*;
pub use parameter_defs::{parse_parameter_defs, PARAMETER_DEFS_FILE};
pub use scenario::*;
pub use types::*;
