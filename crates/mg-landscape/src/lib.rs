mod algorithms;
mod renderer;

pub use algorithms::script_algorithm_function;
pub use renderer::{render, ScriptAlgorithmHost};
