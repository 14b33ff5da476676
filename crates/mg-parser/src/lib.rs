mod landscape;
mod lexer;

pub use landscape::{
    parse_landscape, Algorithm, LandscapeDocument, NodeKind, OverlayNode, MAX_NESTING_DEPTH,
};
