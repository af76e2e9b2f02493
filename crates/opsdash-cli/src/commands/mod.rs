pub mod completions;
pub mod config;
pub mod derive;
pub mod render;
pub mod replay;
