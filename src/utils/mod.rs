//! Process and file utilities shared by the pipeline.

pub mod exec;
pub mod minify;
pub mod tool;
