// SeekCode - terminal coding assistant
// Library exports

pub mod agent;
pub mod cli;
pub mod config;
pub mod context;
pub mod providers;
pub mod tools;
