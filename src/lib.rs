pub mod commands;
pub mod config;
pub mod designer;
pub mod project;
