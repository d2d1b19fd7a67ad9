// Vision model access

pub mod common;
pub mod config;
pub mod prompts;
pub mod vision;
