pub mod commands;
pub mod config;
pub mod output;
pub mod provider;
pub mod shared;
pub mod validation;
pub mod workflow;
