//! Worker thread that runs controller jobs off the UI thread.

pub mod commands;
pub mod runtime;
