//! Integration tests for the ferry synchronization engine

mod cli_commands;
mod config_integration;
mod local_transfer;
mod test_utils;
