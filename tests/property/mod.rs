//! Property-based tests for diffing and transfer convergence

mod diff_properties;
mod transfer_properties;
