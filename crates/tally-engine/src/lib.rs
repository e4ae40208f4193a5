//! tally_engine - Formula language and key addressing for Tally.

pub mod builtins;
pub mod engine;
