//! The daily accessioning pipeline
//!
//! `processor` handles one sheet; the other modules settle it afterwards
//! (output, backups, move, error log). `run` ties them together.

mod backup;
mod error_log;
mod lock;
mod mover;
mod output;
mod processor;
mod run;
#[cfg(test)]
pub(crate) mod testing;

pub use run::run_once;
