//! Subcommand implementations.

pub mod inventory;
pub mod reference;
pub mod ship;

use orderflow_infra::{FsReferenceStore, Settings};

/// Resolved settings and the opened reference store, shared by every command.
#[derive(Debug)]
pub struct App {
    pub settings: Settings,
    pub store: FsReferenceStore,
}
