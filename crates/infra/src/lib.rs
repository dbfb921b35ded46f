//! Infrastructure layer: table files, reference storage, output writers, config.

pub mod config;
pub mod export;
pub mod reference_store;
pub mod table_io;

pub use config::{ConfigError, Settings, SettingsOverrides};
pub use export::{DeliveryLayout, apply_on_hand, write_delivery, write_delivery_file};
pub use reference_store::{
    FsReferenceStore, InMemoryReferenceStore, Manifest, ManifestEntry, ReferenceKind,
    ReferenceStore, ReferenceStoreError, ReferenceTables, load_inventory_exceptions,
};
pub use table_io::{TableFormat, TableIoError, read_table, write_table, write_table_file};
