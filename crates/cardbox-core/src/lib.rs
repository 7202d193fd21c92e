//! cardbox-core: Embeddable record storage with secondary indexes
//!
//! Provides a JSON-file record heap, prefix/exact/date index families, and
//! per-category repositories that keep heap and indexes in sync.
//!
//! # Quick Start
//!
//! For most embedding use cases, use the [`Store`] facade:
//!
//! ```no_run
//! use cardbox_core::Store;
//! use cardbox_core::record::Fields;
//! use serde_json::json;
//!
//! fn main() -> std::io::Result<()> {
//!     let store = Store::open()?;
//!
//!     let mut fields = Fields::new();
//!     fields.insert("first_name".into(), json!("Ada"));
//!     fields.insert("phones".into(), json!(["+44 20 7946 0018"]));
//!     store.contacts.create(fields)?;
//!
//!     let hits = store.contacts.search_by_prefix_field("contact_first_name", "ad")?;
//!     for contact in hits {
//!         println!("{}", contact.id);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! For lower-level access, use the individual modules directly.

pub mod bindings;
pub mod config;
pub mod digest;
pub mod heap;
pub mod index;
pub mod lock;
pub mod record;
pub mod repository;
pub mod safe_io;
mod store;

// Re-export the facade
pub use store::Store;

// Re-export commonly used types
pub use bindings::{ContactBinding, NoteBinding};
pub use config::{Config, StoragePaths};
pub use heap::{RecordScan, RecordStore};
pub use index::{DateQuery, IndexStore};
pub use record::{Fields, Record};
pub use repository::{IndexBinding, IndexKind, IndexedField, Repository};
