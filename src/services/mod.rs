//! Service layer modules.
//!
//! Contains the in-memory quotation store and the debounced autosave that
//! follows its change events.

pub mod autosave;
pub mod store;

pub use autosave::{Autosave, DirectorySink, LogSink, SnapshotSink};
pub use store::{QuotationEvent, QuotationStore};
