//! Skin records and their on-disk format.
//!
//! - [`SkinRecord`] / [`SkinAttributes`] - the persisted unit
//! - [`RecordStore`] - bytes/file serialization with optional zlib bodies
//! - [`FieldTable`] / [`FieldValue`] - raw legend-keyed fields, for inspection
//!   and for reading files written with the legacy legend
//! - [`format`] - header layout, value tags and field names

pub mod format;
mod compression;
mod reader;
mod schema;
mod store;
mod value;
mod writer;

pub use reader::{parse_header, RecordHeader};
pub use schema::{SkinAttributes, SkinRecord};
pub use store::RecordStore;
pub use value::{FieldTable, FieldValue};
