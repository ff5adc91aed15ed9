//! flatmsg is a schema-driven binary message format: an append-only
//! [`Writer`] that builds a flat, relocatable buffer of magic-tagged
//! objects, and a validating [`read_message`] view that decodes it with
//! zero-copy random access.
//!
//! The runtime knows nothing about concrete message types. A schema compiler
//! normally emits per-type accessors that call the offset-based primitives
//! here, supplying each table's magic constant and default byte image via
//! [`TableSchema`] (and struct/enum codecs via [`StructSchema`] and
//! [`Enum`]). Hand-written schema types work the same way:
//!
//! ```
//! use flatmsg::{read_message, TableSchema, Writer};
//!
//! // What a schema compiler would emit for `table Point { x: u32; name: text; }`.
//! struct Point;
//! impl TableSchema for Point {
//!     const MAGIC: u32 = 0x5058_10A4;
//!     const DEFAULT: &'static [u8] = &[0; 10]; // x at 0, name pointer at 4
//! }
//!
//! let mut w = Writer::new();
//! let point = w.add_table::<Point>();
//! point.set_pod(&mut w, 0, 7u32);
//! point.add_text(&mut w, 4, "origin");
//! let data = w.finalize(point);
//!
//! let point = read_message::<Point>(&data).unwrap();
//! assert_eq!(point.get_pod(0, 0u32), 7);
//! assert_eq!(point.get_text(4).unwrap(), Some("origin"));
//! ```
//!
//! # Wire format
//!
//! Everything is little-endian; offsets and sizes are 48-bit. A message is a
//! 10-byte header (magic + root pointer) followed by heap objects, each
//! prefixed by its own 10-byte header: a per-type magic and a size or
//! element count. Pointers store the target's header offset with 0 reserved
//! for null. Text carries an uncounted NUL terminator; lists pack their
//! elements per kind (see [`list`]); unions are a 2-byte tag plus a 48-bit
//! payload word. A table, union, or list may place one variable-size child
//! directly after itself ("in place"), addressed by size alone.
//!
//! # Schema evolution
//!
//! Tables carry their declared byte size on the wire. Readers treat fields
//! beyond that size as absent and substitute defaults, so old readers open
//! new messages (trailing fields ignored) and new readers open old ones
//! (missing fields default). Optional fields additionally carry presence
//! bits: "explicitly unset" reads as `None` and is distinguishable from a
//! field that merely holds its default.
//!
//! # Validation
//!
//! Nothing is trusted until touched. Each pointer dereference validates the
//! target's magic and bounds; list access is index-checked; text is strict
//! UTF-8. Malformed or truncated input surfaces as [`Error`] at the access
//! that hits it, while unrelated parts of the same message stay readable.

pub mod error;
pub use error::{Error, Result};
mod arena;
pub mod list;
pub use list::{ListIn, ListOut};
mod reader;
pub use reader::{read_message, Region};
pub mod schema;
pub use schema::{Enum, StructSchema, TableSchema};
mod table;
pub use table::{TableIn, TableOut};
mod union;
pub use union::{UnionIn, UnionOut};
pub mod wire;
pub use wire::{Pod, BYTES_MAGIC, LIST_MAGIC, MESSAGE_MAGIC, TEXT_MAGIC};
mod writer;
pub use writer::{BytesOut, TextOut, Writer};
