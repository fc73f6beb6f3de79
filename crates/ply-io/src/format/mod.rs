//! Minimal PLY grammar: header declarations plus value-at-a-time reading and
//! writing in ASCII or binary little-endian encoding.

pub mod header;
pub mod reader;
pub mod writer;

pub use header::{ElementDecl, Encoding, Header, PlyType, PropertyDecl, PropertyKind};
pub use reader::{PlyFileReader, ValueVisitor};
pub use writer::PlyEmitter;
