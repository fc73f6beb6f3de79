//! Streaming PLY reader and writer for tensor point clouds.
//!
//! A [`PointCloud`](ply_core::PointCloud) maps onto the PLY `vertex` element:
//!
//! | Attribute   | Properties             | Shape    |
//! |-------------|------------------------|----------|
//! | `positions` | `x`, `y`, `z`          | `(N, 3)` |
//! | `normals`   | `nx`, `ny`, `nz`       | `(N, 3)` |
//! | `colors`    | `red`, `green`, `blue` | `(N, 3)` |
//! | any other   | its own name           | `(N, 1)` |
//!
//! Supported property types are `uint8`, `uint16`, `int32`, `float32` and
//! `float64` (plus their `uchar`/`ushort`/`int`/`float`/`double` spellings).
//! Values are never converted, so a write followed by a read reproduces the
//! tensors bit for bit in both ASCII and binary little-endian encodings.
//!
//! ```ignore
//! use ply_io::{read_point_cloud, write_point_cloud, ReadOptions, WriteOptions};
//!
//! let cloud = read_point_cloud("scan.ply", &ReadOptions::default())?;
//! write_point_cloud("scan_ascii.ply", &cloud, &WriteOptions::new().with_ascii(true))?;
//! ```

pub mod format;
pub mod options;
pub mod ply_reader;
pub mod ply_writer;
pub mod registry;
pub mod traits;
pub mod type_map;

pub use format::Encoding;
pub use options::{ReadOptions, WriteOptions};
pub use ply_reader::{read_point_cloud, read_point_cloud_from, PlyReader, VERTEX_ELEMENT};
pub use ply_writer::{write_point_cloud, write_point_cloud_to, PlyWriter};
pub use traits::{PointCloudReader, PointCloudWriter};
