//! Core data model for the PLY point cloud codec.
//!
//! A [`PointCloud`] is a table of named [`Tensor`]s, one per point attribute.
//! Each tensor carries its own [`DataType`] and shape; the codec in `ply-io`
//! maps these onto PLY vertex properties and back.

pub mod data_buffer;
pub mod data_type;
pub mod point_cloud;
pub mod progress;
pub mod status;
pub mod tensor;

pub use data_type::{DataType, Scalar};
pub use point_cloud::{PointCloud, COLORS, NORMALS, POSITIONS};
pub use progress::{CountingProgressReporter, NullProgress, ProgressCallback, ProgressSink};
pub use status::{PlyError, Result, Status};
pub use tensor::Tensor;
