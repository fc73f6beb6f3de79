//! Common traits for point cloud readers and writers.
//!
//! ```ignore
//! use ply_io::{PlyReader, PlyWriter, PointCloudReader, PointCloudWriter};
//!
//! fn convert<R: PointCloudReader, W: PointCloudWriter>(src: &str, dst: &str) -> ply_core::Result<()> {
//!     let cloud = R::open(src)?.read_point_cloud()?;
//!     let mut writer = W::new();
//!     writer.add_point_cloud(&cloud)?;
//!     writer.write(dst)
//! }
//! ```

use std::path::Path;

use ply_core::{PointCloud, Result};

/// Common interface for point cloud readers.
pub trait PointCloudReader: Sized {
    /// Open a file for reading.
    fn open<P: AsRef<Path>>(path: P) -> Result<Self>;

    /// Read the point cloud stored in the file.
    fn read_point_cloud(&mut self) -> Result<PointCloud>;
}

/// Common interface for point cloud writers.
pub trait PointCloudWriter: Sized {
    /// Create a new writer instance.
    fn new() -> Self;

    /// Add the point cloud to be written.
    ///
    /// # Returns
    /// * `Ok(())` on success
    /// * `Err` if the format cannot represent this point cloud
    fn add_point_cloud(&mut self, cloud: &PointCloud) -> Result<()>;

    /// Write the added point cloud to a file.
    fn write<P: AsRef<Path>>(&self, path: P) -> Result<()>;

    /// Get the number of vertices added.
    fn vertex_count(&self) -> usize;
}
