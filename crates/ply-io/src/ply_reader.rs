//! PLY point cloud reader.
//!
//! Decoding streams straight into the output tensors: the header is parsed,
//! every supported scalar property of the `vertex` element is registered, and
//! values are then routed one at a time to their buffers. Nothing is staged
//! in an intermediate representation.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use ply_core::{PlyError, PointCloud, ProgressSink, Result};

use crate::format::{ElementDecl, Encoding, PlyFileReader, PropertyKind, ValueVisitor};
use crate::options::ReadOptions;
use crate::registry::{AttributeGroup, AttributeRegistry};
use crate::traits::PointCloudReader;
use crate::type_map::to_data_type;

/// The only element decoded into point attributes.
pub const VERTEX_ELEMENT: &str = "vertex";

/// Rows between progress updates.
pub const PROGRESS_INTERVAL: usize = 1000;

/// Where a read got to. Used to qualify failures in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStage {
    Opened,
    HeaderParsed,
    ElementLocated,
    PropertiesRegistered,
    Streaming,
    Closed,
}

/// Typed context for one decode call; receives every registered value.
struct ReadSession<'a> {
    registry: AttributeRegistry,
    progress: &'a mut dyn ProgressSink,
}

impl ValueVisitor for ReadSession<'_> {
    fn value(&mut self, id: usize, value: f64) -> Result<()> {
        self.registry.dispatch(id, value)
    }

    fn end_row(&mut self, row: usize) -> Result<()> {
        let rows = row + 1;
        if rows % PROGRESS_INTERVAL == 0 {
            self.progress.update(rows as u64);
        }
        Ok(())
    }
}

/// PLY format reader.
#[derive(Debug)]
pub struct PlyReader {
    path: PathBuf,
    options: ReadOptions,
}

impl PlyReader {
    /// Open a PLY file for reading.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            tracing::warn!("Read PLY failed: unable to open file: {}.", path.display());
            return Err(PlyError::Io(format!("File not found: {}", path.display())));
        }
        Ok(Self {
            path,
            options: ReadOptions::default(),
        })
    }

    pub fn with_options(mut self, options: ReadOptions) -> Self {
        self.options = options;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read_point_cloud(&mut self) -> Result<PointCloud> {
        read_point_cloud(&self.path, &self.options)
    }
}

impl PointCloudReader for PlyReader {
    fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        PlyReader::open(path)
    }

    fn read_point_cloud(&mut self) -> Result<PointCloud> {
        PlyReader::read_point_cloud(self)
    }
}

/// Reads the `vertex` element of a PLY file into a point cloud.
pub fn read_point_cloud<P: AsRef<Path>>(path: P, options: &ReadOptions) -> Result<PointCloud> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|err| {
        tracing::warn!("Read PLY failed: unable to open file: {}.", path.display());
        PlyError::from(err)
    })?;
    let byte_limit = file.metadata().ok().map(|metadata| metadata.len());
    let mut reporter = options.reporter();
    read_stream(BufReader::new(file), &mut reporter, byte_limit)
}

/// Reads the `vertex` element of a PLY stream into a point cloud.
///
/// `x/y/z`, `nx/ny/nz` and `red/green/blue` become the `positions`,
/// `normals` and `colors` attributes; every other supported scalar property
/// becomes an `(N, 1)` attribute under its own name. Properties whose type
/// has no tensor counterpart are skipped with a warning. A failed read yields
/// no partial point cloud.
pub fn read_point_cloud_from<R: BufRead>(reader: R, progress: &mut dyn ProgressSink) -> Result<PointCloud> {
    read_stream(reader, progress, None)
}

/// `byte_limit` is the total input size when known; it bounds the row count
/// a header may declare before any buffer is allocated.
fn read_stream<R: BufRead>(
    reader: R,
    progress: &mut dyn ProgressSink,
    byte_limit: Option<u64>,
) -> Result<PointCloud> {
    let mut stage = ReadStage::Opened;
    let result = decode(reader, progress, byte_limit, &mut stage);
    if let Err(err) = &result {
        if err.is_fatal() {
            tracing::error!(?stage, "Read PLY failed: {}", err);
        } else {
            tracing::warn!(?stage, "Read PLY failed: {}", err);
        }
    }
    result
}

/// Smallest number of bytes one instance of `element` can occupy.
fn min_row_bytes(element: &ElementDecl, encoding: Encoding) -> u64 {
    element
        .properties
        .iter()
        .map(|property| match (encoding, property.kind) {
            (Encoding::Ascii, _) => 1,
            (Encoding::BinaryLittleEndian, PropertyKind::Scalar(ty))
            | (Encoding::BinaryLittleEndian, PropertyKind::List { count: ty, .. }) => {
                ty.storage_type().map_or(0, |dtype| dtype.byte_length() as u64)
            }
        })
        .sum()
}

fn decode<R: BufRead>(
    reader: R,
    progress: &mut dyn ProgressSink,
    byte_limit: Option<u64>,
    stage: &mut ReadStage,
) -> Result<PointCloud> {
    let mut file = PlyFileReader::new(reader)?;
    *stage = ReadStage::HeaderParsed;

    let element = file
        .header()
        .element(VERTEX_ELEMENT)
        .map(|(_, element)| element.clone())
        .ok_or_else(|| PlyError::MissingElement("no vertex attribute".into()))?;
    *stage = ReadStage::ElementLocated;

    if let Some(limit) = byte_limit {
        let needed = (element.count as u64).checked_mul(min_row_bytes(&element, file.header().encoding));
        if needed.map_or(true, |needed| needed > limit) {
            return Err(PlyError::TruncatedStream(format!(
                "element '{}' declares {} rows but the input holds only {} bytes",
                VERTEX_ELEMENT, element.count, limit
            )));
        }
    }

    let mut registry = AttributeRegistry::new(VERTEX_ELEMENT);
    for property in &element.properties {
        let ty = property.ply_type();
        let dtype = match to_data_type(ty) {
            Some(dtype) => dtype,
            None => {
                tracing::warn!(
                    "Read PLY warning: skipping property \"{}\", unsupported datatype \"{}\".",
                    property.name,
                    ty
                );
                continue;
            }
        };
        if AttributeGroup::from_attribute(&property.name) != AttributeGroup::Generic {
            tracing::warn!(
                "Read PLY warning: skipping property \"{}\", name is reserved for a grouped attribute.",
                property.name
            );
            continue;
        }
        let id = registry.register(&property.name, dtype, element.count)?;
        let count = file
            .set_read_callback(VERTEX_ELEMENT, &property.name, id)
            .unwrap_or(0);
        registry.check_cardinality(id, count)?;
    }
    *stage = ReadStage::PropertiesRegistered;

    progress.set_total(element.count as u64);
    *stage = ReadStage::Streaming;
    let mut session = ReadSession { registry, progress };
    let streamed = file.read(&mut session);
    session.progress.finish();
    streamed?;

    let cloud = session.registry.into_point_cloud()?;
    *stage = ReadStage::Closed;
    Ok(cloud)
}
