//! PLY point cloud writer.
//!
//! The attribute table is validated in full before anything is written. The
//! vertex element then carries positions first, normals and colors when
//! present, and every other attribute as a single scalar property, in table
//! order. Values are emitted point by point.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use ply_core::{PlyError, PointCloud, ProgressSink, Result, Scalar, Tensor, POSITIONS};

use crate::format::writer::check_identifier;
use crate::format::{Encoding, PlyEmitter, PlyType};
use crate::options::WriteOptions;
use crate::ply_reader::{PROGRESS_INTERVAL, VERTEX_ELEMENT};
use crate::registry::AttributeGroup;
use crate::traits::PointCloudWriter;
use crate::type_map::to_ply_type;

pub const PRODUCER_COMMENT: &str = "Created by ply-io";

type EmitFn<W> = fn(&mut PlyEmitter<W>, &Tensor, usize, usize) -> Result<()>;

fn emit_row<T: Scalar, W: Write>(
    emitter: &mut PlyEmitter<W>,
    tensor: &Tensor,
    start: usize,
    width: usize,
) -> Result<()> {
    for index in start..start + width {
        let value = tensor.get::<T>(index).ok_or_else(|| {
            PlyError::InvalidParameter(format!("index {} out of range for {:?}", index, tensor.shape()))
        })?;
        emitter.write_value(value)?;
    }
    Ok(())
}

fn emit_fn<W: Write>(ty: PlyType) -> Option<EmitFn<W>> {
    match ty {
        PlyType::Uint8 => Some(emit_row::<u8, W> as EmitFn<W>),
        PlyType::Uint16 => Some(emit_row::<u16, W> as EmitFn<W>),
        PlyType::Int32 => Some(emit_row::<i32, W> as EmitFn<W>),
        PlyType::Float32 => Some(emit_row::<f32, W> as EmitFn<W>),
        PlyType::Float64 => Some(emit_row::<f64, W> as EmitFn<W>),
        _ => None,
    }
}

/// One attribute group scheduled for output.
#[derive(Debug)]
struct AttributeSlot<'a> {
    name: &'a str,
    group: AttributeGroup,
    tensor: &'a Tensor,
    ply_type: PlyType,
}

/// Checks the attribute table and puts it in output order.
fn plan(cloud: &PointCloud) -> Result<Vec<AttributeSlot<'_>>> {
    if cloud.is_empty() {
        return Err(PlyError::EmptyPointCloud);
    }
    let num_points = cloud.num_points();

    let mut fixed = Vec::new();
    let mut generic = Vec::new();
    for (name, tensor) in cloud.iter() {
        let group = AttributeGroup::from_attribute(name);
        if group == AttributeGroup::Generic {
            check_identifier(name)?;
            if AttributeGroup::classify(name).0 != AttributeGroup::Generic {
                return Err(PlyError::InvalidParameter(format!(
                    "attribute '{}' clashes with a reserved property name",
                    name
                )));
            }
        } else if tensor.len() != num_points {
            return Err(PlyError::LengthMismatch {
                attribute: name.to_string(),
                expected: num_points,
                actual: tensor.len(),
            });
        }
        let expected = vec![num_points, group.width()];
        if tensor.shape() != expected.as_slice() {
            return Err(PlyError::UnsupportedAttribute {
                attribute: name.to_string(),
                expected,
                actual: tensor.shape().to_vec(),
            });
        }
        let ply_type = to_ply_type(tensor.dtype()).ok_or_else(|| PlyError::UnsupportedDataType {
            attribute: name.to_string(),
            dtype: tensor.dtype().to_string(),
        })?;
        let slot = AttributeSlot {
            name,
            group,
            tensor,
            ply_type,
        };
        match group {
            AttributeGroup::Generic => generic.push(slot),
            _ => fixed.push(slot),
        }
    }

    fixed.sort_by_key(|slot| match slot.group {
        AttributeGroup::Positions => 0,
        AttributeGroup::Normals => 1,
        _ => 2,
    });
    debug_assert_eq!(fixed.first().map(|s| s.name), Some(POSITIONS));
    fixed.extend(generic);
    Ok(fixed)
}

fn encode<W: Write>(
    writer: W,
    slots: &[AttributeSlot<'_>],
    num_points: usize,
    encoding: Encoding,
    progress: &mut dyn ProgressSink,
) -> Result<W> {
    let mut emitter = PlyEmitter::new(writer, encoding);
    emitter.add_comment(PRODUCER_COMMENT)?;
    emitter.add_element(VERTEX_ELEMENT, num_points)?;
    for slot in slots {
        match slot.group.property_names() {
            [] => emitter.add_property(slot.name, slot.ply_type)?,
            names => {
                for name in names {
                    emitter.add_property(name, slot.ply_type)?;
                }
            }
        }
    }
    emitter.write_header()?;

    let rows = slots
        .iter()
        .map(|slot| {
            emit_fn::<W>(slot.ply_type)
                .map(|emit| (slot.tensor, slot.group.width(), emit))
                .ok_or_else(|| PlyError::UnsupportedDataType {
                    attribute: slot.name.to_string(),
                    dtype: slot.tensor.dtype().to_string(),
                })
        })
        .collect::<Result<Vec<_>>>()?;

    progress.set_total(num_points as u64);
    let streamed = stream_points(&mut emitter, &rows, num_points, progress);
    progress.finish();
    streamed?;

    emitter.finish()
}

/// Point-major body: for each point, each group's row in slot order.
fn stream_points<W: Write>(
    emitter: &mut PlyEmitter<W>,
    rows: &[(&Tensor, usize, EmitFn<W>)],
    num_points: usize,
    progress: &mut dyn ProgressSink,
) -> Result<()> {
    for i in 0..num_points {
        for &(tensor, width, emit) in rows {
            emit(emitter, tensor, width * i, width)?;
        }
        if i % PROGRESS_INTERVAL == 0 {
            progress.update(i as u64);
        }
    }
    Ok(())
}

fn log_failure(err: &PlyError) {
    tracing::warn!("Write PLY failed: {}", err);
}

/// Writes a point cloud to any stream and hands the stream back.
pub fn write_point_cloud_to<W: Write>(
    writer: W,
    cloud: &PointCloud,
    encoding: Encoding,
    progress: &mut dyn ProgressSink,
) -> Result<W> {
    plan(cloud)
        .and_then(|slots| encode(writer, &slots, cloud.num_points(), encoding, progress))
        .map_err(|err| {
            log_failure(&err);
            err
        })
}

/// Writes a point cloud to a PLY file.
///
/// Invalid tables are rejected before the file is created. If writing fails
/// after that, the partial file is removed.
pub fn write_point_cloud<P: AsRef<Path>>(path: P, cloud: &PointCloud, options: &WriteOptions) -> Result<()> {
    let path = path.as_ref();
    let slots = plan(cloud).map_err(|err| {
        log_failure(&err);
        err
    })?;
    let file = File::create(path).map_err(|err| {
        tracing::warn!("Write PLY failed: unable to open file: {}.", path.display());
        PlyError::from(err)
    })?;

    let mut reporter = options.reporter();
    let result = encode(
        BufWriter::new(file),
        &slots,
        cloud.num_points(),
        options.encoding(),
        &mut reporter,
    );
    match result {
        Ok(_) => Ok(()),
        Err(err) => {
            log_failure(&err);
            if let Err(remove_err) = fs::remove_file(path) {
                tracing::debug!("could not remove partial file {}: {}", path.display(), remove_err);
            }
            Err(err)
        }
    }
}

/// PLY format writer.
///
/// Holds one point cloud until [`PlyWriter::write`] is called.
#[derive(Debug, Default)]
pub struct PlyWriter {
    cloud: Option<PointCloud>,
    options: WriteOptions,
}

impl PlyWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(mut self, options: WriteOptions) -> Self {
        self.options = options;
        self
    }

    /// Write ASCII instead of binary little-endian.
    pub fn with_ascii(mut self, write_ascii: bool) -> Self {
        self.options.write_ascii = write_ascii;
        self
    }

    /// Validates and stores the point cloud to write, replacing any earlier one.
    pub fn add_point_cloud(&mut self, cloud: &PointCloud) -> Result<()> {
        plan(cloud).map_err(|err| {
            log_failure(&err);
            err
        })?;
        self.cloud = Some(cloud.clone());
        Ok(())
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let cloud = self.cloud.as_ref().ok_or(PlyError::EmptyPointCloud)?;
        write_point_cloud(path, cloud, &self.options)
    }

    pub fn vertex_count(&self) -> usize {
        self.cloud.as_ref().map(PointCloud::num_points).unwrap_or(0)
    }
}

impl PointCloudWriter for PlyWriter {
    fn new() -> Self {
        PlyWriter::new()
    }

    fn add_point_cloud(&mut self, cloud: &PointCloud) -> Result<()> {
        PlyWriter::add_point_cloud(self, cloud)
    }

    fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        PlyWriter::write(self, path)
    }

    fn vertex_count(&self) -> usize {
        PlyWriter::vertex_count(self)
    }
}
