//! Dense, row-major, dtype-tagged storage for one point attribute.

use crate::data_buffer::DataBuffer;
use crate::data_type::{DataType, Scalar};
use crate::status::{PlyError, Result};

/// An n-dimensional array of a single [`DataType`].
///
/// Point attributes use two dimensions: `(num_points, row_width)`. Element
/// `(i, k)` lives at flat index `row_width * i + k`.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    dtype: DataType,
    shape: Vec<usize>,
    buffer: DataBuffer,
}

impl Tensor {
    /// Allocates a zero-filled tensor.
    pub fn empty(shape: &[usize], dtype: DataType) -> Self {
        let num_elements: usize = shape.iter().product();
        Self {
            dtype,
            shape: shape.to_vec(),
            buffer: DataBuffer::with_size(num_elements * dtype.byte_length()),
        }
    }

    /// Allocates a zero-filled tensor whose shape comes from untrusted input.
    ///
    /// Fails with `InvalidParameter` if the byte size overflows `usize` or the
    /// allocation is refused.
    pub fn try_empty(shape: &[usize], dtype: DataType) -> Result<Self> {
        let byte_size = shape
            .iter()
            .try_fold(dtype.byte_length(), |acc, &dim| acc.checked_mul(dim))
            .ok_or_else(|| {
                PlyError::InvalidParameter(format!("{} tensor of shape {:?} overflows", dtype, shape))
            })?;
        let buffer = DataBuffer::try_with_size(byte_size).ok_or_else(|| {
            PlyError::InvalidParameter(format!("cannot allocate {} bytes for shape {:?}", byte_size, shape))
        })?;
        Ok(Self {
            dtype,
            shape: shape.to_vec(),
            buffer,
        })
    }

    /// Builds a tensor from flat row-major values.
    pub fn from_slice<T: Scalar>(values: &[T], shape: &[usize]) -> Result<Self> {
        let num_elements: usize = shape.iter().product();
        if num_elements != values.len() {
            return Err(PlyError::InvalidParameter(format!(
                "{} values cannot fill shape {:?}",
                values.len(),
                shape
            )));
        }
        let mut tensor = Self::empty(shape, T::DATA_TYPE);
        for (i, v) in values.iter().enumerate() {
            tensor.set(i, *v)?;
        }
        Ok(tensor)
    }

    /// Builds an `(rows.len(), N)` tensor, e.g. from `[[x, y, z]; n]`.
    pub fn from_rows<T: Scalar, const N: usize>(rows: &[[T; N]]) -> Self {
        let mut tensor = Self::empty(&[rows.len(), N], T::DATA_TYPE);
        let width = T::DATA_TYPE.byte_length();
        for (i, v) in rows.iter().flatten().enumerate() {
            if let Some(slot) = tensor.buffer.slot_mut(i * width, width) {
                v.write_le(slot);
            }
        }
        tensor
    }

    /// Builds an `(values.len(), 1)` column tensor.
    pub fn from_column<T: Scalar>(values: &[T]) -> Self {
        let mut tensor = Self::empty(&[values.len(), 1], T::DATA_TYPE);
        let width = T::DATA_TYPE.byte_length();
        for (i, v) in values.iter().enumerate() {
            if let Some(slot) = tensor.buffer.slot_mut(i * width, width) {
                v.write_le(slot);
            }
        }
        tensor
    }

    pub fn dtype(&self) -> DataType {
        self.dtype
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Length of the first dimension (number of rows).
    pub fn len(&self) -> usize {
        self.shape.first().copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Scalars per row: the product of every dimension after the first.
    pub fn row_width(&self) -> usize {
        self.shape.iter().skip(1).product()
    }

    pub fn num_elements(&self) -> usize {
        self.shape.iter().product()
    }

    /// Reads the scalar at a flat index. `None` on dtype mismatch or out of range.
    pub fn get<T: Scalar>(&self, index: usize) -> Option<T> {
        if T::DATA_TYPE != self.dtype {
            return None;
        }
        let width = self.dtype.byte_length();
        self.buffer
            .read(index.checked_mul(width)?, width)
            .map(T::read_le)
    }

    /// Writes the scalar at a flat index.
    pub fn set<T: Scalar>(&mut self, index: usize, value: T) -> Result<()> {
        if T::DATA_TYPE != self.dtype {
            return Err(PlyError::TypeMismatch(format!(
                "cannot store {} into a {} tensor",
                T::DATA_TYPE,
                self.dtype
            )));
        }
        let width = self.dtype.byte_length();
        let num_elements = self.num_elements();
        let slot = index
            .checked_mul(width)
            .and_then(|pos| self.buffer.slot_mut(pos, width))
            .ok_or_else(|| {
                PlyError::InvalidParameter(format!(
                    "index {} out of range for {} elements",
                    index, num_elements
                ))
            })?;
        value.write_le(slot);
        Ok(())
    }

    /// Copies every element out in row-major order. `None` on dtype mismatch.
    pub fn to_vec<T: Scalar>(&self) -> Option<Vec<T>> {
        if T::DATA_TYPE != self.dtype {
            return None;
        }
        let width = self.dtype.byte_length();
        Some(
            self.buffer
                .data()
                .chunks_exact(width)
                .map(T::read_le)
                .collect(),
        )
    }
}
