use std::fmt;
use std::str::FromStr;

use byteorder::{ByteOrder, LittleEndian};
use num_traits::NumCast;

/// Element type of a [`Tensor`](crate::tensor::Tensor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
    Bool,
}

impl DataType {
    pub fn byte_length(&self) -> usize {
        match self {
            DataType::Int8 | DataType::UInt8 | DataType::Bool => 1,
            DataType::Int16 | DataType::UInt16 => 2,
            DataType::Int32 | DataType::UInt32 | DataType::Float32 => 4,
            DataType::Int64 | DataType::UInt64 | DataType::Float64 => 8,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DataType::Int8 => "Int8",
            DataType::UInt8 => "UInt8",
            DataType::Int16 => "Int16",
            DataType::UInt16 => "UInt16",
            DataType::Int32 => "Int32",
            DataType::UInt32 => "UInt32",
            DataType::Int64 => "Int64",
            DataType::UInt64 => "UInt64",
            DataType::Float32 => "Float32",
            DataType::Float64 => "Float64",
            DataType::Bool => "Bool",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A Rust primitive that can live in a tensor buffer.
///
/// Values are stored little-endian regardless of the host, so a buffer's
/// bytes are exactly what a binary little-endian stream carries.
pub trait Scalar: Copy + PartialEq + fmt::Debug + fmt::Display + FromStr + NumCast + 'static {
    const DATA_TYPE: DataType;

    fn read_le(bytes: &[u8]) -> Self;
    fn write_le(self, bytes: &mut [u8]);
}

impl Scalar for u8 {
    const DATA_TYPE: DataType = DataType::UInt8;

    fn read_le(bytes: &[u8]) -> Self {
        bytes[0]
    }

    fn write_le(self, bytes: &mut [u8]) {
        bytes[0] = self;
    }
}

impl Scalar for i8 {
    const DATA_TYPE: DataType = DataType::Int8;

    fn read_le(bytes: &[u8]) -> Self {
        bytes[0] as i8
    }

    fn write_le(self, bytes: &mut [u8]) {
        bytes[0] = self as u8;
    }
}

macro_rules! impl_scalar {
    ($t:ty, $dtype:expr, $read:ident, $write:ident) => {
        impl Scalar for $t {
            const DATA_TYPE: DataType = $dtype;

            fn read_le(bytes: &[u8]) -> Self {
                LittleEndian::$read(bytes)
            }

            fn write_le(self, bytes: &mut [u8]) {
                LittleEndian::$write(bytes, self)
            }
        }
    };
}

impl_scalar!(i16, DataType::Int16, read_i16, write_i16);
impl_scalar!(u16, DataType::UInt16, read_u16, write_u16);
impl_scalar!(i32, DataType::Int32, read_i32, write_i32);
impl_scalar!(u32, DataType::UInt32, read_u32, write_u32);
impl_scalar!(i64, DataType::Int64, read_i64, write_i64);
impl_scalar!(u64, DataType::UInt64, read_u64, write_u64);
impl_scalar!(f32, DataType::Float32, read_f32, write_f32);
impl_scalar!(f64, DataType::Float64, read_f64, write_f64);
