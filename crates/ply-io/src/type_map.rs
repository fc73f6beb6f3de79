//! Mapping between PLY property types and tensor data types.
//!
//! Only UInt8, UInt16, Int32, Float32 and Float64 cross the boundary, and
//! they cross unchanged: no widening, narrowing or sign conversion.

use ply_core::DataType;

use crate::format::PlyType;

/// Tensor dtype for a wire type, or `None` if the property must be skipped.
pub fn to_data_type(ty: PlyType) -> Option<DataType> {
    match ty.sized() {
        PlyType::Uint8 => Some(DataType::UInt8),
        PlyType::Uint16 => Some(DataType::UInt16),
        PlyType::Int32 => Some(DataType::Int32),
        PlyType::Float32 => Some(DataType::Float32),
        PlyType::Float64 => Some(DataType::Float64),
        _ => None,
    }
}

/// Wire type used when writing a dtype. Inverse of [`to_data_type`] on the
/// sized spellings.
pub fn to_ply_type(dtype: DataType) -> Option<PlyType> {
    match dtype {
        DataType::UInt8 => Some(PlyType::Uint8),
        DataType::UInt16 => Some(PlyType::Uint16),
        DataType::Int32 => Some(PlyType::Int32),
        DataType::Float32 => Some(PlyType::Float32),
        DataType::Float64 => Some(PlyType::Float64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_PLY: [PlyType; 17] = [
        PlyType::Int8,
        PlyType::Uint8,
        PlyType::Int16,
        PlyType::Uint16,
        PlyType::Int32,
        PlyType::Uint32,
        PlyType::Float32,
        PlyType::Float64,
        PlyType::Char,
        PlyType::Uchar,
        PlyType::Short,
        PlyType::Ushort,
        PlyType::Int,
        PlyType::Uint,
        PlyType::Float,
        PlyType::Double,
        PlyType::List,
    ];

    #[test]
    fn test_supported_wire_types() {
        let supported: Vec<PlyType> = ALL_PLY
            .iter()
            .copied()
            .filter(|t| to_data_type(*t).is_some())
            .collect();
        assert_eq!(
            supported,
            vec![
                PlyType::Uint8,
                PlyType::Uint16,
                PlyType::Int32,
                PlyType::Float32,
                PlyType::Float64,
                PlyType::Uchar,
                PlyType::Ushort,
                PlyType::Int,
                PlyType::Float,
                PlyType::Double,
            ]
        );
    }

    #[test]
    fn test_bijection_on_supported_set() {
        for dtype in [
            DataType::UInt8,
            DataType::UInt16,
            DataType::Int32,
            DataType::Float32,
            DataType::Float64,
        ] {
            let ty = to_ply_type(dtype).unwrap();
            assert_eq!(to_data_type(ty), Some(dtype));
            assert_eq!(ty.storage_type(), Some(dtype));
        }
    }

    #[test]
    fn test_unsupported_dtypes() {
        for dtype in [
            DataType::Int8,
            DataType::Int16,
            DataType::UInt32,
            DataType::Int64,
            DataType::UInt64,
            DataType::Bool,
        ] {
            assert_eq!(to_ply_type(dtype), None, "{dtype} should not be writable");
        }
    }
}
