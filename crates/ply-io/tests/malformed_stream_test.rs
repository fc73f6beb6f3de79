//! Reads of streams that disagree with their own header, and writes that
//! must be refused before a file exists.

use std::io::Cursor;

use ply_core::{DataType, NullProgress, PlyError, PointCloud, Tensor};
use ply_io::{
    read_point_cloud, read_point_cloud_from, write_point_cloud, write_point_cloud_to, Encoding, ReadOptions,
    WriteOptions,
};

fn read_bytes(bytes: Vec<u8>) -> Result<PointCloud, PlyError> {
    read_point_cloud_from(Cursor::new(bytes), &mut NullProgress)
}

fn binary_header(count: usize) -> Vec<u8> {
    format!(
        "ply\nformat binary_little_endian 1.0\nelement vertex {count}\n\
         property float x\nproperty float y\nproperty float z\nend_header\n"
    )
    .into_bytes()
}

#[test]
fn test_binary_stream_one_row_short() {
    let mut bytes = binary_header(5);
    for row in 0..4 {
        for _ in 0..3 {
            bytes.extend_from_slice(&(row as f32).to_le_bytes());
        }
    }
    let err = read_bytes(bytes).unwrap_err();
    assert!(err.is_fatal(), "expected a fatal error, got {err:?}");
}

#[test]
fn test_binary_stream_ends_mid_row() {
    let mut bytes = binary_header(2);
    for v in [0.0f32, 1.0, 2.0, 3.0] {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    assert!(matches!(read_bytes(bytes), Err(PlyError::TruncatedStream(_))));
}

#[test]
fn test_overflowing_vertex_count_is_an_error() {
    let text = "ply\nformat binary_little_endian 1.0\nelement vertex 4611686018427387904\n\
        property float x\nend_header\n";
    let err = read_bytes(text.as_bytes().to_vec()).unwrap_err();
    assert!(matches!(err, PlyError::InvalidHeader(_)), "{err:?}");

    let err = read_bytes(binary_header(usize::MAX)).unwrap_err();
    assert!(matches!(err, PlyError::InvalidHeader(_)), "{err:?}");
}

#[test]
fn test_vertex_count_larger_than_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tiny.ply");
    let mut bytes = binary_header(1_000_000_000);
    bytes.extend_from_slice(&[0; 12]);
    std::fs::write(&path, bytes).unwrap();

    let err = read_point_cloud(&path, &ReadOptions::default()).unwrap_err();
    assert!(matches!(err, PlyError::TruncatedStream(_)), "{err:?}");
    assert!(err.is_fatal());
}

#[test]
fn test_reserved_property_name_survives_rewrite() {
    let text = "ply\nformat ascii 1.0\nelement vertex 2\n\
        property float x\nproperty float y\nproperty float z\nproperty float positions\n\
        end_header\n0 1 2 7\n3 4 5 8\n";
    let cloud = read_bytes(text.as_bytes().to_vec()).unwrap();
    assert_eq!(cloud.point_positions().unwrap().shape(), &[2, 3]);

    let bytes = write_point_cloud_to(Vec::new(), &cloud, Encoding::BinaryLittleEndian, &mut NullProgress).unwrap();
    assert_eq!(read_bytes(bytes).unwrap(), cloud);
}

#[test]
fn test_trailing_bytes_are_ignored() {
    let mut bytes = binary_header(1);
    for v in [0.0f32, 1.0, 2.0, 9.0, 9.0] {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    let cloud = read_bytes(bytes).unwrap();
    assert_eq!(cloud.point_positions().unwrap().to_vec::<f32>().unwrap(), vec![0.0, 1.0, 2.0]);
}

#[test]
fn test_garbage_ascii_value() {
    let text = "ply\nformat ascii 1.0\nelement vertex 1\nproperty int32 v\nend_header\nseven\n";
    let err = read_bytes(text.as_bytes().to_vec()).unwrap_err();
    assert!(matches!(err, PlyError::InvalidValue(_)));
    assert!(!err.is_fatal());
}

#[test]
fn test_not_a_ply_file() {
    let err = read_bytes(b"OFF\n3 1 0\n".to_vec()).unwrap_err();
    assert!(matches!(err, PlyError::InvalidHeader(_)));
    assert!(!err.is_fatal());
}

#[test]
fn test_big_endian_is_refused() {
    let text = "ply\nformat binary_big_endian 1.0\nelement vertex 0\nend_header\n";
    assert!(matches!(
        read_bytes(text.as_bytes().to_vec()),
        Err(PlyError::UnsupportedFormat(_))
    ));
}

#[test]
fn test_empty_vertex_element_reads_empty_cloud() {
    let text = "ply\nformat ascii 1.0\nelement vertex 0\nproperty float x\nproperty float y\nproperty float z\nend_header\n";
    let cloud = read_bytes(text.as_bytes().to_vec()).unwrap();
    assert!(cloud.is_empty());
    assert_eq!(cloud.point_positions().unwrap().shape(), &[0, 3]);
}

#[test]
fn test_empty_cloud_writes_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.ply");
    let err = write_point_cloud(&path, &PointCloud::new(), &WriteOptions::default()).unwrap_err();
    assert_eq!(err, PlyError::EmptyPointCloud);
    assert!(!path.exists());
}

#[test]
fn test_bad_generic_shape_writes_no_file() {
    let mut cloud = PointCloud::new();
    cloud.set_point_positions(Tensor::from_rows(&[[0.0f32; 3], [1.0; 3]]));
    cloud.set_point_attr("pair", Tensor::empty(&[2, 2], DataType::UInt8));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.ply");
    let err = write_point_cloud(&path, &cloud, &WriteOptions::new().with_ascii(true)).unwrap_err();
    assert!(matches!(err, PlyError::UnsupportedAttribute { .. }));
    assert!(!path.exists());
}

#[test]
fn test_unwritable_destination() {
    let mut cloud = PointCloud::new();
    cloud.set_point_positions(Tensor::from_rows(&[[0.0f32; 3]]));
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing_dir").join("out.ply");
    let err = write_point_cloud(&path, &cloud, &WriteOptions::default()).unwrap_err();
    assert!(matches!(err, PlyError::Io(_)));
}
