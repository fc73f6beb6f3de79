//! Streaming value reader: walks element instances and hands registered
//! property values to a visitor one scalar at a time.

use std::io::BufRead;

use byteorder::{LittleEndian, ReadBytesExt};
use ply_core::{PlyError, Result};

use super::header::{Encoding, Header, PlyType, PropertyKind};

/// Receives decoded values for properties registered with
/// [`PlyFileReader::set_read_callback`].
pub trait ValueVisitor {
    fn value(&mut self, id: usize, value: f64) -> Result<()>;

    /// Called after every instance of an element that has at least one
    /// registered property. `row` counts from zero.
    fn end_row(&mut self, _row: usize) -> Result<()> {
        Ok(())
    }
}

/// Decodes raw scalars from the data section in either encoding.
struct ValueSource<R> {
    reader: R,
    encoding: Encoding,
    token: String,
}

impl<R: BufRead> ValueSource<R> {
    fn read_scalar(&mut self, ty: PlyType) -> Result<f64> {
        match self.encoding {
            Encoding::Ascii => self.read_ascii(ty),
            Encoding::BinaryLittleEndian => self.read_binary(ty),
        }
    }

    fn read_binary(&mut self, ty: PlyType) -> Result<f64> {
        let r = &mut self.reader;
        let value = match ty.sized() {
            PlyType::Int8 => r.read_i8()? as f64,
            PlyType::Uint8 => r.read_u8()? as f64,
            PlyType::Int16 => r.read_i16::<LittleEndian>()? as f64,
            PlyType::Uint16 => r.read_u16::<LittleEndian>()? as f64,
            PlyType::Int32 => r.read_i32::<LittleEndian>()? as f64,
            PlyType::Uint32 => r.read_u32::<LittleEndian>()? as f64,
            PlyType::Float32 => r.read_f32::<LittleEndian>()? as f64,
            PlyType::Float64 => r.read_f64::<LittleEndian>()?,
            _ => return Err(PlyError::InvalidValue(format!("cannot read a {} scalar", ty))),
        };
        Ok(value)
    }

    fn read_ascii(&mut self, ty: PlyType) -> Result<f64> {
        self.next_token()?;
        let token = self.token.as_str();
        let bad = || PlyError::InvalidValue(format!("'{}' is not a valid {}", token, ty));
        // Each type is parsed at its own width so float32 text round-trips exactly.
        let value = match ty.sized() {
            PlyType::Int8 => token.parse::<i8>().map_err(|_| bad())? as f64,
            PlyType::Uint8 => token.parse::<u8>().map_err(|_| bad())? as f64,
            PlyType::Int16 => token.parse::<i16>().map_err(|_| bad())? as f64,
            PlyType::Uint16 => token.parse::<u16>().map_err(|_| bad())? as f64,
            PlyType::Int32 => token.parse::<i32>().map_err(|_| bad())? as f64,
            PlyType::Uint32 => token.parse::<u32>().map_err(|_| bad())? as f64,
            PlyType::Float32 => token.parse::<f32>().map_err(|_| bad())? as f64,
            PlyType::Float64 => token.parse::<f64>().map_err(|_| bad())?,
            _ => return Err(bad()),
        };
        Ok(value)
    }

    /// Loads the next whitespace-delimited word into `self.token`.
    fn next_token(&mut self) -> Result<()> {
        self.token.clear();
        loop {
            let buf = self.reader.fill_buf()?;
            if buf.is_empty() {
                break;
            }
            let mut used = 0;
            let mut done = false;
            for &b in buf {
                if b.is_ascii_whitespace() {
                    if !self.token.is_empty() {
                        done = true;
                        break;
                    }
                } else {
                    self.token.push(b as char);
                }
                used += 1;
            }
            self.reader.consume(used);
            if done {
                break;
            }
        }
        if self.token.is_empty() {
            return Err(PlyError::TruncatedStream("unexpected end of ascii data".into()));
        }
        Ok(())
    }
}

/// An open PLY stream whose header has been parsed.
pub struct PlyFileReader<R> {
    source: ValueSource<R>,
    header: Header,
    callbacks: Vec<Vec<Option<usize>>>,
}

impl<R: BufRead> PlyFileReader<R> {
    pub fn new(mut reader: R) -> Result<Self> {
        let header = Header::parse(&mut reader)?;
        let callbacks = header
            .elements
            .iter()
            .map(|e| vec![None; e.properties.len()])
            .collect();
        Ok(Self {
            source: ValueSource {
                reader,
                encoding: header.encoding,
                token: String::new(),
            },
            header,
            callbacks,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Routes values of `element.property` to the visitor under `id`.
    ///
    /// Returns the number of values the stream will deliver for the
    /// property, or `None` if no such scalar property exists.
    pub fn set_read_callback(&mut self, element: &str, property: &str, id: usize) -> Option<usize> {
        let (e_idx, decl) = self.header.element(element)?;
        let (p_idx, prop) = decl.property(property)?;
        if let PropertyKind::List { .. } = prop.kind {
            return None;
        }
        let count = decl.count;
        self.callbacks[e_idx][p_idx] = Some(id);
        Some(count)
    }

    /// Streams the data section. Stops after the last element that has a
    /// registered property; later elements are never decoded.
    pub fn read<V: ValueVisitor>(&mut self, visitor: &mut V) -> Result<()> {
        let last = match self
            .callbacks
            .iter()
            .rposition(|props| props.iter().any(Option::is_some))
        {
            Some(last) => last,
            None => return Ok(()),
        };

        for (element, ids) in self.header.elements.iter().zip(&self.callbacks).take(last + 1) {
            let has_callbacks = ids.iter().any(Option::is_some);
            for row in 0..element.count {
                for (property, id) in element.properties.iter().zip(ids) {
                    match property.kind {
                        PropertyKind::Scalar(ty) => {
                            let value = self.source.read_scalar(ty)?;
                            if let Some(id) = id {
                                visitor.value(*id, value)?;
                            }
                        }
                        PropertyKind::List { count, item } => {
                            let n = self.source.read_scalar(count)?;
                            if n < 0.0 || n.fract() != 0.0 {
                                return Err(PlyError::InvalidValue(format!(
                                    "bad list length {} for property '{}'",
                                    n, property.name
                                )));
                            }
                            for _ in 0..n as usize {
                                self.source.read_scalar(item)?;
                            }
                        }
                    }
                }
                if has_callbacks {
                    visitor.end_row(row)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[derive(Default)]
    struct Collect {
        values: Vec<(usize, f64)>,
        rows: usize,
    }

    impl ValueVisitor for Collect {
        fn value(&mut self, id: usize, value: f64) -> Result<()> {
            self.values.push((id, value));
            Ok(())
        }

        fn end_row(&mut self, _row: usize) -> Result<()> {
            self.rows += 1;
            Ok(())
        }
    }

    #[test]
    fn test_ascii_stream_skips_lists_and_unregistered() {
        let text = "ply\nformat ascii 1.0\n\
            element vertex 2\n\
            property float x\n\
            property list uchar int idx\n\
            property char c\n\
            end_header\n\
            1.5 2 7 8 -3\n\
            -0.25 0 4\n";
        let mut file = PlyFileReader::new(Cursor::new(text.as_bytes())).unwrap();
        assert_eq!(file.set_read_callback("vertex", "x", 0), Some(2));
        assert_eq!(file.set_read_callback("vertex", "idx", 1), None);
        assert_eq!(file.set_read_callback("vertex", "c", 2), Some(2));
        assert_eq!(file.set_read_callback("face", "x", 3), None);

        let mut visitor = Collect::default();
        file.read(&mut visitor).unwrap();
        assert_eq!(visitor.values, vec![(0, 1.5), (2, -3.0), (0, -0.25), (2, 4.0)]);
        assert_eq!(visitor.rows, 2);
    }

    #[test]
    fn test_binary_stream() {
        let mut data = b"ply\nformat binary_little_endian 1.0\n\
            element vertex 2\n\
            property uint16 a\n\
            property double b\n\
            end_header\n"
            .to_vec();
        for (a, b) in [(513u16, 0.5f64), (7, -1.0)] {
            data.extend_from_slice(&a.to_le_bytes());
            data.extend_from_slice(&b.to_le_bytes());
        }
        let mut file = PlyFileReader::new(Cursor::new(data)).unwrap();
        file.set_read_callback("vertex", "a", 0);
        file.set_read_callback("vertex", "b", 1);
        let mut visitor = Collect::default();
        file.read(&mut visitor).unwrap();
        assert_eq!(visitor.values, vec![(0, 513.0), (1, 0.5), (0, 7.0), (1, -1.0)]);
    }

    #[test]
    fn test_truncated_stream() {
        let text = "ply\nformat ascii 1.0\nelement vertex 3\nproperty int v\nend_header\n1 2\n";
        let mut file = PlyFileReader::new(Cursor::new(text.as_bytes())).unwrap();
        file.set_read_callback("vertex", "v", 0);
        let err = file.read(&mut Collect::default()).unwrap_err();
        assert!(matches!(err, PlyError::TruncatedStream(_)));

        let mut data = b"ply\nformat binary_little_endian 1.0\nelement vertex 2\nproperty float v\nend_header\n".to_vec();
        data.extend_from_slice(&1.0f32.to_le_bytes());
        data.extend_from_slice(&[0, 0]);
        let mut file = PlyFileReader::new(Cursor::new(data)).unwrap();
        file.set_read_callback("vertex", "v", 0);
        let err = file.read(&mut Collect::default()).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_out_of_range_ascii_value() {
        let text = "ply\nformat ascii 1.0\nelement vertex 1\nproperty uchar v\nend_header\n300\n";
        let mut file = PlyFileReader::new(Cursor::new(text.as_bytes())).unwrap();
        file.set_read_callback("vertex", "v", 0);
        let err = file.read(&mut Collect::default()).unwrap_err();
        assert!(matches!(err, PlyError::InvalidValue(_)));
    }

    #[test]
    fn test_elements_after_last_callback_are_not_decoded() {
        // The face section is garbage; it is never touched.
        let text = "ply\nformat ascii 1.0\nelement vertex 1\nproperty int v\n\
            element face 1\nproperty list uchar int idx\nend_header\n5\nnot numbers\n";
        let mut file = PlyFileReader::new(Cursor::new(text.as_bytes())).unwrap();
        file.set_read_callback("vertex", "v", 0);
        let mut visitor = Collect::default();
        file.read(&mut visitor).unwrap();
        assert_eq!(visitor.values, vec![(0, 5.0)]);
    }
}
