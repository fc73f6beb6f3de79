//! Value emitter: declares a header, then accepts scalars one at a time in
//! element, row, property order.

use std::io::Write;

use ply_core::{PlyError, Result, Scalar};

use super::header::{ElementDecl, Encoding, Header, PlyType, PropertyDecl, PropertyKind};

pub struct PlyEmitter<W: Write> {
    writer: W,
    header: Header,
    header_written: bool,
    element: usize,
    row: usize,
    property: usize,
}

impl<W: Write> PlyEmitter<W> {
    pub fn new(writer: W, encoding: Encoding) -> Self {
        Self {
            writer,
            header: Header::new(encoding),
            header_written: false,
            element: 0,
            row: 0,
            property: 0,
        }
    }

    pub fn add_comment(&mut self, comment: &str) -> Result<()> {
        self.check_declaring()?;
        self.header.comments.push(comment.to_string());
        Ok(())
    }

    pub fn add_element(&mut self, name: &str, count: usize) -> Result<()> {
        self.check_declaring()?;
        check_identifier(name)?;
        self.header.elements.push(ElementDecl {
            name: name.to_string(),
            count,
            properties: Vec::new(),
        });
        Ok(())
    }

    /// Declares a scalar property on the most recently added element.
    pub fn add_property(&mut self, name: &str, ty: PlyType) -> Result<()> {
        self.check_declaring()?;
        check_identifier(name)?;
        if ty == PlyType::List {
            return Err(PlyError::InvalidParameter(format!(
                "list property '{}' cannot be written",
                name
            )));
        }
        let element = self.header.elements.last_mut().ok_or_else(|| {
            PlyError::InvalidParameter(format!("property '{}' declared before any element", name))
        })?;
        if element.property(name).is_some() {
            return Err(PlyError::InvalidParameter(format!(
                "duplicate property '{}' on element '{}'",
                name, element.name
            )));
        }
        element.properties.push(PropertyDecl {
            name: name.to_string(),
            kind: PropertyKind::Scalar(ty),
        });
        Ok(())
    }

    pub fn write_header(&mut self) -> Result<()> {
        self.check_declaring()?;
        self.header.write(&mut self.writer)?;
        self.header_written = true;
        self.skip_exhausted();
        Ok(())
    }

    /// Emits the next value. `T` must be the in-memory type of the property
    /// the value lands in; nothing is converted.
    pub fn write_value<T: Scalar>(&mut self, value: T) -> Result<()> {
        if !self.header_written {
            return Err(PlyError::InvalidParameter("header not written yet".into()));
        }
        let element = self
            .header
            .elements
            .get(self.element)
            .ok_or_else(|| PlyError::InvalidParameter("all declared values already written".into()))?;
        let property = &element.properties[self.property];
        let ty = property.ply_type();
        if ty.storage_type() != Some(T::DATA_TYPE) {
            return Err(PlyError::TypeMismatch(format!(
                "property '{}' is {} but got a {} value",
                property.name,
                ty,
                T::DATA_TYPE
            )));
        }
        let last_in_row = self.property + 1 == element.properties.len();

        match self.header.encoding {
            Encoding::Ascii => {
                let separator = if last_in_row { '\n' } else { ' ' };
                write!(self.writer, "{}{}", value, separator)?;
            }
            Encoding::BinaryLittleEndian => {
                let mut bytes = [0u8; 8];
                let len = T::DATA_TYPE.byte_length();
                value.write_le(&mut bytes[..len]);
                self.writer.write_all(&bytes[..len])?;
            }
        }

        self.property += 1;
        if last_in_row {
            self.property = 0;
            self.row += 1;
        }
        self.skip_exhausted();
        Ok(())
    }

    /// Flushes and hands back the writer. Fails if declared values are missing.
    pub fn finish(mut self) -> Result<W> {
        if !self.header_written {
            return Err(PlyError::InvalidParameter("header not written".into()));
        }
        if self.element < self.header.elements.len() {
            return Err(PlyError::InvalidParameter(format!(
                "element '{}' stopped at row {} of {}",
                self.header.elements[self.element].name,
                self.row,
                self.header.elements[self.element].count
            )));
        }
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn check_declaring(&self) -> Result<()> {
        if self.header_written {
            return Err(PlyError::InvalidParameter("header already written".into()));
        }
        Ok(())
    }

    /// Moves past elements that are complete or have nothing to write.
    fn skip_exhausted(&mut self) {
        while let Some(element) = self.header.elements.get(self.element) {
            if self.row < element.count && !element.properties.is_empty() {
                break;
            }
            self.element += 1;
            self.row = 0;
            self.property = 0;
        }
    }
}

pub(crate) fn check_identifier(name: &str) -> Result<()> {
    if name.is_empty() || name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(PlyError::InvalidParameter(format!("'{}' is not a valid PLY name", name)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_layout() {
        let mut emitter = PlyEmitter::new(Vec::new(), Encoding::Ascii);
        emitter.add_comment("test").unwrap();
        emitter.add_element("vertex", 2).unwrap();
        emitter.add_property("x", PlyType::Float32).unwrap();
        emitter.add_property("label", PlyType::Uint8).unwrap();
        emitter.write_header().unwrap();
        emitter.write_value(0.5f32).unwrap();
        emitter.write_value(1u8).unwrap();
        emitter.write_value(-2.0f32).unwrap();
        emitter.write_value(255u8).unwrap();
        let out = String::from_utf8(emitter.finish().unwrap()).unwrap();
        assert_eq!(
            out,
            "ply\nformat ascii 1.0\ncomment test\nelement vertex 2\n\
             property float32 x\nproperty uint8 label\nend_header\n\
             0.5 1\n-2 255\n"
        );
    }

    #[test]
    fn test_binary_layout() {
        let mut emitter = PlyEmitter::new(Vec::new(), Encoding::BinaryLittleEndian);
        emitter.add_element("vertex", 1).unwrap();
        emitter.add_property("v", PlyType::Uint16).unwrap();
        emitter.add_property("w", PlyType::Int32).unwrap();
        emitter.write_header().unwrap();
        emitter.write_value(0x0102u16).unwrap();
        emitter.write_value(-1i32).unwrap();
        let out = emitter.finish().unwrap();
        assert!(out.ends_with(b"end_header\n\x02\x01\xff\xff\xff\xff"));
    }

    #[test]
    fn test_type_is_checked() {
        let mut emitter = PlyEmitter::new(Vec::new(), Encoding::Ascii);
        emitter.add_element("vertex", 1).unwrap();
        emitter.add_property("x", PlyType::Float).unwrap();
        emitter.write_header().unwrap();
        assert!(matches!(emitter.write_value(1.0f64), Err(PlyError::TypeMismatch(_))));
        emitter.write_value(1.0f32).unwrap();
        assert!(emitter.write_value(1.0f32).is_err());
    }

    #[test]
    fn test_incomplete_stream_fails_to_finish() {
        let mut emitter = PlyEmitter::new(Vec::new(), Encoding::Ascii);
        emitter.add_element("vertex", 2).unwrap();
        emitter.add_property("x", PlyType::Int32).unwrap();
        emitter.write_header().unwrap();
        emitter.write_value(1i32).unwrap();
        assert!(emitter.finish().is_err());
    }

    #[test]
    fn test_declaration_rules() {
        let mut emitter = PlyEmitter::new(Vec::new(), Encoding::Ascii);
        assert!(emitter.add_property("x", PlyType::Int32).is_err());
        emitter.add_element("vertex", 1).unwrap();
        assert!(emitter.add_property("has space", PlyType::Int32).is_err());
        assert!(emitter.add_property("l", PlyType::List).is_err());
        emitter.add_property("x", PlyType::Int32).unwrap();
        assert!(emitter.add_property("x", PlyType::Int32).is_err());
        emitter.write_header().unwrap();
        assert!(emitter.add_comment("late").is_err());
    }
}
