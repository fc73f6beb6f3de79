//! PLY header model: format line, comments, elements and their properties.

use std::fmt;
use std::io::{BufRead, Write};

use ply_core::{DataType, PlyError, Result};

/// Scalar type names accepted in `property` declarations.
///
/// PLY has two spelling families (`uint8` and `uchar` name the same wire
/// layout); both are kept distinct so diagnostics can echo what the file said.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlyType {
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Float32,
    Float64,
    Char,
    Uchar,
    Short,
    Ushort,
    Int,
    Uint,
    Float,
    Double,
    List,
}

impl PlyType {
    pub fn from_name(name: &str) -> Option<PlyType> {
        let ty = match name {
            "int8" => PlyType::Int8,
            "uint8" => PlyType::Uint8,
            "int16" => PlyType::Int16,
            "uint16" => PlyType::Uint16,
            "int32" => PlyType::Int32,
            "uint32" => PlyType::Uint32,
            "float32" => PlyType::Float32,
            "float64" => PlyType::Float64,
            "char" => PlyType::Char,
            "uchar" => PlyType::Uchar,
            "short" => PlyType::Short,
            "ushort" => PlyType::Ushort,
            "int" => PlyType::Int,
            "uint" => PlyType::Uint,
            "float" => PlyType::Float,
            "double" => PlyType::Double,
            _ => return None,
        };
        Some(ty)
    }

    pub fn name(&self) -> &'static str {
        match self {
            PlyType::Int8 => "int8",
            PlyType::Uint8 => "uint8",
            PlyType::Int16 => "int16",
            PlyType::Uint16 => "uint16",
            PlyType::Int32 => "int32",
            PlyType::Uint32 => "uint32",
            PlyType::Float32 => "float32",
            PlyType::Float64 => "float64",
            PlyType::Char => "char",
            PlyType::Uchar => "uchar",
            PlyType::Short => "short",
            PlyType::Ushort => "ushort",
            PlyType::Int => "int",
            PlyType::Uint => "uint",
            PlyType::Float => "float",
            PlyType::Double => "double",
            PlyType::List => "list",
        }
    }

    /// Folds the classic spellings onto the sized ones.
    pub fn sized(&self) -> PlyType {
        match self {
            PlyType::Char => PlyType::Int8,
            PlyType::Uchar => PlyType::Uint8,
            PlyType::Short => PlyType::Int16,
            PlyType::Ushort => PlyType::Uint16,
            PlyType::Int => PlyType::Int32,
            PlyType::Uint => PlyType::Uint32,
            PlyType::Float => PlyType::Float32,
            PlyType::Double => PlyType::Float64,
            other => *other,
        }
    }

    /// In-memory type with the same layout as one wire value. `None` for lists.
    pub fn storage_type(&self) -> Option<DataType> {
        let dtype = match self.sized() {
            PlyType::Int8 => DataType::Int8,
            PlyType::Uint8 => DataType::UInt8,
            PlyType::Int16 => DataType::Int16,
            PlyType::Uint16 => DataType::UInt16,
            PlyType::Int32 => DataType::Int32,
            PlyType::Uint32 => DataType::UInt32,
            PlyType::Float32 => DataType::Float32,
            PlyType::Float64 => DataType::Float64,
            _ => return None,
        };
        Some(dtype)
    }
}

impl fmt::Display for PlyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Ascii,
    BinaryLittleEndian,
}

impl Encoding {
    fn keyword(&self) -> &'static str {
        match self {
            Encoding::Ascii => "ascii",
            Encoding::BinaryLittleEndian => "binary_little_endian",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Scalar(PlyType),
    List { count: PlyType, item: PlyType },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDecl {
    pub name: String,
    pub kind: PropertyKind,
}

impl PropertyDecl {
    /// The declared scalar type, or [`PlyType::List`] for list properties.
    pub fn ply_type(&self) -> PlyType {
        match self.kind {
            PropertyKind::Scalar(ty) => ty,
            PropertyKind::List { .. } => PlyType::List,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementDecl {
    pub name: String,
    pub count: usize,
    pub properties: Vec<PropertyDecl>,
}

impl ElementDecl {
    pub fn property(&self, name: &str) -> Option<(usize, &PropertyDecl)> {
        self.properties
            .iter()
            .enumerate()
            .find(|(_, p)| p.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub encoding: Encoding,
    pub comments: Vec<String>,
    pub obj_info: Vec<String>,
    pub elements: Vec<ElementDecl>,
}

impl Header {
    pub fn new(encoding: Encoding) -> Self {
        Self {
            encoding,
            comments: Vec::new(),
            obj_info: Vec::new(),
            elements: Vec::new(),
        }
    }

    /// First element with the given name, in file order.
    pub fn element(&self, name: &str) -> Option<(usize, &ElementDecl)> {
        self.elements
            .iter()
            .enumerate()
            .find(|(_, e)| e.name == name)
    }

    /// Parses everything up to and including `end_header`, leaving the
    /// reader positioned on the first data byte.
    pub fn parse<R: BufRead>(reader: &mut R) -> Result<Self> {
        let mut line = String::new();
        if read_header_line(reader, &mut line)? != Some("ply") {
            return Err(PlyError::InvalidHeader("missing 'ply' magic".into()));
        }

        let encoding = match read_header_line(reader, &mut line)? {
            Some(format_line) => parse_format_line(format_line)?,
            None => return Err(PlyError::InvalidHeader("missing format line".into())),
        };

        let mut header = Header::new(encoding);
        loop {
            let text = read_header_line(reader, &mut line)?
                .ok_or_else(|| PlyError::InvalidHeader("missing end_header".into()))?;
            let (keyword, rest) = split_keyword(text);
            match keyword {
                "end_header" => break,
                "" => {}
                "comment" => header.comments.push(rest.to_string()),
                "obj_info" => header.obj_info.push(rest.to_string()),
                "element" => header.elements.push(parse_element(rest)?),
                "property" => {
                    let property = parse_property(rest)?;
                    let element = header.elements.last_mut().ok_or_else(|| {
                        PlyError::InvalidHeader(format!(
                            "property '{}' declared before any element",
                            property.name
                        ))
                    })?;
                    element.properties.push(property);
                }
                other => {
                    return Err(PlyError::InvalidHeader(format!(
                        "unknown header keyword '{}'",
                        other
                    )))
                }
            }
        }
        Ok(header)
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writeln!(writer, "ply")?;
        writeln!(writer, "format {} 1.0", self.encoding.keyword())?;
        for comment in &self.comments {
            writeln!(writer, "comment {}", comment)?;
        }
        for info in &self.obj_info {
            writeln!(writer, "obj_info {}", info)?;
        }
        for element in &self.elements {
            writeln!(writer, "element {} {}", element.name, element.count)?;
            for property in &element.properties {
                match property.kind {
                    PropertyKind::Scalar(ty) => {
                        writeln!(writer, "property {} {}", ty, property.name)?
                    }
                    PropertyKind::List { count, item } => {
                        writeln!(writer, "property list {} {} {}", count, item, property.name)?
                    }
                }
            }
        }
        writeln!(writer, "end_header")?;
        Ok(())
    }
}

/// Reads one header line, trimmed. `None` at end of input.
fn read_header_line<'a, R: BufRead>(reader: &mut R, line: &'a mut String) -> Result<Option<&'a str>> {
    line.clear();
    if reader.read_line(line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim()))
}

fn split_keyword(text: &str) -> (&str, &str) {
    match text.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword, rest.trim()),
        None => (text, ""),
    }
}

fn parse_format_line(text: &str) -> Result<Encoding> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() != 3 || tokens[0] != "format" {
        return Err(PlyError::InvalidHeader(format!("bad format line '{}'", text)));
    }
    if tokens[2] != "1.0" {
        return Err(PlyError::UnsupportedFormat(format!("version {}", tokens[2])));
    }
    match tokens[1] {
        "ascii" => Ok(Encoding::Ascii),
        "binary_little_endian" => Ok(Encoding::BinaryLittleEndian),
        other => Err(PlyError::UnsupportedFormat(other.to_string())),
    }
}

fn parse_element(rest: &str) -> Result<ElementDecl> {
    let tokens: Vec<&str> = rest.split_whitespace().collect();
    if tokens.len() != 2 {
        return Err(PlyError::InvalidHeader(format!("bad element line '{}'", rest)));
    }
    let count = tokens[1].parse().map_err(|_| {
        PlyError::InvalidHeader(format!("bad count for element '{}'", tokens[0]))
    })?;
    Ok(ElementDecl {
        name: tokens[0].to_string(),
        count,
        properties: Vec::new(),
    })
}

fn parse_property(rest: &str) -> Result<PropertyDecl> {
    let scalar_type = |name: &str| {
        PlyType::from_name(name)
            .ok_or_else(|| PlyError::InvalidHeader(format!("unknown property type '{}'", name)))
    };
    let tokens: Vec<&str> = rest.split_whitespace().collect();
    match tokens.as_slice() {
        ["list", count, item, name] => Ok(PropertyDecl {
            name: name.to_string(),
            kind: PropertyKind::List {
                count: scalar_type(*count)?,
                item: scalar_type(*item)?,
            },
        }),
        [ty, name] => Ok(PropertyDecl {
            name: name.to_string(),
            kind: PropertyKind::Scalar(scalar_type(*ty)?),
        }),
        _ => Err(PlyError::InvalidHeader(format!("bad property line '{}'", rest))),
    }
}
