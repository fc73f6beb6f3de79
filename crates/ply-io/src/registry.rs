//! Attribute registry and read dispatch for a single decode call.
//!
//! Each registered PLY property gets an [`AttributeDescriptor`] that points at
//! a column of one shared attribute buffer. Properties of the same group
//! (`x`/`y`/`z`, `nx`/`ny`/`nz`, `red`/`green`/`blue`) share a buffer and
//! differ only in their offset; any other property gets its own `(N, 1)`
//! buffer named after itself.

use std::collections::HashMap;

use ply_core::{DataType, PlyError, PointCloud, Result, Scalar, Tensor, COLORS, NORMALS, POSITIONS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeGroup {
    Positions,
    Normals,
    Colors,
    Generic,
}

impl AttributeGroup {
    /// Group of a PLY property and the property's column within it.
    pub fn classify(property: &str) -> (AttributeGroup, usize) {
        match property {
            "x" => (AttributeGroup::Positions, 0),
            "y" => (AttributeGroup::Positions, 1),
            "z" => (AttributeGroup::Positions, 2),
            "nx" => (AttributeGroup::Normals, 0),
            "ny" => (AttributeGroup::Normals, 1),
            "nz" => (AttributeGroup::Normals, 2),
            "red" => (AttributeGroup::Colors, 0),
            "green" => (AttributeGroup::Colors, 1),
            "blue" => (AttributeGroup::Colors, 2),
            _ => (AttributeGroup::Generic, 0),
        }
    }

    /// Group of a point cloud attribute name.
    pub fn from_attribute(name: &str) -> AttributeGroup {
        match name {
            POSITIONS => AttributeGroup::Positions,
            NORMALS => AttributeGroup::Normals,
            COLORS => AttributeGroup::Colors,
            _ => AttributeGroup::Generic,
        }
    }

    pub fn width(&self) -> usize {
        match self {
            AttributeGroup::Generic => 1,
            _ => 3,
        }
    }

    /// Point cloud attribute name for a property in this group.
    pub fn attribute_name<'a>(&self, property: &'a str) -> &'a str {
        match self {
            AttributeGroup::Positions => POSITIONS,
            AttributeGroup::Normals => NORMALS,
            AttributeGroup::Colors => COLORS,
            AttributeGroup::Generic => property,
        }
    }

    /// PLY property names of a fixed group, in column order. Empty for generic.
    pub fn property_names(&self) -> &'static [&'static str] {
        match self {
            AttributeGroup::Positions => &["x", "y", "z"],
            AttributeGroup::Normals => &["nx", "ny", "nz"],
            AttributeGroup::Colors => &["red", "green", "blue"],
            AttributeGroup::Generic => &[],
        }
    }
}

type StoreFn = fn(&mut Tensor, usize, f64) -> Result<()>;

fn store<T: Scalar>(tensor: &mut Tensor, index: usize, value: f64) -> Result<()> {
    let value: T = num_traits::cast(value).ok_or_else(|| {
        PlyError::InvalidValue(format!("{} does not fit in {}", value, T::DATA_TYPE))
    })?;
    tensor.set(index, value)
}

fn store_fn(dtype: DataType) -> Option<StoreFn> {
    match dtype {
        DataType::UInt8 => Some(store::<u8> as StoreFn),
        DataType::UInt16 => Some(store::<u16> as StoreFn),
        DataType::Int32 => Some(store::<i32> as StoreFn),
        DataType::Float32 => Some(store::<f32> as StoreFn),
        DataType::Float64 => Some(store::<f64> as StoreFn),
        _ => None,
    }
}

/// Bookkeeping for one registered property.
#[derive(Debug, Clone)]
pub struct AttributeDescriptor {
    pub property: String,
    pub attribute: String,
    pub group_width: usize,
    pub offset: usize,
    pub expected_count: usize,
    pub consumed_count: usize,
    slot: usize,
    store: StoreFn,
}

#[derive(Debug)]
struct AttributeBuffer {
    name: String,
    tensor: Tensor,
}

#[derive(Debug)]
pub struct AttributeRegistry {
    element: String,
    descriptors: Vec<AttributeDescriptor>,
    by_name: HashMap<String, usize>,
    buffers: Vec<AttributeBuffer>,
}

impl AttributeRegistry {
    pub fn new(element: &str) -> Self {
        Self {
            element: element.to_string(),
            descriptors: Vec::new(),
            by_name: HashMap::new(),
            buffers: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn descriptor(&self, id: usize) -> Option<&AttributeDescriptor> {
        self.descriptors.get(id)
    }

    pub fn descriptor_by_name(&self, property: &str) -> Option<&AttributeDescriptor> {
        self.by_name.get(property).map(|&id| &self.descriptors[id])
    }

    /// Creates a descriptor for `property`, allocating its group's buffer on
    /// first sight. Returns the descriptor id.
    pub fn register(&mut self, property: &str, dtype: DataType, expected_count: usize) -> Result<usize> {
        if self.by_name.contains_key(property) {
            return Err(PlyError::InvalidHeader(format!(
                "property '{}' declared twice on element '{}'",
                property, self.element
            )));
        }
        let store = store_fn(dtype).ok_or_else(|| PlyError::UnsupportedDataType {
            attribute: property.to_string(),
            dtype: dtype.to_string(),
        })?;

        let (group, offset) = AttributeGroup::classify(property);
        if group == AttributeGroup::Generic && AttributeGroup::from_attribute(property) != AttributeGroup::Generic {
            return Err(PlyError::InvalidHeader(format!(
                "property '{}' uses a reserved attribute name",
                property
            )));
        }
        let attribute = group.attribute_name(property);
        let group_width = group.width();

        let slot = match self.buffers.iter().position(|b| b.name == attribute) {
            Some(slot) => {
                let buffer = &self.buffers[slot];
                if buffer.tensor.dtype() != dtype {
                    return Err(PlyError::TypeMismatch(format!(
                        "property '{}' is {} but '{}' is stored as {}",
                        property,
                        dtype,
                        attribute,
                        buffer.tensor.dtype()
                    )));
                }
                slot
            }
            None => {
                let tensor = Tensor::try_empty(&[expected_count, group_width], dtype).map_err(|err| {
                    PlyError::InvalidHeader(format!(
                        "element '{}' declares {} rows: {}",
                        self.element, expected_count, err
                    ))
                })?;
                self.buffers.push(AttributeBuffer {
                    name: attribute.to_string(),
                    tensor,
                });
                self.buffers.len() - 1
            }
        };

        let id = self.descriptors.len();
        tracing::debug!(
            property,
            attribute,
            id,
            offset,
            group_width,
            "registered PLY property"
        );
        self.descriptors.push(AttributeDescriptor {
            property: property.to_string(),
            attribute: attribute.to_string(),
            group_width,
            offset,
            expected_count,
            consumed_count: 0,
            slot,
            store,
        });
        self.by_name.insert(property.to_string(), id);
        Ok(id)
    }

    /// Fails if the stream will deliver a different number of values for a
    /// property than its element declares.
    pub fn check_cardinality(&self, id: usize, property_count: usize) -> Result<()> {
        let descriptor = self.lookup(id)?;
        if property_count != descriptor.expected_count {
            return Err(PlyError::CardinalityMismatch {
                property: descriptor.property.clone(),
                element: self.element.clone(),
                property_count,
                element_count: descriptor.expected_count,
            });
        }
        Ok(())
    }

    /// Stores one decoded value for descriptor `id`.
    ///
    /// Values past `expected_count` are dropped without error.
    pub fn dispatch(&mut self, id: usize, value: f64) -> Result<()> {
        let descriptor = self
            .descriptors
            .get_mut(id)
            .ok_or_else(|| PlyError::InvalidParameter(format!("no descriptor with id {}", id)))?;
        if descriptor.consumed_count >= descriptor.expected_count {
            return Ok(());
        }
        let index = descriptor.group_width * descriptor.consumed_count + descriptor.offset;
        (descriptor.store)(&mut self.buffers[descriptor.slot].tensor, index, value)?;
        descriptor.consumed_count += 1;
        Ok(())
    }

    /// Hands the filled buffers over as point attributes, in the order their
    /// groups were first seen. Fails if any property came up short.
    pub fn into_point_cloud(self) -> Result<PointCloud> {
        for descriptor in &self.descriptors {
            if descriptor.consumed_count != descriptor.expected_count {
                return Err(PlyError::CardinalityMismatch {
                    property: descriptor.property.clone(),
                    element: self.element.clone(),
                    property_count: descriptor.consumed_count,
                    element_count: descriptor.expected_count,
                });
            }
        }
        let mut cloud = PointCloud::new();
        for buffer in self.buffers {
            cloud.set_point_attr(buffer.name, buffer.tensor);
        }
        Ok(cloud)
    }

    fn lookup(&self, id: usize) -> Result<&AttributeDescriptor> {
        self.descriptors
            .get(id)
            .ok_or_else(|| PlyError::InvalidParameter(format!("no descriptor with id {}", id)))
    }
}
