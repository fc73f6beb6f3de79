use crate::tensor::Tensor;

pub const POSITIONS: &str = "positions";
pub const NORMALS: &str = "normals";
pub const COLORS: &str = "colors";

/// A point cloud stored as a table of named per-point tensors.
///
/// `positions`, `normals` and `colors` are `(N, 3)` by convention; any other
/// attribute is free-form. Iteration follows insertion order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PointCloud {
    attributes: Vec<(String, Tensor)>,
}

impl PointCloud {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an attribute. A replaced attribute keeps its slot.
    pub fn set_point_attr(&mut self, name: impl Into<String>, value: Tensor) {
        let name = name.into();
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn point_attr(&self, name: &str) -> Option<&Tensor> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t)
    }

    pub fn remove_point_attr(&mut self, name: &str) -> Option<Tensor> {
        let pos = self.attributes.iter().position(|(n, _)| n == name)?;
        Some(self.attributes.remove(pos).1)
    }

    pub fn has_point_attr(&self, name: &str) -> bool {
        self.point_attr(name).is_some()
    }

    pub fn set_point_positions(&mut self, value: Tensor) {
        self.set_point_attr(POSITIONS, value);
    }

    pub fn set_point_normals(&mut self, value: Tensor) {
        self.set_point_attr(NORMALS, value);
    }

    pub fn set_point_colors(&mut self, value: Tensor) {
        self.set_point_attr(COLORS, value);
    }

    pub fn point_positions(&self) -> Option<&Tensor> {
        self.point_attr(POSITIONS)
    }

    pub fn point_normals(&self) -> Option<&Tensor> {
        self.point_attr(NORMALS)
    }

    pub fn point_colors(&self) -> Option<&Tensor> {
        self.point_attr(COLORS)
    }

    pub fn has_point_positions(&self) -> bool {
        self.has_point_attr(POSITIONS)
    }

    pub fn has_point_normals(&self) -> bool {
        self.has_point_attr(NORMALS)
    }

    pub fn has_point_colors(&self) -> bool {
        self.has_point_attr(COLORS)
    }

    /// Number of points, taken from the positions attribute.
    pub fn num_points(&self) -> usize {
        self.point_positions().map(Tensor::len).unwrap_or(0)
    }

    /// True when there are no positions or the positions have zero rows.
    pub fn is_empty(&self) -> bool {
        self.num_points() == 0
    }

    pub fn num_attributes(&self) -> usize {
        self.attributes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tensor)> {
        self.attributes.iter().map(|(n, t)| (n.as_str(), t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_type::DataType;

    #[test]
    fn test_empty_cloud() {
        let pc = PointCloud::new();
        assert!(pc.is_empty());
        assert_eq!(pc.num_points(), 0);

        let mut pc = PointCloud::new();
        pc.set_point_positions(Tensor::empty(&[0, 3], DataType::Float32));
        assert!(pc.is_empty());
    }

    #[test]
    fn test_insertion_order_and_replace() {
        let mut pc = PointCloud::new();
        pc.set_point_attr("label", Tensor::from_column(&[1u8, 2]));
        pc.set_point_positions(Tensor::from_rows(&[[0.0f32; 3], [1.0; 3]]));
        pc.set_point_attr("intensity", Tensor::from_column(&[0.5f64, 0.25]));
        pc.set_point_attr("label", Tensor::from_column(&[3u8, 4]));

        let names: Vec<&str> = pc.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["label", "positions", "intensity"]);
        assert_eq!(
            pc.point_attr("label").unwrap().to_vec::<u8>().unwrap(),
            vec![3, 4]
        );
        assert_eq!(pc.num_points(), 2);
        assert!(!pc.has_point_normals());

        assert!(pc.remove_point_attr("label").is_some());
        assert!(pc.remove_point_attr("label").is_none());
        assert_eq!(pc.num_attributes(), 2);
    }
}
