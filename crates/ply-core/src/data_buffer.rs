/// Contiguous byte storage backing a tensor.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DataBuffer {
    data: Vec<u8>,
}

impl DataBuffer {
    pub fn with_size(size: usize) -> Self {
        Self {
            data: vec![0; size],
        }
    }

    /// Like [`DataBuffer::with_size`], but returns `None` instead of aborting
    /// when the allocator refuses `size` bytes.
    pub fn try_with_size(size: usize) -> Option<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(size).ok()?;
        data.resize(size, 0);
        Some(Self { data })
    }

    /// Returns `None` when the range runs past the end of the buffer.
    pub fn read(&self, byte_pos: usize, len: usize) -> Option<&[u8]> {
        self.data.get(byte_pos..byte_pos.checked_add(len)?)
    }

    /// Returns `None` when the range runs past the end of the buffer.
    pub fn slot_mut(&mut self, byte_pos: usize, len: usize) -> Option<&mut [u8]> {
        self.data.get_mut(byte_pos..byte_pos.checked_add(len)?)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}
