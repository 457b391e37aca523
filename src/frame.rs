use crate::detection::Detection;

pub struct Frame {
    pub index: u64,
    pub dims: (u32, u32), // (width, height) in px
    pub detections: Vec<Detection>,
}

impl Frame {
    #[inline]
    pub fn new(index: u64, dims: (u32, u32), detections: Vec<Detection>) -> Self {
        Self {
            index,
            dims,
            detections,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.detections.len()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Detection> {
        self.detections.iter()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }
}
