use serde_derive::{Deserialize, Serialize};

use crate::bbox::{BBox, Ltrb};
use nalgebra as na;

/// Stable identity assigned by the external tracker.
pub type TrackId = u64;

/// One tracked object in one frame: its identity and `[x1, y1, x2, y2]` box.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    #[serde(rename = "id")]
    pub track_id: TrackId,
    pub bbox: [f32; 4],
}

impl Detection {
    #[inline]
    pub fn new(track_id: TrackId, bbox: [f32; 4]) -> Self {
        Self { track_id, bbox }
    }

    #[inline(always)]
    pub fn bbox(&self) -> BBox<Ltrb> {
        BBox::ltrb(self.bbox[0], self.bbox[1], self.bbox[2], self.bbox[3])
    }

    #[inline]
    pub fn anchor(&self) -> na::Point2<f32> {
        self.bbox().anchor()
    }
}
