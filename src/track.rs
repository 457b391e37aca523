use crate::curve::Side;
use crate::detection::TrackId;
use crate::tracker::{Direction, TrackState};
use nalgebra as na;

/// Read-only view of one track, for overlays and reporting.
#[derive(Debug, Clone)]
pub struct Track {
    pub track_id: TrackId,

    // oriented classification of the latest anchor
    pub side: Side,

    pub counted: Option<Direction>,

    pub anchor: Option<na::Point2<f32>>,
    pub history_len: usize,
    pub last_seen_frame: u64,
}

impl Track {
    pub fn new(track_id: TrackId, state: &TrackState) -> Self {
        Self {
            track_id,
            side: state.side,
            counted: state.counted,
            anchor: state.history.last(),
            history_len: state.history.len(),
            last_seen_frame: state.last_seen_frame,
        }
    }

    #[inline]
    pub fn is_counted(&self) -> bool {
        self.counted.is_some()
    }
}
