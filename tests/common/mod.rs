#![allow(dead_code)]

use curve_counter::{BoundaryCurve, Detection, Frame, SessionConfig, TrackId};

pub const FRAME_SIZE: (u32, u32) = (960, 480);

pub fn entrance_points() -> Vec<[f32; 2]> {
    vec![
        [461.0, 373.0],
        [474.0, 412.0],
        [508.0, 424.0],
        [547.0, 424.0],
        [591.0, 424.0],
        [635.0, 427.0],
        [661.0, 423.0],
        [705.0, 390.0],
        [704.0, 370.0],
    ]
}

pub fn entrance() -> BoundaryCurve {
    BoundaryCurve::from_pairs(&entrance_points()).unwrap()
}

/// Anchors of one person walking up across the entrance curve. The first
/// thirteen lie below it, the rest above.
pub fn walk_in() -> Vec<[f32; 2]> {
    vec![
        [392.0, 438.0],
        [397.0, 438.0],
        [401.0, 437.0],
        [409.0, 436.0],
        [421.0, 436.0],
        [434.0, 435.0],
        [446.0, 434.0],
        [443.0, 434.0],
        [454.0, 434.0],
        [464.0, 433.0],
        [473.0, 430.0],
        [482.0, 429.0],
        [502.0, 426.0],
        [514.0, 423.0],
        [520.0, 420.0],
        [528.0, 417.0],
        [536.0, 416.0],
        [540.0, 414.0],
        [545.0, 413.0],
        [554.0, 414.0],
        [564.0, 414.0],
        [573.0, 413.0],
        [580.0, 413.0],
        [585.0, 414.0],
        [589.0, 414.0],
        [593.0, 413.0],
        [597.0, 413.0],
        [601.0, 412.0],
        [605.0, 409.0],
        [608.0, 407.0],
        [614.0, 408.0],
    ]
}

/// Index into `walk_in()` of the first anchor past the curve.
pub const WALK_IN_CROSSING: usize = 13;

/// Box whose bottom-center is `(x, y)`.
pub fn det(track_id: TrackId, [x, y]: [f32; 2]) -> Detection {
    Detection::new(track_id, [x - 12.0, y - 80.0, x + 12.0, y])
}

/// One frame per anchor, single track, starting at `first_index`.
pub fn frames(track_id: TrackId, path: &[[f32; 2]], first_index: u64) -> Vec<Frame> {
    path.iter()
        .enumerate()
        .map(|(i, p)| Frame::new(first_index + i as u64, FRAME_SIZE, vec![det(track_id, *p)]))
        .collect()
}

pub fn config(min_samples: usize, min_crossings: usize) -> SessionConfig {
    let mut config = SessionConfig::default();
    config.calibration.min_samples = min_samples;
    config.calibration.min_crossings = min_crossings;
    config
}

/// Small deterministic generator for reproducible random walks.
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Uniform in `[0, 1)`.
    pub fn next_f32(&mut self) -> f32 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.0 >> 40) as f32) / ((1u64 << 24) as f32)
    }
}
