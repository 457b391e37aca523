use crate::curve::{BoundaryCurve, Side};
use crate::detection::TrackId;
use crate::history::History;
use crate::orientation::Orientation;

use log::{debug, info};
use nalgebra as na;
use serde_derive::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    /// `(in_delta, out_delta)` contributed by this event.
    #[inline]
    pub fn deltas(self) -> (u32, u32) {
        match self {
            Direction::In => (1, 0),
            Direction::Out => (0, 1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossingEvent {
    pub track_id: TrackId,
    pub direction: Direction,
    pub frame_index: u64,
    pub anchor: na::Point2<f32>,
    /// The straight path from the previous anchor intersects the curve.
    /// `false` when the track jumped around an endpoint or reappeared after
    /// a gray-zone stretch.
    pub path_crossed: bool,
}

#[derive(Debug, Clone)]
pub struct TrackState {
    /// Last non-neutral oriented side; `None` until one is seen.
    pub last_side: Option<Side>,
    /// Classification of the most recent anchor, gray zone included.
    pub side: Side,
    /// Terminal latch: set once, never cleared.
    pub counted: Option<Direction>,
    pub history: History,
    pub first_seen_frame: u64,
    pub last_seen_frame: u64,
}

impl TrackState {
    fn new(frame_index: u64, history_capacity: Option<usize>) -> Self {
        Self {
            last_side: None,
            side: Side::Neutral,
            counted: None,
            history: History::new(history_capacity),
            first_seen_frame: frame_index,
            last_seen_frame: frame_index,
        }
    }

    #[inline]
    pub fn is_counted(&self) -> bool {
        self.counted.is_some()
    }
}

/// Per-identity crossing state machine.
///
/// A track fires at most one event over its lifetime: the first confident
/// sign change of its oriented side. Positive to negative is IN, negative to
/// positive is OUT.
#[derive(Debug, Clone)]
pub struct TrackCrossingTracker {
    states: HashMap<TrackId, TrackState>,
    gray_zone_width: f32,
    history_capacity: Option<usize>,
}

impl TrackCrossingTracker {
    pub fn new(gray_zone_width: f32, history_capacity: Option<usize>) -> Self {
        Self {
            states: HashMap::new(),
            gray_zone_width,
            history_capacity,
        }
    }

    pub fn observe(
        &mut self,
        track_id: TrackId,
        anchor: na::Point2<f32>,
        frame_index: u64,
        curve: &BoundaryCurve,
        orientation: Orientation,
    ) -> Option<CrossingEvent> {
        let history_capacity = self.history_capacity;
        let state = self.states.entry(track_id).or_insert_with(|| {
            debug!("track {} first seen at frame {}", track_id, frame_index);
            TrackState::new(frame_index, history_capacity)
        });

        let prev_anchor = state.history.last();
        state.history.push(anchor);
        state.last_seen_frame = frame_index;

        let side = curve
            .classify_side(anchor, self.gray_zone_width)
            .oriented(orientation);
        state.side = side;

        let mut event = None;

        if let (Some(last), false, None) = (state.last_side, side.is_neutral(), state.counted) {
            let direction = match (last, side) {
                (Side::Positive, Side::Negative) => Some(Direction::In),
                (Side::Negative, Side::Positive) => Some(Direction::Out),
                _ => None,
            };

            if let Some(direction) = direction {
                state.counted = Some(direction);

                let path_crossed = prev_anchor
                    .map(|prev| curve.crosses_path(prev, anchor))
                    .unwrap_or(false);

                info!(
                    "track {} crossed {:?} at frame {} ({:.1}, {:.1})",
                    track_id, direction, frame_index, anchor.x, anchor.y
                );

                event = Some(CrossingEvent {
                    track_id,
                    direction,
                    frame_index,
                    anchor,
                    path_crossed,
                });
            }
        }

        if !side.is_neutral() {
            state.last_side = Some(side);
        }

        event
    }

    #[inline]
    pub fn get(&self, track_id: TrackId) -> Option<&TrackState> {
        self.states.get(&track_id)
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&TrackId, &TrackState)> {
        self.states.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Drops a track the external tracker reported as ended.
    pub fn end_track(&mut self, track_id: TrackId) -> Option<TrackState> {
        let removed = self.states.remove(&track_id);
        if removed.is_some() {
            debug!("track {} ended", track_id);
        }
        removed
    }

    /// Drops every track not observed within `ttl` frames of `frame_index`.
    pub fn evict_stale(&mut self, frame_index: u64, ttl: u64) -> usize {
        let before = self.states.len();

        self.states.retain(|id, s| {
            let keep = frame_index.saturating_sub(s.last_seen_frame) <= ttl;
            if !keep {
                debug!("track {} evicted, last seen at frame {}", id, s.last_seen_frame);
            }
            keep
        });

        before - self.states.len()
    }
}
