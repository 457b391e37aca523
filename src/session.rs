use crate::config::{BoundaryConfig, SessionConfig};
use crate::curve::BoundaryCurve;
use crate::detection::TrackId;
use crate::error::Error;
use crate::orientation::{
    CalibrationDiagnostics, Orientation, OrientationCalibrator, OrientationResult,
};
use crate::region::{InDirection, InsideRegion, RegionBuilder};
use crate::tracker::{CrossingEvent, TrackCrossingTracker};
use crate::{Frame, Track};

use log::info;
use nalgebra as na;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Calibrating,
    Operational,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Totals {
    pub in_count: u32,
    pub out_count: u32,
}

impl Totals {
    #[inline]
    fn add(&mut self, event: &CrossingEvent) {
        let (din, dout) = event.direction.deltas();
        self.in_count += din;
        self.out_count += dout;
    }
}

#[derive(Debug, Clone)]
pub struct FrameReport {
    pub frame_index: u64,
    pub state: SessionState,
    pub events: Vec<CrossingEvent>,
    pub totals: Totals,
}

/// Orchestrates calibration, region construction and per-track counting.
///
/// Anchors seen while calibrating only feed the calibrator; crossings made
/// during that window are not counted.
#[derive(Debug)]
pub struct CountingSession {
    config: SessionConfig,
    curve: BoundaryCurve,
    in_direction: InDirection,
    state: SessionState,
    calibrator: OrientationCalibrator,
    orientation: Option<OrientationResult>,
    diagnostics: Option<CalibrationDiagnostics>,
    region: Option<InsideRegion>,
    frame_size: Option<(u32, u32)>,
    tracker: TrackCrossingTracker,
    totals: Totals,
    frame_index: u64,
}

impl CountingSession {
    /// Session that calibrates its orientation from the first anchors.
    pub fn new(curve: BoundaryCurve, config: SessionConfig) -> Result<Self, Error> {
        config.validate()?;

        Ok(Self {
            calibrator: OrientationCalibrator::new(config.calibration.clone()),
            tracker: TrackCrossingTracker::new(config.gray_zone_width, config.history_capacity),
            config,
            curve,
            in_direction: InDirection::Auto,
            state: SessionState::Calibrating,
            orientation: None,
            diagnostics: None,
            region: None,
            frame_size: None,
            totals: Totals::default(),
            frame_index: 0,
        })
    }

    /// Session that skips calibration and counts from the first frame.
    pub fn with_orientation(
        curve: BoundaryCurve,
        config: SessionConfig,
        orientation: Orientation,
        in_direction: InDirection,
    ) -> Result<Self, Error> {
        let mut session = Self::new(curve, config)?;
        session.in_direction = in_direction;
        session.orientation = Some(OrientationResult::preset(orientation));
        session.state = SessionState::Operational;

        info!(
            "session operational with preset orientation {:+} (IN_direction {})",
            orientation.sign(),
            in_direction
        );

        Ok(session)
    }

    /// Session with an explicit IN direction: no calibration, and the
    /// orientation is taken from the axis-extension region once the frame
    /// size is known. `Auto` falls back to [`CountingSession::new`].
    pub fn with_direction(
        curve: BoundaryCurve,
        config: SessionConfig,
        in_direction: InDirection,
    ) -> Result<Self, Error> {
        let mut session = Self::new(curve, config)?;
        if in_direction == InDirection::Auto {
            return Ok(session);
        }

        session.in_direction = in_direction;
        session.state = SessionState::Operational;

        info!("session operational with IN_direction {}", in_direction);

        Ok(session)
    }

    /// Builds a session from a persisted boundary, reusing its explicit
    /// direction or cached orientation when there is one.
    pub fn from_boundary(
        boundary: &BoundaryConfig,
        mut config: SessionConfig,
    ) -> Result<Self, Error> {
        let curve = boundary.curve()?;
        let in_direction = boundary.direction()?;

        if let Some(depth) = boundary.region_depth {
            config.region_depth = depth;
        }

        match (in_direction, boundary.orientation) {
            (InDirection::Auto, Some(orientation)) => {
                Self::with_orientation(curve, config, orientation, InDirection::Auto)
            }
            (InDirection::Auto, None) => Self::new(curve, config),
            (direction, _) => Self::with_direction(curve, config, direction),
        }
    }

    #[inline]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[inline]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[inline]
    pub fn curve(&self) -> &BoundaryCurve {
        &self.curve
    }

    #[inline]
    pub fn in_direction(&self) -> InDirection {
        self.in_direction
    }

    #[inline]
    pub fn totals(&self) -> Totals {
        self.totals
    }

    #[inline]
    pub fn orientation(&self) -> Option<&OrientationResult> {
        self.orientation.as_ref()
    }

    /// Calibration diagnostics; `None` for preset or still-calibrating sessions.
    #[inline]
    pub fn diagnostics(&self) -> Option<&CalibrationDiagnostics> {
        self.diagnostics.as_ref()
    }

    /// Available once operational and a frame size has been seen.
    #[inline]
    pub fn inside_region(&self) -> Option<&InsideRegion> {
        self.region.as_ref()
    }

    #[inline]
    pub fn tracker(&self) -> &TrackCrossingTracker {
        &self.tracker
    }

    pub fn tracks(&self) -> Vec<Track> {
        let mut tracks: Vec<Track> = self
            .tracker
            .iter()
            .map(|(id, state)| Track::new(*id, state))
            .collect();

        tracks.sort_by_key(|t| t.track_id);
        tracks
    }

    pub fn process_frame(&mut self, frame: &Frame) -> Result<FrameReport, Error> {
        self.frame_index = frame.index;
        self.frame_size = Some(frame.dims);

        let mut events = Vec::new();

        match self.state {
            SessionState::Calibrating => {
                for det in frame.iter() {
                    self.calibrator.push(det.anchor());
                }

                if self.calibrator.is_ready() {
                    self.finish_calibration()?;
                }
            }
            SessionState::Operational => {
                self.ensure_orientation();
                self.ensure_region()?;

                for det in frame.iter() {
                    if let Some(event) = self.count(det.track_id, det.anchor()) {
                        events.push(event);
                    }
                }
            }
        }

        if let Some(ttl) = self.config.track_ttl_frames {
            self.tracker.evict_stale(frame.index, ttl);
        }

        Ok(FrameReport {
            frame_index: frame.index,
            state: self.state,
            events,
            totals: self.totals,
        })
    }

    /// Single-anchor entry point, for callers without frame batches. Uses the
    /// frame index of the last processed frame.
    pub fn observe(
        &mut self,
        track_id: TrackId,
        anchor: na::Point2<f32>,
    ) -> Result<Option<CrossingEvent>, Error> {
        match self.state {
            SessionState::Calibrating => {
                self.calibrator.push(anchor);
                if self.calibrator.is_ready() {
                    self.finish_calibration()?;
                }
                Ok(None)
            }
            SessionState::Operational => Ok(self.count(track_id, anchor)),
        }
    }

    /// Forgets a track the external tracker reported as ended.
    pub fn end_track(&mut self, track_id: TrackId) -> bool {
        self.tracker.end_track(track_id).is_some()
    }

    /// Changes the region depth and rebuilds the inside region.
    pub fn set_region_depth(&mut self, region_depth: f32) -> Result<(), Error> {
        let mut config = self.config.clone();
        config.region_depth = region_depth;
        config.validate()?;
        self.config = config;

        self.region = None;
        self.ensure_region()
    }

    fn count(&mut self, track_id: TrackId, anchor: na::Point2<f32>) -> Option<CrossingEvent> {
        self.ensure_orientation();

        let orientation = self
            .orientation
            .map(|o| o.orientation)
            .unwrap_or_default();

        let event = self.tracker.observe(
            track_id,
            anchor,
            self.frame_index,
            &self.curve,
            orientation,
        )?;

        self.totals.add(&event);
        Some(event)
    }

    fn finish_calibration(&mut self) -> Result<(), Error> {
        let (result, diag) = self.calibrator.finish(&self.curve);
        self.diagnostics = Some(diag.clone());
        self.orientation = Some(result);
        self.state = SessionState::Operational;

        info!(
            "session operational after calibration (orientation {:+}, resolved {})",
            result.orientation.sign(),
            result.resolved
        );

        self.ensure_region()
    }

    /// Fixes the orientation of an explicit-direction session; the first
    /// frame size seen decides it, or the curve's extent without one.
    fn ensure_orientation(&mut self) {
        if self.orientation.is_some() {
            return;
        }

        if let Some(orientation) = self.in_direction.orientation_for(&self.curve, self.frame_size) {
            info!(
                "orientation {:+} derived from IN_direction {}",
                orientation.sign(),
                self.in_direction
            );
            self.orientation = Some(OrientationResult::preset(orientation));
        }
    }

    fn ensure_region(&mut self) -> Result<(), Error> {
        if self.region.is_some() {
            return Ok(());
        }

        let (frame_size, result) = match (self.frame_size, self.orientation) {
            (Some(size), Some(result)) => (size, result),
            _ => return Ok(()),
        };

        let builder = match self.in_direction {
            InDirection::Auto => {
                RegionBuilder::normal_offset(Some(result.orientation).filter(|_| result.resolved))
                    .clipped(self.config.clip_region)
            }
            direction => RegionBuilder::axis_extension(direction),
        };

        self.region = Some(builder.build(&self.curve, frame_size, self.config.region_depth)?);
        Ok(())
    }
}
