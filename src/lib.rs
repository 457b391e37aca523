pub mod bbox;
pub mod config;
pub mod curve;
pub mod detection;
pub mod error;
pub mod frame;
pub mod math;
pub mod orientation;
pub mod region;
pub mod session;
pub mod tracker;

mod history;
mod track;

pub use config::{BoundaryConfig, SessionConfig};
pub use curve::{BoundaryCurve, Side};
pub use detection::{Detection, TrackId};
pub use frame::Frame;
pub use history::History;
pub use orientation::{CalibrationDiagnostics, Orientation, OrientationResult};
pub use region::{InDirection, InsideRegion, RegionBuilder, RegionDiagnostics, RegionStrategy};
pub use session::{CountingSession, FrameReport, SessionState, Totals};
pub use track::Track;
pub use tracker::{CrossingEvent, Direction};

use error::Error;
use std::rc::Rc;

pub trait Counting {
    fn update(&mut self, frames: &[Frame]) -> Result<Vec<CrossingEvent>, error::Error>;
    fn totals(&self) -> Totals;
    fn tracks(&self) -> Rc<[Track]>;
}

impl crate::Counting for CountingSession {
    fn update(&mut self, frames: &[Frame]) -> Result<Vec<CrossingEvent>, Error> {
        let mut events = Vec::new();
        for frame in frames {
            events.extend(self.process_frame(frame)?.events);
        }
        Ok(events)
    }

    #[inline]
    fn totals(&self) -> Totals {
        CountingSession::totals(self)
    }

    #[inline]
    fn tracks(&self) -> Rc<[Track]> {
        CountingSession::tracks(self).into_boxed_slice().into()
    }
}
