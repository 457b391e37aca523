use crate::curve::BoundaryCurve;
use crate::error::Error;
use crate::orientation::{CalibrationDiagnostics, CalibrationParams, Orientation, OrientationResult};
use crate::region::{InDirection, InsideRegion, RegionDiagnostics};

use log::{info, warn};
use serde_derive::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Thresholds for one counting session.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    pub calibration: CalibrationParams,
    /// Anchors closer to the curve than this (px) are neither side; 0 disables.
    pub gray_zone_width: f32,
    /// Normal-offset depth of the inside region (px).
    pub region_depth: f32,
    /// Clamp the inside region to the frame.
    pub clip_region: bool,
    /// Anchors kept per track; `None` keeps all of them.
    pub history_capacity: Option<usize>,
    /// Evict tracks unseen for this many frames; `None` keeps them forever.
    pub track_ttl_frames: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            calibration: CalibrationParams::default(),
            gray_zone_width: 0.0,
            region_depth: 50.0,
            clip_region: true,
            history_capacity: Some(64),
            track_ttl_frames: None,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), Error> {
        let eps = self.calibration.eps;
        if !eps.is_finite() || eps < 0.0 {
            return Err(Error::Configuration(format!(
                "calibration eps must be a non-negative number, got {}",
                eps
            )));
        }

        if self.calibration.min_samples == 0 {
            return Err(Error::Configuration("min_samples must be at least 1".into()));
        }

        if !self.gray_zone_width.is_finite() || self.gray_zone_width < 0.0 {
            return Err(Error::Configuration(format!(
                "gray zone width must be a non-negative number, got {}",
                self.gray_zone_width
            )));
        }

        if !self.region_depth.is_finite() || self.region_depth <= 0.0 {
            return Err(Error::Configuration(format!(
                "region depth must be positive, got {}",
                self.region_depth
            )));
        }

        if self.history_capacity == Some(0) {
            return Err(Error::Configuration(
                "history capacity must be at least 1 when set".into(),
            ));
        }

        Ok(())
    }
}

fn default_in_direction() -> String {
    InDirection::Auto.to_string()
}

/// Persisted boundary: the curve plus whatever a previous calibration produced.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BoundaryConfig {
    pub curve_points: Vec<[f32; 2]>,

    #[serde(rename = "IN_direction", default = "default_in_direction")]
    pub in_direction: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_depth: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation_diagnostics: Option<CalibrationDiagnostics>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inside_region: Option<Vec<[f32; 2]>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_diagnostics: Option<RegionDiagnostics>,
}

impl BoundaryConfig {
    pub fn new(curve_points: Vec<[f32; 2]>) -> Self {
        Self {
            curve_points,
            in_direction: default_in_direction(),
            orientation: None,
            region_depth: None,
            orientation_diagnostics: None,
            inside_region: None,
            region_diagnostics: None,
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;

        if config.curve_points.len() < 2 {
            warn!(
                "boundary config {} has {} curve points",
                path.display(),
                config.curve_points.len()
            );
        }

        info!("loaded boundary config from {}", path.display());
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!("saved boundary config to {}", path.display());
        Ok(())
    }

    #[inline]
    pub fn curve(&self) -> Result<BoundaryCurve, Error> {
        BoundaryCurve::from_pairs(&self.curve_points)
    }

    #[inline]
    pub fn direction(&self) -> Result<InDirection, Error> {
        self.in_direction.parse()
    }

    /// Orientation usable without calibrating: an explicit direction wins,
    /// then a cached calibration result. An explicit direction is resolved
    /// against the curve and `frame_size`, see [`InDirection::orientation_for`].
    pub fn preset_orientation(
        &self,
        frame_size: Option<(u32, u32)>,
    ) -> Result<Option<Orientation>, Error> {
        let direction = self.direction()?;
        if direction == InDirection::Auto {
            return Ok(self.orientation);
        }

        Ok(direction.orientation_for(&self.curve()?, frame_size))
    }

    /// Stores a calibration outcome. A defaulted orientation is not cached so
    /// that the next run calibrates again.
    pub fn record_calibration(
        &mut self,
        result: &OrientationResult,
        diagnostics: &CalibrationDiagnostics,
    ) {
        self.orientation = if result.resolved {
            Some(result.orientation)
        } else {
            None
        };
        self.orientation_diagnostics = Some(diagnostics.clone());
    }

    pub fn record_region(&mut self, region: &InsideRegion) {
        self.inside_region = Some(region.to_pairs());
        self.region_depth = Some(region.depth());
        self.region_diagnostics = Some(region.diagnostics());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::RegionBuilder;

    #[test]
    fn defaults_are_valid() {
        assert!(SessionConfig::default().validate().is_ok());
    }

    #[test]
    fn invalid_values_are_configuration_errors() {
        let mut c = SessionConfig::default();
        c.gray_zone_width = -1.0;
        assert!(matches!(c.validate(), Err(Error::Configuration(_))));

        let mut c = SessionConfig::default();
        c.calibration.min_samples = 0;
        assert!(matches!(c.validate(), Err(Error::Configuration(_))));

        let mut c = SessionConfig::default();
        c.history_capacity = Some(0);
        assert!(matches!(c.validate(), Err(Error::Configuration(_))));

        let mut c = SessionConfig::default();
        c.region_depth = 0.0;
        assert!(matches!(c.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn partial_session_config_fills_defaults() {
        let c: SessionConfig =
            serde_json::from_str(r#"{"gray_zone_width": 5.0, "calibration": {"min_samples": 4}}"#)
                .unwrap();
        assert_eq!(c.gray_zone_width, 5.0);
        assert_eq!(c.calibration.min_samples, 4);
        assert_eq!(c.calibration.eps, 3.0);
        assert_eq!(c.region_depth, 50.0);
    }

    #[test]
    fn reads_minimal_boundary_record() {
        let b: BoundaryConfig =
            serde_json::from_str(r#"{"curve_points": [[0, 0], [100, 0]], "orientation": null}"#)
                .unwrap();
        assert_eq!(b.direction().unwrap(), InDirection::Auto);
        assert_eq!(b.preset_orientation(None).unwrap(), None);
        assert_eq!(b.curve().unwrap().len(), 2);
    }

    #[test]
    fn explicit_direction_overrides_cached_orientation() {
        let mut b = BoundaryConfig::new(vec![[0.0, 100.0], [200.0, 100.0]]);
        b.orientation = Some(Orientation::Positive);
        assert_eq!(b.preset_orientation(None).unwrap(), Some(Orientation::Positive));

        b.in_direction = "away_from_cam".into();
        assert_eq!(
            b.preset_orientation(Some((960, 480))).unwrap(),
            Some(Orientation::Negative)
        );

        // Same direction, curve drawn the other way round.
        b.curve_points.reverse();
        assert_eq!(
            b.preset_orientation(Some((960, 480))).unwrap(),
            Some(Orientation::Positive)
        );

        b.in_direction = "sideways".into();
        assert!(matches!(b.preset_orientation(None), Err(Error::Configuration(_))));
    }

    #[test]
    fn defaulted_calibration_is_not_cached() {
        let mut b = BoundaryConfig::new(vec![[0.0, 0.0], [1.0, 0.0]]);
        let diag = CalibrationDiagnostics::default();

        b.record_calibration(&OrientationResult::fallback(0), &diag);
        assert_eq!(b.orientation, None);
        assert!(b.orientation_diagnostics.is_some());

        b.record_calibration(&OrientationResult::preset(Orientation::Negative), &diag);
        assert_eq!(b.orientation, Some(Orientation::Negative));
    }

    #[test]
    fn save_and_load_preserve_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config").join("curve_config.json");

        let mut b = BoundaryConfig::new(vec![[461.0, 373.0], [474.0, 412.0], [508.0, 424.0]]);
        b.in_direction = "toward_cam".into();
        b.orientation = Some(Orientation::Negative);
        b.save(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"IN_direction\": \"toward_cam\""));
        assert!(raw.contains("\"orientation\": -1"));

        let loaded = BoundaryConfig::load(&path).unwrap();
        assert_eq!(loaded, b);
    }

    #[test]
    fn region_diagnostics_survive_a_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("curve_config.json");

        let mut b = BoundaryConfig::new(vec![[461.0, 373.0], [474.0, 412.0], [508.0, 424.0]]);
        let region = RegionBuilder::normal_offset(None)
            .build(&b.curve().unwrap(), (960, 480), 30.0)
            .unwrap();
        b.record_region(&region);
        b.save(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"method\": \"normal_offset\""));

        let loaded = BoundaryConfig::load(&path).unwrap();
        assert_eq!(loaded, b);
        assert_eq!(loaded.region_depth, Some(30.0));
        assert_eq!(loaded.inside_region.as_ref().map(|r| r.len()), Some(6));

        let diag = loaded.region_diagnostics.unwrap();
        assert_eq!(diag.status, "ok (symmetric)");
        assert_eq!(diag.num_points, 6);
        assert_eq!(diag.region_depth, 30.0);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let res = BoundaryConfig::load(dir.path().join("nope.json"));
        assert!(matches!(res, Err(Error::Io(_))));
    }
}
