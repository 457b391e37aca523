//! Automatic orientation calibration.
//!
//! Anchors sampled from every visible track are classified against the curve.
//! Sign changes between consecutive kept samples are crossings; each one votes
//! for an orientation with a weight equal to how far from the curve the two
//! samples were, so confident far-from-boundary transitions dominate jittery
//! ones. Too little evidence is not an error: the calibrator falls back to
//! `+1` and says so in its diagnostics.
use crate::curve::BoundaryCurve;

use log::{debug, info, warn};
use nalgebra as na;
use serde_derive::{Deserialize, Serialize};
use std::convert::TryFrom;

pub const NOTE_TOO_FEW_SAMPLES: &str = "too_few_samples";
pub const NOTE_NOT_ENOUGH_CROSSINGS: &str = "not_enough_crossings";
pub const NOTE_CHECK_FOR_BIAS: &str = "high_confidence_check_for_bias";

const BIAS_CONFIDENCE: f32 = 0.95;

/// Multiplier mapping the geometric side of the curve onto IN/OUT semantics.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(try_from = "i8", into = "i8")]
pub enum Orientation {
    #[default]
    Positive,
    Negative,
}

impl Orientation {
    #[inline]
    pub fn sign(self) -> i8 {
        match self {
            Orientation::Positive => 1,
            Orientation::Negative => -1,
        }
    }

    #[inline]
    pub fn as_f32(self) -> f32 {
        self.sign() as f32
    }
}

impl From<Orientation> for i8 {
    fn from(o: Orientation) -> i8 {
        o.sign()
    }
}

impl TryFrom<i8> for Orientation {
    type Error = String;

    fn try_from(v: i8) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(Orientation::Positive),
            -1 => Ok(Orientation::Negative),
            other => Err(format!("orientation must be +1 or -1, got {}", other)),
        }
    }
}

/// Parameters for orientation calibration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CalibrationParams {
    /// Samples closer to the curve than this (px) are skipped.
    pub eps: f32,
    /// Crossings required before the vote is trusted.
    pub min_crossings: usize,
    /// Samples required before calibration is attempted at all.
    pub min_samples: usize,
    /// Flags one-sided, near-unanimous votes in the diagnostics.
    pub require_balance: bool,
}

impl Default for CalibrationParams {
    fn default() -> Self {
        Self {
            eps: 3.0,
            min_crossings: 2,
            min_samples: 10,
            require_balance: false,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct OrientationResult {
    pub orientation: Orientation,
    pub confidence: f32,
    pub crossings_used: usize,
    pub resolved: bool,
}

impl OrientationResult {
    /// The `+1` fallback used while evidence is insufficient.
    pub fn fallback(crossings_used: usize) -> Self {
        Self {
            orientation: Orientation::Positive,
            confidence: 0.0,
            crossings_used,
            resolved: false,
        }
    }

    /// A result that was not calibrated but supplied by configuration.
    pub fn preset(orientation: Orientation) -> Self {
        Self {
            orientation,
            confidence: 1.0,
            crossings_used: 0,
            resolved: true,
        }
    }
}

/// One sign change between consecutive kept samples.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Crossing {
    pub from_index: usize,
    pub to_index: usize,
    pub from_sign: i8,
    pub to_sign: i8,
    pub weight: f32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct CandidateVotes {
    /// Weight of negative -> positive transitions.
    #[serde(rename = "+1")]
    pub positive: f32,
    /// Weight of positive -> negative transitions.
    #[serde(rename = "-1")]
    pub negative: f32,
}

impl CandidateVotes {
    #[inline]
    pub fn total(&self) -> f32 {
        self.positive + self.negative
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct CalibrationDiagnostics {
    pub num_samples: usize,
    pub num_used: usize,
    pub num_crossings: usize,
    pub crossings: Vec<Crossing>,
    pub candidates: CandidateVotes,
    pub notes: Vec<String>,
}

/// Infers the orientation from a batch of anchors. Pure; the calibrator's
/// state machine is layered on top of it.
pub fn resolve(
    curve: &BoundaryCurve,
    samples: &[na::Point2<f32>],
    params: &CalibrationParams,
) -> (OrientationResult, CalibrationDiagnostics) {
    let mut diag = CalibrationDiagnostics {
        num_samples: samples.len(),
        ..Default::default()
    };

    if samples.len() < params.min_samples {
        diag.notes.push(format!(
            "{} (need >= {})",
            NOTE_TOO_FEW_SAMPLES, params.min_samples
        ));
        return (OrientationResult::fallback(0), diag);
    }

    // (index, sign, distance) of the previous kept sample
    let mut last: Option<(usize, i8, f32)> = None;

    for (idx, pt) in samples.iter().enumerate() {
        let d = curve.signed_distance(*pt);
        if d == 0.0 || d.abs() < params.eps {
            continue;
        }

        let sign: i8 = if d > 0.0 { 1 } else { -1 };

        if let Some((last_idx, last_sign, last_dist)) = last {
            if sign != last_sign {
                let weight = d.abs() + last_dist.abs();

                if sign > last_sign {
                    diag.candidates.positive += weight;
                } else {
                    diag.candidates.negative += weight;
                }

                debug!(
                    "calibration crossing {} -> {} ({:+} -> {:+}), weight {:.2}",
                    last_idx, idx, last_sign, sign, weight
                );

                diag.crossings.push(Crossing {
                    from_index: last_idx,
                    to_index: idx,
                    from_sign: last_sign,
                    to_sign: sign,
                    weight,
                });
            }
        }

        last = Some((idx, sign, d));
        diag.num_used += 1;
    }

    diag.num_crossings = diag.crossings.len();

    if diag.num_crossings < params.min_crossings {
        diag.notes.push(NOTE_NOT_ENOUGH_CROSSINGS.to_string());
        return (OrientationResult::fallback(diag.num_crossings), diag);
    }

    let votes = diag.candidates;
    let (orientation, winning) = if votes.positive >= votes.negative {
        (Orientation::Positive, votes.positive)
    } else {
        (Orientation::Negative, votes.negative)
    };

    let total = votes.total();
    let confidence = if total > 0.0 { winning / total } else { 0.0 };

    if params.require_balance && confidence > BIAS_CONFIDENCE {
        diag.notes.push(NOTE_CHECK_FOR_BIAS.to_string());
    }

    let result = OrientationResult {
        orientation,
        confidence,
        crossings_used: diag.num_crossings,
        resolved: true,
    };

    (result, diag)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationState {
    Collecting,
    Resolved,
    Defaulted,
}

/// Buffers anchors until enough are available, then resolves once.
#[derive(Debug)]
pub struct OrientationCalibrator {
    params: CalibrationParams,
    samples: Vec<na::Point2<f32>>,
    state: CalibrationState,
    outcome: Option<(OrientationResult, CalibrationDiagnostics)>,
}

impl OrientationCalibrator {
    pub fn new(params: CalibrationParams) -> Self {
        Self {
            samples: Vec::with_capacity(params.min_samples),
            params,
            state: CalibrationState::Collecting,
            outcome: None,
        }
    }

    #[inline]
    pub fn state(&self) -> CalibrationState {
        self.state
    }

    #[inline]
    pub fn params(&self) -> &CalibrationParams {
        &self.params
    }

    #[inline]
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.state == CalibrationState::Collecting && self.samples.len() >= self.params.min_samples
    }

    /// Buffers one sample. Ignored once calibration has finished.
    pub fn push(&mut self, point: na::Point2<f32>) {
        if self.state == CalibrationState::Collecting {
            self.samples.push(point);
        }
    }

    /// Resolves with whatever has been collected and moves to a terminal state.
    /// Subsequent calls return the cached outcome.
    pub fn finish(
        &mut self,
        curve: &BoundaryCurve,
    ) -> (OrientationResult, &CalibrationDiagnostics) {
        let state = &mut self.state;
        let samples = &mut self.samples;
        let params = &self.params;

        let (result, diag) = self.outcome.get_or_insert_with(|| {
            let (result, diag) = resolve(curve, samples, params);

            if result.resolved {
                info!(
                    "orientation resolved to {:+} (confidence {:.2}, {} crossings, {}/{} samples)",
                    result.orientation.sign(),
                    result.confidence,
                    result.crossings_used,
                    diag.num_used,
                    diag.num_samples
                );
                *state = CalibrationState::Resolved;
            } else {
                warn!("orientation defaulted to +1 ({})", diag.notes.join(", "));
                *state = CalibrationState::Defaulted;
            }

            *samples = Vec::new();
            (result, diag)
        });

        (*result, diag)
    }
}
