use crate::frame::{FrameSampler, PathFrame};
use serde::{Deserialize, Serialize};

/// Lanes are numbered from the guidance path center outwards, positive to
/// the right. Lane `i` is centered at `i * lane_width`.
pub type LaneIndex = i32;

/// How far past a fork's commit point the reference roads keep reporting it.
const FORK_CLEARANCE_M: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LaneSpan {
    pub min: LaneIndex,
    pub max: LaneIndex,
}

impl LaneSpan {
    pub fn new(min: LaneIndex, max: LaneIndex) -> Self {
        assert!(min <= max);
        Self { min, max }
    }

    pub fn single(lane: LaneIndex) -> Self {
        Self::new(lane, lane)
    }

    pub fn contains(&self, lane: LaneIndex) -> bool {
        (self.min..=self.max).contains(&lane)
    }

    pub fn clamp(&self, lane: LaneIndex) -> LaneIndex {
        lane.clamp(self.min, self.max)
    }
}

impl Default for LaneSpan {
    fn default() -> Self {
        Self::new(-1, 1)
    }
}

pub fn lane_center(lane: LaneIndex, lane_width: f64) -> f64 {
    lane as f64 * lane_width
}

/// Lane availability around the vehicle. Implemented by the track and
/// traffic collaborators; the defaults describe an open three lane road.
pub trait LaneSensor {
    fn lane_span(&self, _path_position: f64) -> LaneSpan {
        LaneSpan::default()
    }

    fn is_obstructed(&self, _lane: LaneIndex, _path_position: f64) -> bool {
        false
    }

    /// Signed distance to the commit point of the upcoming fork, negative
    /// once it has been passed. `None` when no fork is relevant.
    fn fork_commit_distance(&self, _path_position: f64) -> Option<f64> {
        None
    }
}

/// Straight road along `+Z`.
#[derive(Debug, Clone, Default)]
pub struct StraightRoad {
    pub lanes: LaneSpan,
    pub obstructed: Vec<LaneIndex>,
    pub fork_commit_at: Option<f64>,
}

impl StraightRoad {
    pub fn new(lanes: LaneSpan) -> Self {
        Self {
            lanes,
            ..Self::default()
        }
    }

    pub fn with_obstructed_lane(mut self, lane: LaneIndex) -> Self {
        self.obstructed.push(lane);
        self
    }

    pub fn with_fork_at(mut self, path_position: f64) -> Self {
        self.fork_commit_at = Some(path_position);
        self
    }
}

impl FrameSampler for StraightRoad {
    fn sample_frame(&self, _path_position: f64) -> PathFrame {
        PathFrame::planar(0.0, 0.0)
    }
}

impl LaneSensor for StraightRoad {
    fn lane_span(&self, _path_position: f64) -> LaneSpan {
        self.lanes
    }

    fn is_obstructed(&self, lane: LaneIndex, _path_position: f64) -> bool {
        self.obstructed.contains(&lane)
    }

    fn fork_commit_distance(&self, path_position: f64) -> Option<f64> {
        fork_distance(self.fork_commit_at, path_position)
    }
}

/// Flat constant-curvature road starting along `+Z`. Positive curvature
/// bends to the right.
#[derive(Debug, Clone, Default)]
pub struct ArcRoad {
    pub lanes: LaneSpan,
    pub curvature: f64,
    pub fork_commit_at: Option<f64>,
}

impl ArcRoad {
    pub fn new(lanes: LaneSpan, curvature: f64) -> Self {
        Self {
            lanes,
            curvature,
            fork_commit_at: None,
        }
    }
}

impl FrameSampler for ArcRoad {
    fn sample_frame(&self, path_position: f64) -> PathFrame {
        PathFrame::planar(self.curvature * path_position, self.curvature)
    }
}

impl LaneSensor for ArcRoad {
    fn lane_span(&self, _path_position: f64) -> LaneSpan {
        self.lanes
    }

    fn fork_commit_distance(&self, path_position: f64) -> Option<f64> {
        fork_distance(self.fork_commit_at, path_position)
    }
}

fn fork_distance(commit_at: Option<f64>, path_position: f64) -> Option<f64> {
    let distance = commit_at? - path_position;
    (distance >= -FORK_CLEARANCE_M).then_some(distance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lane_centers_scale_with_width() {
        assert_eq!(lane_center(0, 3.6), 0.0);
        assert_eq!(lane_center(1, 3.6), 3.6);
        assert_eq!(lane_center(-2, 3.5), -7.0);
    }

    #[test]
    fn span_membership() {
        let span = LaneSpan::new(-1, 2);
        assert!(span.contains(-1));
        assert!(span.contains(2));
        assert!(!span.contains(3));
        assert_eq!(span.clamp(-4), -1);
    }

    #[test]
    fn fork_is_reported_until_cleared() {
        let road = StraightRoad::default().with_fork_at(100.0);
        assert_eq!(road.fork_commit_distance(40.0), Some(60.0));
        assert_eq!(road.fork_commit_distance(130.0), Some(-30.0));
        assert_eq!(road.fork_commit_distance(151.0), None);
    }

    #[test]
    fn arc_road_turns_right_with_positive_curvature() {
        let road = ArcRoad::new(LaneSpan::default(), 0.01);
        let frame = road.sample_frame(50.0);
        assert!(frame.forward.x > 0.0);
        assert!((frame.curvature - 0.01).abs() < 1e-12);
    }
}
