use crate::config::DynamicsTuning;
use noisy_float::types::{r64, R64};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageZone {
    Front,
    Rear,
    Left,
    Right,
}

impl DamageZone {
    pub const ALL: [DamageZone; 4] = [
        DamageZone::Front,
        DamageZone::Rear,
        DamageZone::Left,
        DamageZone::Right,
    ];

    fn index(self) -> usize {
        match self {
            DamageZone::Front => 0,
            DamageZone::Rear => 1,
            DamageZone::Left => 2,
            DamageZone::Right => 3,
        }
    }
}

/// Set of zones whose integrity has dropped to the failure threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedZones([bool; 4]);

impl FailedZones {
    pub fn contains(&self, zone: DamageZone) -> bool {
        self.0[zone.index()]
    }

    pub fn is_empty(&self) -> bool {
        !self.0.contains(&true)
    }

    pub fn iter(&self) -> impl Iterator<Item = DamageZone> + '_ {
        DamageZone::ALL
            .into_iter()
            .filter(move |zone| self.contains(*zone))
    }
}

/// Accumulated damage per zone, each in `[0, 1]`.
///
/// Written by the collision/damage collaborator only. Damage is never
/// repaired within a run, so every zone is monotonically non-decreasing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectionalDamageState {
    front: f64,
    rear: f64,
    left: f64,
    right: f64,
}

impl DirectionalDamageState {
    pub fn new(front: f64, rear: f64, left: f64, right: f64) -> Self {
        let mut state = Self::default();
        state.apply(DamageZone::Front, front);
        state.apply(DamageZone::Rear, rear);
        state.apply(DamageZone::Left, left);
        state.apply(DamageZone::Right, right);
        state
    }

    pub fn get(&self, zone: DamageZone) -> f64 {
        match zone {
            DamageZone::Front => self.front,
            DamageZone::Rear => self.rear,
            DamageZone::Left => self.left,
            DamageZone::Right => self.right,
        }
    }

    /// Adds damage to a zone. Negative or non-finite amounts are ignored.
    pub fn apply(&mut self, zone: DamageZone, amount: f64) {
        let amount = match R64::try_new(amount) {
            Some(amount) if amount.raw() > 0.0 => amount.raw(),
            _ => return,
        };
        let slot = match zone {
            DamageZone::Front => &mut self.front,
            DamageZone::Rear => &mut self.rear,
            DamageZone::Left => &mut self.left,
            DamageZone::Right => &mut self.right,
        };
        *slot = (*slot + amount).min(1.0);
    }
}

#[derive(Debug, Clone)]
pub struct DegradationInit {
    pub front_to_steering_ratio: f64,
    pub side_to_magnetism_ratio: f64,
    pub rear_to_drift_ratio: f64,
    pub rear_to_slip_ratio: f64,
    pub failure_threshold: f64,
}

impl DegradationInit {
    pub fn from_tuning(tuning: &DynamicsTuning) -> Self {
        Self {
            front_to_steering_ratio: tuning.front_to_steering_ratio,
            side_to_magnetism_ratio: tuning.side_to_magnetism_ratio,
            rear_to_drift_ratio: tuning.rear_to_drift_ratio,
            rear_to_slip_ratio: tuning.rear_to_slip_ratio,
            failure_threshold: tuning.failure_threshold,
        }
    }

    pub fn build(&self) -> DegradationCoupler {
        let Self {
            front_to_steering_ratio,
            side_to_magnetism_ratio,
            rear_to_drift_ratio,
            rear_to_slip_ratio,
            failure_threshold,
        } = *self;

        DegradationCoupler {
            front_to_steering_ratio,
            side_to_magnetism_ratio,
            rear_to_drift_ratio,
            rear_to_slip_ratio,
            saturation: 1.0 - failure_threshold,
        }
    }
}

/// Gain multipliers derived from damage, consumed on the following tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DegradationFactors {
    pub steering: f64,
    pub magnetism: f64,
    pub drift: f64,
    pub slip: f64,
}

impl Default for DegradationFactors {
    fn default() -> Self {
        Self {
            steering: 1.0,
            magnetism: 1.0,
            drift: 1.0,
            slip: 1.0,
        }
    }
}

/// Maps [`DirectionalDamageState`] to [`DegradationFactors`].
///
/// A zone whose remaining integrity is at or below the failure threshold is
/// failed: its contribution saturates there and stays put.
#[derive(Debug)]
pub struct DegradationCoupler {
    front_to_steering_ratio: f64,
    side_to_magnetism_ratio: f64,
    rear_to_drift_ratio: f64,
    rear_to_slip_ratio: f64,
    saturation: f64,
}

impl DegradationCoupler {
    pub fn is_failed(&self, damage: &DirectionalDamageState, zone: DamageZone) -> bool {
        damage.get(zone) >= self.saturation
    }

    pub fn failed_zones(&self, damage: &DirectionalDamageState) -> FailedZones {
        FailedZones(DamageZone::ALL.map(|zone| self.is_failed(damage, zone)))
    }

    pub fn factors(&self, damage: &DirectionalDamageState) -> DegradationFactors {
        let Self {
            front_to_steering_ratio,
            side_to_magnetism_ratio,
            rear_to_drift_ratio,
            rear_to_slip_ratio,
            ..
        } = *self;

        let front = self.effective(damage, DamageZone::Front);
        let rear = self.effective(damage, DamageZone::Rear);
        let side = [DamageZone::Left, DamageZone::Right]
            .into_iter()
            .map(|zone| r64(self.effective(damage, zone)))
            .max()
            .map(|val| val.raw())
            .unwrap_or(0.0);

        DegradationFactors {
            steering: 1.0 - front * front_to_steering_ratio,
            magnetism: 1.0 - side * side_to_magnetism_ratio,
            drift: 1.0 + rear * rear_to_drift_ratio,
            slip: 1.0 + rear * rear_to_slip_ratio,
        }
    }

    fn effective(&self, damage: &DirectionalDamageState, zone: DamageZone) -> f64 {
        damage.get(zone).min(self.saturation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coupler() -> DegradationCoupler {
        DegradationInit::from_tuning(&DynamicsTuning::default()).build()
    }

    #[test]
    fn undamaged_vehicle_keeps_full_gains() {
        let factors = coupler().factors(&DirectionalDamageState::default());
        assert_eq!(factors, DegradationFactors::default());
    }

    #[test]
    fn front_damage_cuts_steering() {
        let damage = DirectionalDamageState::new(0.9, 0.0, 0.0, 0.0);
        let factors = coupler().factors(&damage);
        assert!((factors.steering - 0.28).abs() < 1e-9);
        assert_eq!(factors.magnetism, 1.0);
    }

    #[test]
    fn failed_zone_saturates() {
        let coupler = coupler();
        let at_threshold = DirectionalDamageState::new(0.9, 0.0, 0.0, 0.0);
        let wrecked = DirectionalDamageState::new(1.0, 0.0, 0.0, 0.0);

        assert!(coupler.is_failed(&wrecked, DamageZone::Front));
        assert_eq!(
            coupler.factors(&wrecked).steering,
            coupler.factors(&at_threshold).steering
        );
        let failed = coupler.failed_zones(&wrecked);
        assert!(failed.contains(DamageZone::Front));
        assert_eq!(failed.iter().collect::<Vec<_>>(), vec![DamageZone::Front]);
    }

    #[test]
    fn intact_vehicle_has_no_failed_zones() {
        let damage = DirectionalDamageState::new(0.5, 0.5, 0.5, 0.5);
        let failed = coupler().failed_zones(&damage);
        assert!(failed.is_empty());
        assert_eq!(failed.iter().count(), 0);
    }

    #[test]
    fn worst_side_weakens_magnetism() {
        let damage = DirectionalDamageState::new(0.0, 0.0, 0.2, 0.6);
        let factors = coupler().factors(&damage);
        assert!((factors.magnetism - (1.0 - 0.6 * 0.5)).abs() < 1e-9);
    }

    #[test]
    fn rear_damage_loosens_the_tail() {
        let damage = DirectionalDamageState::new(0.0, 0.5, 0.0, 0.0);
        let factors = coupler().factors(&damage);
        assert!(factors.drift > 1.0);
        assert!(factors.slip > 1.0);
    }

    #[test]
    fn damage_never_decreases() {
        let mut damage = DirectionalDamageState::default();
        damage.apply(DamageZone::Left, 0.4);
        damage.apply(DamageZone::Left, -0.3);
        damage.apply(DamageZone::Left, f64::NAN);
        assert_eq!(damage.get(DamageZone::Left), 0.4);
        damage.apply(DamageZone::Left, 5.0);
        assert_eq!(damage.get(DamageZone::Left), 1.0);
    }
}
