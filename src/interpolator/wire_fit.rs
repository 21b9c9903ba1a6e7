//! Wire-fit interpolation (Baird & Klopf, as used by Gaskett et al.).

use super::wire::{best_wire_index, Wire};
use super::Interpolator;
use crate::error::{Result, WireFitError};
use serde::{Deserialize, Serialize};

/// Inverse-distance interpolation over wires with a reward-dependent smoothing term.
///
/// Each wire `i` is weighted by `1 / d_i` with
/// `d_i = |u - a_i|^2 + smoothing * (q_max - q_i) + epsilon`,
/// and the interpolated reward is the weighted mean of the wire rewards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WireFitInterpolator {
    /// Weight given to the reward gap to the best wire
    smoothing: f64,
    /// Constant keeping every distance strictly positive
    epsilon: f64,
}

impl Default for WireFitInterpolator {
    fn default() -> Self {
        Self {
            smoothing: 0.2,
            epsilon: 0.01,
        }
    }
}

/// Intermediate sums shared by the value and both derivatives
struct Terms {
    distances: Vec<f64>,
    weighted_sum: f64,
    normalizer: f64,
    best_index: usize,
}

impl Terms {
    fn value(&self) -> f64 {
        self.weighted_sum / self.normalizer
    }
}

impl WireFitInterpolator {
    /// Create an interpolator with custom smoothing constants
    pub fn new(smoothing: f64, epsilon: f64) -> Result<Self> {
        if !(smoothing >= 0.0 && smoothing.is_finite()) {
            return Err(WireFitError::invalid_argument(format!(
                "smoothing must be a finite non-negative number, got {}",
                smoothing
            )));
        }
        if !(epsilon > 0.0 && epsilon.is_finite()) {
            return Err(WireFitError::invalid_argument(format!(
                "epsilon must be a finite positive number, got {}",
                epsilon
            )));
        }
        Ok(Self { smoothing, epsilon })
    }

    pub fn smoothing(&self) -> f64 {
        self.smoothing
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Smoothed squared distance between a wire and a query action
    fn distance_between_wire_and_action(&self, wire: &Wire, action: &[f64], max_reward: f64) -> f64 {
        let squared_norm: f64 = wire
            .action
            .iter()
            .zip(action)
            .map(|(w, a)| (a - w).powi(2))
            .sum();

        squared_norm + self.smoothing * (max_reward - wire.reward) + self.epsilon
    }

    fn terms(&self, control_wires: &[Wire], action: &[f64]) -> Result<Terms> {
        let best_index = best_wire_index(control_wires)
            .ok_or_else(|| WireFitError::invalid_argument("control wire set is empty"))?;
        for wire in control_wires {
            WireFitError::check_len("wire action", action.len(), wire.dimensions())?;
        }

        let max_reward = control_wires[best_index].reward;
        let distances: Vec<f64> = control_wires
            .iter()
            .map(|wire| self.distance_between_wire_and_action(wire, action, max_reward))
            .collect();

        let mut weighted_sum = 0.0;
        let mut normalizer = 0.0;
        for (wire, &distance) in control_wires.iter().zip(&distances) {
            weighted_sum += wire.reward / distance;
            normalizer += 1.0 / distance;
        }

        Ok(Terms {
            distances,
            weighted_sum,
            normalizer,
            best_index,
        })
    }
}

impl Interpolator for WireFitInterpolator {
    fn reward(&self, control_wires: &[Wire], action: &[f64]) -> Result<f64> {
        Ok(self.terms(control_wires, action)?.value())
    }

    fn reward_derivative_at(
        &self,
        action: &[f64],
        k: usize,
        control_wires: &[Wire],
    ) -> Result<f64> {
        let terms = self.terms(control_wires, action)?;
        if k >= control_wires.len() {
            return Err(WireFitError::invalid_argument(format!(
                "wire index {} out of range for {} control wires",
                k,
                control_wires.len()
            )));
        }

        // q_k enters d_k directly and, for the best wire, every d_j through q_max
        let through_max = if k == terms.best_index { 1.0 } else { 0.0 };

        let mut d_sum = 0.0;
        let mut d_norm = 0.0;
        for (j, (other, &distance)) in control_wires.iter().zip(&terms.distances).enumerate() {
            let own = if j == k { 1.0 } else { 0.0 };
            let d_distance = self.smoothing * (through_max - own);
            let d_weight = -d_distance / (distance * distance);

            d_sum += other.reward * d_weight + own / distance;
            d_norm += d_weight;
        }

        Ok((d_sum - terms.value() * d_norm) / terms.normalizer)
    }

    fn action_term_derivative(
        &self,
        action_term: f64,
        wire_action_term: f64,
        action: &[f64],
        wire: &Wire,
        control_wires: &[Wire],
    ) -> Result<f64> {
        let terms = self.terms(control_wires, action)?;
        let k = wire.position_in(control_wires)?;
        let distance = terms.distances[k];

        let numerator = (terms.weighted_sum - terms.normalizer * wire.reward)
            * 2.0
            * (wire_action_term - action_term);
        let denominator = (terms.normalizer * distance).powi(2);

        Ok(numerator / denominator)
    }

    fn name(&self) -> &str {
        "wirefit"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_wires(rng: &mut StdRng, count: usize, dims: usize) -> Vec<Wire> {
        (0..count)
            .map(|_| {
                Wire::new(
                    (0..dims).map(|_| rng.gen_range(-1.0..1.0)).collect(),
                    rng.gen_range(-2.0..2.0),
                )
            })
            .collect()
    }

    /// Largest reward gap between the best wire and the runner-up
    fn max_gap(wires: &[Wire]) -> f64 {
        let mut rewards: Vec<f64> = wires.iter().map(|w| w.reward).collect();
        rewards.sort_by(|a, b| b.partial_cmp(a).unwrap());
        rewards[0] - rewards[1]
    }

    #[test]
    fn test_single_wire_returns_its_reward() {
        let interpolator = WireFitInterpolator::default();
        let wires = vec![Wire::new(vec![0.3, -0.2], 4.2)];

        let reward = interpolator.reward(&wires, &[0.3, -0.2]).unwrap();
        assert_abs_diff_eq!(reward, 4.2, epsilon = 1e-12);
    }

    #[test]
    fn test_reward_is_bounded_by_wire_rewards() {
        let interpolator = WireFitInterpolator::default();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..200 {
            let wires = random_wires(&mut rng, 5, 2);
            let action: Vec<f64> = (0..2).map(|_| rng.gen_range(-1.5..1.5)).collect();
            let reward = interpolator.reward(&wires, &action).unwrap();

            let lo = wires.iter().map(|w| w.reward).fold(f64::INFINITY, f64::min);
            let hi = wires.iter().map(|w| w.reward).fold(f64::NEG_INFINITY, f64::max);
            assert!(reward >= lo - 1e-12 && reward <= hi + 1e-12);
        }
    }

    #[test]
    fn test_small_smoothing_approaches_nearest_neighbour() {
        let interpolator = WireFitInterpolator::new(1e-9, 1e-9).unwrap();
        let wires = vec![
            Wire::new(vec![0.0], 1.0),
            Wire::new(vec![0.5], -3.0),
            Wire::new(vec![1.0], 2.0),
        ];

        let reward = interpolator.reward(&wires, &[0.49]).unwrap();
        assert_abs_diff_eq!(reward, -3.0, epsilon = 0.01);
    }

    #[test]
    fn test_empty_wires_rejected() {
        let interpolator = WireFitInterpolator::default();
        assert!(matches!(
            interpolator.reward(&[], &[0.0]),
            Err(WireFitError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_mismatched_dimensions_rejected() {
        let interpolator = WireFitInterpolator::default();
        let wires = vec![Wire::new(vec![0.0, 1.0], 1.0)];
        assert!(matches!(
            interpolator.reward(&wires, &[0.0]),
            Err(WireFitError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_invalid_constants_rejected() {
        assert!(WireFitInterpolator::new(-0.1, 0.01).is_err());
        assert!(WireFitInterpolator::new(0.2, 0.0).is_err());
        assert!(WireFitInterpolator::new(f64::NAN, 0.01).is_err());
    }

    #[test]
    fn test_reward_derivative_matches_finite_difference() {
        let interpolator = WireFitInterpolator::default();
        let mut rng = StdRng::seed_from_u64(42);
        let h = 1e-6;

        let mut checked = 0;
        while checked < 50 {
            let wires = random_wires(&mut rng, 4, 2);
            if max_gap(&wires) < 1e-3 {
                continue;
            }
            let action: Vec<f64> = (0..2).map(|_| rng.gen_range(-1.0..1.0)).collect();

            for k in 0..wires.len() {
                let analytic = interpolator
                    .reward_derivative(&action, &wires[k], &wires)
                    .unwrap();

                let mut plus = wires.clone();
                plus[k].reward += h;
                let mut minus = wires.clone();
                minus[k].reward -= h;
                let numeric = (interpolator.reward(&plus, &action).unwrap()
                    - interpolator.reward(&minus, &action).unwrap())
                    / (2.0 * h);

                assert_abs_diff_eq!(analytic, numeric, epsilon = 1e-5);
            }
            checked += 1;
        }
    }

    #[test]
    fn test_action_term_derivative_matches_finite_difference() {
        let interpolator = WireFitInterpolator::default();
        let mut rng = StdRng::seed_from_u64(1234);
        let h = 1e-6;

        for _ in 0..50 {
            let wires = random_wires(&mut rng, 4, 3);
            let action: Vec<f64> = (0..3).map(|_| rng.gen_range(-1.0..1.0)).collect();

            for k in 0..wires.len() {
                for m in 0..3 {
                    let analytic = interpolator
                        .action_term_derivative(
                            action[m],
                            wires[k].action[m],
                            &action,
                            &wires[k],
                            &wires,
                        )
                        .unwrap();

                    let mut plus = wires.clone();
                    plus[k].action[m] += h;
                    let mut minus = wires.clone();
                    minus[k].action[m] -= h;
                    let numeric = (interpolator.reward(&plus, &action).unwrap()
                        - interpolator.reward(&minus, &action).unwrap())
                        / (2.0 * h);

                    assert_abs_diff_eq!(analytic, numeric, epsilon = 1e-5);
                }
            }
        }
    }

    #[test]
    fn test_derivative_of_unknown_wire_rejected() {
        let interpolator = WireFitInterpolator::default();
        let wires = vec![Wire::new(vec![0.0], 1.0)];
        let stranger = Wire::new(vec![0.5], 1.0);
        assert!(interpolator
            .reward_derivative(&[0.0], &stranger, &wires)
            .is_err());
    }

    #[test]
    fn test_duplicate_maximisers_split_by_position() {
        let interpolator = WireFitInterpolator::default();
        let wires = vec![
            Wire::new(vec![0.2], 1.0),
            Wire::new(vec![0.6], 2.0),
            Wire::new(vec![0.6], 2.0),
        ];
        let action = [0.3];
        let h = 1e-6;
        let value = interpolator.reward(&wires, &action).unwrap();

        // Raising the first copy moves q_max; lowering the second leaves it to the first
        let mut raised = wires.clone();
        raised[1].reward += h;
        let upward = (interpolator.reward(&raised, &action).unwrap() - value) / h;

        let mut lowered = wires.clone();
        lowered[2].reward -= h;
        let downward = (value - interpolator.reward(&lowered, &action).unwrap()) / h;

        let first = interpolator.reward_derivative_at(&action, 1, &wires).unwrap();
        let second = interpolator.reward_derivative_at(&action, 2, &wires).unwrap();
        assert_abs_diff_eq!(first, upward, epsilon = 1e-4);
        assert_abs_diff_eq!(second, downward, epsilon = 1e-4);
        assert!((first - second).abs() > 1e-3);

        assert_eq!(
            interpolator.reward_derivative(&action, &wires[2], &wires).unwrap(),
            first
        );
        assert!(interpolator.reward_derivative_at(&action, 3, &wires).is_err());
    }

    #[test]
    fn test_name() {
        assert_eq!(WireFitInterpolator::default().name(), "wirefit");
    }
}
