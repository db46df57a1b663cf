//! Output delay: how long a computed state waits before neighbours see it.

use crate::state::{CellState, ConfigError};

pub trait DelayPolicy: Send + Sync {
    fn output_delay(&self, state: &CellState) -> f64;
}

/// The same delay for every state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantDelay(f64);

impl ConstantDelay {
    pub fn new(delay: f64) -> Result<Self, ConfigError> {
        if delay.is_finite() && delay >= 0.0 {
            Ok(Self(delay))
        } else {
            Err(ConfigError::InvalidDelay(delay))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Default for ConstantDelay {
    fn default() -> Self {
        Self(1.0)
    }
}

impl DelayPolicy for ConstantDelay {
    fn output_delay(&self, _state: &CellState) -> f64 {
        self.0
    }
}

/// Any `Fn(&CellState) -> f64` works as a policy; negative or non-finite
/// results are clamped to zero.
impl<F> DelayPolicy for F
where
    F: Fn(&CellState) -> f64 + Send + Sync,
{
    fn output_delay(&self, state: &CellState) -> f64 {
        let delay = self(state);
        if delay.is_finite() {
            delay.max(0.0)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::Terrain;

    #[test]
    fn default_delay_is_one_time_unit() {
        let policy = ConstantDelay::default();
        for terrain in Terrain::ALL {
            assert_eq!(policy.output_delay(&CellState::new(terrain)), 1.0);
        }
    }

    #[test]
    fn rejects_negative_or_nan_delay() {
        assert_eq!(ConstantDelay::new(-1.0), Err(ConfigError::InvalidDelay(-1.0)));
        assert!(ConstantDelay::new(f64::NAN).is_err());
        assert_eq!(ConstantDelay::new(0.0).unwrap().value(), 0.0);
    }

    #[test]
    fn closures_act_as_policies() {
        let slow_forests = |state: &CellState| match state.terrain {
            Terrain::Forest => 3.0,
            _ => 1.0,
        };
        assert_eq!(slow_forests.output_delay(&CellState::new(Terrain::Forest)), 3.0);
        assert_eq!(slow_forests.output_delay(&CellState::new(Terrain::Land)), 1.0);

        let broken = |_: &CellState| -2.0;
        assert_eq!(broken.output_delay(&CellState::new(Terrain::Land)), 0.0);
    }
}
