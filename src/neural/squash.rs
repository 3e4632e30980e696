//! Squashing (activation) functions and their derivatives.

use serde::{Deserialize, Serialize};

/// Activation function applied to a neuron's state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Squash {
    /// Logistic sigmoid, `1 / (1 + e^-x)`
    #[default]
    Logistic,
    /// Hyperbolic tangent
    Tanh,
    /// Pass-through
    Identity,
    /// Hard limit: 1 when positive, else 0
    HardLimit,
    /// Rectified linear unit
    Relu,
}

impl Squash {
    /// Evaluate the function at `x`
    #[inline]
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Squash::Logistic => 1.0 / (1.0 + (-x).exp()),
            Squash::Tanh => x.tanh(),
            Squash::Identity => x,
            Squash::HardLimit => {
                if x > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Squash::Relu => {
                if x > 0.0 {
                    x
                } else {
                    0.0
                }
            }
        }
    }

    /// Derivative at `x`. The hard limit reports a constant slope of 1.
    #[inline]
    pub fn derivative(self, x: f64) -> f64 {
        match self {
            Squash::Logistic => {
                let fx = self.apply(x);
                fx * (1.0 - fx)
            }
            Squash::Tanh => 1.0 - x.tanh().powi(2),
            Squash::Identity | Squash::HardLimit => 1.0,
            Squash::Relu => {
                if x > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}
