//! # ActivationFunction
//!
//! The closed set of per-layer nonlinearities together with their registry:
//! stable numeric ids (used by the persistence format) and display names.
//!
//! | Variant    | id | f(x)                   |
//! |------------|----|------------------------|
//! | `Identity` | 0  | `x`                    |
//! | `Relu`     | 1  | `x` if `x >= 0`, else 0 |
//! | `Sigmoid`  | 2  | `1 / (1 + e^x)`, reals only |
//! | `Step`     | 3  | 1 if `x > 0`, else 0    |

use std::fmt;
use std::str::FromStr;

use crate::error::{GeneticError, Result};
use crate::numeric::Scalar;

/// A resolved activation, ready to be applied to every unit of a layer.
pub type Kernel<T> = fn(T) -> T;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivationFunction {
    Identity,
    Relu,
    Sigmoid,
    Step,
}

impl ActivationFunction {
    pub const ALL: [ActivationFunction; 4] = [
        ActivationFunction::Identity,
        ActivationFunction::Relu,
        ActivationFunction::Sigmoid,
        ActivationFunction::Step,
    ];

    /// Numeric tag written by the persistence layer.
    pub fn id(self) -> i32 {
        match self {
            ActivationFunction::Identity => 0,
            ActivationFunction::Relu => 1,
            ActivationFunction::Sigmoid => 2,
            ActivationFunction::Step => 3,
        }
    }

    pub fn from_id(id: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|activation| activation.id() == id)
    }

    pub fn name(self) -> &'static str {
        match self {
            ActivationFunction::Identity => "Identity",
            ActivationFunction::Relu => "ReLU",
            ActivationFunction::Sigmoid => "Sigmoid",
            ActivationFunction::Step => "Step",
        }
    }

    /// Whether this activation is defined for `T`.
    pub fn supports<T: Scalar>(self) -> bool {
        self != ActivationFunction::Sigmoid || T::SIGMOID.is_some()
    }

    /// Resolves the activation to a plain function pointer for `T`.
    ///
    /// # Errors
    ///
    /// Returns `GeneticError::UnsupportedActivation` when `Sigmoid` is
    /// requested for an integer type.
    pub fn kernel<T: Scalar>(self) -> Result<Kernel<T>> {
        match self {
            ActivationFunction::Identity => Ok(identity::<T> as Kernel<T>),
            ActivationFunction::Relu => Ok(relu::<T> as Kernel<T>),
            ActivationFunction::Step => Ok(step::<T> as Kernel<T>),
            ActivationFunction::Sigmoid => {
                T::SIGMOID.ok_or(GeneticError::UnsupportedActivation {
                    activation: self.name(),
                    scalar: T::NAME,
                })
            }
        }
    }

    /// Applies the activation to a single value.
    pub fn evaluate<T: Scalar>(self, x: T) -> Result<T> {
        let kernel = self.kernel::<T>()?;
        Ok(kernel(x))
    }
}

fn identity<T: Scalar>(x: T) -> T {
    x
}

fn relu<T: Scalar>(x: T) -> T {
    if x >= T::ZERO {
        x
    } else {
        T::ZERO
    }
}

fn step<T: Scalar>(x: T) -> T {
    if x > T::ZERO {
        T::ONE
    } else {
        T::ZERO
    }
}

impl fmt::Display for ActivationFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ActivationFunction {
    type Err = GeneticError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|activation| activation.name() == s)
            .ok_or_else(|| GeneticError::Configuration(format!("Unknown activation function: {}", s)))
    }
}
