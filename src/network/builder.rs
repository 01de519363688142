//! # NetworkBuilder
//!
//! Networks are configured in a fixed order: input layer, hidden layer count,
//! each hidden layer (nearest the input first), output layer. The builder is a
//! small state machine over that protocol; every transition consumes the
//! builder and an out-of-order call is reported as
//! `GeneticError::Configuration` instead of producing a half-built network.
//!
//! Setting the output layer is the final transition: it computes the weight
//! blocks, allocates the weight buffer and yields the [`Network`].

use tracing::debug;

use super::{ActivationFunction, Layer, Network, WeightBlock};
use crate::error::{try_filled, GeneticError, Result};
use crate::numeric::Scalar;

/// Where the builder stands in the configuration protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Empty,
    InputSet,
    /// The hidden layer count is known, no hidden layer configured yet.
    HiddenCountSet(usize),
    /// Number of hidden layers still to configure.
    HiddenLayersPending(usize),
    HiddenLayersDone,
}

#[derive(Debug, Clone)]
pub struct NetworkBuilder<T: Scalar> {
    state: BuildState,
    layers: Vec<Layer<T>>,
}

impl<T: Scalar> NetworkBuilder<T> {
    pub fn new() -> Self {
        Self {
            state: BuildState::Empty,
            layers: Vec::new(),
        }
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    /// Sets the input layer size, bias unit not included.
    pub fn input(mut self, size: usize) -> Result<Self> {
        self.expect_state("input", |state| state == BuildState::Empty)?;
        non_zero("Input layer", size)?;

        // The input layer is never activated; Identity only fills the slot.
        self.layers
            .push(Layer::new(size, true, ActivationFunction::Identity)?);
        self.state = BuildState::InputSet;
        Ok(self)
    }

    /// Declares how many hidden layers follow. At least one is required.
    pub fn hidden_layer_count(mut self, count: usize) -> Result<Self> {
        self.expect_state("hidden_layer_count", |state| state == BuildState::InputSet)?;
        non_zero("Hidden layer count", count)?;

        self.layers.try_reserve_exact(count.saturating_add(1))?;
        self.state = BuildState::HiddenCountSet(count);
        Ok(self)
    }

    /// Configures the next hidden layer, bias unit not included.
    pub fn hidden_layer(mut self, size: usize, activation: ActivationFunction) -> Result<Self> {
        let remaining = match self.state {
            BuildState::HiddenCountSet(remaining) | BuildState::HiddenLayersPending(remaining) => {
                remaining
            }
            state => return Err(out_of_order("hidden_layer", state)),
        };
        non_zero("Hidden layer", size)?;

        self.layers.push(Layer::new(size, true, activation)?);
        self.state = match remaining - 1 {
            0 => BuildState::HiddenLayersDone,
            left => BuildState::HiddenLayersPending(left),
        };
        Ok(self)
    }

    /// Configures the output layer and finishes the network.
    ///
    /// The weight buffer is allocated here; the returned network still needs
    /// weights before it can propagate.
    pub fn output_layer(mut self, size: usize, activation: ActivationFunction) -> Result<Network<T>> {
        self.expect_state("output_layer", |state| state == BuildState::HiddenLayersDone)?;
        non_zero("Output layer", size)?;

        self.layers.push(Layer::new(size, false, activation)?);

        let mut blocks = Vec::with_capacity(self.layers.len() - 1);
        let mut offset = 0usize;
        for pair in self.layers.windows(2) {
            let block = WeightBlock {
                offset,
                source_units: pair[0].units(),
                destination_units: pair[1].size,
            };
            offset = block
                .source_units
                .checked_mul(block.destination_units)
                .and_then(|len| offset.checked_add(len))
                .ok_or_else(|| {
                    GeneticError::Allocation("Weight buffer size overflows usize".to_string())
                })?;
            blocks.push(block);
        }

        let weight = try_filled(offset, T::ZERO)?;
        debug!(
            weight_size = offset,
            hidden_layers = self.layers.len() - 2,
            scalar = T::NAME,
            "network built"
        );
        Ok(Network::from_parts(self.layers, blocks, weight))
    }

    fn expect_state(&self, operation: &str, allowed: impl Fn(BuildState) -> bool) -> Result<()> {
        if allowed(self.state) {
            Ok(())
        } else {
            Err(out_of_order(operation, self.state))
        }
    }
}

impl<T: Scalar> Default for NetworkBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn out_of_order(operation: &str, state: BuildState) -> GeneticError {
    GeneticError::Configuration(format!(
        "{} cannot be called in builder state {:?}",
        operation, state
    ))
}

pub(super) fn non_zero(what: &str, size: usize) -> Result<()> {
    if size == 0 {
        return Err(GeneticError::Configuration(format!(
            "{} size must be at least 1",
            what
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_transitions() {
        let builder = NetworkBuilder::<f64>::new();
        assert_eq!(builder.state(), BuildState::Empty);
        let builder = builder.input(3).unwrap();
        assert_eq!(builder.state(), BuildState::InputSet);
        let builder = builder.hidden_layer_count(2).unwrap();
        assert_eq!(builder.state(), BuildState::HiddenCountSet(2));
        let builder = builder.hidden_layer(4, ActivationFunction::Relu).unwrap();
        assert_eq!(builder.state(), BuildState::HiddenLayersPending(1));
        let builder = builder.hidden_layer(2, ActivationFunction::Sigmoid).unwrap();
        assert_eq!(builder.state(), BuildState::HiddenLayersDone);
        let network = builder.output_layer(1, ActivationFunction::Identity).unwrap();
        // (3+1)*4 + (4+1)*2 + (2+1)*1
        assert_eq!(network.weight_size(), 16 + 10 + 3);
    }

    #[test]
    fn test_output_before_hidden_layers_done() {
        let result = NetworkBuilder::<i32>::new()
            .input(2)
            .and_then(|b| b.hidden_layer_count(2))
            .and_then(|b| b.hidden_layer(2, ActivationFunction::Relu))
            .and_then(|b| b.output_layer(1, ActivationFunction::Step));
        match result {
            Err(GeneticError::Configuration(msg)) => {
                assert!(msg.contains("output_layer"));
                assert!(msg.contains("HiddenLayersPending(1)"));
            }
            other => panic!("Expected Configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_too_many_hidden_layers() {
        let result = NetworkBuilder::<i32>::new()
            .input(2)
            .and_then(|b| b.hidden_layer_count(1))
            .and_then(|b| b.hidden_layer(2, ActivationFunction::Relu))
            .and_then(|b| b.hidden_layer(2, ActivationFunction::Relu));
        assert!(matches!(result, Err(GeneticError::Configuration(_))));
    }

    #[test]
    fn test_hidden_layer_before_count() {
        let result = NetworkBuilder::<i32>::new()
            .input(2)
            .and_then(|b| b.hidden_layer(2, ActivationFunction::Relu));
        assert!(matches!(result, Err(GeneticError::Configuration(_))));
    }

    #[test]
    fn test_input_twice() {
        let result = NetworkBuilder::<i32>::new().input(2).and_then(|b| b.input(3));
        assert!(matches!(result, Err(GeneticError::Configuration(_))));
    }

    #[test]
    fn test_zero_sizes_rejected() {
        assert!(NetworkBuilder::<i32>::new().input(0).is_err());
        let result = NetworkBuilder::<i32>::new()
            .input(1)
            .and_then(|b| b.hidden_layer_count(0));
        assert!(matches!(result, Err(GeneticError::Configuration(_))));
    }

    #[test]
    fn test_sigmoid_rejected_for_integer_network() {
        let result = NetworkBuilder::<i32>::new()
            .input(2)
            .and_then(|b| b.hidden_layer_count(1))
            .and_then(|b| b.hidden_layer(2, ActivationFunction::Sigmoid));
        assert!(matches!(
            result,
            Err(GeneticError::UnsupportedActivation {
                activation: "Sigmoid",
                scalar: "i32"
            })
        ));

        let result = NetworkBuilder::<i64>::new()
            .input(2)
            .and_then(|b| b.hidden_layer_count(1))
            .and_then(|b| b.hidden_layer(2, ActivationFunction::Relu))
            .and_then(|b| b.output_layer(1, ActivationFunction::Sigmoid));
        assert!(matches!(
            result,
            Err(GeneticError::UnsupportedActivation { .. })
        ));
    }
}
