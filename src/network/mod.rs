//! # Network
//!
//! A fixed-topology feed-forward evaluator over a [`Scalar`] type. A network
//! consists of an input layer, one or more hidden layers and an output layer.
//! Every layer except the output layer carries a bias unit whose value is
//! pinned to 1.
//!
//! Weights live in one flat buffer, partitioned into one [`WeightBlock`] per
//! layer transition. Within a block, each destination unit owns a contiguous
//! slice of `source_units` weights (bias weight last), so forward propagation
//! walks the buffer strictly front to back.
//!
//! ## Example
//!
//! ```rust
//! use gannet::network::{ActivationFunction, NetworkBuilder};
//!
//! let mut network = NetworkBuilder::<i32>::new()
//!     .input(2)?
//!     .hidden_layer_count(1)?
//!     .hidden_layer(2, ActivationFunction::Relu)?
//!     .output_layer(1, ActivationFunction::Step)?;
//! assert_eq!(network.weight_size(), 9);
//!
//! network.set_weight(&[1, 1, 0, 1, 1, -1, 1, -2, 0])?;
//! assert_eq!(network.forward_propagate(&[1, 0])?, &[1]);
//! assert_eq!(network.forward_propagate(&[1, 1])?, &[0]);
//! # Ok::<(), gannet::error::GeneticError>(())
//! ```

pub mod activation;
pub mod builder;
pub mod topology;

use std::ops::Range;

use crate::error::{GeneticError, Result};
use crate::numeric::Scalar;
use crate::rng::RandomNumberGenerator;

pub use activation::{ActivationFunction, Kernel};
pub use builder::{BuildState, NetworkBuilder};
pub use topology::{LayerSpec, Topology};

/// The slice of the weight buffer that connects one layer to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightBlock {
    /// First weight of the block.
    pub offset: usize,
    /// Units of the source layer, bias included.
    pub source_units: usize,
    /// Units of the destination layer.
    pub destination_units: usize,
}

impl WeightBlock {
    pub fn len(&self) -> usize {
        self.source_units * self.destination_units
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.len()
    }

    /// Weights feeding destination unit `unit`.
    pub fn unit_range(&self, unit: usize) -> Range<usize> {
        let start = self.offset + unit * self.source_units;
        start..start + self.source_units
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Layer<T: Scalar> {
    size: usize,
    /// `size` node values, followed by the bias unit when present.
    values: Vec<T>,
    activation: ActivationFunction,
    kernel: Kernel<T>,
}

impl<T: Scalar> Layer<T> {
    pub(crate) fn new(
        size: usize,
        with_bias: bool,
        activation: ActivationFunction,
    ) -> Result<Self> {
        let kernel = activation.kernel::<T>()?;
        let units = if with_bias {
            size.checked_add(1).ok_or_else(|| {
                GeneticError::Allocation(format!("Layer of {} units is too large", size))
            })?
        } else {
            size
        };
        let mut values = crate::error::try_filled(units, T::ZERO)?;
        if with_bias {
            values[size] = T::ONE;
        }
        Ok(Self {
            size,
            values,
            activation,
            kernel,
        })
    }

    /// Units this layer feeds into the next block, bias included.
    pub(crate) fn units(&self) -> usize {
        self.values.len()
    }
}

/// A configured feed-forward network. Obtain one from [`NetworkBuilder`] or
/// [`Topology::build`].
///
/// Cloning a network yields an independent weight buffer, which is how
/// parallel fitness evaluation gives every worker its own evaluator.
#[derive(Debug, Clone)]
pub struct Network<T: Scalar> {
    /// Input layer, hidden layers in order, output layer.
    layers: Vec<Layer<T>>,
    blocks: Vec<WeightBlock>,
    weight: Vec<T>,
    weights_initialized: bool,
}

impl<T: Scalar> Network<T> {
    pub(crate) fn from_parts(layers: Vec<Layer<T>>, blocks: Vec<WeightBlock>, weight: Vec<T>) -> Self {
        Self {
            layers,
            blocks,
            weight,
            weights_initialized: false,
        }
    }

    /// Overwrites the whole weight buffer.
    ///
    /// # Errors
    ///
    /// Returns `GeneticError::ShapeMismatch` when `weight` is not exactly
    /// `weight_size()` long; the network is left untouched.
    pub fn set_weight(&mut self, weight: &[T]) -> Result<()> {
        if weight.len() != self.weight.len() {
            return Err(GeneticError::ShapeMismatch {
                what: "weight buffer",
                expected: self.weight.len(),
                actual: weight.len(),
            });
        }
        self.weight.copy_from_slice(weight);
        self.weights_initialized = true;
        Ok(())
    }

    /// Draws every weight independently from `[min, max]`.
    ///
    /// # Errors
    ///
    /// Returns `GeneticError::OutOfBounds` if the range is inverted or, for
    /// reals, its width is not finite.
    pub fn set_weight_random(
        &mut self,
        min: T,
        max: T,
        rng: &mut RandomNumberGenerator,
    ) -> Result<()> {
        if !T::is_sampleable(min, max) {
            return Err(GeneticError::OutOfBounds(format!(
                "Weight range [{}, {}] is not an ordered interval of finite width",
                min, max
            )));
        }
        rng.fill_uniform(&mut self.weight, min, max);
        self.weights_initialized = true;
        Ok(())
    }

    /// Propagates `input` through every layer and returns the output layer's
    /// values. The returned slice is reused by the next call.
    ///
    /// # Errors
    ///
    /// - `GeneticError::Configuration` if no weights have been set yet.
    /// - `GeneticError::ShapeMismatch` if `input` does not match the input layer.
    pub fn forward_propagate(&mut self, input: &[T]) -> Result<&[T]> {
        if !self.weights_initialized {
            return Err(GeneticError::Configuration(
                "Weights must be set before forward propagation".to_string(),
            ));
        }

        let input_size = self.input_layer_size();
        if input.len() != input_size {
            return Err(GeneticError::ShapeMismatch {
                what: "input layer",
                expected: input_size,
                actual: input.len(),
            });
        }

        // The bias slot past `input_size` is never written.
        self.layers[0].values[..input_size].copy_from_slice(input);

        for (index, block) in self.blocks.iter().enumerate() {
            let (sources, destinations) = self.layers.split_at_mut(index + 1);
            let source = &sources[index].values;
            let destination = &mut destinations[0];
            let kernel = destination.kernel;

            let weights = &self.weight[block.range()];
            for (value, row) in destination
                .values
                .iter_mut()
                .zip(weights.chunks_exact(block.source_units))
            {
                let sum = row
                    .iter()
                    .zip(source)
                    .fold(T::ZERO, |acc, (&w, &x)| acc.wrapping_add(x.wrapping_mul(w)));
                *value = kernel(sum);
            }
        }

        Ok(&self.output_layer().values)
    }

    pub fn input_layer_size(&self) -> usize {
        self.layers[0].size
    }

    pub fn hidden_layer_count(&self) -> usize {
        self.layers.len() - 2
    }

    pub fn hidden_layer_size(&self, index: usize) -> Result<usize> {
        self.hidden_layer(index).map(|layer| layer.size)
    }

    pub fn hidden_layer_activation(&self, index: usize) -> Result<ActivationFunction> {
        self.hidden_layer(index).map(|layer| layer.activation)
    }

    pub fn output_layer_size(&self) -> usize {
        self.output_layer().size
    }

    pub fn output_layer_activation(&self) -> ActivationFunction {
        self.output_layer().activation
    }

    pub fn weight_size(&self) -> usize {
        self.weight.len()
    }

    pub fn weight(&self) -> &[T] {
        &self.weight
    }

    pub fn weight_blocks(&self) -> &[WeightBlock] {
        &self.blocks
    }

    pub fn weights_initialized(&self) -> bool {
        self.weights_initialized
    }

    /// Describes the layer structure, without weights.
    pub fn topology(&self) -> Topology {
        let hidden = self.layers[1..self.layers.len() - 1]
            .iter()
            .map(|layer| LayerSpec::new(layer.size, layer.activation))
            .collect();
        let output = self.output_layer();
        Topology::new(
            self.input_layer_size(),
            hidden,
            LayerSpec::new(output.size, output.activation),
        )
    }

    fn hidden_layer(&self, index: usize) -> Result<&Layer<T>> {
        let count = self.hidden_layer_count();
        if index >= count {
            return Err(GeneticError::OutOfBounds(format!(
                "Hidden layer index {} out of range for {} hidden layers",
                index, count
            )));
        }
        Ok(&self.layers[index + 1])
    }

    fn output_layer(&self) -> &Layer<T> {
        &self.layers[self.layers.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xor_network() -> Network<i32> {
        NetworkBuilder::new()
            .input(2)
            .unwrap()
            .hidden_layer_count(1)
            .unwrap()
            .hidden_layer(2, ActivationFunction::Relu)
            .unwrap()
            .output_layer(1, ActivationFunction::Step)
            .unwrap()
    }

    #[test]
    fn test_forward_before_weights_is_rejected() {
        let mut network = xor_network();
        assert!(!network.weights_initialized());
        assert!(matches!(
            network.forward_propagate(&[0, 1]),
            Err(GeneticError::Configuration(_))
        ));
    }

    #[test]
    fn test_set_weight_wrong_length_leaves_network_untouched() {
        let mut network = xor_network();
        let result = network.set_weight(&[1; 8]);
        assert!(matches!(
            result,
            Err(GeneticError::ShapeMismatch {
                expected: 9,
                actual: 8,
                ..
            })
        ));
        assert!(!network.weights_initialized());
        assert!(network.weight().iter().all(|&w| w == 0));
    }

    #[test]
    fn test_input_length_is_checked() {
        let mut network = xor_network();
        network.set_weight(&[0; 9]).unwrap();
        assert!(matches!(
            network.forward_propagate(&[1, 0, 1]),
            Err(GeneticError::ShapeMismatch { expected: 2, .. })
        ));
    }

    #[test]
    fn test_bias_unit_survives_forward_pass() {
        let mut network = xor_network();
        network.set_weight(&[1, 1, 0, 1, 1, -1, 1, -2, 0]).unwrap();
        network.forward_propagate(&[1, 1]).unwrap();
        assert_eq!(network.layers[0].values, vec![1, 1, 1]);
        assert_eq!(network.layers[1].values[2], 1);
        assert_eq!(network.layers[2].values.len(), 1);
    }

    #[test]
    fn test_weight_blocks_tile_buffer() {
        let network = xor_network();
        let blocks = network.weight_blocks();
        assert_eq!(
            blocks,
            &[
                WeightBlock {
                    offset: 0,
                    source_units: 3,
                    destination_units: 2
                },
                WeightBlock {
                    offset: 6,
                    source_units: 3,
                    destination_units: 1
                },
            ]
        );
        assert_eq!(blocks[0].unit_range(1), 3..6);
        assert_eq!(blocks[1].range(), 6..9);
    }

    #[test]
    fn test_set_weight_random_respects_range() {
        let mut network = xor_network();
        let mut rng = RandomNumberGenerator::from_seed(11);
        network.set_weight_random(-3, 3, &mut rng).unwrap();
        assert!(network.weights_initialized());
        assert!(network.weight().iter().all(|w| (-3..=3).contains(w)));

        assert!(matches!(
            network.set_weight_random(3, -3, &mut rng),
            Err(GeneticError::OutOfBounds(_))
        ));
    }

    #[test]
    fn test_set_weight_random_rejects_non_finite() {
        let mut network: Network<f64> = NetworkBuilder::new()
            .input(1)
            .unwrap()
            .hidden_layer_count(1)
            .unwrap()
            .hidden_layer(1, ActivationFunction::Sigmoid)
            .unwrap()
            .output_layer(1, ActivationFunction::Identity)
            .unwrap();
        let mut rng = RandomNumberGenerator::from_seed(5);
        assert!(matches!(
            network.set_weight_random(f64::NEG_INFINITY, 1.0, &mut rng),
            Err(GeneticError::OutOfBounds(_))
        ));
        assert!(matches!(
            network.set_weight_random(-f64::MAX, f64::MAX, &mut rng),
            Err(GeneticError::OutOfBounds(_))
        ));
        assert!(!network.weights_initialized());
    }

    #[test]
    fn test_hidden_layer_accessors() {
        let network = xor_network();
        assert_eq!(network.input_layer_size(), 2);
        assert_eq!(network.hidden_layer_count(), 1);
        assert_eq!(network.hidden_layer_size(0).unwrap(), 2);
        assert_eq!(
            network.hidden_layer_activation(0).unwrap(),
            ActivationFunction::Relu
        );
        assert!(network.hidden_layer_size(1).is_err());
        assert_eq!(network.output_layer_size(), 1);
        assert_eq!(network.output_layer_activation(), ActivationFunction::Step);
    }

    #[test]
    fn test_integer_overflow_wraps() {
        let mut network: Network<i32> = NetworkBuilder::new()
            .input(1)
            .unwrap()
            .hidden_layer_count(1)
            .unwrap()
            .hidden_layer(1, ActivationFunction::Identity)
            .unwrap()
            .output_layer(1, ActivationFunction::Identity)
            .unwrap();
        network.set_weight(&[i32::MAX, 1, 1, 0]).unwrap();
        let output = network.forward_propagate(&[1]).unwrap();
        assert_eq!(output, &[i32::MIN]);
    }

    #[test]
    fn test_clone_has_independent_weights() {
        let mut network = xor_network();
        network.set_weight(&[1; 9]).unwrap();
        let mut copy = network.clone();
        copy.set_weight(&[2; 9]).unwrap();
        assert_eq!(network.weight(), &[1; 9]);
        assert_eq!(copy.weight(), &[2; 9]);
    }
}
