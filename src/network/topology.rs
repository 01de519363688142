use super::builder::non_zero;
use super::{ActivationFunction, Network, NetworkBuilder};
use crate::error::Result;
use crate::numeric::Scalar;

/// Size and activation of one hidden or output layer.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerSpec {
    pub size: usize,
    pub activation: ActivationFunction,
}

impl LayerSpec {
    pub fn new(size: usize, activation: ActivationFunction) -> Self {
        Self { size, activation }
    }
}

/// Layer structure of a network, independent of its numeric type and weights.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    pub input_size: usize,
    pub hidden: Vec<LayerSpec>,
    pub output: LayerSpec,
}

impl Topology {
    pub fn new(input_size: usize, hidden: Vec<LayerSpec>, output: LayerSpec) -> Self {
        Self {
            input_size,
            hidden,
            output,
        }
    }

    /// Closed-form weight count: for every consecutive pair of layers,
    /// `(source size + 1) * destination size`. `None` on overflow.
    pub fn weight_size(&self) -> Option<usize> {
        let sizes: Vec<usize> = std::iter::once(self.input_size)
            .chain(self.hidden.iter().map(|layer| layer.size))
            .chain(std::iter::once(self.output.size))
            .collect();
        sizes.windows(2).try_fold(0usize, |total, pair| {
            pair[0]
                .checked_add(1)?
                .checked_mul(pair[1])
                .and_then(|len| total.checked_add(len))
        })
    }

    /// Checks layer sizes and activations for `T` without allocating,
    /// reporting the errors [`build`](Self::build) would.
    pub fn validate<T: Scalar>(&self) -> Result<()> {
        non_zero("Input layer", self.input_size)?;
        non_zero("Hidden layer count", self.hidden.len())?;
        for layer in &self.hidden {
            non_zero("Hidden layer", layer.size)?;
            layer.activation.kernel::<T>()?;
        }
        non_zero("Output layer", self.output.size)?;
        self.output.activation.kernel::<T>()?;
        Ok(())
    }

    /// Runs the builder protocol for this topology.
    pub fn build<T: Scalar>(&self) -> Result<Network<T>> {
        let mut builder = NetworkBuilder::<T>::new()
            .input(self.input_size)?
            .hidden_layer_count(self.hidden.len())?;
        for layer in &self.hidden {
            builder = builder.hidden_layer(layer.size, layer.activation)?;
        }
        builder.output_layer(self.output.size, self.output.activation)
    }
}
