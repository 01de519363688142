//! # Persistence
//!
//! Binary snapshots of networks and populations. Every field is written in
//! native byte order, without padding, version tags or length prefixes; each
//! length follows from fields read earlier. Counts and activation ids are
//! 32-bit signed integers.
//!
//! A network is stored as
//!
//! ```text
//! input_size, hidden_count, hidden_sizes[hidden_count],
//! hidden_activation_ids[hidden_count], output_size, output_activation_id,
//! weight[weight_size]
//! ```
//!
//! and a population as
//!
//! ```text
//! generation, population_size, chromosome_length, gene_min, gene_max,
//! elite_count, individuals[population_size * chromosome_length],
//! fitnesses[population_size]
//! ```
//!
//! ## Example
//!
//! ```rust
//! use gannet::network::{ActivationFunction, NetworkBuilder};
//! use gannet::persistence::{read_network, write_network};
//!
//! let mut network = NetworkBuilder::<i32>::new()
//!     .input(2)?
//!     .hidden_layer_count(1)?
//!     .hidden_layer(2, ActivationFunction::Relu)?
//!     .output_layer(1, ActivationFunction::Step)?;
//! network.set_weight(&[1, 1, 0, 1, 1, -1, 1, -2, 0])?;
//!
//! let mut bytes = Vec::new();
//! write_network(&network, &mut bytes)?;
//! let restored = read_network::<i32, _>(&mut bytes.as_slice())?;
//! assert_eq!(restored.weight(), network.weight());
//! # Ok::<(), gannet::error::GeneticError>(())
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use tracing::{debug, instrument};

use crate::error::{GeneticError, Result, ResultExt};
use crate::network::{ActivationFunction, LayerSpec, Network, Topology};
use crate::numeric::Scalar;
use crate::population::{Population, PopulationOptions};

fn write_count<W: Write>(writer: &mut W, what: &str, value: usize) -> Result<()> {
    let value = i32::try_from(value).map_err(|_| {
        GeneticError::Codec(format!("{} {} does not fit in 32 bits", what, value))
    })?;
    value.write_ne(writer)?;
    Ok(())
}

fn read_count<R: Read>(reader: &mut R, what: &str) -> Result<usize> {
    let value = i32::read_ne(reader)?;
    usize::try_from(value)
        .map_err(|_| GeneticError::Codec(format!("{} cannot be negative, got {}", what, value)))
}

fn read_activation<R: Read>(reader: &mut R) -> Result<ActivationFunction> {
    let id = i32::read_ne(reader)?;
    ActivationFunction::from_id(id)
        .ok_or_else(|| GeneticError::Codec(format!("Unknown activation id {}", id)))
}

/// Most values reserved ahead of the data actually read.
const READ_CHUNK: usize = 64 * 1024;

/// Reads `len` values, growing the buffer with the input so a forged count
/// fails on the missing payload rather than on a huge allocation.
fn read_values<T: Scalar, R: Read>(reader: &mut R, len: usize) -> Result<Vec<T>> {
    let mut values: Vec<T> = Vec::new();
    while values.len() < len {
        let chunk = READ_CHUNK.min(len - values.len());
        values.try_reserve_exact(chunk)?;
        for _ in 0..chunk {
            values.push(T::read_ne(reader)?);
        }
    }
    Ok(values)
}

fn write_values<T: Scalar, W: Write>(writer: &mut W, values: &[T]) -> Result<()> {
    for &value in values {
        value.write_ne(writer)?;
    }
    Ok(())
}

/// Writes the topology and weights of `network`.
#[instrument(level = "debug", skip_all, fields(weight_size = network.weight_size()))]
pub fn write_network<T: Scalar, W: Write>(network: &Network<T>, writer: &mut W) -> Result<()> {
    let topology = network.topology();
    write_count(writer, "Input size", topology.input_size)?;
    write_count(writer, "Hidden layer count", topology.hidden.len())?;
    for layer in &topology.hidden {
        write_count(writer, "Hidden layer size", layer.size)?;
    }
    for layer in &topology.hidden {
        layer.activation.id().write_ne(writer)?;
    }
    write_count(writer, "Output size", topology.output.size)?;
    topology.output.activation.id().write_ne(writer)?;
    write_values(writer, network.weight())
}

/// Reads a network written by [`write_network`]. The result has its weights
/// initialized.
///
/// # Errors
///
/// - `GeneticError::Io` if the input ends early.
/// - `GeneticError::Codec` for negative counts or unknown activation ids.
/// - Any error the builder reports for the stored topology, such as a zero
///   layer size or Sigmoid on an integer type.
#[instrument(level = "debug", skip_all)]
pub fn read_network<T: Scalar, R: Read>(reader: &mut R) -> Result<Network<T>> {
    let input_size = read_count(reader, "Input size")?;
    let hidden_count = read_count(reader, "Hidden layer count")?;

    let mut sizes: Vec<usize> = Vec::new();
    for _ in 0..hidden_count {
        sizes.push(read_count(reader, "Hidden layer size")?);
    }
    let mut hidden: Vec<LayerSpec> = Vec::with_capacity(sizes.len());
    for &size in &sizes {
        hidden.push(LayerSpec::new(size, read_activation(reader)?));
    }
    let output_size = read_count(reader, "Output size")?;
    let output = LayerSpec::new(output_size, read_activation(reader)?);

    let topology = Topology::new(input_size, hidden, output);
    topology.validate::<T>()?;
    let weight_size = topology.weight_size().ok_or_else(|| {
        GeneticError::Codec("Stored layer sizes overflow the weight count".to_string())
    })?;
    // The weights must be present before any layer buffer is sized from the header.
    let weight = read_values(reader, weight_size)?;
    let mut network = topology.build::<T>()?;
    network.set_weight(&weight)?;
    debug!(weight_size = network.weight_size(), "network loaded");
    Ok(network)
}

/// Writes the configuration, individuals and fitness values of `population`.
///
/// Only an evaluated population can be written, since the reader restores
/// the stored fitness values as the current ones.
///
/// # Errors
///
/// - `GeneticError::Configuration` if the population was never reset, has
///   no individuals, or was not evaluated since its last change.
/// - `GeneticError::Codec` if a count does not fit the 32-bit format.
#[instrument(level = "debug", skip_all, fields(generation = population.generation()))]
pub fn write_population<G: Scalar, F: Scalar, W: Write>(
    population: &Population<G, F>,
    writer: &mut W,
) -> Result<()> {
    let options = population.options()?;
    if !population.has_individuals() || !population.is_evaluated() {
        return Err(GeneticError::Configuration(format!(
            "Generation {} must be evaluated before it is written",
            population.generation()
        )));
    }
    write_count(writer, "Generation", population.generation())?;
    write_count(writer, "Population size", options.population_size())?;
    write_count(writer, "Chromosome length", options.chromosome_length())?;
    options.gene_min().write_ne(writer)?;
    options.gene_max().write_ne(writer)?;
    write_count(writer, "Elite count", options.elite_count())?;
    write_values(writer, population.individuals())?;
    write_values(writer, population.fitnesses())
}

/// Reads a population written by [`write_population`] into `population`,
/// keeping its random generator. The restored population counts as
/// evaluated with the stored fitness values.
///
/// # Errors
///
/// - `GeneticError::Io` if the input ends early.
/// - `GeneticError::Codec` for negative counts.
/// - The errors of [`Population::reset`], [`Population::set_individuals`]
///   and [`Population::evaluate`] for an inconsistent snapshot.
///
/// On error `population` is left unchanged.
#[instrument(level = "debug", skip_all)]
pub fn read_population_into<G: Scalar, F: Scalar, R: Read>(
    population: &mut Population<G, F>,
    reader: &mut R,
) -> Result<()> {
    let generation = read_count(reader, "Generation")?;
    let population_size = read_count(reader, "Population size")?;
    let chromosome_length = read_count(reader, "Chromosome length")?;
    let gene_min = G::read_ne(reader)?;
    let gene_max = G::read_ne(reader)?;
    let elite_count = read_count(reader, "Elite count")?;

    let options = PopulationOptions::new(
        population_size,
        chromosome_length,
        gene_min,
        gene_max,
        elite_count,
    )
    .with_generation(generation);
    // Rejects garbage headers before sizing any buffer from them.
    options.validate()?;

    let genes = population_size
        .checked_mul(chromosome_length)
        .ok_or_else(|| {
            GeneticError::Codec(format!(
                "{} × {} genes overflow the address space",
                population_size, chromosome_length
            ))
        })?;
    let individuals = read_values::<G, _>(reader, genes)?;
    let fitnesses = read_values::<F, _>(reader, population_size)?;

    population.restore(options, &individuals, &fitnesses)?;
    debug!(generation, population_size, "population loaded");
    Ok(())
}

/// Reads a population written by [`write_population`] into a new population
/// seeded from entropy.
pub fn read_population<G: Scalar, F: Scalar, R: Read>(reader: &mut R) -> Result<Population<G, F>> {
    let mut population = Population::new();
    read_population_into(&mut population, reader)?;
    Ok(population)
}

pub fn save_network<T: Scalar, P: AsRef<Path>>(network: &Network<T>, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).context(format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write_network(network, &mut writer)?;
    writer.flush()?;
    Ok(())
}

pub fn load_network<T: Scalar, P: AsRef<Path>>(path: P) -> Result<Network<T>> {
    let path = path.as_ref();
    let file = File::open(path).context(format!("Failed to open {}", path.display()))?;
    let mut reader = BufReader::new(file);
    read_network(&mut reader)
}

pub fn save_population<G: Scalar, F: Scalar, P: AsRef<Path>>(
    population: &Population<G, F>,
    path: P,
) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).context(format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write_population(population, &mut writer)?;
    writer.flush()?;
    Ok(())
}

pub fn load_population<G: Scalar, F: Scalar, P: AsRef<Path>>(path: P) -> Result<Population<G, F>> {
    let path = path.as_ref();
    let file = File::open(path).context(format!("Failed to open {}", path.display()))?;
    let mut reader = BufReader::new(file);
    read_population(&mut reader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::NetworkBuilder;
    use crate::rng::RandomNumberGenerator;
    use std::io::ErrorKind;

    fn xor_network() -> Network<i32> {
        let mut network = NetworkBuilder::new()
            .input(2)
            .unwrap()
            .hidden_layer_count(1)
            .unwrap()
            .hidden_layer(2, ActivationFunction::Relu)
            .unwrap()
            .output_layer(1, ActivationFunction::Step)
            .unwrap();
        network.set_weight(&[1, 1, 0, 1, 1, -1, 1, -2, 0]).unwrap();
        network
    }

    fn encode(values: &[i32]) -> Vec<u8> {
        values.iter().flat_map(|value| value.to_ne_bytes()).collect()
    }

    #[test]
    fn test_network_layout() {
        let mut bytes = Vec::new();
        write_network(&xor_network(), &mut bytes).unwrap();
        let expected = encode(&[2, 1, 2, 1, 1, 3, 1, 1, 0, 1, 1, -1, 1, -2, 0]);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_network_from_raw_bytes() {
        let bytes = encode(&[2, 1, 2, 1, 1, 3, 1, 1, 0, 1, 1, -1, 1, -2, 0]);
        let mut network: Network<i32> = read_network(&mut bytes.as_slice()).unwrap();
        assert!(network.weights_initialized());
        assert_eq!(network.forward_propagate(&[0, 1]).unwrap(), &[1]);
        assert_eq!(network.forward_propagate(&[1, 1]).unwrap(), &[0]);
    }

    #[test]
    fn test_truncated_network_is_io_error() {
        let mut bytes = Vec::new();
        write_network(&xor_network(), &mut bytes).unwrap();
        bytes.truncate(bytes.len() - 1);
        match read_network::<i32, _>(&mut bytes.as_slice()) {
            Err(GeneticError::Io(e)) => assert_eq!(e.kind(), ErrorKind::UnexpectedEof),
            other => panic!("Expected Io error, got {:?}", other),
        }
    }

    #[test]
    fn test_large_network_header_without_weights_is_io_error() {
        // 100000 inputs into 100000 ReLU units: about 10^10 weights claimed.
        let bytes = encode(&[100_000, 1, 100_000, 1, 1, 0]);
        match read_network::<f64, _>(&mut bytes.as_slice()) {
            Err(GeneticError::Io(e)) => assert_eq!(e.kind(), ErrorKind::UnexpectedEof),
            other => panic!("Expected Io error, got {:?}", other),
        }
    }

    #[test]
    fn test_negative_count_is_codec_error() {
        let bytes = encode(&[2, -1]);
        assert!(matches!(
            read_network::<i32, _>(&mut bytes.as_slice()),
            Err(GeneticError::Codec(_))
        ));
    }

    #[test]
    fn test_unknown_activation_is_codec_error() {
        let bytes = encode(&[2, 1, 2, 7]);
        assert!(matches!(
            read_network::<i32, _>(&mut bytes.as_slice()),
            Err(GeneticError::Codec(_))
        ));
    }

    #[test]
    fn test_stored_sigmoid_rejected_for_integers() {
        let bytes = encode(&[1, 1, 1, 2, 1, 0, 0, 0, 0, 0]);
        assert!(matches!(
            read_network::<i32, _>(&mut bytes.as_slice()),
            Err(GeneticError::UnsupportedActivation { .. })
        ));
    }

    #[test]
    fn test_zero_hidden_layers_rejected() {
        let bytes = encode(&[1, 0, 1, 0]);
        assert!(matches!(
            read_network::<i32, _>(&mut bytes.as_slice()),
            Err(GeneticError::Configuration(_))
        ));
    }

    fn small_population() -> Population<i32, f64> {
        let mut population = Population::with_rng(RandomNumberGenerator::from_seed(21));
        population
            .reset(PopulationOptions::new(3, 2, -5, 5, 1).with_generation(4))
            .unwrap();
        population.set_individuals(&[1, -1, 5, 0, -5, 2]).unwrap();
        population.evaluate(&[0.5, -2.25, 3.0]).unwrap();
        population
    }

    #[test]
    fn test_population_layout() {
        let mut bytes = Vec::new();
        write_population(&small_population(), &mut bytes).unwrap();

        let mut expected = encode(&[4, 3, 2, -5, 5, 1, 1, -1, 5, 0, -5, 2]);
        for fitness in [0.5f64, -2.25, 3.0] {
            expected.extend_from_slice(&fitness.to_ne_bytes());
        }
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_population_round_trip_is_evaluated() {
        let original = small_population();
        let mut bytes = Vec::new();
        write_population(&original, &mut bytes).unwrap();

        let restored: Population<i32, f64> = read_population(&mut bytes.as_slice()).unwrap();
        assert_eq!(restored.generation(), 4);
        assert_eq!(restored.options().unwrap(), original.options().unwrap());
        assert_eq!(restored.individuals(), original.individuals());
        assert_eq!(restored.fitnesses(), original.fitnesses());
        assert!(restored.is_evaluated());
        assert_eq!(restored.best().unwrap(), (2, 3.0));
    }

    #[test]
    fn test_unreset_population_cannot_be_written() {
        let population: Population<i32, i32> = Population::new();
        let mut bytes = Vec::new();
        assert!(matches!(
            write_population(&population, &mut bytes),
            Err(GeneticError::Configuration(_))
        ));
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_bred_population_cannot_be_written_until_evaluated() {
        let mut population = small_population();
        population.generate_next_generation().unwrap();
        let mut bytes = Vec::new();
        assert!(matches!(
            write_population(&population, &mut bytes),
            Err(GeneticError::Configuration(_))
        ));
        assert!(bytes.is_empty());

        population.evaluate(&[1.0, 2.0, 3.0]).unwrap();
        write_population(&population, &mut bytes).unwrap();
        let restored: Population<i32, f64> = read_population(&mut bytes.as_slice()).unwrap();
        assert_eq!(restored.generation(), 5);
        assert_eq!(restored.fitnesses(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_unset_population_cannot_be_written() {
        let mut population: Population<i32, i32> = Population::new();
        population.reset(PopulationOptions::new(2, 2, 0, 1, 0)).unwrap();
        let mut bytes = Vec::new();
        assert!(matches!(
            write_population(&population, &mut bytes),
            Err(GeneticError::Configuration(_))
        ));
    }

    #[test]
    fn test_large_population_header_without_genes_is_io_error() {
        let bytes = encode(&[1, 100_000, 100_000, 0, 1, 0]);
        match read_population::<i32, i32, _>(&mut bytes.as_slice()) {
            Err(GeneticError::Io(e)) => assert_eq!(e.kind(), ErrorKind::UnexpectedEof),
            other => panic!("Expected Io error, got {:?}", other),
        }
    }

    #[test]
    fn test_values_spanning_several_chunks() {
        let len = READ_CHUNK * 2 + 3;
        let values: Vec<i32> = (0..len as i32).collect();
        let bytes = encode(&values);
        let read: Vec<i32> = read_values(&mut bytes.as_slice(), len).unwrap();
        assert_eq!(read, values);
    }

    #[test]
    fn test_invalid_snapshot_leaves_target_untouched() {
        let mut target = small_population();
        // Gene 9 lies outside [-5, 5].
        let mut bytes = encode(&[1, 1, 1, -5, 5, 0, 9]);
        bytes.extend_from_slice(&1.0f64.to_ne_bytes());

        assert!(matches!(
            read_population_into(&mut target, &mut bytes.as_slice()),
            Err(GeneticError::OutOfBounds(_))
        ));
        assert_eq!(target.generation(), 4);
        assert_eq!(target.individuals(), &[1, -1, 5, 0, -5, 2]);
    }

    #[test]
    fn test_invalid_header_is_rejected_before_reading_genes() {
        // Elite count equal to the population size.
        let bytes = encode(&[1, 2, 1, 0, 1, 2]);
        assert!(matches!(
            read_population::<i32, i32, _>(&mut bytes.as_slice()),
            Err(GeneticError::Configuration(_))
        ));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = std::env::temp_dir();
        let network_path = dir.join(format!("gannet-net-{}.bin", std::process::id()));
        let population_path = dir.join(format!("gannet-pop-{}.bin", std::process::id()));

        let network = xor_network();
        save_network(&network, &network_path).unwrap();
        let loaded: Network<i32> = load_network(&network_path).unwrap();
        assert_eq!(loaded.topology(), network.topology());
        assert_eq!(loaded.weight(), network.weight());

        let population = small_population();
        save_population(&population, &population_path).unwrap();
        let loaded: Population<i32, f64> = load_population(&population_path).unwrap();
        assert_eq!(loaded.individuals(), population.individuals());

        std::fs::remove_file(network_path).unwrap();
        std::fs::remove_file(population_path).unwrap();
    }

    #[test]
    fn test_open_failure_names_the_path() {
        let path = std::env::temp_dir()
            .join(format!("gannet-missing-{}", std::process::id()))
            .join("population.bin");
        match load_population::<i32, i32, _>(&path) {
            Err(GeneticError::Other(msg)) => {
                assert!(msg.starts_with("Failed to open"));
                assert!(msg.contains("population.bin"));
            }
            other => panic!("Expected Other error, got {:?}", other),
        }
        assert!(matches!(
            save_network(&xor_network(), &path),
            Err(GeneticError::Other(_))
        ));
    }
}
