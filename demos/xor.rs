//! Trains a 2-2-1 integer network to compute XOR by searching its weights
//! with the genetic algorithm, then round-trips the network and the
//! population through snapshot files.
//!
//! ```text
//! cargo run --example xor
//! ```

use gannet::error::Result;
use gannet::network::{ActivationFunction, Network, NetworkBuilder};
use gannet::persistence::{load_network, load_population, save_network, save_population};
use gannet::population::{Population, PopulationOptions};
use tracing::{info, Level};

const POPULATION_SIZE: usize = 20;
const GENE_MIN: i32 = -9;
const GENE_MAX: i32 = 9;
const ELITE_COUNT: usize = 1;
const MAX_GENERATIONS: usize = 10_000;

const INPUTS: [[i32; 2]; 4] = [[0, 0], [0, 1], [1, 0], [1, 1]];
const IDEAL: [i32; 4] = [0, 1, 1, 0];

/// Sum of absolute output errors over the truth table.
fn xor_error(network: &mut Network<i32>) -> Result<i32> {
    let mut error = 0;
    for (input, ideal) in INPUTS.iter().zip(IDEAL) {
        let output = network.forward_propagate(input)?;
        error += (output[0] - ideal).abs();
    }
    Ok(error)
}

fn print_network(network: &Network<i32>) -> Result<()> {
    println!("input layer size  = {}", network.input_layer_size());
    println!("hidden layers     = {}", network.hidden_layer_count());
    for index in 0..network.hidden_layer_count() {
        println!(
            "hidden layer {}    = {} units, {}",
            index,
            network.hidden_layer_size(index)?,
            network.hidden_layer_activation(index)?
        );
    }
    println!(
        "output layer      = {} units, {}",
        network.output_layer_size(),
        network.output_layer_activation()
    );
    println!("weights           = {:?}", network.weight());
    Ok(())
}

fn print_population(population: &Population<i32, i32>) -> Result<()> {
    println!(
        "generation {}, {} candidates of length {}, genes in [{}, {}], {} elite",
        population.generation(),
        population.population_size(),
        population.chromosome_length(),
        population.gene_min(),
        population.gene_max(),
        population.elite_count()
    );
    for index in 0..population.population_size() {
        println!("  {:>2}: {:?}", index, population.individual(index)?);
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let mut network = NetworkBuilder::<i32>::new()
        .input(2)?
        .hidden_layer_count(1)?
        .hidden_layer(2, ActivationFunction::Relu)?
        .output_layer(1, ActivationFunction::Step)?;

    let mut population: Population<i32, i32> = Population::new();
    population.reset(PopulationOptions::new(
        POPULATION_SIZE,
        network.weight_size(),
        GENE_MIN,
        GENE_MAX,
        ELITE_COUNT,
    ))?;
    population.set_individuals_random(GENE_MIN, GENE_MAX)?;
    print_population(&population)?;

    loop {
        // The fewer errors, the fitter.
        population.evaluate_with(&network, |candidate| Ok(-xor_error(candidate)?))?;
        population.generate_next_generation()?;

        // Row 0 holds the elite of the generation just scored.
        network.set_weight(population.individual(0)?)?;
        let error = xor_error(&mut network)?;
        info!(generation = population.generation(), error, "elite scored");

        if error == 0 {
            info!(generation = population.generation(), "XOR learned");
            break;
        }
        if population.generation() >= MAX_GENERATIONS {
            info!("giving up after {} generations", MAX_GENERATIONS);
            break;
        }
    }

    for input in &INPUTS {
        let output = network.forward_propagate(input)?;
        println!("({}, {}) -> {}", input[0], input[1], output[0]);
    }

    let dir = std::env::temp_dir();
    let network_path = dir.join("gannet-xor-network.dat");
    let population_path = dir.join("gannet-xor-population.dat");

    save_network(&network, &network_path)?;
    let restored: Network<i32> = load_network(&network_path)?;
    println!("network loaded from {}", network_path.display());
    print_network(&restored)?;

    // Score the bred generation so the snapshot carries its own fitnesses.
    population.evaluate_with(&network, |candidate| Ok(-xor_error(candidate)?))?;
    save_population(&population, &population_path)?;
    let restored: Population<i32, i32> = load_population(&population_path)?;
    println!("population loaded from {}", population_path.display());
    print_population(&restored)?;

    Ok(())
}
