//! # Error Types
//!
//! This module defines the error type shared by the network evaluator, the
//! genetic algorithm and the persistence layer. Every operation that can detect
//! misuse (an out-of-order builder call, a buffer of the wrong length, a gene
//! outside its bounds) reports it through [`GeneticError`] instead of
//! corrupting state.
//!
//! ## Examples
//!
//! Using the `Result` type:
//!
//! ```rust
//! use gannet::error::{GeneticError, Result};
//!
//! fn some_function() -> Result<()> {
//!     Ok(())
//! }
//!
//! match some_function() {
//!     Ok(_) => println!("Success!"),
//!     Err(e) => println!("Error: {}", e),
//! }
//! ```
//!
//! Using the `ResultExt` trait to add context to errors:
//!
//! ```rust
//! use gannet::error::{Result, ResultExt};
//! use std::fs::File;
//!
//! fn open_snapshot(path: &str) -> Result<File> {
//!     File::open(path).context("Failed to open snapshot")
//! }
//! ```
//!
//! Using the `OptionExt` trait to convert `Option` to `Result`:
//!
//! ```rust
//! use gannet::error::{GeneticError, OptionExt};
//!
//! fn best(fitnesses: &[i32]) -> gannet::error::Result<i32> {
//!     fitnesses.iter().max().cloned().ok_or_else_genetic(||
//!         GeneticError::EmptyPopulation
//!     )
//! }
//! ```

use std::collections::TryReserveError;
use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// Represents errors that can occur while building networks, breeding
/// populations or persisting either of them.
#[derive(Error, Debug)]
pub enum GeneticError {
    /// An operation was called before its required predecessors, or with
    /// parameters that make the configuration unusable.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A supplied buffer does not have the length the component expects.
    #[error("Shape mismatch: {what} expects {expected} values, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// An index or a value lies outside its valid range.
    #[error("Bounds error: {0}")]
    OutOfBounds(String),

    /// An activation function was selected for a numeric type it is not
    /// defined for.
    #[error("Activation {activation} is not supported for {scalar} values")]
    UnsupportedActivation {
        activation: &'static str,
        scalar: &'static str,
    },

    /// Error that occurs when a population is used without any candidates.
    #[error("Empty population error: Cannot operate on an empty population")]
    EmptyPopulation,

    /// Error that occurs when fitness values cannot be used for selection.
    #[error("Fitness calculation error: {0}")]
    FitnessCalculation(String),

    /// A buffer could not be allocated.
    #[error("Allocation error: {0}")]
    Allocation(String),

    /// Persisted data is structurally invalid.
    #[error("Codec error: {0}")]
    Codec(String),

    /// Error that occurs when an I/O operation fails.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A generic error with a custom message.
    #[error("{0}")]
    Other(String),
}

impl From<TryReserveError> for GeneticError {
    fn from(error: TryReserveError) -> Self {
        GeneticError::Allocation(error.to_string())
    }
}

/// A specialized Result type for this crate.
///
/// This type is a convenience wrapper around `std::result::Result` with the error type
/// fixed to `GeneticError`.
pub type Result<T> = std::result::Result<T, GeneticError>;

/// Extension trait for Result to add context to errors.
///
/// ## Examples
///
/// ```rust
/// use gannet::error::ResultExt;
/// use std::fs::File;
///
/// fn read_file(path: &str) -> gannet::error::Result<()> {
///     File::open(path).context("Failed to open file")?;
///     Ok(())
/// }
/// ```
pub trait ResultExt<T, E> {
    /// Converts the error to a `GeneticError` prefixed with `context`.
    fn context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static;
}

impl<T, E> ResultExt<T, E> for std::result::Result<T, E>
where
    E: StdError + Send + Sync + 'static,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| GeneticError::Other(format!("{}: {}", context, e)))
    }
}

/// Extension trait for Option to convert to Result with a custom error.
pub trait OptionExt<T> {
    /// Converts an `Option<T>` to a `Result<T, GeneticError>` using
    /// a closure to generate the error.
    fn ok_or_else_genetic<F>(self, err_fn: F) -> Result<T>
    where
        F: FnOnce() -> GeneticError;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_else_genetic<F>(self, err_fn: F) -> Result<T>
    where
        F: FnOnce() -> GeneticError,
    {
        self.ok_or_else(err_fn)
    }
}

/// Allocates a vector of `len` copies of `value`, reporting allocation
/// failure instead of aborting.
pub(crate) fn try_filled<T: Clone>(len: usize, value: T) -> Result<Vec<T>> {
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(len)?;
    buffer.resize(len, value);
    Ok(buffer)
}
