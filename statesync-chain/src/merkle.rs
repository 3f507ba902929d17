//! Merkle folding and the convergence stamp.

use serde::{Deserialize, Serialize};
use statesync_types::sha256_hex;
use std::fmt;

/// Iteration budget used when a chain is exported.
pub const DEFAULT_CONVERGENCE_ITERATIONS: u32 = 1000;

/// Leading hex characters that end the convergence search.
const CONVERGENCE_PREFIX: &str = "0000";

/// Folds `leaves` pairwise until one hash remains.
///
/// An odd-length level is padded by duplicating its last element. Leaf
/// order matters: callers that need an order-independent root must sort
/// first. Returns `None` for an empty input.
pub fn merkle_root(mut level: Vec<String>) -> Option<String> {
    if level.is_empty() {
        return None;
    }
    while level.len() > 1 {
        pad_level(&mut level);
        level = level
            .chunks(2)
            .map(|pair| sha256_hex(format!("{}{}", pair[0], pair[1])))
            .collect();
    }
    level.pop()
}

/// Duplicates the last element of an odd-length level.
pub fn pad_level(level: &mut Vec<String>) {
    if level.len() % 2 == 1 {
        if let Some(last) = level.last().cloned() {
            level.push(last);
        }
    }
}

/// A best-effort uniqueness stamp derived from a Merkle root.
///
/// This is a fixed-length identifier, not a cryptographic commitment: it
/// adds no collision resistance beyond that of SHA-256 itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvergenceStamp {
    /// Iteration at which the search stopped.
    pub iterations: u32,
    /// The final hash.
    pub hash: String,
}

impl ConvergenceStamp {
    /// Repeatedly hashes `current + iteration` until the result starts with
    /// four zero hex digits or `max_iterations` is exhausted.
    pub fn search(start: &str, max_iterations: u32) -> Self {
        let mut current = start.to_string();
        for iteration in 0..max_iterations {
            let next = sha256_hex(format!("{current}{iteration}"));
            if next.starts_with(CONVERGENCE_PREFIX) {
                return Self {
                    iterations: iteration,
                    hash: next,
                };
            }
            current = next;
        }
        Self {
            iterations: max_iterations,
            hash: current,
        }
    }

    /// Returns true if the search found the zero prefix.
    pub fn converged(&self) -> bool {
        self.hash.starts_with(CONVERGENCE_PREFIX)
    }
}

impl fmt::Display for ConvergenceStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "INF:{}:{}", self.iterations, self.hash)
    }
}
