use std::collections::BTreeMap;

use rand::Rng;

use crate::errors::GenerationError;

/// Discrete distribution over a fixed set of choices.
///
/// Choices are kept in key order, so the same weights and the same RNG state
/// always yield the same pick.
#[derive(Debug, Clone)]
pub struct WeightedTable<T> {
    entries: Vec<(T, f64)>,
    total_weight: f64,
}

impl<T: Copy + Ord> WeightedTable<T> {
    /// Build from a weight map; zero-weight entries are never picked.
    pub fn new(label: &str, weights: &BTreeMap<T, f64>) -> Result<Self, GenerationError> {
        let mut total_weight = 0.0;
        let mut entries = Vec::with_capacity(weights.len());
        for (choice, weight) in weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(GenerationError::InvalidConfig(format!(
                    "{label} weights must be finite and >= 0"
                )));
            }
            if *weight == 0.0 {
                continue;
            }
            total_weight += weight;
            entries.push((*choice, *weight));
        }

        if entries.is_empty() || total_weight <= 0.0 {
            return Err(GenerationError::InvalidConfig(format!(
                "{label} total weight must be > 0"
            )));
        }

        Ok(Self {
            entries,
            total_weight,
        })
    }

    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> T {
        let mut roll = rng.random_range(0.0..self.total_weight);
        for (choice, weight) in &self.entries {
            if roll < *weight {
                return *choice;
            }
            roll -= weight;
        }
        // Floating point residue on the last bucket.
        self.entries[self.entries.len() - 1].0
    }

    /// Probability of `choice` under this table.
    pub fn share(&self, choice: T) -> f64 {
        self.entries
            .iter()
            .find(|(candidate, _)| *candidate == choice)
            .map(|(_, weight)| weight / self.total_weight)
            .unwrap_or(0.0)
    }
}
