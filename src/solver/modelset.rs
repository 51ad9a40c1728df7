use std::collections::BTreeMap;

use rayon::prelude::*;

use super::{Model, SolveError};

/// A collection of independent models, one per proof obligation, solved in
/// parallel by default.
///
/// Solving is fail-fast: the first model that fails aborts the whole set and
/// its error is returned; no partial value map is produced.
#[derive(Debug, Default)]
pub struct ModelSet {
    models: Vec<Model>,
    sequential: bool,
}

impl ModelSet {
    pub fn new() -> Self {
        ModelSet::default()
    }

    /// A set that solves its models one by one on the calling thread.
    pub fn sequential() -> Self {
        ModelSet {
            models: Vec::new(),
            sequential: true,
        }
    }

    pub fn push(&mut self, model: Model) {
        self.models.push(model);
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Solve every model and merge the per-model value maps. Variable ids
    /// are session-unique, so merging never overwrites one model's variable
    /// with another's.
    pub fn solve(&self) -> Result<BTreeMap<String, String>, SolveError> {
        let maps: Vec<BTreeMap<String, String>> = if self.sequential {
            let mut acc = Vec::with_capacity(self.models.len());
            for model in &self.models {
                acc.push(model.solve()?);
            }
            acc
        } else {
            self.models
                .par_iter()
                .map(Model::solve)
                .collect::<Result<_, _>>()?
        };
        let mut merged = BTreeMap::new();
        for map in maps {
            merged.extend(map);
        }
        Ok(merged)
    }
}
