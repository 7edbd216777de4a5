//! GA individual: a city permutation with a lazily computed evaluation.

use crate::precompute::DistanceCache;
use crate::split::{Evaluation, Evaluator};

/// Evaluation state of an individual
#[derive(Debug, Clone, PartialEq)]
pub enum EvalState {
    Unknown,
    Known(Evaluation),
}

/// Individual in the genetic algorithm population
#[derive(Debug, Clone)]
pub struct Individual {
    /// Permutation of the target cities, never changed in place
    route: Vec<usize>,
    state: EvalState,
}

impl Individual {
    pub fn new(route: Vec<usize>) -> Self {
        Individual { route, state: EvalState::Unknown }
    }

    pub fn route(&self) -> &[usize] {
        &self.route
    }

    pub fn len(&self) -> usize {
        self.route.len()
    }

    pub fn is_empty(&self) -> bool {
        self.route.is_empty()
    }

    pub fn state(&self) -> &EvalState {
        &self.state
    }

    pub fn is_evaluated(&self) -> bool {
        matches!(self.state, EvalState::Known(_))
    }

    pub fn evaluation(&self) -> Option<&Evaluation> {
        match &self.state {
            EvalState::Known(eval) => Some(eval),
            EvalState::Unknown => None,
        }
    }

    /// Evaluate once and cache; later calls reuse the stored result
    pub fn evaluate<E: Evaluator + ?Sized>(&mut self, evaluator: &E, cache: &DistanceCache) -> f64 {
        if let EvalState::Unknown = self.state {
            self.state = EvalState::Known(evaluator.evaluate(&self.route, cache));
        }
        self.cost()
    }

    /// Cost of the known evaluation, infinite while unknown
    pub fn cost(&self) -> f64 {
        self.evaluation().map_or(f64::INFINITY, |e| e.cost)
    }

    /// Negated cost, higher is better
    pub fn fitness(&self) -> f64 {
        -self.cost()
    }

    /// Copy the route, apply `f` to the copy and return it unevaluated
    pub fn mutated<F: FnOnce(&mut Vec<usize>)>(&self, f: F) -> Individual {
        let mut route = self.route.clone();
        f(&mut route);
        Individual::new(route)
    }
}
