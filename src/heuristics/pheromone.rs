//! Pheromone matrix shared by the plain and the ACS colonies.
//!
//! One symmetric storage with a zero diagonal; the policy picked at
//! construction decides how values are bounded after every write.

/// Smallest cost used as a divisor in deposit amounts
pub const MIN_COST: f64 = 1e-9;

/// How pheromone values are bounded
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PheromonePolicy {
    /// Plain ACO: no upper bound, values never drop below `floor`
    Floored { floor: f64 },
    /// ACS: values kept in `[tau_min, tau_max]`
    Bounded { tau_min: f64, tau_max: f64 },
}

impl PheromonePolicy {
    #[inline]
    fn bound(&self, value: f64) -> f64 {
        match *self {
            PheromonePolicy::Floored { floor } => value.max(floor),
            PheromonePolicy::Bounded { tau_min, tau_max } => value.max(tau_min).min(tau_max),
        }
    }
}

/// Symmetric N×N pheromone trail matrix
#[derive(Debug, Clone)]
pub struct PheromoneMatrix {
    size: usize,
    tau0: f64,
    values: Vec<f64>,
    policy: PheromonePolicy,
}

impl PheromoneMatrix {
    pub fn new(size: usize, tau0: f64, policy: PheromonePolicy) -> Self {
        let start = policy.bound(tau0);
        let mut values = vec![start; size * size];
        for i in 0..size {
            values[i * size + i] = 0.0;
        }

        PheromoneMatrix { size, tau0, values, policy }
    }

    /// Matrix for the plain colony
    pub fn new_plain(size: usize, initial: f64, floor: f64) -> Self {
        Self::new(size, initial, PheromonePolicy::Floored { floor })
    }

    /// Matrix for the ACS colony
    pub fn new_acs(size: usize, tau0: f64, tau_min: f64, tau_max: f64) -> Self {
        Self::new(size, tau0, PheromonePolicy::Bounded { tau_min, tau_max })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn tau0(&self) -> f64 {
        self.tau0
    }

    pub fn policy(&self) -> PheromonePolicy {
        self.policy
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.size + j]
    }

    fn set_pair(&mut self, i: usize, j: usize, value: f64) {
        if i == j {
            return;
        }
        let value = self.policy.bound(value);
        self.values[i * self.size + j] = value;
        self.values[j * self.size + i] = value;
    }

    /// Scale every off-diagonal entry by `1 - rho`, then bound it
    pub fn evaporate(&mut self, rho: f64) {
        let factor = 1.0 - rho;
        for i in 0..self.size {
            for j in 0..self.size {
                if i != j {
                    let idx = i * self.size + j;
                    self.values[idx] = self.policy.bound(self.values[idx] * factor);
                }
            }
        }
    }

    /// Add `amount` on every consecutive pair of `route` and its mirror
    pub fn deposit(&mut self, route: &[usize], amount: f64) {
        for pair in route.windows(2) {
            let (i, j) = (pair[0], pair[1]);
            let value = self.get(i, j) + amount;
            self.set_pair(i, j, value);
        }
    }

    /// ACS local update: pull the edge back toward `tau0`
    pub fn local_update(&mut self, i: usize, j: usize, rho: f64) {
        let value = (1.0 - rho) * self.get(i, j) + rho * self.tau0;
        self.set_pair(i, j, value);
    }

    /// ACS global update: evaporate everything, then reinforce `tour` by `1 / cost`
    pub fn global_update(&mut self, tour: &[usize], cost: f64, rho: f64) {
        self.evaporate(rho);
        self.deposit(tour, 1.0 / cost.max(MIN_COST));
    }
}
