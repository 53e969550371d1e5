//! Earth Mover's Distance between the empirical distributions of two bags.
//!
//! With `n1` instances in the first bag and `n2` in the second, the flow
//! `f[i][j]` between instance `i` and instance `j` solves
//!
//! ```text
//! minimize   Σ f[i][j] · cost[i][j]
//! subject to f[i][j] >= 0
//!            Σ_j f[i][j] <= 1/n1     for every i
//!            Σ_i f[i][j] <= 1/n2     for every j
//!            Σ f[i][j]    = 1
//! ```
//!
//! where `cost` is the ground [`PointMetric`] between instances. The program is
//! solved exactly by simplex, so the distance is deterministic.

use bagscan_core::{Bag, BagDistance, Error, Result};
use tracing::trace;
use crate::lp::{LinearProgram, LpError, Relation};
use crate::PointMetric;

#[derive(Debug, Clone, Copy, Default)]
pub struct EarthMoversDistance {
    ground: PointMetric,
}

impl EarthMoversDistance {
    pub fn new(ground: PointMetric) -> Self {
        Self { ground }
    }

    pub fn ground_metric(&self) -> PointMetric {
        self.ground
    }

    /// `n1 × n2` ground distances, row-major
    fn cost_matrix(&self, a: &Bag, b: &Bag) -> Vec<f64> {
        let mut costs = Vec::with_capacity(a.len() * b.len());
        for x in a.instances() {
            for y in b.instances() {
                costs.push(self.ground.between(x, y));
            }
        }
        costs
    }

    fn transport(&self, a: &Bag, b: &Bag) -> std::result::Result<f64, LpError> {
        let (n1, n2) = (a.len(), b.len());
        let vars = n1 * n2;
        let mut lp = LinearProgram::minimize(self.cost_matrix(a, b));

        for i in 0..n1 {
            let mut row = vec![0.0; vars];
            row[i * n2..(i + 1) * n2].fill(1.0);
            lp.add_constraint(row, Relation::LessEq, 1.0 / n1 as f64)?;
        }
        for j in 0..n2 {
            let mut column = vec![0.0; vars];
            for i in 0..n1 {
                column[i * n2 + j] = 1.0;
            }
            lp.add_constraint(column, Relation::LessEq, 1.0 / n2 as f64)?;
        }
        lp.add_constraint(vec![1.0; vars], Relation::Eq, 1.0)?;

        let solution = lp.solve()?;
        trace!(n1, n2, objective = solution.objective, "transport problem solved");
        Ok(solution.objective.max(0.0))
    }
}

impl From<LpError> for Error {
    fn from(e: LpError) -> Self {
        Error::MetricFailure {
            metric: "earth_movers",
            message: e.to_string(),
        }
    }
}

impl BagDistance for EarthMoversDistance {
    fn name(&self) -> &'static str {
        "earth_movers"
    }

    fn fingerprint(&self) -> String {
        format!("earth_movers:{:?}", self.ground)
    }

    fn compute(&self, a: &Bag, b: &Bag) -> Result<f64> {
        a.check_dim(b)?;
        Ok(self.transport(a, b)?)
    }
}
