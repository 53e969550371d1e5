//! Dense two-phase simplex for small linear programs.
//!
//! Solves `minimize c·x` subject to linear (in)equality rows and `x >= 0`.
//! Pivoting follows Bland's rule, so degenerate problems (transportation
//! problems are highly degenerate) terminate.

use thiserror::Error;

const EPS: f64 = 1e-10;
const FEASIBILITY_TOL: f64 = 1e-8;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LpError {
    #[error("constraint has {found} coefficients, expected {expected}")]
    Shape { expected: usize, found: usize },

    #[error("linear program is infeasible")]
    Infeasible,

    #[error("linear program is unbounded")]
    Unbounded,

    #[error("simplex did not converge within {0} pivots")]
    IterationLimit(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    LessEq,
    Eq,
    GreaterEq,
}

#[derive(Debug, Clone)]
struct Constraint {
    coefficients: Vec<f64>,
    relation: Relation,
    rhs: f64,
}

/// Optimal point of a [`LinearProgram`]
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub objective: f64,
    pub values: Vec<f64>,
}

/// A minimization problem over non-negative variables
#[derive(Debug, Clone)]
pub struct LinearProgram {
    objective: Vec<f64>,
    constraints: Vec<Constraint>,
}

impl LinearProgram {
    pub fn minimize(objective: Vec<f64>) -> Self {
        Self {
            objective,
            constraints: Vec::new(),
        }
    }

    pub fn num_variables(&self) -> usize {
        self.objective.len()
    }

    pub fn add_constraint(&mut self, coefficients: Vec<f64>, relation: Relation, rhs: f64) -> Result<(), LpError> {
        if coefficients.len() != self.objective.len() {
            return Err(LpError::Shape {
                expected: self.objective.len(),
                found: coefficients.len(),
            });
        }
        self.constraints.push(Constraint {
            coefficients,
            relation,
            rhs,
        });
        Ok(())
    }

    pub fn solve(&self) -> Result<Solution, LpError> {
        let mut tableau = Tableau::new(&self.objective, &self.constraints);

        if tableau.has_artificials() {
            let phase_one: Vec<f64> = (0..tableau.cols)
                .map(|j| if tableau.artificial[j] { 1.0 } else { 0.0 })
                .collect();
            tableau.optimize(&phase_one, |_| true)?;
            if tableau.objective_value(&phase_one) > FEASIBILITY_TOL {
                return Err(LpError::Infeasible);
            }
            tableau.evict_artificials();
        }

        let mut phase_two = vec![0.0; tableau.cols];
        phase_two[..self.objective.len()].copy_from_slice(&self.objective);
        let artificial = tableau.artificial.clone();
        tableau.optimize(&phase_two, |j| !artificial[j])?;

        let values = tableau.structural_values(self.objective.len());
        let objective = values
            .iter()
            .zip(&self.objective)
            .map(|(x, c)| x * c)
            .sum();
        Ok(Solution { objective, values })
    }
}

struct Tableau {
    rows: Vec<Vec<f64>>,
    basis: Vec<usize>,
    artificial: Vec<bool>,
    cols: usize,
}

impl Tableau {
    /// Column layout: structural variables, then one slack or surplus per
    /// inequality row, then one artificial per `>=` or `=` row. The last
    /// entry of every row is its right-hand side.
    fn new(objective: &[f64], constraints: &[Constraint]) -> Self {
        let n = objective.len();
        let normalized: Vec<(Vec<f64>, Relation, f64)> = constraints
            .iter()
            .map(|c| {
                if c.rhs < 0.0 {
                    let flipped = match c.relation {
                        Relation::LessEq => Relation::GreaterEq,
                        Relation::GreaterEq => Relation::LessEq,
                        Relation::Eq => Relation::Eq,
                    };
                    (c.coefficients.iter().map(|a| -a).collect(), flipped, -c.rhs)
                } else {
                    (c.coefficients.clone(), c.relation, c.rhs)
                }
            })
            .collect();

        let slacks = normalized.iter().filter(|(_, r, _)| *r != Relation::Eq).count();
        let artificials = normalized.iter().filter(|(_, r, _)| *r != Relation::LessEq).count();
        let cols = n + slacks + artificials;

        let mut rows = Vec::with_capacity(normalized.len());
        let mut basis = Vec::with_capacity(normalized.len());
        let mut artificial = vec![false; cols];
        let mut next_slack = n;
        let mut next_artificial = n + slacks;

        for (coefficients, relation, rhs) in normalized {
            let mut row = vec![0.0; cols + 1];
            row[..n].copy_from_slice(&coefficients);
            row[cols] = rhs;
            match relation {
                Relation::LessEq => {
                    row[next_slack] = 1.0;
                    basis.push(next_slack);
                    next_slack += 1;
                }
                Relation::GreaterEq => {
                    row[next_slack] = -1.0;
                    next_slack += 1;
                    row[next_artificial] = 1.0;
                    artificial[next_artificial] = true;
                    basis.push(next_artificial);
                    next_artificial += 1;
                }
                Relation::Eq => {
                    row[next_artificial] = 1.0;
                    artificial[next_artificial] = true;
                    basis.push(next_artificial);
                    next_artificial += 1;
                }
            }
            rows.push(row);
        }

        Self {
            rows,
            basis,
            artificial,
            cols,
        }
    }

    fn has_artificials(&self) -> bool {
        self.artificial.iter().any(|&a| a)
    }

    fn objective_value(&self, costs: &[f64]) -> f64 {
        self.rows
            .iter()
            .zip(&self.basis)
            .map(|(row, &b)| costs[b] * row[self.cols])
            .sum()
    }

    fn pivot(&mut self, leaving_row: usize, entering: usize) {
        let rhs = self.cols;
        let p = self.rows[leaving_row][entering];
        for v in self.rows[leaving_row].iter_mut() {
            *v /= p;
        }
        let pivot_row = self.rows[leaving_row].clone();

        for (r, row) in self.rows.iter_mut().enumerate() {
            if r == leaving_row {
                continue;
            }
            let factor = row[entering];
            if factor == 0.0 {
                continue;
            }
            for (v, pv) in row.iter_mut().zip(&pivot_row) {
                *v -= factor * pv;
            }
            row[entering] = 0.0;
            if row[rhs].abs() < EPS {
                row[rhs] = 0.0;
            }
        }
        self.basis[leaving_row] = entering;
    }

    fn optimize(&mut self, costs: &[f64], allowed: impl Fn(usize) -> bool) -> Result<(), LpError> {
        let rhs = self.cols;
        let mut reduced: Vec<f64> = (0..self.cols)
            .map(|j| {
                costs[j]
                    - self
                        .rows
                        .iter()
                        .zip(&self.basis)
                        .map(|(row, &b)| costs[b] * row[j])
                        .sum::<f64>()
            })
            .collect();

        let max_pivots = 50 * (self.cols + self.rows.len()).max(100);
        for _ in 0..max_pivots {
            // Bland: lowest-index improving column
            let Some(entering) = (0..self.cols).find(|&j| allowed(j) && reduced[j] < -EPS) else {
                return Ok(());
            };

            let mut leaving: Option<(usize, f64)> = None;
            for (i, row) in self.rows.iter().enumerate() {
                let a = row[entering];
                if a <= EPS {
                    continue;
                }
                let ratio = row[rhs] / a;
                leaving = match leaving {
                    None => Some((i, ratio)),
                    Some((_, best)) if ratio < best - EPS => Some((i, ratio)),
                    // Bland: among ties, lowest basic variable index leaves
                    Some((l, best)) if ratio <= best + EPS && self.basis[i] < self.basis[l] => Some((i, best.min(ratio))),
                    keep => keep,
                };
            }

            let Some((leaving_row, _)) = leaving else {
                return Err(LpError::Unbounded);
            };

            self.pivot(leaving_row, entering);
            let factor = reduced[entering];
            for (r, v) in reduced.iter_mut().zip(&self.rows[leaving_row]) {
                *r -= factor * v;
            }
            reduced[entering] = 0.0;
        }

        Err(LpError::IterationLimit(max_pivots))
    }

    /// After phase one, pivot zero-valued artificials out of the basis where a
    /// structural or slack column can replace them. Rows where none can are
    /// redundant and keep their artificial at zero.
    fn evict_artificials(&mut self) {
        for i in 0..self.rows.len() {
            if !self.artificial[self.basis[i]] {
                continue;
            }
            let replacement = (0..self.cols)
                .find(|&j| !self.artificial[j] && self.rows[i][j].abs() > EPS);
            if let Some(j) = replacement {
                self.pivot(i, j);
            }
        }
    }

    fn structural_values(&self, n: usize) -> Vec<f64> {
        let mut values = vec![0.0; n];
        for (row, &b) in self.rows.iter().zip(&self.basis) {
            if b < n {
                values[b] = row[self.cols].max(0.0);
            }
        }
        values
    }
}
