use serde::Serialize;

use crate::{Cell, CriterionType, DecisionMatrix, Error, Sign, WeightVector};

/// A decision matrix together with the weights and criterion types it is scored with.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Problem {
    matrix: DecisionMatrix,
    weights: WeightVector,
    types: Vec<CriterionType>,
}

impl Problem {
    pub fn new(
        matrix: DecisionMatrix,
        weights: WeightVector,
        types: Vec<CriterionType>,
    ) -> Result<Self, Error> {
        let criteria = matrix.criteria();
        if weights.len() != criteria {
            return Err(Error::invalid(format!(
                "{} weights for {criteria} criteria",
                weights.len()
            )));
        }
        if types.len() != criteria {
            return Err(Error::invalid(format!(
                "{} criterion types for {criteria} criteria",
                types.len()
            )));
        }
        Ok(Self {
            matrix,
            weights,
            types,
        })
    }

    pub fn matrix(&self) -> &DecisionMatrix {
        &self.matrix
    }

    pub fn weights(&self) -> &WeightVector {
        &self.weights
    }

    pub fn types(&self) -> &[CriterionType] {
        &self.types
    }
}

/// What a scenario changed relative to its base.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Modification {
    /// A matrix cell scaled by `(1 ± percent / 100)`.
    CellPercentage {
        cell: Cell,
        sign: Sign,
        percent: f64,
    },
    /// A criterion weight scaled by `(1 ± percent / 100)`, the others rescaled to compensate.
    WeightPercentage {
        criterion: usize,
        sign: Sign,
        percent: f64,
    },
    /// Matrix cells set to explicit values.
    CellValues { changes: Vec<(Cell, f64)> },
    /// Criterion weights set to explicit values, the other criteria sharing the difference equally.
    WeightValues { changes: Vec<(usize, f64)> },
    /// Independent random draw number `index`.
    Sample { index: usize },
    RemovedAlternatives { alternatives: Vec<usize> },
    RemovedCriteria { criteria: Vec<usize> },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Variant {
    Matrix(DecisionMatrix),
    Weights(WeightVector),
    Problem(Problem),
}

/// One perturbed variant of the base decision data.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Scenario {
    pub id: usize,
    pub modification: Modification,
    pub variant: Variant,
}

impl Scenario {
    pub fn matrix(&self) -> Option<&DecisionMatrix> {
        match &self.variant {
            Variant::Matrix(matrix) => Some(matrix),
            Variant::Problem(problem) => Some(problem.matrix()),
            Variant::Weights(_) => None,
        }
    }

    pub fn weights(&self) -> Option<&WeightVector> {
        match &self.variant {
            Variant::Weights(weights) => Some(weights),
            Variant::Problem(problem) => Some(problem.weights()),
            Variant::Matrix(_) => None,
        }
    }

    /// Combine this scenario with `base`, filling in the parts the scenario did not perturb.
    pub fn resolve<'s>(&'s self, base: &'s Problem) -> Result<ProblemRef<'s>, Error> {
        let resolved = match &self.variant {
            Variant::Matrix(matrix) => ProblemRef {
                matrix,
                weights: base.weights(),
                types: base.types(),
            },
            Variant::Weights(weights) => ProblemRef {
                matrix: base.matrix(),
                weights,
                types: base.types(),
            },
            Variant::Problem(problem) => ProblemRef {
                matrix: problem.matrix(),
                weights: problem.weights(),
                types: problem.types(),
            },
        };
        if (resolved.matrix.criteria() != resolved.weights.len())
            || (resolved.types.len() != resolved.weights.len())
        {
            return Err(Error::invalid(format!(
                "scenario {} does not match the base problem's criteria",
                self.id
            )));
        }
        Ok(resolved)
    }
}

/// Borrowed view of the inputs a scoring method receives for one scenario.
#[derive(Clone, Copy, Debug)]
pub struct ProblemRef<'p> {
    pub matrix: &'p DecisionMatrix,
    pub weights: &'p WeightVector,
    pub types: &'p [CriterionType],
}

/// Assign sequential ids in generation order.
pub(crate) fn number(items: Vec<(Modification, Variant)>) -> Vec<Scenario> {
    items
        .into_iter()
        .enumerate()
        .map(|(id, (modification, variant))| Scenario {
            id,
            modification,
            variant,
        })
        .collect()
}
