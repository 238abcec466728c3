use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::inputs::EvaluationInputs;
use super::metrics::EvaluationOutputs;

/// A stored evaluation: a user's deal analysis of one property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub id: String,
    pub user_id: String,
    pub property_id: String,
    pub name: String,
    pub inputs: EvaluationInputs,
    /// Cent-rounded metrics; `None` until first computed
    pub outputs: Option<EvaluationOutputs>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Data needed to create an evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvaluation {
    pub user_id: String,
    pub property_id: String,
    pub name: String,
    pub inputs: EvaluationInputs,
}
