use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info};

use super::inputs::{validate_inputs, EvaluationField, EvaluationInputs, RawEvaluationInputs};
use super::metrics::{compute_evaluation_metrics, EvaluationOutputs};
use super::record::{Evaluation, NewEvaluation};
use super::repository::EvaluationRepository;
use crate::EvalResult;

/// Keeps stored evaluation metrics in step with their inputs.
///
/// Every write recomputes the metrics from the full input set and stores them
/// rounded to cents; the engine itself never rounds.
pub struct EvaluationService<R: EvaluationRepository> {
    repository: R,
}

impl<R: EvaluationRepository> EvaluationService<R> {
    pub fn new(repository: R) -> Self {
        EvaluationService { repository }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn get(&self, id: &str) -> EvalResult<Evaluation> {
        self.repository.get(id)
    }

    pub fn list_for_user(&self, user_id: &str) -> EvalResult<Vec<Evaluation>> {
        self.repository.list_for_user(user_id)
    }

    /// Validate and compute a new evaluation, then store it. Nothing is
    /// stored when the inputs are invalid or the metrics cannot be computed.
    pub fn create(&self, new_evaluation: NewEvaluation) -> EvalResult<Evaluation> {
        let outputs = compute_outputs(&new_evaluation.inputs)?;
        let mut evaluation = self.repository.insert(new_evaluation)?;
        info!(id = %evaluation.id, user_id = %evaluation.user_id, "evaluation created");

        evaluation.outputs = Some(outputs);
        self.repository.save(&evaluation)?;
        Ok(evaluation)
    }

    /// Create from the stored string form of the inputs.
    pub fn create_from_raw(
        &self,
        user_id: &str,
        property_id: &str,
        name: &str,
        raw: &RawEvaluationInputs,
    ) -> EvalResult<Evaluation> {
        let inputs = raw.parse()?;
        self.create(NewEvaluation {
            user_id: user_id.to_string(),
            property_id: property_id.to_string(),
            name: name.to_string(),
            inputs,
        })
    }

    /// Apply a single-field edit and recompute. The stored record is left
    /// untouched if the edit produces invalid inputs.
    pub fn update_field(
        &self,
        id: &str,
        field: EvaluationField,
        value: Decimal,
    ) -> EvalResult<Evaluation> {
        let mut evaluation = self.repository.get(id)?;
        evaluation.inputs.set(field, value)?;

        debug!(id, %field, %value, "evaluation field updated");
        self.recompute_and_save(&mut evaluation)?;
        Ok(evaluation)
    }

    /// Recompute stored metrics from stored inputs.
    pub fn recalculate(&self, id: &str) -> EvalResult<Evaluation> {
        let mut evaluation = self.repository.get(id)?;
        self.recompute_and_save(&mut evaluation)?;
        Ok(evaluation)
    }

    pub fn delete(&self, id: &str) -> EvalResult<()> {
        self.repository.delete(id)?;
        info!(id, "evaluation deleted");
        Ok(())
    }

    fn recompute_and_save(&self, evaluation: &mut Evaluation) -> EvalResult<()> {
        let outputs = compute_outputs(&evaluation.inputs)?;
        debug!(
            id = %evaluation.id,
            equity_capture = %outputs.equity_capture,
            annual_cash_flow = %outputs.annual_cash_flow,
            "evaluation metrics recomputed"
        );

        evaluation.outputs = Some(outputs);
        evaluation.updated_at = Utc::now().naive_utc();
        self.repository.save(evaluation)
    }
}

/// Metrics as persisted: validated inputs, outputs rounded to cents.
fn compute_outputs(inputs: &EvaluationInputs) -> EvalResult<EvaluationOutputs> {
    validate_inputs(inputs)?;
    Ok(compute_evaluation_metrics(inputs)?.rounded_to_cents())
}
