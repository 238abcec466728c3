pub mod inputs;
pub mod metrics;
pub mod record;
pub mod repository;
pub mod service;

pub use inputs::{
    validate_inputs, EvaluationField, EvaluationInputs, RawEvaluationInputs, MAX_AMOUNT,
};
pub use metrics::{
    compute_evaluation_metrics, evaluate, EvaluationBreakdown, EvaluationOutputs,
    EvaluationResult,
};
pub use record::{Evaluation, NewEvaluation};
pub use repository::{EvaluationRepository, InMemoryEvaluationRepository};
pub use service::EvaluationService;
