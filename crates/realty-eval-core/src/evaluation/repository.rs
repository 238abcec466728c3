use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use chrono::Utc;

use super::record::{Evaluation, NewEvaluation};
use crate::error::EvalError;
use crate::EvalResult;

/// Storage contract for evaluations.
pub trait EvaluationRepository: Send + Sync {
    fn get(&self, id: &str) -> EvalResult<Evaluation>;
    fn list_for_user(&self, user_id: &str) -> EvalResult<Vec<Evaluation>>;
    fn insert(&self, new_evaluation: NewEvaluation) -> EvalResult<Evaluation>;
    /// Overwrite an existing record. Unknown ids are `NotFound`.
    fn save(&self, evaluation: &Evaluation) -> EvalResult<()>;
    fn delete(&self, id: &str) -> EvalResult<()>;
}

/// Process-local repository backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct InMemoryEvaluationRepository {
    records: RwLock<HashMap<String, Evaluation>>,
    next_id: AtomicU64,
}

impl InMemoryEvaluationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> EvalError {
        EvalError::Storage("evaluation store lock poisoned".into())
    }
}

impl EvaluationRepository for InMemoryEvaluationRepository {
    fn get(&self, id: &str) -> EvalResult<Evaluation> {
        let records = self.records.read().map_err(|_| Self::poisoned())?;
        records
            .get(id)
            .cloned()
            .ok_or_else(|| EvalError::NotFound(id.to_string()))
    }

    fn list_for_user(&self, user_id: &str) -> EvalResult<Vec<Evaluation>> {
        let records = self.records.read().map_err(|_| Self::poisoned())?;
        let mut found: Vec<Evaluation> = records
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));
        Ok(found)
    }

    fn insert(&self, new_evaluation: NewEvaluation) -> EvalResult<Evaluation> {
        let id = format!("eval-{}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let now = Utc::now().naive_utc();
        let evaluation = Evaluation {
            id: id.clone(),
            user_id: new_evaluation.user_id,
            property_id: new_evaluation.property_id,
            name: new_evaluation.name,
            inputs: new_evaluation.inputs,
            outputs: None,
            created_at: now,
            updated_at: now,
        };

        let mut records = self.records.write().map_err(|_| Self::poisoned())?;
        records.insert(id, evaluation.clone());
        Ok(evaluation)
    }

    fn save(&self, evaluation: &Evaluation) -> EvalResult<()> {
        let mut records = self.records.write().map_err(|_| Self::poisoned())?;
        match records.get_mut(&evaluation.id) {
            Some(slot) => {
                *slot = evaluation.clone();
                Ok(())
            }
            None => Err(EvalError::NotFound(evaluation.id.clone())),
        }
    }

    fn delete(&self, id: &str) -> EvalResult<()> {
        let mut records = self.records.write().map_err(|_| Self::poisoned())?;
        records
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| EvalError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::inputs::EvaluationInputs;

    fn new_eval(user: &str) -> NewEvaluation {
        NewEvaluation {
            user_id: user.into(),
            property_id: "prop-1".into(),
            name: "Maple St".into(),
            inputs: EvaluationInputs::default(),
        }
    }

    #[test]
    fn test_insert_assigns_sequential_ids() {
        let repo = InMemoryEvaluationRepository::new();
        let a = repo.insert(new_eval("u1")).unwrap();
        let b = repo.insert(new_eval("u1")).unwrap();
        assert_eq!(a.id, "eval-1");
        assert_eq!(b.id, "eval-2");
        assert!(a.outputs.is_none());
    }

    #[test]
    fn test_list_filters_by_user() {
        let repo = InMemoryEvaluationRepository::new();
        repo.insert(new_eval("u1")).unwrap();
        repo.insert(new_eval("u2")).unwrap();
        repo.insert(new_eval("u1")).unwrap();
        assert_eq!(repo.list_for_user("u1").unwrap().len(), 2);
        assert!(repo.list_for_user("nobody").unwrap().is_empty());
    }

    #[test]
    fn test_save_unknown_is_not_found() {
        let repo = InMemoryEvaluationRepository::new();
        let mut e = repo.insert(new_eval("u1")).unwrap();
        e.id = "eval-99".into();
        assert!(matches!(repo.save(&e), Err(EvalError::NotFound(_))));
    }

    #[test]
    fn test_delete() {
        let repo = InMemoryEvaluationRepository::new();
        let e = repo.insert(new_eval("u1")).unwrap();
        repo.delete(&e.id).unwrap();
        assert!(matches!(repo.get(&e.id), Err(EvalError::NotFound(_))));
        assert!(repo.delete(&e.id).is_err());
    }
}
