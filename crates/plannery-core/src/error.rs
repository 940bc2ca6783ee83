use crate::id::{ItemId, RecipeId, StepId};
use crate::rational::RationalError;

/// Errors from editing or solving a crafting process.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("recipe {recipe} does not produce {item}")]
    ItemNotProduced { recipe: RecipeId, item: ItemId },
    #[error("no step with id {0}")]
    UnknownStep(StepId),
    #[error("cannot move step {step} by {offset}")]
    InvalidMove { step: StepId, offset: isize },
    #[error("the process has no net amount of {0} to scale against")]
    NoNetCount(ItemId),
    #[error(transparent)]
    Rational(#[from] RationalError),
}
