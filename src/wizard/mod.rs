//! Multi-step listing form: step schemas, the publish gate and session state.

pub mod session;
pub mod step_store;
pub mod steps;
pub mod validation;

pub use session::{FormSession, Navigation};
pub use step_store::StepStore;
pub use steps::WizardStep;
pub use validation::{check_completeness, step_navigable, validate_step, Completeness, FieldError};
