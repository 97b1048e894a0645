//! Text-generation backends used to pick the next action.
//!
//! The `llm` crate defines the [`Backend`] trait along with two concrete
//! implementations: [`KoboldClient`] for the slow strategic server and
//! [`OllamaClient`] for the fast local model. [`extract_plan`] turns the
//! free-form text either one produces into a structured action.

pub mod client;
pub mod extract;
pub mod kobold;
pub mod profile;
pub mod runner;
pub mod traits;

pub use client::OllamaClient;
pub use extract::{extract_object, extract_plan, ExtractError, ExtractedPlan};
pub use kobold::KoboldClient;
pub use profile::{BackendProfile, ModelFamily};
pub use runner::{detect_profile, generate_within};
pub use traits::{Backend, BackendError, Generation};
