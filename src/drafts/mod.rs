//! Draft reconciliation
//!
//! The remote service emits tentative field updates ("drafts") while the user
//! is still speaking, and later confirms function calls in batches. This
//! module keeps one consistent view over both:
//! - one stored draft per draft id, highest similarity score first
//! - a weaker duplicate for the same function never replaces a stronger one
//! - a proposal for an already-confirmed function is flagged as
//!   `awaiting_potential_update` instead of looking brand new
//! - confirmed calls are never lost, even without a preceding draft

mod manager;
mod types;

pub use manager::DraftManager;
pub use types::{DraftCandidate, DraftStatus, FunctionArgs, FunctionCall, FunctionDraft};
