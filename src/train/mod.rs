//! Training-loop integration
//!
//! The training loop itself lives outside this crate. It drives the
//! callbacks registered here through a fixed hook sequence.

pub mod callback;

pub use callback::{BatchEnd, CallbackContext, CallbackManager, TrainerCallback};
