//! Callback system for training events
//!
//! Provides extensible hooks for training loop events:
//! - `on_fit_start`
//! - `on_epoch_start`
//! - `on_batch_end`
//! - `on_validate_start` / `on_validate_end`
//!
//! # Example
//!
//! ```rust
//! use evaluar::train::callback::{CallbackContext, TrainerCallback};
//! use evaluar::Result;
//!
//! struct PrintCallback;
//!
//! impl TrainerCallback for PrintCallback {
//!     fn on_epoch_start(&mut self, ctx: &CallbackContext) -> Result<()> {
//!         println!("Epoch {} of {}", ctx.epoch_number(), ctx.max_epochs);
//!         Ok(())
//!     }
//! }
//! ```

mod manager;
mod traits;

// Re-export all public types
pub use manager::CallbackManager;
pub use traits::{BatchEnd, CallbackContext, TrainerCallback};
