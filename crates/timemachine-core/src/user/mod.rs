//! User domain module.
//!
//! # Module Structure
//!
//! - `model`: the logged-in [`Identity`] and the [`Credentials`] derived from it
//!
//! # Usage
//!
//! ```ignore
//! use timemachine_core::user::{Credentials, Identity};
//! ```

mod model;

// Re-export public API
pub use model::{Credentials, DEFAULT_TOKEN_TYPE, Identity};
