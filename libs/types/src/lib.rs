//! Types library for the rocket telemetry service
//!
//! Provides the wire envelope, the validated message forms handed to the
//! reconciliation engine, and the per-rocket state records exposed by the
//! read API. Every crate in the workspace builds on these definitions.
//!
//! # Modules
//! - `envelope`: inbound wire format and envelope validation
//! - `rocket`: rocket state records and state transitions
//! - `errors`: validation error taxonomy

// Public modules
pub mod envelope;
pub mod errors;
pub mod rocket;

// Library version constant
pub const LIB_VERSION: &str = "0.1.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::envelope::*;
    pub use crate::errors::*;
    pub use crate::rocket::*;
}
