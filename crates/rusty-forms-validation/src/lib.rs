//! Rusty-Forms-Validation Core
//!
//! Pure predicate functions behind the built-in form rules.
//! Used by the client engine's rule catalog; nothing here touches a document.

pub mod email;
pub mod string;

// Re-export all validators
pub use email::*;
pub use string::*;
