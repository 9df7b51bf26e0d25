//! Error Handling Module
//!
//! All connectors report failures through [`LlmError`]. Nothing here retries:
//! every error propagates to the caller on the first failure.
//!
//! # Example
//!
//! ```rust,ignore
//! use kernel_connectors::error::{ErrorCategory, LlmError};
//!
//! let error = LlmError::api_error(404, "Not found");
//! assert_eq!(error.category(), ErrorCategory::Client);
//! assert!(!error.is_retryable());
//! ```

mod conversions;
pub mod types;

pub use types::*;
