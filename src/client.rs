//! The request pipeline.
//!
//! Keep the public surface small and predictable: build a [`RestClient`] with
//! [`RestClientBuilder`], call [`RestClient::execute`] or a typed verb, match on the
//! returned [`crate::Failure`]. Implementation details are split into submodules under
//! `src/client/`.

pub(crate) mod abort;
pub mod builder;
pub mod core;
pub mod error_classification;
mod execution;
pub mod types;

pub use self::abort::AbortReason;
pub use self::builder::RestClientBuilder;
pub use self::core::RestClient;
pub use self::error_classification::{classify, RawOutcome};
pub use self::types::{CallOptions, Method, RequestContext, RequestDescriptor, Response, RetryKey};
