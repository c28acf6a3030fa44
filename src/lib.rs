//! # rest-pipeline
//!
//! 类型化 REST API 客户端的请求管线：拦截器、超时、取消、重试与封闭的失败分类。
//!
//! The request pipeline underneath a typed REST API client SDK.
//!
//! Feature repositories map JSON into typed entities; this crate is the part they all call
//! into. It dispatches requests, runs a chain of interceptors, races each call against a
//! timeout and a caller-supplied cancellation token, retries transient statuses with
//! backoff, and classifies every failure into one variant of a closed taxonomy.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rest_pipeline::{
//!     AuthInterceptor, CallOptions, CancellationToken, Failure, LoggingInterceptor, RestClient,
//!     RetryConfig,
//! };
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Planet {
//!     name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> rest_pipeline::Result<()> {
//!     let client = RestClient::builder()
//!         .base_url("https://api.example.com/v1")
//!         .interceptor(AuthInterceptor::new("your-api-key"))
//!         .interceptor(LoggingInterceptor::new())
//!         .retry(RetryConfig::default())
//!         .build()?;
//!
//!     let token = CancellationToken::new();
//!     match client
//!         .get::<Planet>("/planets/3", CallOptions::new().cancel_token(token.clone()))
//!         .await
//!     {
//!         Ok(planet) => println!("{}", planet.name),
//!         Err(Failure::NotFound { message, .. }) => eprintln!("missing: {}", message),
//!         Err(other) => eprintln!("{} ({})", other, other.kind().code()),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | `RestClient`, its builder, request types and failure classification |
//! | [`interceptors`] | Interceptor trait and the auth, logging and retry interceptors |
//! | [`cancel`] | Cooperative cancellation tokens |
//! | [`transport`] | The HTTP primitive the pipeline runs on (reqwest by default) |
//! | [`config`] | YAML / environment configuration |
//! | [`error_code`] | Failure kinds and machine codes |

pub mod cancel;
pub mod client;
pub mod config;
pub mod error_code;
pub mod interceptors;
pub mod transport;

pub use cancel::{CancelHandle, CancellationToken};
pub use client::{
    CallOptions, Method, RequestContext, RequestDescriptor, Response, RestClient,
    RestClientBuilder, RetryKey,
};
pub use config::PipelineConfig;
pub use error_code::FailureKind;
pub use interceptors::{
    AuthInterceptor, Interceptor, InterceptorChain, LogBuffer, LoggingInterceptor,
    ResponseAction, RetryConfig, RetryInterceptor,
};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError};

/// Result type for client construction and configuration.
pub type Result<T> = std::result::Result<T, Error>;

/// Result of a call through the pipeline.
pub type CallResult<T> = std::result::Result<T, Failure>;

/// Error types for the library
pub mod error;
pub use error::{Error, ErrorContext, Failure};
