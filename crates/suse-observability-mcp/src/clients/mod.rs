//! SUSE Observability API client.
//!
//! This module provides the HTTP client the tools use to talk to a
//! SUSE Observability installation:
//! - `config`: endpoint, token and transport settings
//! - `observability`: the [`ObservabilityApi`] trait and its reqwest implementation
//! - `types`: request and response DTOs
//!
//! The client handles authentication headers, query parameter encoding and
//! error mapping. It is constructed explicitly and shared with the tools
//! through an `Arc<dyn ObservabilityApi>`.

pub mod config;
pub mod observability;
pub mod types;

pub use config::{ConfigError, ServiceConfig, ServiceEndpoint, TokenKind};
pub use observability::{ObservabilityApi, ObservabilityClient, ObservabilityError};
