//! BoardGameGeek catalog client.
//!
//! [`BggClient`] wraps the XML API2 `search`, `thing` and `hot` endpoints,
//! retries rate-limited requests with exponential backoff, and turns the
//! documents into [`meeple_catalog::CatalogEntry`] values.

pub mod client;
pub mod config;
pub mod derive;
pub mod error;
pub mod retry;
pub mod transport;
pub mod xml;

pub use client::BggClient;
pub use config::{BggConfig, ConfigSource, ConfigSources, config_path, save_token};
pub use error::BggError;
pub use retry::{RetryPolicy, send_with_retry};
pub use transport::{HttpTransport, RawResponse, Transport};
