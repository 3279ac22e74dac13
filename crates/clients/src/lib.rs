//! Resilient clients for the course catalog and student registry
//!
//! Every verb goes through the same pipeline from `registrar-breaker`: a
//! per-dependency circuit breaker, bounded retries with exponential backoff,
//! and fault translation into [`CanonicalError`]. Callers only ever see a
//! shaped record or a canonical error carrying their trace id.
//!
//! ```rust,no_run
//! use registrar_clients::{ClientsConfig, Dependencies};
//! use registrar_breaker::CallContext;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientsConfig::from_env()?;
//! let deps = Dependencies::from_config(&config);
//! deps.startup().await;
//!
//! let ctx = CallContext::traced("req-42");
//! if deps.courses.validate_course(&ctx, 101).await? {
//!     let enrolled = deps.courses.check_enrollment(&ctx, 7, 101).await?;
//!     println!("enrolled: {enrolled}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod config;
pub mod connection;
pub mod courses;
pub mod logging;
pub mod registry;
pub mod students;
pub mod transport;

#[cfg(test)]
mod testing;

pub use adapter::{DependencyClient, DependencyHealth};
pub use config::{ClientsConfig, ConfigError, DependencyConfig, load_config};
pub use connection::{ConnectionStatus, Connector, LazyConnection};
pub use courses::{Course, CourseCatalogClient};
pub use registry::{Dependencies, UnknownDependency};
pub use students::{NewStudentProfile, Student, StudentRegistryClient};
pub use transport::{OutboundRequest, RestTransport, RpcTransport, TRACE_HEADER, Transport};

pub use registrar_breaker::CanonicalError;
