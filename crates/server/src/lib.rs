//! Docvault Server - HTTP delivery of cached and archived documents
//!
//! Documents live in a flat local directory that acts as a cache in front of
//! a remote FTP archive. Requests for a document that is not cached yet pull
//! it from the archive, publish it into the directory by rename, and serve it.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Endpoints
//!
//! - `GET /` - greeting
//! - `GET /healthz` - `200 UP` while healthy, `503` once shutdown starts
//! - `GET /attestation?key=K` - `K.pdf`, from cache or archive
//! - `GET /sampleIdToBarCode?key=K` - writes a `K.png` barcode label
//!
//! Every response carries `X-Request-Id`.
//!
//! # Configuration
//!
//! `server.{toml,yaml,json}` if present, then `DOCVAULT_SERVER__*`
//! environment variables (for example `DOCVAULT_SERVER__ARCHIVE__HOST`), then
//! command-line flags.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::{CliArgs, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use server::{build_router, serve, start_server};
pub use state::{HealthFlag, ServerState};
