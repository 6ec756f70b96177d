//! profrag server - HTTP API for retrieval-augmented professor recommendations
//!
//! One real endpoint, `POST /api/chat`, takes a conversation and streams the
//! model's answer back as plain text while it is being generated. Around it sit
//! the usual operational endpoints and middleware.
//!
//! # Running
//!
//! The `profrag-server` binary reads `.env`, then `server.{toml,yaml,json}`,
//! then `PROFRAG_SERVER__*` variables (see [`ServerConfig`]). Embedding
//! into another binary is one call:
//!
//! ```rust,no_run
//! # async fn run() -> anyhow::Result<()> {
//! server::start_server(server::ServerConfig::load()?).await
//! # }
//! ```
//!
//! Credentials come from `OPENAI_API_KEY` and `PINECONE_API_KEY`; the server
//! refuses to start without them.
//!
//! # Routes
//!
//! - `POST /api/chat` - stream an answer for a conversation
//! - `GET /` - API information
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe
//! - `GET /metrics` - Prometheus metrics
//!
//! # Status codes before streaming starts
//!
//! | Failure                          | Status |
//! |----------------------------------|--------|
//! | malformed body / bad conversation| 400    |
//! | server misconfiguration          | 500    |
//! | embedding/index/generation error | 502    |
//! | upstream timeout                 | 504    |
//! | request timeout                  | 408    |

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;
pub mod telemetry;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::ServerState;
