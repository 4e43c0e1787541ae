//! RecruitAI gateway client — the single point of entry for all backend calls.
//!
//! ARCHITECTURAL RULE: UI screens never talk HTTP directly. Every operation
//! goes through [`Gateway`], which dispatches to either the remote backend
//! (authenticated HTTP with bounded retries and a transparent token-refresh
//! cycle) or the local fallback engine (seeded demo data with simulated
//! latency). Result shapes are identical in both modes, so callers never
//! branch on connectivity.

pub mod backend;
pub mod config;
pub mod errors;
pub mod fallback;
pub mod gateway;
pub mod matching;
pub mod models;
pub mod remote;
pub mod session;

pub use config::GatewayConfig;
pub use errors::GatewayError;
pub use gateway::Gateway;
pub use session::SessionStore;
