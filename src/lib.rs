//! Scheduled digests of unread [Miniflux](https://miniflux.app/) entries.
//!
//! For every feed category with unread entries, fluxdigest groups the entries
//! (by publication day, by feed, or by topic via a content-generation service),
//! renders the result as a single HTML page, archives it on disk, sends a
//! notification and optionally marks the category as read. Archived pages are
//! served over HTTP and evicted once they fall outside the retention window.
//!
//! # Grouping strategies
//!
//! | Strategy | Groups | Order |
//! |----------|--------|-------|
//! | **day** | One per calendar day in the entry's own zone | Oldest day first |
//! | **feed** | One per feed | Feed title, A to Z |
//! | **ai** | Topics proposed by Gemini | As returned; falls back to **day** on any failure |
//!
//! # Modules
//!
//! - [`config`]: TOML configuration with environment overrides
//! - [`feed`]: Feed-reader records and the Miniflux client
//! - [`llm`]: Content-generation client used by AI grouping
//! - [`digest`]: Grouping strategies and digest assembly
//! - [`archive`]: HTML rendering, archive writing, inventory and retention
//! - [`notify`]: Digest notifications
//! - [`pipeline`]: Per-category processing and bounded batch fan-out
//! - [`scheduler`]: The long-running service loop
//! - [`server`]: Archive HTTP server

pub mod archive;
pub mod cli;
pub mod config;
pub mod digest;
pub mod feed;
pub mod llm;
pub mod notify;
pub mod pipeline;
pub mod scheduler;
pub mod server;
