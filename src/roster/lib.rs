//! # Roster Architecture
//!
//! Roster is the **search and list engine** of an account-administration
//! console: a free-text query language, a field registry, and a paginated,
//! virtualized list that decides when to filter locally and when to hand the
//! search to the backend. It is a library that happens to have a CLI client.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (cli/, wired by main.rs)                         │
//! │  - Parses arguments, prints rows, chips and counters        │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Session Layer (api.rs)                                     │
//! │  - Drives the list against a PageSource                     │
//! │  - Sends each issued request, feeds the outcome back        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Engine (list/, search.rs, render.rs, sort.rs, query/)      │
//! │  - Sans-IO: returns requests and emits ListEvents           │
//! │  - Never fetches, never blocks, never prints                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Source Layer (source/)                                     │
//! │  - Abstract PageSource trait                                │
//! │  - MemorySource (fixtures, tests), remote endpoints         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Data Flow
//!
//! Search text goes through the tokenizer and the query parser
//! ([`query`]), which resolves `field:value` tokens against the
//! [`fields::FieldRegistry`] into typed predicates bound to accessors. The
//! [`search::SearchEngine`] evaluates them over the loaded items, or packages
//! them as transport descriptors once the search is handed to the server. The
//! [`list::PaginatedList`] fetches more pages while too little is visible, and
//! the [`render::RenderDriver`] materializes only the rows the viewport needs.
//!
//! ## Item Kinds
//!
//! The engine is generic over [`model::Item`]. Two kinds ship with the crate:
//! [`accounts::Account`] and [`activity::Activity`], each with its field
//! registry and sortable columns.
//!
//! ## Testing Strategy
//!
//! 1. **Engine** modules carry unit tests beside the code, driven by
//!    `Vec<ListEvent>` as the view.
//! 2. **Session** tests run the whole loop against a `MemorySource`.
//! 3. **CLI** tests (`tests/cli.rs`) run the binary against JSON fixtures.

pub mod accounts;
pub mod activity;
pub mod api;
pub mod config;
pub mod error;
pub mod fields;
pub mod list;
pub mod model;
pub mod query;
pub mod render;
pub mod search;
pub mod sort;
pub mod source;
