//! # Repository Module
//!
//! Database repository implementations for Despacho.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Engine Operation                                                      │
//! │       │                                                                 │
//! │       │  db.detail().apply_scan(&key, "10500123", 2.0)                  │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  DetailRepository                                                      │
//! │  ├── list_for_order(&self, key)                                         │
//! │  ├── insert_snapshot(&self, key, lines)                                 │
//! │  ├── apply_scan(&self, key, product, qty)                               │
//! │  └── reset_scan(&self, key, product)                                    │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • Clean separation of concerns                                        │
//! │  • Easy to test (mock the repository)                                  │
//! │  • SQL is isolated in one place                                        │
//! │  • Can swap database implementations                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`DetailRepository`] - Active picking worklist (snapshot + scan state)
//! - [`HistoryRepository`] - Archived worklists of finalized orders
//! - [`AssignmentRepository`] - Per-order people and timing record
//!
//! [`DetailRepository`]: detail::DetailRepository
//! [`HistoryRepository`]: history::HistoryRepository
//! [`AssignmentRepository`]: assignment::AssignmentRepository

pub mod assignment;
pub mod detail;
pub mod history;
