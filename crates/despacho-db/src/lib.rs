//! # despacho-db: Database Layer for Despacho
//!
//! This crate provides database access for the Despacho picking system.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Despacho Data Flow                                │
//! │                                                                         │
//! │  Engine operation (apply_scan, mark_finish, ...)                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    despacho-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐ │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │ │   │
//! │  │   │   (pool.rs)   │    │ (detail.rs,    │    │  (embedded)  │ │   │
//! │  │   │               │    │  assignment.rs,│    │              │ │   │
//! │  │   │ SqlitePool    │◄───│  history.rs)   │    │ 001_init.sql │ │   │
//! │  │   │ Management    │    │                │    │              │ │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘ │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   picking_detail · picking_history · picking_assignment        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (detail, assignment, history)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use despacho_db::{Database, DbConfig};
//!
//! // Create database with default config
//! let config = DbConfig::new("path/to/despacho.db");
//! let db = Database::new(config).await?;
//!
//! // Use repositories
//! let lines = db.detail().list_for_order(&key).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::assignment::AssignmentRepository;
pub use repository::detail::DetailRepository;
pub use repository::history::HistoryRepository;
