//! Reference data storage.
//!
//! Report computation reads store reference data through the
//! [`ReferenceRepository`] trait so the storage backend can be swapped
//! without touching the services.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Ingestion (io::loaders) / Report services               │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository Trait (repository/) - Abstract Interface    │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌──────────────────────────────────────────────┐
//!     │             Local Repository                  │
//!     │               (in-memory)                     │
//!     └──────────────────────────────────────────────┘
//! ```

pub mod repositories;
pub mod repository;

pub use repositories::LocalRepository;
pub use repository::{
    ErrorContext, ReferenceCounts, ReferenceRepository, RepositoryError, RepositoryResult,
};
