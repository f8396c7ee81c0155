//! Data layer: core types, loading, filtering and statistics.
//!
//! Architecture:
//! ```text
//!  .csv / .xlsx / .json / .parquet     Iris / California Housing
//!        │                                   │
//!        ▼                                   ▼
//!   ┌──────────┐                       ┌──────────┐
//!   │  loader   │  bytes → Table        │ samples   │  built-in tables
//!   └──────────┘                       └──────────┘
//!        │                                   │
//!        └──────────────┬────────────────────┘
//!                       ▼
//!                ┌──────────┐
//!                │  Table    │  named, typed columns
//!                └──────────┘
//!                       │
//!            ┌──────────┴──────────┐
//!            ▼                     ▼
//!      ┌──────────┐          ┌──────────┐
//!      │  filter   │          │  stats    │  describe()
//!      └──────────┘          └──────────┘
//!       FilterSpec → filtered Table
//! ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod samples;
pub mod stats;
