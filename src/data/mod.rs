/// Data layer: cell records, stores, loading, filtering and column metadata.
///
/// Architecture:
/// ```text
///  hosted table (PostgREST)   .json / .csv / .parquet export
///            │                          │
///            ▼                          ▼
///      ┌───────────┐             ┌────────────┐
///      │ RestStore │             │ FileStore  │   impl CellStore
///      └───────────┘             └────────────┘
///            └───────────┬──────────────┘
///                        ▼
///                  ┌──────────┐
///                  │  loader   │  one ordered query → PageData / LoadError
///                  └──────────┘
///                        │
///                        ▼
///                  ┌──────────┐
///                  │  filter   │  per-column predicates → visible indices
///                  └──────────┘
///                        │
///                        ▼
///                  ┌──────────┐
///                  │ columns   │  headers, alignment, value → display text
///                  └──────────┘
/// ```

pub mod columns;
pub mod export;
pub mod file_store;
pub mod filter;
pub mod loader;
pub mod model;
pub mod store;
