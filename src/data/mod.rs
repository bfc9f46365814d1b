/// Data layer: core types, loading, filtering, and aggregation.
///
/// Architecture:
/// ```text
///  .parquet / .json / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset  │  Vec<Record>, immutable
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  ordered FilterSpecs → narrowed DatasetView
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  group sums, zero-filled pivots, distinct counts
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  share    │  per-year enrollment shares, ascending order
///   └──────────┘
/// ```

pub mod aggregate;
pub mod filter;
pub mod loader;
pub mod model;
pub mod share;
