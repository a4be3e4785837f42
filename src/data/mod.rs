/// Data layer: core types, loading, filtering, and view transforms.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset  │  Vec<Observation>, province + date indices
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  date range + province set → filtered indices
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │   view    │  map / series / distribution / placeholder
///   └──────────┘
/// ```

pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
pub mod view;
