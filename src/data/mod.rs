/// Data layer: core types, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → SurveillanceDataset
///   └──────────┘
///        │
///        ▼
///   ┌────────────────────┐
///   │ SurveillanceDataset │  Vec<Record>, distinct syndromes / age groups
///   └────────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  syndrome AND age-group selection → filtered rows
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  group-by-sum → time series, age distributions
///   └───────────┘       (age groups placed by `order`)
///        │
///        ▼
///   ┌──────────┐
///   │ pipeline  │  DashboardTables handed to the charts
///   └──────────┘
/// ```

pub mod aggregate;
pub mod filter;
pub mod loader;
pub mod model;
pub mod order;
pub mod pipeline;
