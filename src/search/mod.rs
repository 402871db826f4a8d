pub mod query;
pub mod ranker;
pub mod resolver;
pub mod session;
pub mod traits;
pub mod types;

pub use query::{Coordinates, LocationQuery, Place};
pub use ranker::{rank, rank_filtered, ResultFilter, SortDirection, SortField, SortOrder};
pub use resolver::{SearchOutcome, SearchResolver};
pub use session::{RequestToken, RequestTracker, SearchSession};
pub use traits::PropertySource;
pub use types::{DateRange, RadiusPolicy, SearchFilters, SearchRequest, SearchState, SearchTier};
