use tracing::{debug, info, warn};

use super::traits::PropertySource;
use super::types::{RadiusPolicy, SearchRequest, SearchState, SearchTier};
use crate::error::BackendError;
use crate::models::PropertySummary;

/// Terminal state of one resolution
#[derive(Debug)]
pub enum SearchOutcome {
    /// First tier that returned at least one row
    Found {
        tier: SearchTier,
        properties: Vec<PropertySummary>,
    },
    /// Every applicable tier came back empty. Not an error.
    Empty { attempts: usize },
    /// A call failed; later tiers were not attempted
    Failed { tier: SearchTier, error: BackendError },
}

impl SearchOutcome {
    pub fn properties(&self) -> &[PropertySummary] {
        match self {
            SearchOutcome::Found { properties, .. } => properties,
            _ => &[],
        }
    }

    pub fn into_properties(self) -> Vec<PropertySummary> {
        match self {
            SearchOutcome::Found { properties, .. } => properties,
            _ => Vec::new(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, SearchOutcome::Failed { error, .. } if error.is_retryable())
    }
}

/// Runs the tier cascade against a [`PropertySource`].
pub struct SearchResolver<S> {
    source: S,
    radii: RadiusPolicy,
}

impl<S: PropertySource> SearchResolver<S> {
    pub fn new(source: S, radii: RadiusPolicy) -> Self {
        Self { source, radii }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Tries each tier in order, one awaited call at a time, and stops at the
    /// first non-empty result. Tiers the query cannot express, and tiers whose
    /// request repeats one already sent, are skipped without a call.
    pub async fn resolve(&self, state: &SearchState) -> SearchOutcome {
        let mut issued: Vec<SearchRequest> = Vec::new();

        for tier in SearchTier::ALL {
            let Some(request) = tier.request(state, &self.radii) else {
                debug!(%tier, "Tier not applicable, skipping");
                continue;
            };
            if issued.contains(&request) {
                debug!(%tier, "Tier repeats an earlier request, skipping");
                continue;
            }

            debug!(%tier, source = self.source.source_name(), ?request, "Querying property search");

            let records = match self.source.search(&request).await {
                Ok(records) => records,
                Err(error) => {
                    warn!(%tier, error = %error, "Property search failed");
                    return SearchOutcome::Failed { tier, error };
                }
            };
            issued.push(request);

            if records.is_empty() {
                debug!(%tier, "No rows, relaxing");
                continue;
            }

            let properties: Vec<PropertySummary> =
                records.iter().map(PropertySummary::from_payload).collect();
            info!(%tier, count = properties.len(), calls = issued.len(), "Search resolved");
            return SearchOutcome::Found { tier, properties };
        }

        info!(calls = issued.len(), "Search exhausted every tier without results");
        SearchOutcome::Empty {
            attempts: issued.len(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::search::query::{Coordinates, LocationQuery, Place};
    use crate::search::types::{DateRange, SearchFilters};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    type Responder = Box<dyn Fn(&SearchRequest) -> Result<Vec<Value>, BackendError> + Send + Sync>;

    /// Records every request and answers from a closure
    pub(crate) struct ScriptedSource {
        pub calls: Mutex<Vec<SearchRequest>>,
        respond: Responder,
    }

    impl ScriptedSource {
        pub(crate) fn new(
            respond: impl Fn(&SearchRequest) -> Result<Vec<Value>, BackendError> + Send + Sync + 'static,
        ) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                respond: Box::new(respond),
            }
        }

        pub(crate) fn calls(&self) -> Vec<SearchRequest> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PropertySource for ScriptedSource {
        async fn search(&self, request: &SearchRequest) -> Result<Vec<Value>, BackendError> {
            self.calls.lock().unwrap().push(request.clone());
            (self.respond)(request)
        }

        fn source_name(&self) -> &'static str {
            "scripted"
        }
    }

    fn springfield(coordinates: Option<Coordinates>) -> SearchState {
        SearchState::new(
            LocationQuery::from_text("Springfield")
                .with_place(Place::new(Some("Springfield"), Some("Illinois"), Some("USA")))
                .with_coordinates(coordinates),
        )
    }

    fn resolver(source: ScriptedSource) -> SearchResolver<ScriptedSource> {
        SearchResolver::new(source, RadiusPolicy::default())
    }

    #[tokio::test]
    async fn state_country_tier_resolves_after_two_calls() {
        let resolver = resolver(ScriptedSource::new(|request| {
            if request.state.as_deref() == Some("Illinois") {
                Ok(vec![json!({"id": "p1", "title": "Prairie house"})])
            } else {
                Ok(vec![])
            }
        }));

        let outcome = resolver.resolve(&springfield(None)).await;

        let calls = resolver.source().calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].keyword.as_deref(), Some("Springfield"));
        assert!(calls[0].state.is_none());
        assert!(calls[1].keyword.is_none() && calls[1].city.is_none());
        match outcome {
            SearchOutcome::Found { tier, properties } => {
                assert_eq!(tier, SearchTier::StateCountry);
                assert_eq!(properties[0].title, "Prairie house");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn first_hit_stops_the_cascade() {
        let resolver = resolver(ScriptedSource::new(|_| Ok(vec![json!({"id": "p1"})])));
        let outcome = resolver
            .resolve(&springfield(Coordinates::new(39.78, -89.65, None)))
            .await;

        assert_eq!(resolver.source().calls().len(), 1);
        assert!(matches!(outcome, SearchOutcome::Found { tier: SearchTier::Exact, .. }));
    }

    #[tokio::test]
    async fn exhaustion_walks_tiers_in_fixed_order() {
        let resolver = resolver(ScriptedSource::new(|_| Ok(vec![])));
        let state = springfield(Coordinates::new(39.78, -89.65, Some(4.0))).with_filters(SearchFilters {
            dates: DateRange::parse("2024-05-01", "2024-05-03"),
            ..SearchFilters::default()
        });

        let outcome = resolver.resolve(&state).await;
        let calls = resolver.source().calls();

        assert!(matches!(outcome, SearchOutcome::Empty { attempts: 4 }));
        assert!(outcome.properties().is_empty());
        assert_eq!(calls.len(), 4);
        assert!(calls[0].keyword.is_some());
        assert!(calls[1].state.is_some() && calls[1].country.is_some());
        assert!(calls[2].state.is_none() && calls[2].country.is_some());
        assert!(!calls[3].has_text_filter());
        assert_eq!(calls[3].radius, Some(50.0));
        assert!(calls.iter().all(|c| c.start_date == state.filters.dates.map(|d| d.start)));
    }

    #[tokio::test]
    async fn out_of_range_coordinates_never_reach_coordinate_tiers() {
        let resolver = resolver(ScriptedSource::new(|_| Ok(vec![])));
        let outcome = resolver
            .resolve(&springfield(Coordinates::new(91.0, 200.0, None)))
            .await;

        let calls = resolver.source().calls();
        assert_eq!(calls.len(), 3);
        assert!(calls.iter().all(|c| c.lat.is_none() && c.radius.is_none()));
        assert!(matches!(outcome, SearchOutcome::Empty { attempts: 3 }));
    }

    #[tokio::test]
    async fn repeated_requests_are_not_reissued() {
        let resolver = resolver(ScriptedSource::new(|_| Ok(vec![])));
        let state = SearchState::new(LocationQuery::from_place(Place::new(None, None, Some("Japan"))));

        resolver.resolve(&state).await;

        // exact and country-only would send the same query
        assert_eq!(resolver.source().calls().len(), 1);
    }

    #[tokio::test]
    async fn failure_stops_without_relaxing() {
        let resolver = resolver(ScriptedSource::new(|_| {
            Err(BackendError::Status {
                status: 502,
                body: "bad gateway".into(),
            })
        }));

        let outcome = resolver.resolve(&springfield(None)).await;

        assert_eq!(resolver.source().calls().len(), 1);
        assert!(outcome.is_retryable());
        assert!(matches!(outcome, SearchOutcome::Failed { tier: SearchTier::Exact, .. }));
    }

    #[tokio::test]
    async fn empty_query_is_one_unfiltered_call() {
        let resolver = resolver(ScriptedSource::new(|_| Ok(vec![json!({})])));
        let outcome = resolver.resolve(&SearchState::default()).await;

        let calls = resolver.source().calls();
        assert_eq!(calls.len(), 1);
        assert!(!calls[0].has_text_filter());
        assert_eq!(outcome.into_properties().len(), 1);
    }
}
