//! Frequency accumulation across a parsed log
//!
//! Collects per-IP and per-username tallies from classified lines, caches
//! one country per IP, and folds IP occurrence counts into per-country
//! totals once the whole file has been read.

use std::sync::Arc;

use indexmap::IndexMap;
use log::warn;

use crate::classifier::{AuthOutcome, LineEvent};
use crate::geo::{GeoResolver, UNKNOWN_COUNTRY};

/// Key to occurrence count. Insertion-ordered, so ranking ties resolve to
/// whichever key was seen first.
pub type FrequencyTable = IndexMap<String, u64>;

fn bump(table: &mut FrequencyTable, key: &str) {
    *table.entry(key.to_string()).or_insert(0) += 1;
}

/// Accumulates every frequency table produced by one run.
pub struct FrequencyAggregator {
    resolver: Arc<dyn GeoResolver>,
    ip_count: FrequencyTable,
    ip_success: FrequencyTable,
    ip_failed: FrequencyTable,
    ip_lockout: FrequencyTable,
    user_count: FrequencyTable,
    user_success: FrequencyTable,
    user_failed: FrequencyTable,
    ip_country: IndexMap<String, String>,
    country_count: FrequencyTable,
}

impl FrequencyAggregator {
    pub fn new(resolver: Arc<dyn GeoResolver>) -> Self {
        FrequencyAggregator {
            resolver,
            ip_count: FrequencyTable::new(),
            ip_success: FrequencyTable::new(),
            ip_failed: FrequencyTable::new(),
            ip_lockout: FrequencyTable::new(),
            user_count: FrequencyTable::new(),
            user_success: FrequencyTable::new(),
            user_failed: FrequencyTable::new(),
            ip_country: IndexMap::new(),
            country_count: FrequencyTable::new(),
        }
    }

    /// Folds one classified line into the tables. The country of a source
    /// IP is resolved the first time that IP appears and never again; a
    /// failed lookup is cached as the unknown sentinel so it is not
    /// retried.
    pub async fn apply(&mut self, event: &LineEvent) {
        if let Some(ip) = &event.source_ip {
            self.record_occurrence(ip).await;
            for outcome in &event.outcomes {
                self.record_outcome(ip, outcome);
            }
        }
        if let Some(ip) = &event.lockout_ip {
            bump(&mut self.ip_lockout, ip);
        }
    }

    async fn record_occurrence(&mut self, ip: &str) {
        bump(&mut self.ip_count, ip);

        if !self.ip_country.contains_key(ip) {
            let country = match self.resolver.country_for(ip).await {
                Ok(country) => country,
                Err(err) => {
                    warn!("Country lookup failed for {}: {}", ip, err);
                    UNKNOWN_COUNTRY.to_string()
                }
            };
            self.ip_country.insert(ip.to_string(), country);
        }
    }

    fn record_outcome(&mut self, ip: &str, outcome: &AuthOutcome) {
        match outcome {
            AuthOutcome::Failed(user) => {
                bump(&mut self.ip_failed, ip);
                if let Some(user) = user {
                    bump(&mut self.user_count, user);
                    bump(&mut self.user_failed, user);
                }
            }
            AuthOutcome::Accepted(user) => {
                bump(&mut self.ip_success, ip);
                if let Some(user) = user {
                    bump(&mut self.user_count, user);
                    bump(&mut self.user_success, user);
                }
            }
        }
    }

    /// Derives the per-country table by adding each IP's occurrence count
    /// to its resolved country. Call once, after the last line.
    pub fn finalize_countries(&mut self) {
        for (ip, count) in &self.ip_count {
            let country = self
                .ip_country
                .get(ip)
                .map(String::as_str)
                .unwrap_or(UNKNOWN_COUNTRY);
            *self.country_count.entry(country.to_string()).or_insert(0) += *count;
        }
    }

    pub fn ip_count(&self) -> &FrequencyTable {
        &self.ip_count
    }

    pub fn ip_success(&self) -> &FrequencyTable {
        &self.ip_success
    }

    pub fn ip_failed(&self) -> &FrequencyTable {
        &self.ip_failed
    }

    pub fn ip_lockout(&self) -> &FrequencyTable {
        &self.ip_lockout
    }

    pub fn user_count(&self) -> &FrequencyTable {
        &self.user_count
    }

    pub fn user_success(&self) -> &FrequencyTable {
        &self.user_success
    }

    pub fn user_failed(&self) -> &FrequencyTable {
        &self.user_failed
    }

    pub fn ip_country(&self) -> &IndexMap<String, String> {
        &self.ip_country
    }

    pub fn country_count(&self) -> &FrequencyTable {
        &self.country_count
    }

    pub fn distinct_ips(&self) -> usize {
        self.ip_count.len()
    }

    pub fn distinct_users(&self) -> usize {
        self.user_count.len()
    }

    pub fn distinct_countries(&self) -> usize {
        self.country_count.len()
    }

    pub fn lockout_total(&self) -> u64 {
        self.ip_lockout.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{AnalyzerError, Result};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubResolver {
        countries: HashMap<String, String>,
        calls: AtomicUsize,
    }

    impl StubResolver {
        fn new(pairs: &[(&str, &str)]) -> Self {
            StubResolver {
                countries: pairs
                    .iter()
                    .map(|(ip, country)| (ip.to_string(), country.to_string()))
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GeoResolver for StubResolver {
        async fn country_for(&self, ip: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .countries
                .get(ip)
                .cloned()
                .unwrap_or_else(|| UNKNOWN_COUNTRY.to_string()))
        }
    }

    struct FailingResolver;

    #[async_trait]
    impl GeoResolver for FailingResolver {
        async fn country_for(&self, _ip: &str) -> Result<String> {
            Err(AnalyzerError::Config("lookup unavailable".to_string()))
        }
    }

    fn failed(ip: &str, user: Option<&str>) -> LineEvent {
        LineEvent {
            source_ip: Some(ip.to_string()),
            outcomes: vec![AuthOutcome::Failed(user.map(|u| u.to_string()))],
            lockout_ip: None,
        }
    }

    fn accepted(ip: &str, user: Option<&str>) -> LineEvent {
        LineEvent {
            source_ip: Some(ip.to_string()),
            outcomes: vec![AuthOutcome::Accepted(user.map(|u| u.to_string()))],
            lockout_ip: None,
        }
    }

    #[tokio::test]
    async fn test_repeated_failures_accumulate() {
        let stub = Arc::new(StubResolver::new(&[("200.1.1.1", "Brazil")]));
        let mut agg = FrequencyAggregator::new(stub.clone());

        for _ in 0..3 {
            agg.apply(&failed("200.1.1.1", Some("bob"))).await;
        }

        assert_eq!(agg.ip_count()["200.1.1.1"], 3);
        assert_eq!(agg.ip_failed()["200.1.1.1"], 3);
        assert_eq!(agg.user_count()["bob"], 3);
        assert_eq!(agg.user_failed()["bob"], 3);
        assert!(agg.ip_success().is_empty());
        assert!(agg.user_success().is_empty());
        // One lookup for three sightings of the same address.
        assert_eq!(stub.calls(), 1);
        assert_eq!(agg.ip_country()["200.1.1.1"], "Brazil");
    }

    #[tokio::test]
    async fn test_success_and_failure_tables_are_disjoint() {
        let stub = Arc::new(StubResolver::new(&[]));
        let mut agg = FrequencyAggregator::new(stub);

        agg.apply(&accepted("198.51.100.7", Some("alice"))).await;
        agg.apply(&failed("203.0.113.9", Some("alice"))).await;

        assert_eq!(agg.ip_success()["198.51.100.7"], 1);
        assert_eq!(agg.ip_failed()["203.0.113.9"], 1);
        assert_eq!(agg.user_count()["alice"], 2);
        assert_eq!(agg.user_success()["alice"], 1);
        assert_eq!(agg.user_failed()["alice"], 1);
    }

    #[tokio::test]
    async fn test_outcome_without_username_counts_ip_only() {
        let stub = Arc::new(StubResolver::new(&[]));
        let mut agg = FrequencyAggregator::new(stub);

        agg.apply(&failed("203.0.113.9", None)).await;

        assert_eq!(agg.ip_count()["203.0.113.9"], 1);
        assert_eq!(agg.ip_failed()["203.0.113.9"], 1);
        assert!(agg.user_count().is_empty());
        assert!(agg.user_failed().is_empty());
    }

    #[tokio::test]
    async fn test_lockout_needs_no_source_ip() {
        let stub = Arc::new(StubResolver::new(&[]));
        let mut agg = FrequencyAggregator::new(stub.clone());

        agg.apply(&LineEvent {
            source_ip: None,
            outcomes: vec![],
            lockout_ip: Some("203.0.113.77".to_string()),
        })
        .await;

        assert_eq!(agg.ip_lockout()["203.0.113.77"], 1);
        assert!(agg.ip_count().is_empty());
        // No occurrence means no country lookup either.
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_lookup_cached_as_unknown() {
        let mut agg = FrequencyAggregator::new(Arc::new(FailingResolver));

        agg.apply(&failed("192.0.2.1", None)).await;
        agg.apply(&failed("192.0.2.1", None)).await;

        assert_eq!(agg.ip_country()["192.0.2.1"], UNKNOWN_COUNTRY);
        assert_eq!(agg.ip_count()["192.0.2.1"], 2);
    }

    #[tokio::test]
    async fn test_finalize_countries_sums_occurrences() {
        let stub = Arc::new(StubResolver::new(&[
            ("200.1.1.1", "Brazil"),
            ("200.1.1.2", "Brazil"),
            ("78.46.10.20", "Germany"),
        ]));
        let mut agg = FrequencyAggregator::new(stub);

        for _ in 0..2 {
            agg.apply(&failed("200.1.1.1", None)).await;
        }
        agg.apply(&failed("200.1.1.2", None)).await;
        agg.apply(&accepted("78.46.10.20", Some("ops"))).await;
        agg.finalize_countries();

        assert_eq!(agg.country_count()["Brazil"], 3);
        assert_eq!(agg.country_count()["Germany"], 1);
        // Countries appear in first-sighting order.
        let order: Vec<&str> = agg.country_count().keys().map(String::as_str).collect();
        assert_eq!(order, vec!["Brazil", "Germany"]);
    }
}
