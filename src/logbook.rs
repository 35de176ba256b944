// 📒 Logbook - completed deliveries for one driver
//
// The store owns the collection. Views get read-only slices/iterators and
// mutate only through add/delete. Nothing here can fail: validation happens
// in the form layer before a record reaches the store.

use crate::clock::{self, Clock};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

// ============================================================================
// PLATFORM
// ============================================================================

/// Delivery-aggregator service the order came through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Talabat,
    Jahez,
    Careem,
    Noon,
    Other,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Talabat,
        Platform::Jahez,
        Platform::Careem,
        Platform::Noon,
        Platform::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Talabat => "talabat",
            Platform::Jahez => "jahez",
            Platform::Careem => "careem",
            Platform::Noon => "noon",
            Platform::Other => "other",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Platform::Talabat => Platform::Jahez,
            Platform::Jahez => Platform::Careem,
            Platform::Careem => Platform::Noon,
            Platform::Noon => Platform::Other,
            Platform::Other => Platform::Talabat,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Platform::Talabat => Platform::Other,
            Platform::Jahez => Platform::Talabat,
            Platform::Careem => Platform::Jahez,
            Platform::Noon => Platform::Careem,
            Platform::Other => Platform::Noon,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "talabat" => Ok(Platform::Talabat),
            "jahez" => Ok(Platform::Jahez),
            "careem" => Ok(Platform::Careem),
            "noon" => Ok(Platform::Noon),
            "other" => Ok(Platform::Other),
            other => Err(format!("unknown platform: {}", other)),
        }
    }
}

// ============================================================================
// DELIVERY RECORD
// ============================================================================

/// Fields supplied by the caller when logging a delivery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDelivery {
    pub customer: String,
    pub platform: Platform,
    pub fee: f64,
    pub area: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// One completed delivery
///
/// Identity (`id`) and `timestamp` are assigned by the store; the record is
/// never edited after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub id: String,
    pub customer: String,
    pub platform: Platform,
    pub fee: f64,
    pub area: String,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl DeliveryRecord {
    fn create(fields: NewDelivery, timestamp: DateTime<Utc>) -> Self {
        DeliveryRecord {
            id: uuid::Uuid::new_v4().to_string(),
            customer: fields.customer,
            platform: fields.platform,
            fee: fields.fee,
            area: fields.area,
            notes: fields.notes,
            timestamp,
        }
    }

    /// Case-insensitive substring match over customer, area and notes
    ///
    /// `needle` must already be lowercased.
    fn mentions(&self, needle: &str) -> bool {
        self.customer.to_lowercase().contains(needle)
            || self.area.to_lowercase().contains(needle)
            || self
                .notes
                .as_deref()
                .map(|n| n.to_lowercase().contains(needle))
                .unwrap_or(false)
    }
}

// ============================================================================
// FILTERS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlatformFilter {
    #[default]
    All,
    Only(Platform),
}

impl PlatformFilter {
    pub fn matches(&self, platform: Platform) -> bool {
        match self {
            PlatformFilter::All => true,
            PlatformFilter::Only(p) => *p == platform,
        }
    }

    /// Cycle All -> Talabat -> ... -> Other -> All
    pub fn next(&self) -> Self {
        match self {
            PlatformFilter::All => PlatformFilter::Only(Platform::Talabat),
            PlatformFilter::Only(Platform::Other) => PlatformFilter::All,
            PlatformFilter::Only(p) => PlatformFilter::Only(p.next()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformFilter::All => "all",
            PlatformFilter::Only(p) => p.as_str(),
        }
    }
}

impl FromStr for PlatformFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") || s.trim().is_empty() {
            Ok(PlatformFilter::All)
        } else {
            s.parse().map(PlatformFilter::Only)
        }
    }
}

/// Search text + platform chip, as selected on the logbook page
///
/// A record is shown only when it matches BOTH.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeliveryFilter {
    pub search: String,
    pub platform: PlatformFilter,
}

impl DeliveryFilter {
    pub fn new(search: impl Into<String>, platform: PlatformFilter) -> Self {
        DeliveryFilter {
            search: search.into(),
            platform,
        }
    }

    pub fn matches(&self, record: &DeliveryRecord) -> bool {
        self.platform.matches(record.platform) && self.matches_search(record)
    }

    fn matches_search(&self, record: &DeliveryRecord) -> bool {
        let needle = self.search.trim().to_lowercase();
        needle.is_empty() || record.mentions(&needle)
    }

    pub fn is_active(&self) -> bool {
        !self.search.trim().is_empty() || self.platform != PlatformFilter::All
    }
}

// ============================================================================
// LOGBOOK STORE
// ============================================================================

/// Today's slice of the logbook, as shown on the home page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogbookSummary {
    pub today_deliveries: Vec<DeliveryRecord>,
    pub today_count: usize,
    pub today_earnings: f64,
}

/// Sum of fees over any subset of records
pub fn total_fee<'a, I>(records: I) -> f64
where
    I: IntoIterator<Item = &'a DeliveryRecord>,
{
    records.into_iter().map(|r| r.fee).sum()
}

/// Ordered collection of deliveries (insertion order)
pub struct LogbookStore {
    deliveries: Vec<DeliveryRecord>,
    clock: Arc<dyn Clock>,
}

impl LogbookStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        LogbookStore {
            deliveries: Vec::new(),
            clock,
        }
    }

    /// Store pre-loaded with previously saved records
    pub fn with_records(clock: Arc<dyn Clock>, deliveries: Vec<DeliveryRecord>) -> Self {
        LogbookStore { deliveries, clock }
    }

    /// Log a delivery. Assigns a fresh id and the current timestamp.
    pub fn add_delivery(&mut self, fields: NewDelivery) -> &DeliveryRecord {
        let record = DeliveryRecord::create(fields, self.clock.now());
        tracing::debug!(
            id = %record.id,
            platform = %record.platform,
            fee = record.fee,
            "delivery added"
        );
        self.deliveries.push(record);
        &self.deliveries[self.deliveries.len() - 1]
    }

    /// Remove the delivery with `id`. Unknown ids are ignored.
    ///
    /// Returns the removed record, if there was one.
    pub fn delete_delivery(&mut self, id: &str) -> Option<DeliveryRecord> {
        let index = self.deliveries.iter().position(|d| d.id == id)?;
        let removed = self.deliveries.remove(index);
        tracing::debug!(id = %removed.id, "delivery deleted");
        Some(removed)
    }

    pub fn get(&self, id: &str) -> Option<&DeliveryRecord> {
        self.deliveries.iter().find(|d| d.id == id)
    }

    pub fn deliveries(&self) -> &[DeliveryRecord] {
        &self.deliveries
    }

    pub fn len(&self) -> usize {
        self.deliveries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deliveries.is_empty()
    }

    /// Deliveries whose timestamp falls on today's local calendar date
    ///
    /// Lazy; re-evaluated against the clock on every call.
    pub fn today_deliveries(&self) -> impl Iterator<Item = &DeliveryRecord> + '_ {
        let today = self.clock.today();
        self.deliveries
            .iter()
            .filter(move |d| self.clock.local_date(d.timestamp) == today)
    }

    pub fn today_earnings(&self) -> f64 {
        total_fee(self.today_deliveries())
    }

    pub fn summary(&self) -> LogbookSummary {
        let today_deliveries: Vec<DeliveryRecord> = self.today_deliveries().cloned().collect();
        LogbookSummary {
            today_count: today_deliveries.len(),
            today_earnings: total_fee(&today_deliveries),
            today_deliveries,
        }
    }

    pub fn filtered<'a>(
        &'a self,
        filter: &'a DeliveryFilter,
    ) -> impl Iterator<Item = &'a DeliveryRecord> + 'a {
        self.deliveries.iter().filter(move |d| filter.matches(d))
    }

    /// Number of records a platform chip would show
    pub fn count_for(&self, platform: PlatformFilter) -> usize {
        self.deliveries
            .iter()
            .filter(|d| platform.matches(d.platform))
            .count()
    }

    pub fn total_earnings(&self) -> f64 {
        total_fee(&self.deliveries)
    }

    /// Drop every record (Settings -> Clear Data)
    pub fn clear(&mut self) -> usize {
        let removed = self.deliveries.len();
        self.deliveries.clear();
        tracing::debug!(removed, "logbook cleared");
        removed
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}

impl Default for LogbookStore {
    fn default() -> Self {
        Self::new(clock::system())
    }
}

impl fmt::Debug for LogbookStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogbookStore")
            .field("deliveries", &self.deliveries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::{Duration, FixedOffset, TimeZone};

    fn test_clock() -> FixedClock {
        FixedClock::new(
            Utc.with_ymd_and_hms(2024, 11, 20, 9, 0, 0).unwrap(),
            FixedOffset::east_opt(4 * 3600).unwrap(),
        )
    }

    fn create_test_delivery(customer: &str, platform: Platform, fee: f64, area: &str) -> NewDelivery {
        NewDelivery {
            customer: customer.to_string(),
            platform,
            fee,
            area: area.to_string(),
            notes: None,
        }
    }

    #[test]
    fn test_add_delivery_example_scenario() {
        let mut store = LogbookStore::new(Arc::new(test_clock()));

        let id = store
            .add_delivery(create_test_delivery("Ahmed", Platform::Talabat, 25.0, "Dubai Marina"))
            .id
            .clone();

        assert_eq!(store.len(), 1);
        assert_eq!(store.today_earnings(), 25.0);
        assert_eq!(store.get(&id).unwrap().customer, "Ahmed");

        let talabat = DeliveryFilter::new("", PlatformFilter::Only(Platform::Talabat));
        let jahez = DeliveryFilter::new("", PlatformFilter::Only(Platform::Jahez));
        assert_eq!(store.filtered(&talabat).count(), 1);
        assert_eq!(store.filtered(&jahez).count(), 0);
    }

    #[test]
    fn test_every_add_is_retrievable() {
        let mut store = LogbookStore::new(Arc::new(test_clock()));
        let mut ids = Vec::new();

        for i in 0..10 {
            let record = store.add_delivery(create_test_delivery(
                &format!("Customer {}", i),
                Platform::Noon,
                10.0 + i as f64,
                "Deira",
            ));
            ids.push(record.id.clone());
        }

        assert_eq!(store.len(), 10);
        for id in &ids {
            assert!(store.get(id).is_some(), "record {} should be retrievable", id);
        }

        // Fresh ids, no collisions
        let mut unique = ids.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let mut store = LogbookStore::new(Arc::new(test_clock()));
        let id = store
            .add_delivery(create_test_delivery("Sara", Platform::Careem, 18.0, "JLT"))
            .id
            .clone();
        store.add_delivery(create_test_delivery("Omar", Platform::Jahez, 12.0, "Karama"));

        assert!(store.delete_delivery(&id).is_some());
        assert!(store.delete_delivery(&id).is_none());

        assert_eq!(store.len(), 1);
        assert!(store.get(&id).is_none());
        assert!(store.deliveries().iter().all(|d| d.id != id));
    }

    #[test]
    fn test_delete_unknown_id_leaves_collection_unchanged() {
        let mut store = LogbookStore::new(Arc::new(test_clock()));
        store.add_delivery(create_test_delivery("Ahmed", Platform::Talabat, 25.0, "Dubai Marina"));
        let before = store.deliveries().to_vec();

        assert!(store.delete_delivery("does-not-exist").is_none());

        assert_eq!(store.deliveries(), before.as_slice());
    }

    #[test]
    fn test_today_excludes_previous_days() {
        let clock = test_clock();
        let mut store = LogbookStore::new(Arc::new(clock.clone()));

        // Big fee yesterday, small fee today
        store.add_delivery(create_test_delivery("Yesterday", Platform::Talabat, 500.0, "Deira"));
        clock.advance(Duration::days(1));
        store.add_delivery(create_test_delivery("Today", Platform::Talabat, 20.0, "Deira"));
        store.add_delivery(create_test_delivery("Today 2", Platform::Other, 15.5, "Bur Dubai"));

        let today: Vec<_> = store.today_deliveries().collect();
        assert_eq!(today.len(), 2);
        assert!(today.iter().all(|d| d.customer.starts_with("Today")));

        // Aggregate is tied to the underlying records
        assert_eq!(store.today_earnings(), total_fee(store.today_deliveries()));
        assert_eq!(store.today_earnings(), 35.5);

        let summary = store.summary();
        assert_eq!(summary.today_count, 2);
        assert_eq!(summary.today_earnings, 35.5);
    }

    #[test]
    fn test_today_is_recomputed_on_each_call() {
        let clock = test_clock();
        let mut store = LogbookStore::new(Arc::new(clock.clone()));
        store.add_delivery(create_test_delivery("Ahmed", Platform::Talabat, 25.0, "Marina"));

        assert_eq!(store.today_deliveries().count(), 1);

        clock.advance(Duration::days(1));
        assert_eq!(store.today_deliveries().count(), 0);
        assert_eq!(store.today_earnings(), 0.0);
    }

    #[test]
    fn test_today_uses_local_calendar_day() {
        // 21:00 UTC on the 19th is 01:00 on the 20th in Dubai
        let clock = FixedClock::new(
            Utc.with_ymd_and_hms(2024, 11, 19, 21, 0, 0).unwrap(),
            FixedOffset::east_opt(4 * 3600).unwrap(),
        );
        let mut store = LogbookStore::new(Arc::new(clock.clone()));
        store.add_delivery(create_test_delivery("Late", Platform::Noon, 30.0, "Deira"));

        clock.set(Utc.with_ymd_and_hms(2024, 11, 20, 9, 0, 0).unwrap());
        assert_eq!(store.today_deliveries().count(), 1);
    }

    #[test]
    fn test_search_is_case_insensitive_over_customer_area_notes() {
        let mut store = LogbookStore::new(Arc::new(test_clock()));
        store.add_delivery(create_test_delivery("Ahmed", Platform::Talabat, 25.0, "Dubai Marina"));
        store.add_delivery(NewDelivery {
            notes: Some("Gate code 4417, leave at door".to_string()),
            ..create_test_delivery("Fatima", Platform::Jahez, 14.0, "Al Barsha")
        });

        let by_customer = DeliveryFilter::new("AHMED", PlatformFilter::All);
        let by_area = DeliveryFilter::new("barsha", PlatformFilter::All);
        let by_notes = DeliveryFilter::new("Leave At", PlatformFilter::All);
        let nothing = DeliveryFilter::new("Sharjah", PlatformFilter::All);

        assert_eq!(store.filtered(&by_customer).count(), 1);
        assert_eq!(store.filtered(&by_area).next().unwrap().customer, "Fatima");
        assert_eq!(store.filtered(&by_notes).next().unwrap().customer, "Fatima");
        assert_eq!(store.filtered(&nothing).count(), 0);
    }

    #[test]
    fn test_platform_and_search_filters_intersect() {
        let mut store = LogbookStore::new(Arc::new(test_clock()));
        store.add_delivery(create_test_delivery("Ahmed", Platform::Talabat, 25.0, "Dubai Marina"));
        store.add_delivery(create_test_delivery("Ahmed", Platform::Jahez, 11.0, "Deira"));
        store.add_delivery(create_test_delivery("Khalid", Platform::Talabat, 19.0, "Marina Walk"));

        let filter = DeliveryFilter::new("ahmed", PlatformFilter::Only(Platform::Talabat));
        let matched: Vec<_> = store.filtered(&filter).collect();

        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].area, "Dubai Marina");
        for record in store.deliveries() {
            let expected = filter.platform.matches(record.platform)
                && DeliveryFilter::new("ahmed", PlatformFilter::All).matches(record);
            assert_eq!(filter.matches(record), expected);
        }
        assert_eq!(total_fee(store.filtered(&filter)), 25.0);
    }

    #[test]
    fn test_platform_chip_counts() {
        let mut store = LogbookStore::new(Arc::new(test_clock()));
        store.add_delivery(create_test_delivery("A", Platform::Talabat, 1.0, "x"));
        store.add_delivery(create_test_delivery("B", Platform::Talabat, 1.0, "x"));
        store.add_delivery(create_test_delivery("C", Platform::Noon, 1.0, "x"));

        assert_eq!(store.count_for(PlatformFilter::All), 3);
        assert_eq!(store.count_for(PlatformFilter::Only(Platform::Talabat)), 2);
        assert_eq!(store.count_for(PlatformFilter::Only(Platform::Careem)), 0);
    }

    #[test]
    fn test_platform_filter_cycle_and_parse() {
        let mut filter = PlatformFilter::All;
        let mut seen = Vec::new();
        for _ in 0..6 {
            filter = filter.next();
            seen.push(filter.as_str());
        }
        assert_eq!(seen, vec!["talabat", "jahez", "careem", "noon", "other", "all"]);

        assert_eq!("ALL".parse::<PlatformFilter>().unwrap(), PlatformFilter::All);
        assert_eq!(
            "noon".parse::<PlatformFilter>().unwrap(),
            PlatformFilter::Only(Platform::Noon)
        );
        assert!("deliveroo".parse::<PlatformFilter>().is_err());
    }

    #[test]
    fn test_store_accepts_any_input() {
        // Validation is the form layer's job; the store never rejects
        let mut store = LogbookStore::new(Arc::new(test_clock()));
        store.add_delivery(create_test_delivery("", Platform::Other, 0.0, ""));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut store = LogbookStore::new(Arc::new(test_clock()));
        store.add_delivery(create_test_delivery("A", Platform::Talabat, 1.0, "x"));
        store.add_delivery(create_test_delivery("B", Platform::Noon, 2.0, "y"));

        assert_eq!(store.clear(), 2);
        assert!(store.is_empty());
        assert_eq!(store.total_earnings(), 0.0);
    }
}
