//! City Browser: incremental search, paged accumulation and client-side sort.
//!
//! Loads are split into [`CityBrowser::begin_load`], which hands out a
//! [`PageTicket`], and [`CityBrowser::apply_page`], which folds the fetched
//! page back in. Every ticket carries a generation number; a page whose
//! ticket is not the latest one issued is dropped, so a slow response for an
//! old query can never overwrite the results of a newer one.

use crate::{
    error::CityError,
    model::{CityRecord, SortDirection, SortField, SortSpec},
    provider::CitySource,
    route::{Navigation, Route},
};

/// Rows requested per page.
pub const PAGE_SIZE: usize = 50;

/// Identifies one issued page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTicket {
    generation: u64,
    pub query: String,
    pub offset: usize,
}

/// What happened to a page handed to [`CityBrowser::apply_page`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    Replaced { rows: usize },
    Appended { rows: usize },
    /// The ticket was superseded before its page arrived.
    Stale,
    /// The fetch failed; nothing changed.
    Failed,
}

#[derive(Debug, Clone)]
pub struct CityBrowser {
    cities: Vec<CityRecord>,
    has_more: bool,
    /// Offset of the last page applied for the current query, `None` until
    /// the first page lands.
    applied: Option<usize>,
    query: String,
    sort: Option<SortSpec>,
    generation: u64,
    in_flight: Option<u64>,
}

impl Default for CityBrowser {
    fn default() -> Self {
        Self::new()
    }
}

impl CityBrowser {
    pub fn new() -> Self {
        Self {
            cities: Vec::new(),
            has_more: true,
            applied: None,
            query: String::new(),
            sort: None,
            generation: 0,
            in_flight: None,
        }
    }

    pub fn cities(&self) -> &[CityRecord] {
        &self.cities
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Offset of the last page applied for the current query.
    pub fn offset(&self) -> Option<usize> {
        self.applied
    }

    /// Offset the next load-more will request: page 0 until a page has been
    /// applied for the current query.
    pub fn next_offset(&self) -> usize {
        self.applied.map_or(0, |offset| offset + PAGE_SIZE)
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn sort_spec(&self) -> Option<SortSpec> {
        self.sort
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    fn issue(&mut self, offset: usize) -> PageTicket {
        self.generation += 1;
        self.in_flight = Some(self.generation);
        PageTicket {
            generation: self.generation,
            query: self.query.clone(),
            offset,
        }
    }

    fn restart(&mut self) -> PageTicket {
        self.applied = None;
        self.has_more = true;
        self.issue(0)
    }

    /// Ticket for (re)loading the first page of the current query. Paging
    /// starts over, even if the query had been exhausted.
    ///
    /// Every ticket must reach [`CityBrowser::apply_page`] or
    /// [`CityBrowser::cancel`]; until then the browser counts as loading and
    /// refuses load-more.
    pub fn begin_load(&mut self) -> PageTicket {
        self.restart()
    }

    /// Start a fresh search. Supersedes any load still in flight.
    pub fn on_search_text_change(&mut self, text: &str) -> PageTicket {
        self.query = text.to_string();
        self.restart()
    }

    /// Ticket for the next page, or `None` if the dataset is exhausted or a
    /// load is already running. If no page of the current query has been
    /// applied yet, this asks for page 0 again.
    pub fn on_load_more(&mut self) -> Option<PageTicket> {
        if !self.has_more || self.in_flight.is_some() {
            return None;
        }
        let next = self.next_offset();
        Some(self.issue(next))
    }

    /// Abandon `ticket` without a result, e.g. when its fetch was dropped.
    /// Returns `false` if the ticket was not the one in flight.
    pub fn cancel(&mut self, ticket: &PageTicket) -> bool {
        if self.in_flight != Some(ticket.generation) {
            return false;
        }
        tracing::debug!(generation = ticket.generation, query = %ticket.query, "city page cancelled");
        self.in_flight = None;
        true
    }

    pub fn apply_page(
        &mut self,
        ticket: &PageTicket,
        result: Result<Vec<CityRecord>, CityError>,
    ) -> PageOutcome {
        if self.in_flight != Some(ticket.generation) {
            tracing::debug!(
                generation = ticket.generation,
                latest = self.generation,
                query = %ticket.query,
                "dropping stale city page"
            );
            return PageOutcome::Stale;
        }
        self.in_flight = None;

        let page = match result {
            Ok(page) => page,
            Err(err) => {
                tracing::error!(
                    query = %ticket.query,
                    offset = ticket.offset,
                    error = %err,
                    "Error fetching cities"
                );
                return PageOutcome::Failed;
            }
        };

        if page.is_empty() {
            self.has_more = false;
        }

        let rows = page.len();
        self.applied = Some(ticket.offset);

        if ticket.offset == 0 {
            self.cities = page;
            PageOutcome::Replaced { rows }
        } else {
            self.cities.extend(page);
            PageOutcome::Appended { rows }
        }
    }

    /// Fetch and apply the page for `ticket`. If this future is dropped
    /// before it completes, pass the ticket to [`CityBrowser::cancel`].
    pub async fn fetch<S>(&mut self, source: &S, ticket: PageTicket) -> PageOutcome
    where
        S: CitySource + ?Sized,
    {
        let result = source
            .fetch_page(&ticket.query, ticket.offset, PAGE_SIZE)
            .await;
        self.apply_page(&ticket, result)
    }

    /// Load the first page of the current query.
    pub async fn load<S>(&mut self, source: &S) -> PageOutcome
    where
        S: CitySource + ?Sized,
    {
        let ticket = self.begin_load();
        self.fetch(source, ticket).await
    }

    pub async fn search<S>(&mut self, source: &S, text: &str) -> PageOutcome
    where
        S: CitySource + ?Sized,
    {
        let ticket = self.on_search_text_change(text);
        self.fetch(source, ticket).await
    }

    /// Fetch the next page, if any. `None` when nothing was requested.
    pub async fn load_more<S>(&mut self, source: &S) -> Option<PageOutcome>
    where
        S: CitySource + ?Sized,
    {
        let ticket = self.on_load_more()?;
        Some(self.fetch(source, ticket).await)
    }

    /// Same field flips direction; a new field starts ascending.
    pub fn sort_by(&mut self, field: SortField) {
        let direction = match self.sort {
            Some(spec) if spec.field == field => spec.direction.flipped(),
            _ => SortDirection::Ascending,
        };
        self.sort = Some(SortSpec { field, direction });
    }

    /// The loaded cities in display order. Stable: equal keys keep load order.
    pub fn sorted(&self) -> Vec<&CityRecord> {
        let mut rows: Vec<&CityRecord> = self.cities.iter().collect();

        if let Some(SortSpec { field, direction }) = self.sort {
            rows.sort_by(|a, b| {
                let ord = field.value_of(a).cmp(field.value_of(b));
                match direction {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                }
            });
        }

        rows
    }

    pub fn select_city(&self, city: &CityRecord) -> Navigation {
        Navigation::Replace(Route::weather(&city.name))
    }

    pub fn select_city_new_context(&self, city: &CityRecord) -> Navigation {
        Navigation::NewContext(Route::weather(&city.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn city(id: &str, name: &str, country: &str, tz: &str) -> CityRecord {
        CityRecord {
            record_id: id.to_string(),
            name: name.to_string(),
            country_name: country.to_string(),
            timezone: tz.to_string(),
        }
    }

    fn page(prefix: &str, n: usize) -> Vec<CityRecord> {
        (0..n)
            .map(|i| city(&format!("{prefix}-{i}"), &format!("{prefix}{i}"), "", ""))
            .collect()
    }

    fn status_error() -> CityError {
        CityError::Status {
            status: reqwest::StatusCode::BAD_GATEWAY,
            body: "upstream down".into(),
        }
    }

    /// Serves `pages_per_query` full pages for every query, then empty pages.
    #[derive(Debug)]
    struct FakeCities {
        pages_per_query: usize,
        calls: Mutex<Vec<(String, usize, usize)>>,
    }

    impl FakeCities {
        fn new(pages_per_query: usize) -> Self {
            Self {
                pages_per_query,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CitySource for FakeCities {
        async fn fetch_page(
            &self,
            query: &str,
            start: usize,
            rows: usize,
        ) -> Result<Vec<CityRecord>, CityError> {
            self.calls
                .lock()
                .unwrap()
                .push((query.to_string(), start, rows));
            if start / rows >= self.pages_per_query {
                return Ok(Vec::new());
            }
            Ok((0..rows)
                .map(|i| {
                    let n = start + i;
                    city(&format!("{query}-{n}"), &format!("{query}{n}"), "", "")
                })
                .collect())
        }
    }

    #[test]
    fn search_replaces_accumulated_list() {
        let mut b = CityBrowser::new();

        let t = b.on_search_text_change("par");
        b.apply_page(&t, Ok(page("par", 3)));
        let t = b.on_load_more().expect("more pages");
        b.apply_page(&t, Ok(page("par-more", 2)));
        assert_eq!(b.cities().len(), 5);

        let t = b.on_search_text_change("pari");
        let outcome = b.apply_page(&t, Ok(page("pari", 1)));

        assert_eq!(outcome, PageOutcome::Replaced { rows: 1 });
        assert_eq!(b.cities(), page("pari", 1).as_slice());
        assert_eq!(b.offset(), Some(0));
        assert_eq!(b.query(), "pari");
    }

    #[test]
    fn load_more_concatenates_pages_in_order() {
        let mut b = CityBrowser::new();
        let first = page("a", 2);
        let second = page("b", 2);
        let third = page("c", 1);

        let t = b.begin_load();
        b.apply_page(&t, Ok(first.clone()));
        for p in [&second, &third] {
            let t = b.on_load_more().expect("more pages");
            b.apply_page(&t, Ok(p.clone()));
        }

        let expected: Vec<CityRecord> = [first, second, third].concat();
        assert_eq!(b.cities(), expected.as_slice());
        assert_eq!(b.offset(), Some(2 * PAGE_SIZE));
    }

    #[test]
    fn overlapping_pages_are_not_deduplicated() {
        let mut b = CityBrowser::new();
        let t = b.begin_load();
        b.apply_page(&t, Ok(page("x", 2)));
        let t = b.on_load_more().expect("more pages");
        b.apply_page(&t, Ok(page("x", 2)));

        assert_eq!(b.cities().len(), 4);
        assert_eq!(b.cities()[0], b.cities()[2]);
    }

    #[test]
    fn empty_page_stops_paging_until_next_search() {
        let mut b = CityBrowser::new();
        let t = b.begin_load();
        b.apply_page(&t, Ok(page("a", 2)));

        let t = b.on_load_more().expect("more pages");
        assert_eq!(b.apply_page(&t, Ok(Vec::new())), PageOutcome::Appended { rows: 0 });
        assert!(!b.has_more());
        assert!(b.on_load_more().is_none());
        assert_eq!(b.cities().len(), 2);

        b.on_search_text_change("b");
        assert!(b.has_more());
    }

    #[test]
    fn empty_first_page_clears_list() {
        let mut b = CityBrowser::new();
        let t = b.on_search_text_change("lon");
        b.apply_page(&t, Ok(page("lon", 3)));

        let t = b.on_search_text_change("zzzz");
        assert_eq!(b.apply_page(&t, Ok(Vec::new())), PageOutcome::Replaced { rows: 0 });
        assert!(b.cities().is_empty());
        assert!(!b.has_more());
    }

    #[test]
    fn stale_search_response_is_dropped() {
        let mut b = CityBrowser::new();
        let slow = b.on_search_text_change("p");
        let fast = b.on_search_text_change("pa");

        assert_eq!(b.apply_page(&fast, Ok(page("pa", 2))), PageOutcome::Replaced { rows: 2 });
        assert_eq!(b.apply_page(&slow, Ok(page("p", 5))), PageOutcome::Stale);
        assert_eq!(b.cities(), page("pa", 2).as_slice());
    }

    #[test]
    fn search_supersedes_pending_load_more() {
        let mut b = CityBrowser::new();
        let t = b.begin_load();
        b.apply_page(&t, Ok(page("a", 2)));

        let more = b.on_load_more().expect("more pages");
        let search = b.on_search_text_change("b");

        assert_eq!(b.apply_page(&more, Ok(page("a-more", 2))), PageOutcome::Stale);
        b.apply_page(&search, Ok(page("b", 1)));
        assert_eq!(b.cities(), page("b", 1).as_slice());
    }

    #[test]
    fn load_more_refused_while_loading() {
        let mut b = CityBrowser::new();
        let _pending = b.begin_load();
        assert!(b.is_loading());
        assert!(b.on_load_more().is_none());
    }

    #[test]
    fn failed_load_leaves_state_intact() {
        let mut b = CityBrowser::new();
        let t = b.begin_load();
        b.apply_page(&t, Ok(page("a", 2)));

        let t = b.on_load_more().expect("more pages");
        assert_eq!(t.offset, PAGE_SIZE);
        assert_eq!(b.apply_page(&t, Err(status_error())), PageOutcome::Failed);

        assert_eq!(b.cities(), page("a", 2).as_slice());
        assert!(b.has_more());
        assert_eq!(b.offset(), Some(0));
        assert!(!b.is_loading());

        // The same page is requested again.
        let retry = b.on_load_more().expect("retry allowed");
        assert_eq!(retry.offset, PAGE_SIZE);
    }

    #[test]
    fn load_more_after_failed_first_page_asks_for_page_zero() {
        let mut b = CityBrowser::new();
        let t = b.on_search_text_change("par");
        assert_eq!(b.apply_page(&t, Err(status_error())), PageOutcome::Failed);
        assert_eq!(b.offset(), None);

        let more = b.on_load_more().expect("first page still missing");
        assert_eq!(more.offset, 0);
        assert_eq!(more.query, "par");

        assert_eq!(b.apply_page(&more, Ok(page("par", 2))), PageOutcome::Replaced { rows: 2 });
        let next = b.on_load_more().expect("more pages");
        assert_eq!(next.offset, PAGE_SIZE);
    }

    #[test]
    fn failed_first_page_keeps_previous_query_rows_until_replaced() {
        let mut b = CityBrowser::new();
        let t = b.on_search_text_change("lon");
        b.apply_page(&t, Ok(page("lon", 2)));

        let t = b.on_search_text_change("par");
        b.apply_page(&t, Err(status_error()));
        assert_eq!(b.cities(), page("lon", 2).as_slice());

        let retry = b.on_load_more().expect("retry first page");
        b.apply_page(&retry, Ok(page("par", 1)));
        assert_eq!(b.cities(), page("par", 1).as_slice());
    }

    #[test]
    fn reload_after_exhaustion_allows_paging_again() {
        let mut b = CityBrowser::new();
        let t = b.begin_load();
        b.apply_page(&t, Ok(page("a", 2)));
        let t = b.on_load_more().expect("more pages");
        b.apply_page(&t, Ok(Vec::new()));
        assert!(!b.has_more());

        let t = b.begin_load();
        assert!(b.has_more());
        assert_eq!(b.apply_page(&t, Ok(page("a", 2))), PageOutcome::Replaced { rows: 2 });
        assert!(b.has_more());
        assert_eq!(b.offset(), Some(0));

        let more = b.on_load_more().expect("paging restarted");
        assert_eq!(more.offset, PAGE_SIZE);
    }

    #[test]
    fn cancelled_ticket_releases_load_more() {
        let mut b = CityBrowser::new();
        let t = b.begin_load();
        b.apply_page(&t, Ok(page("a", 2)));

        let abandoned = b.on_load_more().expect("more pages");
        assert!(b.on_load_more().is_none());

        assert!(b.cancel(&abandoned));
        assert!(!b.is_loading());
        assert!(!b.cancel(&abandoned));

        let again = b.on_load_more().expect("load-more available again");
        assert_eq!(again.offset, PAGE_SIZE);
        assert_eq!(b.apply_page(&abandoned, Ok(page("late", 1))), PageOutcome::Stale);
    }

    #[test]
    fn cancel_ignores_superseded_ticket() {
        let mut b = CityBrowser::new();
        let old = b.on_search_text_change("p");
        let _current = b.on_search_text_change("pa");

        assert!(!b.cancel(&old));
        assert!(b.is_loading());
    }

    #[test]
    fn sort_toggles_direction_on_same_field() {
        let mut b = CityBrowser::new();
        assert!(b.sort_spec().is_none());

        b.sort_by(SortField::Name);
        assert_eq!(b.sort_spec().unwrap().direction, SortDirection::Ascending);
        b.sort_by(SortField::Name);
        assert_eq!(b.sort_spec().unwrap().direction, SortDirection::Descending);
        b.sort_by(SortField::Name);
        assert_eq!(b.sort_spec().unwrap().direction, SortDirection::Ascending);

        b.sort_by(SortField::Name);
        b.sort_by(SortField::Country);
        assert_eq!(
            b.sort_spec(),
            Some(SortSpec {
                field: SortField::Country,
                direction: SortDirection::Ascending
            })
        );
    }

    #[test]
    fn sorted_view_is_stable_and_leaves_list_alone() {
        let mut b = CityBrowser::new();
        let rows = vec![
            city("1", "Lyon", "France", "Europe/Paris"),
            city("2", "Berlin", "Germany", "Europe/Berlin"),
            city("3", "Paris", "France", "Europe/Paris"),
            city("4", "Nowhere", "", ""),
        ];
        let t = b.begin_load();
        b.apply_page(&t, Ok(rows.clone()));

        b.sort_by(SortField::Country);
        let ids: Vec<&str> = b.sorted().iter().map(|c| c.record_id.as_str()).collect();
        assert_eq!(ids, ["4", "1", "3", "2"]);

        // Re-deriving with the same spec gives the same order.
        let again: Vec<&str> = b.sorted().iter().map(|c| c.record_id.as_str()).collect();
        assert_eq!(ids, again);

        b.sort_by(SortField::Country);
        let ids: Vec<&str> = b.sorted().iter().map(|c| c.record_id.as_str()).collect();
        assert_eq!(ids, ["2", "1", "3", "4"]);

        assert_eq!(b.cities(), rows.as_slice());
    }

    #[test]
    fn selecting_navigates_by_name() {
        let b = CityBrowser::new();
        let paris = city("1", "Paris", "France", "Europe/Paris");

        assert_eq!(
            b.select_city(&paris),
            Navigation::Replace(Route::weather("Paris"))
        );
        assert_eq!(
            b.select_city_new_context(&paris),
            Navigation::NewContext(Route::weather("Paris"))
        );
    }

    #[tokio::test]
    async fn paging_against_source_until_exhausted() {
        let source = FakeCities::new(2);
        let mut b = CityBrowser::new();

        assert_eq!(
            b.search(&source, "rome").await,
            PageOutcome::Replaced { rows: PAGE_SIZE }
        );
        assert_eq!(
            b.load_more(&source).await,
            Some(PageOutcome::Appended { rows: PAGE_SIZE })
        );
        assert_eq!(b.load_more(&source).await, Some(PageOutcome::Appended { rows: 0 }));
        assert_eq!(b.load_more(&source).await, None);

        assert_eq!(b.cities().len(), 2 * PAGE_SIZE);
        assert_eq!(b.cities()[PAGE_SIZE].name, format!("rome{PAGE_SIZE}"));

        let calls = source.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![
                ("rome".to_string(), 0, PAGE_SIZE),
                ("rome".to_string(), PAGE_SIZE, PAGE_SIZE),
                ("rome".to_string(), 2 * PAGE_SIZE, PAGE_SIZE),
            ]
        );
    }
}
