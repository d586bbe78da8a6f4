//! Deduplicating stale-while-revalidate cache for backend queries.
//!
//! Each [`QueryKey`] owns one [`CacheEntry`]. Reads inside the freshness
//! window are served from the entry; anything else starts a fetch, and every
//! consumer asking for the same key while that fetch is in flight attaches to
//! the same shared future. The fetch settles the entry itself, so a consumer
//! going away (a component unmounting) only drops its interest in the result.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

use chrono::{DateTime, Duration, Utc};
use futures::FutureExt;
use futures::future::{LocalBoxFuture, Shared};
use serde_json::Value;

use crate::config::Config;
use crate::models::error::AppError;
use crate::services::errors::display_message;
use crate::services::retry::retry_with_backoff;

// CACHE KEY
/// Structural identity of a query: an ordered list of JSON segments.
///
/// Two keys are equal when their segments are equal as JSON values, object
/// key order included or not. A key must determine its fetch parameters
/// completely.
#[derive(Clone)]
pub struct QueryKey {
    segments: Vec<Value>,
    canonical: String,
}

impl QueryKey {
    pub fn new(root: impl Into<Value>) -> Self {
        Self::from_segments(vec![root.into()])
    }

    pub fn from_segments(segments: Vec<Value>) -> Self {
        let mut canonical = String::new();
        write_canonical(&Value::Array(segments.clone()), &mut canonical);
        Self {
            segments,
            canonical,
        }
    }

    /// Appends a segment.
    pub fn with(self, segment: impl Into<Value>) -> Self {
        let mut segments = self.segments;
        segments.push(segment.into());
        Self::from_segments(segments)
    }

    pub fn segments(&self) -> &[Value] {
        &self.segments
    }

    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.segments.len() >= prefix.segments.len()
            && self
                .segments
                .iter()
                .zip(&prefix.segments)
                .all(|(a, b)| canonical_eq(a, b))
    }
}

fn canonical_eq(a: &Value, b: &Value) -> bool {
    let (mut left, mut right) = (String::new(), String::new());
    write_canonical(a, &mut left);
    write_canonical(b, &mut right);
    left == right
}

/// JSON encoding with object keys sorted, independent of map ordering.
fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

impl PartialEq for QueryKey {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for QueryKey {}

impl Hash for QueryKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl fmt::Debug for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QueryKey({})", self.canonical)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

// QUERY DESCRIPTOR
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// How long a successful result is served without revalidation.
    pub stale_time: Duration,
    /// Extra attempts after a failed fetch.
    pub retry: u32,
    /// Base backoff between attempts; `0` retries immediately.
    pub retry_delay_ms: u32,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            stale_time: Duration::milliseconds(Config::DEFAULT_STALE_TIME_MS.cast_signed()),
            retry: Config::DEFAULT_RETRY_COUNT,
            retry_delay_ms: Config::DEFAULT_RETRY_DELAY_MS,
        }
    }
}

pub type FetchFn<T> = Rc<dyn Fn() -> LocalBoxFuture<'static, Result<T, AppError>>>;

/// What to fetch, how to identify it and how long it stays fresh.
pub struct Query<T> {
    key: QueryKey,
    fetch: FetchFn<T>,
    options: QueryOptions,
    zero_state: Option<Rc<T>>,
}

impl<T: 'static> Query<T> {
    pub fn new<F, Fut>(key: QueryKey, fetch: F) -> Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Result<T, AppError>> + 'static,
    {
        Self {
            key,
            fetch: Rc::new(move || fetch().boxed_local()),
            options: QueryOptions::default(),
            zero_state: None,
        }
    }

    pub fn stale_time(mut self, stale_time: Duration) -> Self {
        self.options.stale_time = stale_time;
        self
    }

    pub fn retry(mut self, retry: u32) -> Self {
        self.options.retry = retry;
        self
    }

    pub fn retry_delay_ms(mut self, delay_ms: u32) -> Self {
        self.options.retry_delay_ms = delay_ms;
        self
    }

    pub fn options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    /// Value served instead of an error when the backend answers "not found".
    pub fn zero_state(mut self, value: T) -> Self {
        self.zero_state = Some(Rc::new(value));
        self
    }
}

impl<T> Query<T> {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn query_options(&self) -> QueryOptions {
        self.options
    }
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            fetch: self.fetch.clone(),
            options: self.options,
            zero_state: self.zero_state.clone(),
        }
    }
}

impl<T> fmt::Debug for Query<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("key", &self.key)
            .field("options", &self.options)
            .field("zero_state", &self.zero_state.is_some())
            .finish_non_exhaustive()
    }
}

// CACHE ENTRY STATE MACHINE
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Absent,
    Fetching,
    Fresh,
    Stale,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheEvent {
    FetchStarted,
    FetchSucceeded,
    FetchFailed,
    Expired,
    Invalidated,
}

/// Next state of a cache entry. Pairs not listed leave the state unchanged;
/// in particular a fresh entry never starts a fetch until it expires or is
/// invalidated, and a fetching entry never starts a second one.
pub fn transition(state: EntryState, event: CacheEvent) -> EntryState {
    use CacheEvent::*;
    use EntryState::*;

    match (state, event) {
        (Absent | Stale | Error, FetchStarted) => Fetching,
        (Fetching, FetchSucceeded) => Fresh,
        (Fetching, FetchFailed) => Error,
        (Fresh, Expired | Invalidated) => Stale,
        (state, _) => state,
    }
}

type SharedFetch = Shared<LocalBoxFuture<'static, Result<Rc<dyn Any>, AppError>>>;

struct CacheEntry {
    state: EntryState,
    value: Option<Rc<dyn Any>>,
    updated_at: Option<DateTime<Utc>>,
    error: Option<AppError>,
    in_flight: Option<SharedFetch>,
    generation: u64,
}

impl Default for CacheEntry {
    fn default() -> Self {
        Self {
            state: EntryState::Absent,
            value: None,
            updated_at: None,
            error: None,
            in_flight: None,
            generation: 0,
        }
    }
}

impl CacheEntry {
    /// State as observed at `now`, applying expiry of the freshness window.
    fn state_at(&self, now: DateTime<Utc>, stale_time: Duration) -> EntryState {
        match self.updated_at {
            Some(updated_at) if now - updated_at >= stale_time => {
                transition(self.state, CacheEvent::Expired)
            }
            _ => self.state,
        }
    }
}

/// What a consumer sees for one query.
#[derive(Debug)]
pub struct QueryState<T> {
    /// Latest successful value, or the zero-state after a "not found".
    pub data: Option<Rc<T>>,
    /// A fetch for this key is in flight.
    pub is_loading: bool,
    /// Set when the last fetch failed and no zero-state applied.
    pub error: Option<AppError>,
    pub state: EntryState,
}

impl<T> QueryState<T> {
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(display_message)
    }
}

impl<T> Clone for QueryState<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            is_loading: self.is_loading,
            error: self.error.clone(),
            state: self.state,
        }
    }
}

// QUERY CLIENT
pub type Clock = Rc<dyn Fn() -> DateTime<Utc>>;

type Listener = Rc<dyn Fn()>;

struct Inner {
    entries: RefCell<HashMap<QueryKey, CacheEntry>>,
    listeners: RefCell<HashMap<QueryKey, Vec<(u64, Listener)>>>,
    next_id: Cell<u64>,
    /// Shared by every key and never reset, so `clear()` cannot make an old
    /// fetch look current.
    next_generation: Cell<u64>,
    clock: Clock,
}

/// Shared cache of query results. Cloning yields another handle to the same cache.
#[derive(Clone)]
pub struct QueryClient {
    inner: Rc<Inner>,
}

enum Lookup {
    Cached(Rc<dyn Any>),
    Pending(SharedFetch),
}

impl QueryClient {
    pub fn new() -> Self {
        Self::with_clock(Rc::new(Utc::now))
    }

    pub fn with_clock(clock: Clock) -> Self {
        Self {
            inner: Rc::new(Inner {
                entries: RefCell::new(HashMap::new()),
                listeners: RefCell::new(HashMap::new()),
                next_id: Cell::new(0),
                next_generation: Cell::new(0),
                clock,
            }),
        }
    }

    fn now(&self) -> DateTime<Utc> {
        (self.inner.clock)()
    }

    /// Returns the cached value while fresh, otherwise fetches it.
    ///
    /// Concurrent calls for one key share a single fetch.
    pub async fn fetch<T: 'static>(&self, query: &Query<T>) -> Result<Rc<T>, AppError> {
        let value = match self.lookup(query) {
            Lookup::Cached(value) => value,
            Lookup::Pending(pending) => pending.await?,
        };
        downcast(value, &query.key)
    }

    /// Marks the entry stale and fetches it again, joining any fetch already in flight.
    pub async fn refetch<T: 'static>(&self, query: &Query<T>) -> Result<Rc<T>, AppError> {
        self.invalidate(&query.key);
        self.fetch(query).await
    }

    fn lookup<T: 'static>(&self, query: &Query<T>) -> Lookup {
        let now = self.now();
        let pending = {
            let mut entries = self.inner.entries.borrow_mut();
            let entry = entries.entry(query.key.clone()).or_default();
            entry.state = entry.state_at(now, query.options.stale_time);

            if entry.state == EntryState::Fresh {
                if let Some(value) = &entry.value {
                    return Lookup::Cached(value.clone());
                }
            }
            if let Some(pending) = &entry.in_flight {
                tracing::trace!(key = %query.key, "joining in-flight fetch");
                return Lookup::Pending(pending.clone());
            }

            let generation = self.inner.next_generation.get() + 1;
            self.inner.next_generation.set(generation);
            entry.generation = generation;
            let pending = self.start_fetch(query, generation);
            entry.state = transition(entry.state, CacheEvent::FetchStarted);
            entry.in_flight = Some(pending.clone());
            pending
        };

        tracing::debug!(key = %query.key, "fetching");
        self.notify(&query.key);
        Lookup::Pending(pending)
    }

    fn start_fetch<T: 'static>(&self, query: &Query<T>, generation: u64) -> SharedFetch {
        let fetch = query.fetch.clone();
        let options = query.options;
        let zero_state = query.zero_state.clone().map(|v| v as Rc<dyn Any>);
        let key = query.key.clone();
        let cache = Rc::downgrade(&self.inner);

        async move {
            let result = retry_with_backoff(|| fetch(), options.retry, options.retry_delay_ms)
                .await
                .map(|value| Rc::new(value) as Rc<dyn Any>);

            let result = match result {
                Err(e) if e.is_not_found() => zero_state.ok_or(e),
                other => other,
            };

            settle(&cache, &key, generation, &result);
            result
        }
        .boxed_local()
        .shared()
    }

    /// Current view of a query without triggering a fetch.
    pub fn snapshot<T: 'static>(&self, query: &Query<T>) -> QueryState<T> {
        let now = self.now();
        let entries = self.inner.entries.borrow();
        let Some(entry) = entries.get(&query.key) else {
            return QueryState {
                data: None,
                is_loading: false,
                error: None,
                state: EntryState::Absent,
            };
        };

        let state = entry.state_at(now, query.options.stale_time);
        QueryState {
            data: entry.value.clone().and_then(|v| v.downcast::<T>().ok()),
            is_loading: entry.in_flight.is_some(),
            error: if state == EntryState::Error {
                entry.error.clone()
            } else {
                None
            },
            state,
        }
    }

    /// Stores `value` as a fresh result, as if it had just been fetched.
    pub fn set_data<T: 'static>(&self, key: &QueryKey, value: T) {
        let now = self.now();
        {
            let mut entries = self.inner.entries.borrow_mut();
            let entry = entries.entry(key.clone()).or_default();
            entry.value = Some(Rc::new(value));
            entry.updated_at = Some(now);
            entry.error = None;
            if entry.in_flight.is_none() {
                entry.state = EntryState::Fresh;
            }
        }
        self.notify(key);
    }

    /// Marks an entry stale so the next read revalidates it.
    pub fn invalidate(&self, key: &QueryKey) {
        if let Some(entry) = self.inner.entries.borrow_mut().get_mut(key) {
            entry.state = transition(entry.state, CacheEvent::Invalidated);
        }
        self.notify(key);
    }

    /// Invalidates every entry whose key begins with `prefix`.
    pub fn invalidate_prefix(&self, prefix: &QueryKey) {
        let keys: Vec<QueryKey> = {
            let mut entries = self.inner.entries.borrow_mut();
            entries
                .iter_mut()
                .filter(|(key, _)| key.starts_with(prefix))
                .map(|(key, entry)| {
                    entry.state = transition(entry.state, CacheEvent::Invalidated);
                    key.clone()
                })
                .collect()
        };
        for key in &keys {
            self.notify(key);
        }
    }

    /// Drops every entry. Fetches still in flight finish but are not stored.
    pub fn clear(&self) {
        let keys: Vec<QueryKey> = self.inner.entries.borrow_mut().drain().map(|(k, _)| k).collect();
        for key in &keys {
            self.notify(key);
        }
    }

    pub fn state(&self, key: &QueryKey) -> EntryState {
        self.inner
            .entries
            .borrow()
            .get(key)
            .map_or(EntryState::Absent, |entry| entry.state)
    }

    /// Calls `listener` whenever the entry for `key` changes, until the
    /// returned subscription is dropped.
    pub fn subscribe(&self, key: &QueryKey, listener: impl Fn() + 'static) -> Subscription {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner
            .listeners
            .borrow_mut()
            .entry(key.clone())
            .or_default()
            .push((id, Rc::new(listener)));

        Subscription {
            cache: Rc::downgrade(&self.inner),
            key: key.clone(),
            id,
        }
    }

    fn notify(&self, key: &QueryKey) {
        notify(&self.inner, key);
    }
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for QueryClient {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryClient")
            .field("entries", &self.inner.entries.borrow().len())
            .finish_non_exhaustive()
    }
}

/// Records the outcome of a fetch, unless the entry was cleared or a newer
/// fetch replaced it meanwhile.
fn settle(
    cache: &Weak<Inner>,
    key: &QueryKey,
    generation: u64,
    result: &Result<Rc<dyn Any>, AppError>,
) {
    let Some(inner) = cache.upgrade() else {
        return;
    };
    let now = (inner.clock)();

    {
        let mut entries = inner.entries.borrow_mut();
        let Some(entry) = entries.get_mut(key) else {
            tracing::debug!(%key, "discarding result for cleared entry");
            return;
        };
        if entry.generation != generation {
            return;
        }

        entry.in_flight = None;
        match result {
            Ok(value) => {
                entry.value = Some(value.clone());
                entry.updated_at = Some(now);
                entry.error = None;
                entry.state = transition(entry.state, CacheEvent::FetchSucceeded);
            }
            Err(e) => {
                tracing::warn!(%key, "query failed: {e}");
                entry.error = Some(e.clone());
                entry.state = transition(entry.state, CacheEvent::FetchFailed);
            }
        }
    }

    notify(&inner, key);
}

fn notify(inner: &Inner, key: &QueryKey) {
    // Listeners may subscribe or unsubscribe while being called.
    let listeners: Vec<Listener> = inner
        .listeners
        .borrow()
        .get(key)
        .map(|ls| ls.iter().map(|(_, l)| l.clone()).collect())
        .unwrap_or_default();

    for listener in listeners {
        listener();
    }
}

fn downcast<T: 'static>(value: Rc<dyn Any>, key: &QueryKey) -> Result<Rc<T>, AppError> {
    value.downcast::<T>().map_err(|_| {
        AppError::DataError(format!("cached value for {key} has an unexpected type"))
    })
}

/// Keeps a listener registered; dropping it unsubscribes.
pub struct Subscription {
    cache: Weak<Inner>,
    key: QueryKey,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(inner) = self.cache.upgrade() else {
            return;
        };
        let mut listeners = inner.listeners.borrow_mut();
        if let Some(registered) = listeners.get_mut(&self.key) {
            registered.retain(|(id, _)| *id != self.id);
            if registered.is_empty() {
                listeners.remove(&self.key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::oneshot;
    use futures::executor::{LocalPool, block_on};
    use futures::task::LocalSpawnExt;
    use serde_json::json;

    struct TestClock(Rc<Cell<DateTime<Utc>>>);

    impl TestClock {
        fn new() -> Self {
            Self(Rc::new(Cell::new(Utc::now())))
        }

        fn client(&self) -> QueryClient {
            let now = self.0.clone();
            QueryClient::with_clock(Rc::new(move || now.get()))
        }

        fn advance(&self, seconds: i64) {
            self.0.set(self.0.get() + Duration::seconds(seconds));
        }
    }

    fn counting_query(calls: &Rc<Cell<u32>>, key: QueryKey) -> Query<u32> {
        let calls = calls.clone();
        Query::new(key, move || {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move { Ok(n) }
        })
        .retry_delay_ms(0)
    }

    #[test]
    fn test_transition_table() {
        use CacheEvent::*;
        use EntryState::*;

        assert_eq!(transition(Absent, FetchStarted), Fetching);
        assert_eq!(transition(Fetching, FetchStarted), Fetching);
        assert_eq!(transition(Fetching, FetchSucceeded), Fresh);
        assert_eq!(transition(Fetching, FetchFailed), Error);
        assert_eq!(transition(Fresh, FetchStarted), Fresh);
        assert_eq!(transition(Fresh, Expired), Stale);
        assert_eq!(transition(Fresh, Invalidated), Stale);
        assert_eq!(transition(Stale, FetchStarted), Fetching);
        assert_eq!(transition(Error, FetchStarted), Fetching);
        assert_eq!(transition(Absent, FetchSucceeded), Absent);
        assert_eq!(transition(Stale, Expired), Stale);
    }

    #[test]
    fn test_key_equality_is_structural() {
        let a = QueryKey::new("savings").with(json!({"range": "7d", "team": 4}));
        let b = QueryKey::from_segments(vec![json!("savings"), json!({"team": 4, "range": "7d"})]);
        let c = QueryKey::new("savings").with(json!({"range": "30d", "team": 4}));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(QueryKey::new("savings"), QueryKey::new("savings").with("7d"));

        let mut map = HashMap::new();
        map.insert(a, 1);
        assert_eq!(map.get(&b), Some(&1));
    }

    #[test]
    fn test_key_prefix() {
        let key = QueryKey::new("metrics").with("usage").with("7d");
        assert!(key.starts_with(&QueryKey::new("metrics")));
        assert!(key.starts_with(&QueryKey::new("metrics").with("usage")));
        assert!(!key.starts_with(&QueryKey::new("auth")));
        assert!(!QueryKey::new("metrics").starts_with(&key));
    }

    #[test]
    fn test_fresh_value_served_without_fetch() {
        let clock = TestClock::new();
        let client = clock.client();
        let calls = Rc::new(Cell::new(0));
        let query = counting_query(&calls, QueryKey::new("cache"));

        assert_eq!(*block_on(client.fetch(&query)).unwrap(), 1);
        clock.advance(29);
        assert_eq!(*block_on(client.fetch(&query)).unwrap(), 1);
        assert_eq!(calls.get(), 1);
        assert_eq!(client.state(query.key()), EntryState::Fresh);
    }

    #[test]
    fn test_stale_value_refetched_once() {
        let clock = TestClock::new();
        let client = clock.client();
        let calls = Rc::new(Cell::new(0));
        let query = counting_query(&calls, QueryKey::new("routing"));

        block_on(client.fetch(&query)).unwrap();
        clock.advance(31);
        assert_eq!(client.snapshot(&query).state, EntryState::Stale);

        let mut pool = LocalPool::new();
        for _ in 0..3 {
            let client = client.clone();
            let query = query.clone();
            pool.spawner()
                .spawn_local(async move {
                    client.fetch(&query).await.unwrap();
                })
                .unwrap();
        }
        pool.run();

        assert_eq!(calls.get(), 2);
        assert_eq!(*block_on(client.fetch(&query)).unwrap(), 2);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_concurrent_fetches_share_one_call() {
        let client = QueryClient::new();
        let calls = Rc::new(Cell::new(0));
        let (tx, rx) = oneshot::channel::<u32>();
        let rx = Rc::new(RefCell::new(Some(rx)));

        let query = {
            let calls = calls.clone();
            Query::new(QueryKey::new("usage").with("7d"), move || {
                calls.set(calls.get() + 1);
                let rx = rx.borrow_mut().take();
                async move {
                    match rx {
                        Some(rx) => rx.await.map_err(|_| AppError::Network("cancelled".into())),
                        None => Err(AppError::Network("second call".into())),
                    }
                }
            })
        };
        let same_key = Query {
            key: QueryKey::from_segments(vec![json!("usage"), json!("7d")]),
            ..query.clone()
        };

        let results = Rc::new(RefCell::new(Vec::new()));
        let mut pool = LocalPool::new();
        for q in [query.clone(), same_key] {
            let client = client.clone();
            let results = results.clone();
            pool.spawner()
                .spawn_local(async move {
                    let value = client.fetch(&q).await.unwrap();
                    results.borrow_mut().push(value);
                })
                .unwrap();
        }

        pool.run_until_stalled();
        assert_eq!(calls.get(), 1);
        let loading = client.snapshot(&query);
        assert!(loading.is_loading);
        assert_eq!(loading.state, EntryState::Fetching);

        tx.send(42).unwrap();
        pool.run();

        let results = results.borrow();
        assert_eq!(results.len(), 2);
        assert!(Rc::ptr_eq(&results[0], &results[1]));
        assert_eq!(*results[0], 42);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_stale_while_revalidate_keeps_previous_value() {
        let clock = TestClock::new();
        let client = clock.client();
        let calls = Rc::new(Cell::new(0));
        let gate: Rc<RefCell<Option<oneshot::Receiver<()>>>> = Rc::new(RefCell::new(None));

        let query = {
            let calls = calls.clone();
            let gate = gate.clone();
            Query::new(QueryKey::new("savings"), move || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                let wait = gate.borrow_mut().take();
                async move {
                    if let Some(wait) = wait {
                        let _ = wait.await;
                    }
                    Ok(n)
                }
            })
        };

        block_on(client.fetch(&query)).unwrap();
        clock.advance(60);

        let (tx, rx) = oneshot::channel();
        *gate.borrow_mut() = Some(rx);

        let mut pool = LocalPool::new();
        {
            let client = client.clone();
            let query = query.clone();
            pool.spawner()
                .spawn_local(async move {
                    client.fetch(&query).await.unwrap();
                })
                .unwrap();
        }
        pool.run_until_stalled();

        let during = client.snapshot(&query);
        assert!(during.is_loading);
        assert_eq!(during.data.as_deref(), Some(&1));

        tx.send(()).unwrap();
        pool.run();

        let after = client.snapshot(&query);
        assert!(!after.is_loading);
        assert_eq!(after.data.as_deref(), Some(&2));
        assert_eq!(after.state, EntryState::Fresh);
    }

    #[test]
    fn test_not_found_yields_zero_state() {
        let client = QueryClient::new();
        let calls = Rc::new(Cell::new(0));
        let query = {
            let calls = calls.clone();
            Query::new(QueryKey::new("drift"), move || {
                calls.set(calls.get() + 1);
                async { Err::<Vec<String>, _>(AppError::NotFound("no report".into())) }
            })
            .retry(3)
            .retry_delay_ms(0)
            .zero_state(Vec::new())
        };

        let value = block_on(client.fetch(&query)).unwrap();
        assert!(value.is_empty());
        assert_eq!(calls.get(), 1);

        let state = client.snapshot(&query);
        assert!(state.error.is_none());
        assert_eq!(state.data.as_deref(), Some(&Vec::new()));
        assert_eq!(state.state, EntryState::Fresh);
    }

    #[test]
    fn test_not_found_without_zero_state_is_error() {
        let client = QueryClient::new();
        let query = Query::new(QueryKey::new("drift"), || async {
            Err::<u8, _>(AppError::NotFound("no report".into()))
        });

        let err = block_on(client.fetch(&query)).unwrap_err();
        assert!(err.is_not_found());
        let state = client.snapshot(&query);
        assert_eq!(state.error_message().as_deref(), Some("no report"));
        assert!(state.data.is_none());
    }

    #[test]
    fn test_retries_before_error() {
        let client = QueryClient::new();
        let calls = Rc::new(Cell::new(0));
        let query = {
            let calls = calls.clone();
            Query::new(QueryKey::new("validation"), move || {
                calls.set(calls.get() + 1);
                async { Err::<u8, _>(AppError::Api { status: 500, message: "boom".into() }) }
            })
            .retry_delay_ms(0)
        };

        assert!(block_on(client.fetch(&query)).is_err());
        assert_eq!(calls.get(), 2);
        assert_eq!(client.state(query.key()), EntryState::Error);

        // an errored entry revalidates on the next read
        assert!(block_on(client.fetch(&query)).is_err());
        assert_eq!(calls.get(), 4);
    }

    #[test]
    fn test_refetch_ignores_freshness() {
        let client = QueryClient::new();
        let calls = Rc::new(Cell::new(0));
        let query = counting_query(&calls, QueryKey::new("cache"));

        block_on(client.fetch(&query)).unwrap();
        assert_eq!(*block_on(client.refetch(&query)).unwrap(), 2);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_invalidate_prefix() {
        let client = QueryClient::new();
        let calls = Rc::new(Cell::new(0));
        let usage = counting_query(&calls, QueryKey::new("metrics").with("usage"));
        let me = counting_query(&calls, QueryKey::new("auth").with("me"));

        block_on(client.fetch(&usage)).unwrap();
        block_on(client.fetch(&me)).unwrap();
        client.invalidate_prefix(&QueryKey::new("metrics"));

        assert_eq!(client.state(usage.key()), EntryState::Stale);
        assert_eq!(client.state(me.key()), EntryState::Fresh);
    }

    #[test]
    fn test_clear_discards_in_flight_result() {
        let client = QueryClient::new();
        let (tx, rx) = oneshot::channel::<u32>();
        let rx = Rc::new(RefCell::new(Some(rx)));
        let query = Query::new(QueryKey::new("me"), move || {
            let rx = rx.borrow_mut().take();
            async move {
                match rx {
                    Some(rx) => rx.await.map_err(|_| AppError::Network("cancelled".into())),
                    None => Ok(0),
                }
            }
        });

        let mut pool = LocalPool::new();
        {
            let client = client.clone();
            let query = query.clone();
            pool.spawner()
                .spawn_local(async move {
                    let _ = client.fetch(&query).await;
                })
                .unwrap();
        }
        pool.run_until_stalled();
        client.clear();
        tx.send(7).unwrap();
        pool.run();

        assert_eq!(client.state(query.key()), EntryState::Absent);
        assert!(client.snapshot(&query).data.is_none());
    }

    #[test]
    fn test_fetch_before_clear_cannot_settle_new_entry() {
        let client = QueryClient::new();
        let (old_tx, old_rx) = oneshot::channel::<u32>();
        let (new_tx, new_rx) = oneshot::channel::<u32>();
        let gates = Rc::new(RefCell::new(vec![new_rx, old_rx]));
        let query = Query::new(QueryKey::new("me"), move || {
            let rx = gates.borrow_mut().pop();
            async move {
                match rx {
                    Some(rx) => rx.await.map_err(|_| AppError::Network("cancelled".into())),
                    None => Ok(0),
                }
            }
        });

        let mut pool = LocalPool::new();
        let spawn_fetch = |pool: &LocalPool| {
            let client = client.clone();
            let query = query.clone();
            pool.spawner()
                .spawn_local(async move {
                    let _ = client.fetch(&query).await;
                })
                .unwrap();
        };

        spawn_fetch(&pool);
        pool.run_until_stalled();
        client.clear();
        spawn_fetch(&pool);
        pool.run_until_stalled();

        old_tx.send(111).unwrap();
        pool.run_until_stalled();

        let state = client.snapshot(&query);
        assert!(state.data.is_none());
        assert!(state.is_loading);
        assert_eq!(state.state, EntryState::Fetching);

        new_tx.send(222).unwrap();
        pool.run();

        assert_eq!(client.snapshot(&query).data.as_deref(), Some(&222));
        assert_eq!(client.state(query.key()), EntryState::Fresh);
    }

    #[test]
    fn test_subscribers_notified_until_dropped() {
        let client = QueryClient::new();
        let calls = Rc::new(Cell::new(0));
        let query = counting_query(&calls, QueryKey::new("cache"));
        let notified = Rc::new(Cell::new(0));

        let subscription = {
            let notified = notified.clone();
            client.subscribe(query.key(), move || notified.set(notified.get() + 1))
        };

        block_on(client.fetch(&query)).unwrap();
        // started + settled
        assert_eq!(notified.get(), 2);

        drop(subscription);
        client.invalidate(query.key());
        assert_eq!(notified.get(), 2);
    }

    #[test]
    fn test_type_mismatch_is_data_error() {
        let client = QueryClient::new();
        let key = QueryKey::new("shared");
        client.set_data(&key, String::from("text"));

        let query = Query::new(key, || async { Ok(1u8) });
        let err = block_on(client.fetch(&query)).unwrap_err();
        assert!(matches!(err, AppError::DataError(_)));
    }
}
