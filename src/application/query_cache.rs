use crate::domain::time::{NowProvider, Timestamp};
use crate::infrastructure::error::SyncError;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, warn};

pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_GC_TIME: Duration = Duration::from_secs(10 * 60);
const EVENT_CHANNEL_CAPACITY: usize = 64;

type CachedValue = Arc<dyn Any + Send + Sync>;
type FetchOutcome = Result<CachedValue, SyncError>;
type InFlight = Shared<BoxFuture<'static, FetchOutcome>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Profile,
    Reminders,
    WellnessLogs,
    ExerciseLogs,
}

impl EntityKind {
    pub fn query_name(self) -> &'static str {
        match self {
            Self::Profile => "currentUserProfile",
            Self::Reminders => "reminders",
            Self::WellnessLogs => "wellnessLogs",
            Self::ExerciseLogs => "exerciseLogs",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    entity: EntityKind,
    params: String,
}

impl QueryKey {
    pub fn new(entity: EntityKind, params: impl Into<String>) -> Self {
        Self {
            entity,
            params: params.into(),
        }
    }

    pub fn singleton(entity: EntityKind) -> Self {
        Self::new(entity, String::new())
    }

    pub fn entity(&self) -> EntityKind {
        self.entity
    }

    pub fn params(&self) -> &str {
        &self.params
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.params.is_empty() {
            f.write_str(self.entity.query_name())
        } else {
            write!(f, "{}:{}", self.entity.query_name(), self.params)
        }
    }
}

#[derive(Debug, Clone)]
pub struct CachePolicy {
    pub stale_time: Duration,
    pub fetch_timeout: Option<Duration>,
    pub gc_time: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            stale_time: DEFAULT_STALE_TIME,
            fetch_timeout: Some(DEFAULT_FETCH_TIMEOUT),
            gc_time: DEFAULT_GC_TIME,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryStatus {
    Idle,
    Fetching,
    Fresh { fetched_at: Timestamp, stale: bool },
    Failed(SyncError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    Updated(QueryKey),
    Failed(QueryKey, SyncError),
    Invalidated(QueryKey),
    Flushed,
}

enum EntryState {
    Fetching {
        in_flight: InFlight,
        fetch_id: u64,
    },
    Settled,
    Failed(SyncError),
}

struct Entry {
    state: EntryState,
    data: Option<CachedValue>,
    fetched_at: Option<Timestamp>,
    stale: bool,
    last_used: Timestamp,
}

impl Entry {
    fn fetching(in_flight: InFlight, fetch_id: u64, now: Timestamp) -> Self {
        Self {
            state: EntryState::Fetching { in_flight, fetch_id },
            data: None,
            fetched_at: None,
            stale: false,
            last_used: now,
        }
    }

    fn status(&self) -> QueryStatus {
        match &self.state {
            EntryState::Fetching { .. } => QueryStatus::Fetching,
            EntryState::Failed(error) => QueryStatus::Failed(error.clone()),
            EntryState::Settled => match self.fetched_at {
                Some(fetched_at) => QueryStatus::Fresh {
                    fetched_at,
                    stale: self.stale,
                },
                None => QueryStatus::Idle,
            },
        }
    }
}

enum Lookup {
    Hit(CachedValue),
    Join(InFlight),
    Miss,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<QueryKey, Entry>,
    next_fetch_id: u64,
}

impl CacheState {
    fn lookup(&mut self, key: &QueryKey, now: Timestamp, stale_time: Duration) -> Lookup {
        let Some(entry) = self.entries.get_mut(key) else {
            return Lookup::Miss;
        };
        entry.last_used = now;
        match &entry.state {
            EntryState::Fetching { in_flight, .. } => Lookup::Join(in_flight.clone()),
            EntryState::Failed(_) => Lookup::Miss,
            EntryState::Settled => {
                let (Some(data), Some(fetched_at)) = (&entry.data, entry.fetched_at) else {
                    return Lookup::Miss;
                };
                if entry.stale || now.nanos_since(fetched_at) > duration_nanos(stale_time) {
                    Lookup::Miss
                } else {
                    Lookup::Hit(Arc::clone(data))
                }
            }
        }
    }

    // Settled and failed keys nobody asked for within `gc_time` are dropped.
    fn prune(&mut self, now: Timestamp, gc_time: Duration) -> usize {
        let before = self.entries.len();
        let max_idle = duration_nanos(gc_time);
        self.entries.retain(|_, entry| {
            matches!(entry.state, EntryState::Fetching { .. })
                || now.nanos_since(entry.last_used) <= max_idle
        });
        before - self.entries.len()
    }
}

fn duration_nanos(duration: Duration) -> i64 {
    i64::try_from(duration.as_nanos()).unwrap_or(i64::MAX)
}

struct CacheInner {
    state: Mutex<CacheState>,
    policy: CachePolicy,
    now_provider: NowProvider,
    events: broadcast::Sender<CacheEvent>,
}

impl CacheInner {
    fn lock_state(&self) -> Result<MutexGuard<'_, CacheState>, SyncError> {
        self.state
            .lock()
            .map_err(|error| SyncError::Internal(format!("query cache lock poisoned: {error}")))
    }

    fn emit(&self, event: CacheEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }

    fn complete(&self, key: &QueryKey, fetch_id: u64, outcome: &FetchOutcome) {
        let Ok(mut state) = self.lock_state() else {
            return;
        };
        let Some(entry) = state.entries.get_mut(key) else {
            debug!(key = %key, "dropping result for flushed query");
            return;
        };
        if !matches!(&entry.state, EntryState::Fetching { fetch_id: current, .. } if *current == fetch_id) {
            debug!(key = %key, fetch_id, "dropping result of superseded fetch");
            return;
        }

        let now = (self.now_provider)();
        entry.last_used = now;
        let event = match outcome {
            Ok(value) => {
                entry.data = Some(Arc::clone(value));
                entry.fetched_at = Some(now);
                entry.stale = false;
                entry.state = EntryState::Settled;
                debug!(key = %key, "query fresh");
                CacheEvent::Updated(key.clone())
            }
            Err(error) => {
                entry.state = EntryState::Failed(error.clone());
                warn!(key = %key, error = %error, "query failed");
                CacheEvent::Failed(key.clone(), error.clone())
            }
        };
        drop(state);
        self.emit(event);
    }
}

#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<CacheInner>,
}

impl QueryCache {
    pub fn new(policy: CachePolicy) -> Self {
        Self::with_clock(policy, Timestamp::system_clock())
    }

    pub fn with_clock(policy: CachePolicy, now_provider: NowProvider) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(CacheInner {
                state: Mutex::new(CacheState::default()),
                policy,
                now_provider,
                events,
            }),
        }
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.inner.policy
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.inner.events.subscribe()
    }

    // The remote call runs on its own task, so dropping this future does not cancel it.
    pub async fn fetch<T, F, Fut>(&self, key: QueryKey, fetcher: F) -> Result<Arc<T>, SyncError>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, SyncError>> + Send + 'static,
    {
        let in_flight = {
            let mut state = self.inner.lock_state()?;
            let now = (self.inner.now_provider)();
            let pruned = state.prune(now, self.inner.policy.gc_time);
            if pruned > 0 {
                debug!(pruned, "collected idle queries");
            }
            match state.lookup(&key, now, self.inner.policy.stale_time) {
                Lookup::Hit(value) => {
                    debug!(key = %key, "cache hit");
                    return downcast(&key, value);
                }
                Lookup::Join(in_flight) => {
                    debug!(key = %key, "joining in-flight query");
                    in_flight
                }
                Lookup::Miss => self.start_fetch(&mut state, &key, now, fetcher()),
            }
        };

        let value = in_flight.await?;
        downcast(&key, value)
    }

    fn start_fetch<T, Fut>(
        &self,
        state: &mut CacheState,
        key: &QueryKey,
        now: Timestamp,
        request: Fut,
    ) -> InFlight
    where
        T: Send + Sync + 'static,
        Fut: Future<Output = Result<T, SyncError>> + Send + 'static,
    {
        let fetch_id = state.next_fetch_id;
        state.next_fetch_id = state.next_fetch_id.wrapping_add(1);
        debug!(key = %key, fetch_id, "starting remote fetch");

        let timeout = self.inner.policy.fetch_timeout;
        let task_inner = Arc::clone(&self.inner);
        let task_key = key.clone();
        let task = tokio::spawn(async move {
            let result = match timeout {
                Some(limit) => match tokio::time::timeout(limit, request).await {
                    Ok(result) => result,
                    Err(_) => Err(SyncError::Timeout(limit)),
                },
                None => request.await,
            };
            let outcome: FetchOutcome = result.map(|value| Arc::new(value) as CachedValue);
            task_inner.complete(&task_key, fetch_id, &outcome);
            outcome
        });

        let join_inner = Arc::clone(&self.inner);
        let join_key = key.clone();
        let in_flight = async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(error) => {
                    let outcome: FetchOutcome =
                        Err(SyncError::Internal(format!("fetch task for {join_key} failed: {error}")));
                    join_inner.complete(&join_key, fetch_id, &outcome);
                    outcome
                }
            }
        }
        .boxed()
        .shared();

        match state.entries.get_mut(key) {
            Some(entry) => {
                entry.state = EntryState::Fetching {
                    in_flight: in_flight.clone(),
                    fetch_id,
                };
            }
            None => {
                state
                    .entries
                    .insert(key.clone(), Entry::fetching(in_flight.clone(), fetch_id, now));
            }
        }
        in_flight
    }

    // A fetch still running for an invalidated key is retired: its waiters get
    // its result, but it is never stored and the next read starts a new call.
    pub fn invalidate(&self, entity: EntityKind) -> usize {
        let invalidated = {
            let Ok(mut state) = self.inner.lock_state() else {
                return 0;
            };
            let mut invalidated = Vec::new();
            for (key, entry) in state.entries.iter_mut() {
                if key.entity != entity {
                    continue;
                }
                entry.stale = true;
                if matches!(entry.state, EntryState::Fetching { .. }) {
                    entry.state = EntryState::Settled;
                }
                invalidated.push(key.clone());
            }
            invalidated
        };

        debug!(entity = entity.query_name(), count = invalidated.len(), "invalidated queries");
        let count = invalidated.len();
        for key in invalidated {
            self.inner.emit(CacheEvent::Invalidated(key));
        }
        count
    }

    pub fn flush(&self) {
        if let Ok(mut state) = self.inner.lock_state() {
            state.entries.clear();
        }
        debug!("query cache flushed");
        self.inner.emit(CacheEvent::Flushed);
    }

    pub fn status(&self, key: &QueryKey) -> QueryStatus {
        self.inner
            .lock_state()
            .ok()
            .and_then(|state| state.entries.get(key).map(Entry::status))
            .unwrap_or(QueryStatus::Idle)
    }

    pub fn peek<T>(&self, key: &QueryKey) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        let value = {
            let state = self.inner.lock_state().ok()?;
            state.entries.get(key)?.data.clone()?
        };
        value.downcast::<T>().ok()
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock_state()
            .map(|state| state.entries.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn downcast<T>(key: &QueryKey, value: CachedValue) -> Result<Arc<T>, SyncError>
where
    T: Send + Sync + 'static,
{
    value
        .downcast::<T>()
        .map_err(|_| SyncError::Internal(format!("cached value for {key} has an unexpected type")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::time::NANOS_PER_MINUTE;
    use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
    use tokio::sync::Notify;

    struct ManualClock {
        nanos: Arc<AtomicI64>,
    }

    impl ManualClock {
        fn new() -> Self {
            Self {
                nanos: Arc::new(AtomicI64::new(1_771_200_000_000_000_000)),
            }
        }

        fn provider(&self) -> NowProvider {
            let nanos = Arc::clone(&self.nanos);
            Arc::new(move || Timestamp::from_nanos(nanos.load(Ordering::SeqCst)))
        }

        fn advance_minutes(&self, minutes: i64) {
            self.nanos.fetch_add(minutes * NANOS_PER_MINUTE, Ordering::SeqCst);
        }
    }

    fn cache_with(clock: &ManualClock) -> QueryCache {
        QueryCache::with_clock(CachePolicy::default(), clock.provider())
    }

    fn counting_fetch(
        calls: &Arc<AtomicUsize>,
        value: u32,
    ) -> impl FnOnce() -> BoxFuture<'static, Result<Vec<u32>, SyncError>> + use<> {
        let calls = Arc::clone(calls);
        move || {
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(vec![value])
            }
            .boxed()
        }
    }

    fn gated_fetch(
        calls: &Arc<AtomicUsize>,
        gate: &Arc<Notify>,
        value: u32,
    ) -> impl FnOnce() -> BoxFuture<'static, Result<Vec<u32>, SyncError>> + use<> {
        let calls = Arc::clone(calls);
        let gate = Arc::clone(gate);
        move || {
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                gate.notified().await;
                Ok(vec![value])
            }
            .boxed()
        }
    }

    fn reminders_key() -> QueryKey {
        QueryKey::singleton(EntityKind::Reminders)
    }

    #[tokio::test]
    async fn fresh_entry_is_served_without_remote_call() {
        let clock = ManualClock::new();
        let cache = cache_with(&clock);
        let calls = Arc::new(AtomicUsize::new(0));

        let first = cache.fetch(reminders_key(), counting_fetch(&calls, 1)).await.expect("first read");
        clock.advance_minutes(4);
        let second = cache.fetch(reminders_key(), counting_fetch(&calls, 2)).await.expect("second read");

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(*first, vec![1]);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn entry_older_than_stale_time_is_refetched() {
        let clock = ManualClock::new();
        let cache = cache_with(&clock);
        let calls = Arc::new(AtomicUsize::new(0));

        cache.fetch(reminders_key(), counting_fetch(&calls, 1)).await.expect("first read");
        clock.advance_minutes(6);
        let refreshed = cache.fetch(reminders_key(), counting_fetch(&calls, 2)).await.expect("second read");

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(*refreshed, vec![2]);
    }

    #[tokio::test]
    async fn concurrent_reads_share_one_remote_call() {
        let clock = ManualClock::new();
        let cache = cache_with(&clock);
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Notify::new());

        let (first, second, _) = tokio::join!(
            cache.fetch(reminders_key(), gated_fetch(&calls, &gate, 7)),
            cache.fetch(reminders_key(), gated_fetch(&calls, &gate, 8)),
            async {
                tokio::task::yield_now().await;
                gate.notify_one();
            }
        );

        let first = first.expect("first read");
        let second = second.expect("second read");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(*first, vec![7]);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn failure_is_reported_and_retried_on_next_read() {
        let clock = ManualClock::new();
        let cache = cache_with(&clock);

        let failed = cache
            .fetch(reminders_key(), || async {
                Err::<Vec<u32>, _>(SyncError::RemoteRejected("boom".to_string()))
            })
            .await;
        assert_eq!(failed, Err(SyncError::RemoteRejected("boom".to_string())));
        assert_eq!(
            cache.status(&reminders_key()),
            QueryStatus::Failed(SyncError::RemoteRejected("boom".to_string()))
        );

        let calls = Arc::new(AtomicUsize::new(0));
        let recovered = cache.fetch(reminders_key(), counting_fetch(&calls, 3)).await.expect("retry");
        assert_eq!(*recovered, vec![3]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn last_good_value_survives_a_failed_refresh() {
        let clock = ManualClock::new();
        let cache = cache_with(&clock);
        let calls = Arc::new(AtomicUsize::new(0));

        cache.fetch(reminders_key(), counting_fetch(&calls, 1)).await.expect("first read");
        cache.invalidate(EntityKind::Reminders);
        let failed = cache
            .fetch(reminders_key(), || async {
                Err::<Vec<u32>, _>(SyncError::Unavailable("offline".to_string()))
            })
            .await;

        assert!(failed.is_err());
        assert_eq!(cache.peek::<Vec<u32>>(&reminders_key()).as_deref(), Some(&vec![1]));
    }

    #[tokio::test]
    async fn invalidation_forces_refetch_only_for_matching_entity() {
        let clock = ManualClock::new();
        let cache = cache_with(&clock);
        let calls = Arc::new(AtomicUsize::new(0));
        let today = QueryKey::new(EntityKind::ExerciseLogs, "0:10");
        let week = QueryKey::new(EntityKind::ExerciseLogs, "0:70");

        cache.fetch(today.clone(), counting_fetch(&calls, 1)).await.expect("today");
        cache.fetch(week.clone(), counting_fetch(&calls, 2)).await.expect("week");
        cache.fetch(reminders_key(), counting_fetch(&calls, 3)).await.expect("reminders");
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        assert_eq!(cache.invalidate(EntityKind::ExerciseLogs), 2);
        cache.fetch(today, counting_fetch(&calls, 4)).await.expect("today again");
        cache.fetch(week, counting_fetch(&calls, 5)).await.expect("week again");
        cache.fetch(reminders_key(), counting_fetch(&calls, 6)).await.expect("reminders again");

        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn read_after_invalidation_does_not_join_the_older_fetch() {
        let clock = ManualClock::new();
        let cache = cache_with(&clock);
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Notify::new());

        let (before_write, after_write) = tokio::join!(
            cache.fetch(reminders_key(), gated_fetch(&calls, &gate, 1)),
            async {
                while calls.load(Ordering::SeqCst) == 0 {
                    tokio::task::yield_now().await;
                }
                assert_eq!(cache.invalidate(EntityKind::Reminders), 1);
                assert_eq!(cache.status(&reminders_key()), QueryStatus::Idle);
                let after_write = cache.fetch(reminders_key(), counting_fetch(&calls, 2)).await;
                gate.notify_one();
                after_write
            }
        );

        assert_eq!(*before_write.expect("earlier waiter"), vec![1]);
        assert_eq!(*after_write.expect("later read"), vec![2]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let cached = cache.fetch(reminders_key(), counting_fetch(&calls, 3)).await.expect("hit");
        assert_eq!(*cached, vec![2], "the retired fetch must not overwrite the newer result");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn flush_discards_entries_and_in_flight_results() {
        let clock = ManualClock::new();
        let cache = cache_with(&clock);
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Notify::new());

        let (value, _) = tokio::join!(
            cache.fetch(reminders_key(), gated_fetch(&calls, &gate, 1)),
            async {
                cache.flush();
                gate.notify_one();
            }
        );
        assert!(value.is_ok(), "the waiting caller still receives its result");
        assert_eq!(cache.status(&reminders_key()), QueryStatus::Idle);
        assert!(cache.is_empty());

        cache.fetch(reminders_key(), counting_fetch(&calls, 2)).await.expect("after flush");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn dropped_consumer_does_not_cancel_the_fetch() {
        let clock = ManualClock::new();
        let cache = cache_with(&clock);
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Notify::new());
        let mut events = cache.subscribe();

        let consumer = {
            let cache = cache.clone();
            let fetcher = gated_fetch(&calls, &gate, 9);
            tokio::spawn(async move { cache.fetch(reminders_key(), fetcher).await })
        };
        while calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        consumer.abort();
        gate.notify_one();

        let event = events.recv().await.expect("cache event");
        assert_eq!(event, CacheEvent::Updated(reminders_key()));
        let cached = cache.fetch(reminders_key(), counting_fetch(&calls, 10)).await.expect("hit");
        assert_eq!(*cached, vec![9]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn hung_fetch_times_out_into_failed_state() {
        let clock = ManualClock::new();
        let cache = QueryCache::with_clock(
            CachePolicy {
                stale_time: DEFAULT_STALE_TIME,
                fetch_timeout: Some(Duration::from_millis(20)),
                gc_time: DEFAULT_GC_TIME,
            },
            clock.provider(),
        );

        let result = cache
            .fetch(reminders_key(), || async {
                std::future::pending::<()>().await;
                Ok(Vec::<u32>::new())
            })
            .await;

        assert_eq!(result, Err(SyncError::Timeout(Duration::from_millis(20))));
        assert!(matches!(cache.status(&reminders_key()), QueryStatus::Failed(SyncError::Timeout(_))));
    }

    #[tokio::test]
    async fn idle_keys_are_collected_after_gc_time() {
        let clock = ManualClock::new();
        let cache = cache_with(&clock);
        let calls = Arc::new(AtomicUsize::new(0));

        for minute in 0..120 {
            let key = QueryKey::new(EntityKind::ExerciseLogs, format!("0:{minute}"));
            cache.fetch(key, counting_fetch(&calls, minute)).await.expect("window read");
            clock.advance_minutes(1);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 120);
        assert_eq!(cache.len(), 11);
        assert!(cache.peek::<Vec<u32>>(&QueryKey::new(EntityKind::ExerciseLogs, "0:0")).is_none());
        assert!(cache.peek::<Vec<u32>>(&QueryKey::new(EntityKind::ExerciseLogs, "0:119")).is_some());
    }

    #[tokio::test]
    async fn keys_in_use_survive_collection() {
        let clock = ManualClock::new();
        let cache = cache_with(&clock);
        let calls = Arc::new(AtomicUsize::new(0));

        for minute in 0..30 {
            cache.fetch(reminders_key(), counting_fetch(&calls, 1)).await.expect("reminders");
            let key = QueryKey::new(EntityKind::WellnessLogs, format!("{minute}"));
            cache.fetch(key, counting_fetch(&calls, 2)).await.expect("window read");
            clock.advance_minutes(1);
        }

        assert!(cache.peek::<Vec<u32>>(&reminders_key()).is_some());
    }

    #[test]
    fn query_keys_render_operation_and_parameters() {
        assert_eq!(reminders_key().to_string(), "reminders");
        assert_eq!(
            QueryKey::new(EntityKind::ExerciseLogs, "1:2").to_string(),
            "exerciseLogs:1:2"
        );
    }
}
