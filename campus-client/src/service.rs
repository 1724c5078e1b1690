//! Cached record service.
//!
//! Reads go through a [`FreshnessCache`]; writes go straight to the backend
//! and invalidate the affected key once they succeed, so the next read sees
//! the authoritative collection instead of a snapshot from before the write.

use async_trait::async_trait;
use campus_cache::{
    CachePeek, CacheRead, CollectionChanged, CollectionFetcher, FreshnessCache, SubscriptionId,
};
use campus_core::{CampusResult, CollectionKey, FetchError};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::records::Resource;

/// Write operations against a remote collection.
#[async_trait]
pub trait RecordMutator<R: Resource>: Send + Sync {
    async fn create_record(&self, key: &CollectionKey, record: &R) -> Result<R, FetchError>;

    async fn update_record(&self, key: &CollectionKey, record: &R) -> Result<R, FetchError>;

    async fn delete_record(&self, key: &CollectionKey, id: Uuid) -> Result<(), FetchError>;

    async fn set_status(&self, key: &CollectionKey, id: Uuid, active: bool) -> Result<R, FetchError>;
}

#[async_trait]
impl<R, M> RecordMutator<R> for Arc<M>
where
    R: Resource,
    M: RecordMutator<R> + ?Sized,
{
    async fn create_record(&self, key: &CollectionKey, record: &R) -> Result<R, FetchError> {
        (**self).create_record(key, record).await
    }

    async fn update_record(&self, key: &CollectionKey, record: &R) -> Result<R, FetchError> {
        (**self).update_record(key, record).await
    }

    async fn delete_record(&self, key: &CollectionKey, id: Uuid) -> Result<(), FetchError> {
        (**self).delete_record(key, id).await
    }

    async fn set_status(&self, key: &CollectionKey, id: Uuid, active: bool) -> Result<R, FetchError> {
        (**self).set_status(key, id, active).await
    }
}

/// Cached reads and invalidating writes for one resource type.
pub struct RecordService<R, F, M>
where
    R: Resource,
    F: CollectionFetcher<R> + 'static,
    M: RecordMutator<R>,
{
    cache: FreshnessCache<R, F>,
    mutator: M,
}

impl<R, F, M> RecordService<R, F, M>
where
    R: Resource,
    F: CollectionFetcher<R> + 'static,
    M: RecordMutator<R>,
{
    pub fn new(cache: FreshnessCache<R, F>, mutator: M) -> Self {
        Self { cache, mutator }
    }

    pub fn cache(&self) -> &FreshnessCache<R, F> {
        &self.cache
    }

    /// List the collection, from cache while it is fresh.
    pub async fn list(&self, key: &CollectionKey) -> CampusResult<CacheRead<R>> {
        self.cache.get(key, false).await
    }

    /// List the collection, bypassing the freshness window.
    pub async fn list_fresh(&self, key: &CollectionKey) -> CampusResult<CacheRead<R>> {
        self.cache.get(key, true).await
    }

    pub fn peek(&self, key: &CollectionKey) -> CachePeek {
        self.cache.peek(key)
    }

    pub fn subscribe<L>(&self, listener: L) -> SubscriptionId
    where
        L: Fn(&CollectionChanged<R>) + Send + Sync + 'static,
    {
        self.cache.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.cache.unsubscribe(id)
    }

    pub fn changes(&self) -> broadcast::Receiver<CollectionChanged<R>> {
        self.cache.changes()
    }

    pub async fn create(&self, key: &CollectionKey, record: &R) -> CampusResult<R> {
        self.mutate(key, "create", self.mutator.create_record(key, record)).await
    }

    pub async fn update(&self, key: &CollectionKey, record: &R) -> CampusResult<R> {
        self.mutate(key, "update", self.mutator.update_record(key, record)).await
    }

    pub async fn delete(&self, key: &CollectionKey, id: Uuid) -> CampusResult<()> {
        self.mutate(key, "delete", self.mutator.delete_record(key, id)).await
    }

    pub async fn set_status(&self, key: &CollectionKey, id: Uuid, active: bool) -> CampusResult<R> {
        self.mutate(key, "set_status", self.mutator.set_status(key, id, active))
            .await
    }

    /// Run a write and invalidate `key` only if it succeeded.
    async fn mutate<T, Fut>(&self, key: &CollectionKey, op: &'static str, write: Fut) -> CampusResult<T>
    where
        Fut: std::future::Future<Output = Result<T, FetchError>>,
    {
        match write.await {
            Ok(value) => {
                self.cache.invalidate(key);
                debug!(institution = %key, collection = R::COLLECTION, op, "Write succeeded, cache invalidated");
                Ok(value)
            }
            Err(err) => {
                warn!(institution = %key, collection = R::COLLECTION, op, error = %err, "Write failed");
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{UserRecord, UserRole};
    use campus_cache::CacheConfig;
    use campus_test_utils::{fixtures, ScriptedFetcher};
    use std::sync::Mutex;
    use std::time::Duration;

    // Records every write; fails them all when `fail` is set.
    #[derive(Default)]
    struct RecordingMutator {
        writes: Mutex<Vec<&'static str>>,
        fail: Mutex<bool>,
    }

    impl RecordingMutator {
        fn record(&self, op: &'static str) -> Result<(), FetchError> {
            self.writes.lock().unwrap().push(op);
            if *self.fail.lock().unwrap() {
                return Err(FetchError::Server {
                    status: 503,
                    message: "maintenance".to_string(),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl RecordMutator<UserRecord> for RecordingMutator {
        async fn create_record(&self, _key: &CollectionKey, record: &UserRecord) -> Result<UserRecord, FetchError> {
            self.record("create")?;
            Ok(record.clone())
        }

        async fn update_record(&self, _key: &CollectionKey, record: &UserRecord) -> Result<UserRecord, FetchError> {
            self.record("update")?;
            Ok(record.clone())
        }

        async fn delete_record(&self, _key: &CollectionKey, _id: Uuid) -> Result<(), FetchError> {
            self.record("delete")
        }

        async fn set_status(&self, _key: &CollectionKey, id: Uuid, active: bool) -> Result<UserRecord, FetchError> {
            self.record("set_status")?;
            Ok(UserRecord {
                id,
                name: "Ada".to_string(),
                email: "ada@example.edu".to_string(),
                role: UserRole::Admin,
                active,
                course_ids: Vec::new(),
            })
        }
    }

    fn user() -> UserRecord {
        UserRecord {
            id: Uuid::now_v7(),
            name: "Grace".to_string(),
            email: "grace@example.edu".to_string(),
            role: UserRole::Instructor,
            active: true,
            course_ids: Vec::new(),
        }
    }

    type TestService =
        RecordService<UserRecord, Arc<ScriptedFetcher<UserRecord>>, Arc<RecordingMutator>>;

    fn service() -> (TestService, Arc<ScriptedFetcher<UserRecord>>, Arc<RecordingMutator>) {
        let fetcher = ScriptedFetcher::shared(vec![user()]);
        let mutator = Arc::new(RecordingMutator::default());
        let config = CacheConfig::new()
            .with_ttl(Duration::from_secs(60))
            .with_refresh_interval(Duration::from_secs(3600));
        let cache = FreshnessCache::new(Arc::clone(&fetcher), config).unwrap();
        (RecordService::new(cache, Arc::clone(&mutator)), fetcher, mutator)
    }

    #[tokio::test]
    async fn test_every_successful_write_invalidates() {
        let (service, fetcher, mutator) = service();
        let key = fixtures::key("inst-1");
        let record = user();

        service.list(&key).await.unwrap();
        service.create(&key, &record).await.unwrap();
        assert!(!service.peek(&key).present);

        service.list(&key).await.unwrap();
        service.update(&key, &record).await.unwrap();
        assert!(!service.peek(&key).present);

        service.list(&key).await.unwrap();
        let toggled = service.set_status(&key, record.id, false).await.unwrap();
        assert!(!toggled.active);
        assert!(!service.peek(&key).present);

        service.list(&key).await.unwrap();
        service.delete(&key, record.id).await.unwrap();
        assert!(!service.peek(&key).present);

        assert_eq!(fetcher.calls(), 4);
        assert_eq!(
            *mutator.writes.lock().unwrap(),
            vec!["create", "update", "set_status", "delete"]
        );
    }

    #[tokio::test]
    async fn test_failed_write_leaves_cache_alone() {
        let (service, fetcher, mutator) = service();
        let key = fixtures::key("inst-1");

        service.list(&key).await.unwrap();
        *mutator.fail.lock().unwrap() = true;

        let err = service.create(&key, &user()).await.unwrap_err();
        assert!(matches!(err.as_fetch(), Some(FetchError::Server { status: 503, .. })));
        assert!(service.peek(&key).present);

        let read = service.list(&key).await.unwrap();
        assert!(read.served_from_cache());
        assert_eq!(fetcher.calls(), 1);
    }
}
