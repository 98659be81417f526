// 用户服务
// 分页读取走缓存，写操作之后清空所有分页缓存

use sqlx::Error as SqlxError;
use std::sync::Arc;

use crate::cache::CacheStore;
use crate::cache::keys::{USERS_PAGE_PATTERN, USERS_PAGE_TTL_SECS, users_page_key};
use crate::database::{FindManyParams, NewUser, UserChanges, UserEntity, UserOrder, UserStore};

/// 用户服务
///
/// 数据库错误原样返回给调用方；缓存错误只记录日志，不影响请求结果。
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    cache: Arc<dyn CacheStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, cache: Arc<dyn CacheStore>) -> Self {
        Self { store, cache }
    }

    /// 分页获取用户，按创建时间倒序
    pub async fn get_users(&self, offset: i64, limit: i64) -> Result<Vec<UserEntity>, SqlxError> {
        let key = users_page_key(offset, limit);

        // 缓存不可用时直接读库，也不再尝试回写
        let cache_reachable = match self.cache.get(&key).await {
            Ok(Some(json)) => match serde_json::from_str::<Vec<UserEntity>>(&json) {
                Ok(users) => {
                    tracing::debug!("Cache hit {}", key);
                    return Ok(users);
                }
                Err(e) => {
                    tracing::warn!("Discarding undecodable cache entry {}: {}", key, e);
                    true
                }
            },
            Ok(None) => {
                tracing::debug!("Cache miss {}", key);
                true
            }
            Err(e) => {
                tracing::warn!("Cache read failed for {}, reading from database: {}", key, e);
                false
            }
        };

        let users = self
            .store
            .find_many(FindManyParams {
                skip: offset,
                take: limit,
                order: UserOrder::CreatedAtDesc,
            })
            .await?;

        if cache_reachable {
            self.populate(&key, &users).await;
        }

        Ok(users)
    }

    /// 用户总数
    pub async fn count_users(&self) -> Result<i64, SqlxError> {
        self.store.count().await
    }

    /// 根据ID获取用户，不经过缓存
    pub async fn get_user_by_id(&self, id: i64) -> Result<Option<UserEntity>, SqlxError> {
        self.store.find_unique(id).await
    }

    /// 创建用户
    pub async fn create_user(&self, data: NewUser) -> Result<UserEntity, SqlxError> {
        let user = self.store.create(data).await?;
        self.invalidate_pages().await;
        Ok(user)
    }

    /// 更新用户，用户不存在时返回 None
    pub async fn update_user(
        &self,
        id: i64,
        changes: UserChanges,
    ) -> Result<Option<UserEntity>, SqlxError> {
        if self.store.find_unique(id).await?.is_none() {
            return Ok(None);
        }

        let Some(updated) = self.store.update(id, changes).await? else {
            // 查询和更新之间被删除，没有发生任何修改
            tracing::warn!("User {} disappeared before update", id);
            return Ok(None);
        };

        self.invalidate_pages().await;
        Ok(Some(updated))
    }

    /// 删除用户，返回删除前的数据；用户不存在时返回 None
    pub async fn delete_user(&self, id: i64) -> Result<Option<UserEntity>, SqlxError> {
        let Some(existing) = self.store.find_unique(id).await? else {
            return Ok(None);
        };

        if self.store.delete(id).await?.is_none() {
            tracing::warn!("User {} was already deleted by a concurrent request", id);
        }

        self.invalidate_pages().await;
        Ok(Some(existing))
    }

    async fn populate(&self, key: &str, users: &[UserEntity]) {
        let json = match serde_json::to_string(users) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Failed to serialize users for {}: {}", key, e);
                return;
            }
        };

        if let Err(e) = self.cache.set_ex(key, USERS_PAGE_TTL_SECS, json).await {
            tracing::warn!("Failed to cache {}: {}", key, e);
        }
    }

    /// 清空所有分页缓存
    ///
    /// 任何写入都可能让所有分页窗口的内容移位，所以不做局部失效。
    async fn invalidate_pages(&self) {
        let keys = match self.cache.keys(USERS_PAGE_PATTERN).await {
            Ok(keys) => keys,
            Err(e) => {
                tracing::warn!("Failed to list cached pages: {}", e);
                return;
            }
        };

        if keys.is_empty() {
            return;
        }

        match self.cache.del(&keys).await {
            Ok(removed) => tracing::info!("Invalidated {} cached user pages", removed),
            Err(e) => tracing::warn!("Failed to invalidate cached pages: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use redis::RedisError;
    use std::sync::Mutex;

    fn sample_user(id: i64, username: &str) -> UserEntity {
        UserEntity {
            id,
            name: format!("{username} name"),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            phone: None,
            website: None,
            created_at: DateTime::from_timestamp(1_700_000_000 + id, 0).unwrap(),
        }
    }

    fn redis_down() -> RedisError {
        RedisError::from((redis::ErrorKind::IoError, "connection refused"))
    }

    #[derive(Debug, Clone, PartialEq)]
    enum StoreCall {
        FindMany(FindManyParams),
        FindUnique(i64),
        Create(NewUser),
        Update(i64, UserChanges),
        Delete(i64),
        Count,
    }

    /// 记录调用的数据库替身，每个方法的返回值预先设置
    #[derive(Default)]
    struct RecordingStore {
        calls: Mutex<Vec<StoreCall>>,
        many: Mutex<Vec<UserEntity>>,
        unique: Mutex<Option<UserEntity>>,
        updated: Mutex<Option<UserEntity>>,
        deleted: Mutex<Option<UserEntity>>,
        fail: bool,
    }

    impl RecordingStore {
        fn calls(&self) -> Vec<StoreCall> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: StoreCall) -> Result<(), SqlxError> {
            self.calls.lock().unwrap().push(call);
            if self.fail {
                Err(SqlxError::PoolTimedOut)
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl UserStore for RecordingStore {
        async fn find_many(&self, params: FindManyParams) -> Result<Vec<UserEntity>, SqlxError> {
            self.record(StoreCall::FindMany(params))?;
            Ok(self.many.lock().unwrap().clone())
        }

        async fn find_unique(&self, id: i64) -> Result<Option<UserEntity>, SqlxError> {
            self.record(StoreCall::FindUnique(id))?;
            Ok(self.unique.lock().unwrap().clone())
        }

        async fn create(&self, data: NewUser) -> Result<UserEntity, SqlxError> {
            self.record(StoreCall::Create(data.clone()))?;
            Ok(UserEntity {
                id: 42,
                name: data.name,
                username: data.username,
                email: data.email,
                phone: data.phone,
                website: data.website,
                created_at: Utc::now(),
            })
        }

        async fn update(
            &self,
            id: i64,
            changes: UserChanges,
        ) -> Result<Option<UserEntity>, SqlxError> {
            self.record(StoreCall::Update(id, changes))?;
            Ok(self.updated.lock().unwrap().clone())
        }

        async fn delete(&self, id: i64) -> Result<Option<UserEntity>, SqlxError> {
            self.record(StoreCall::Delete(id))?;
            Ok(self.deleted.lock().unwrap().clone())
        }

        async fn count(&self) -> Result<i64, SqlxError> {
            self.record(StoreCall::Count)?;
            Ok(self.many.lock().unwrap().len() as i64)
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum CacheCall {
        Get(String),
        SetEx(String, u64, String),
        Keys(String),
        Del(Vec<String>),
    }

    #[derive(Default)]
    struct RecordingCache {
        calls: Mutex<Vec<CacheCall>>,
        value: Mutex<Option<String>>,
        keys: Mutex<Vec<String>>,
        unreachable: bool,
    }

    impl RecordingCache {
        fn calls(&self) -> Vec<CacheCall> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: CacheCall) -> Result<(), RedisError> {
            self.calls.lock().unwrap().push(call);
            if self.unreachable {
                Err(redis_down())
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl CacheStore for RecordingCache {
        async fn get(&self, key: &str) -> Result<Option<String>, RedisError> {
            self.record(CacheCall::Get(key.to_string()))?;
            Ok(self.value.lock().unwrap().clone())
        }

        async fn set_ex(&self, key: &str, ttl_secs: u64, value: String) -> Result<(), RedisError> {
            self.record(CacheCall::SetEx(key.to_string(), ttl_secs, value))
        }

        async fn keys(&self, pattern: &str) -> Result<Vec<String>, RedisError> {
            self.record(CacheCall::Keys(pattern.to_string()))?;
            Ok(self.keys.lock().unwrap().clone())
        }

        async fn del(&self, keys: &[String]) -> Result<usize, RedisError> {
            self.record(CacheCall::Del(keys.to_vec()))?;
            Ok(keys.len())
        }
    }

    fn service(store: &Arc<RecordingStore>, cache: &Arc<RecordingCache>) -> UserService {
        UserService::new(store.clone(), cache.clone())
    }

    fn sweep_calls(cache: &RecordingCache) -> Vec<CacheCall> {
        cache
            .calls()
            .into_iter()
            .filter(|c| matches!(c, CacheCall::Keys(_) | CacheCall::Del(_)))
            .collect()
    }

    #[tokio::test]
    async fn cache_hit_never_touches_database() {
        let cached = vec![sample_user(1, "cached")];
        let store = Arc::new(RecordingStore::default());
        let cache = Arc::new(RecordingCache {
            value: Mutex::new(Some(serde_json::to_string(&cached).unwrap())),
            ..Default::default()
        });

        let users = service(&store, &cache).get_users(0, 10).await.unwrap();

        assert_eq!(users, cached);
        assert_eq!(
            cache.calls(),
            vec![CacheCall::Get("users:offset:0:limit:10".into())]
        );
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn cache_miss_reads_database_and_populates_with_ttl() {
        let db_users = vec![sample_user(2, "dbuser")];
        let store = Arc::new(RecordingStore {
            many: Mutex::new(db_users.clone()),
            ..Default::default()
        });
        let cache = Arc::new(RecordingCache::default());

        let users = service(&store, &cache).get_users(0, 10).await.unwrap();

        assert_eq!(users, db_users);
        assert_eq!(
            store.calls(),
            vec![StoreCall::FindMany(FindManyParams {
                skip: 0,
                take: 10,
                order: UserOrder::CreatedAtDesc,
            })]
        );
        assert_eq!(
            cache.calls(),
            vec![
                CacheCall::Get("users:offset:0:limit:10".into()),
                CacheCall::SetEx(
                    "users:offset:0:limit:10".into(),
                    300,
                    serde_json::to_string(&db_users).unwrap()
                ),
            ]
        );
    }

    #[tokio::test]
    async fn empty_page_is_cached_too() {
        let store = Arc::new(RecordingStore::default());
        let cache = Arc::new(RecordingCache::default());

        let users = service(&store, &cache).get_users(500, 5).await.unwrap();

        assert!(users.is_empty());
        assert!(cache.calls().contains(&CacheCall::SetEx(
            "users:offset:500:limit:5".into(),
            300,
            "[]".into()
        )));
    }

    #[tokio::test]
    async fn undecodable_entry_is_treated_as_miss() {
        let db_users = vec![sample_user(3, "fresh")];
        let store = Arc::new(RecordingStore {
            many: Mutex::new(db_users.clone()),
            ..Default::default()
        });
        let cache = Arc::new(RecordingCache {
            value: Mutex::new(Some("{not json".into())),
            ..Default::default()
        });

        let users = service(&store, &cache).get_users(10, 10).await.unwrap();

        assert_eq!(users, db_users);
        assert_eq!(store.calls().len(), 1);
        assert!(
            cache
                .calls()
                .iter()
                .any(|c| matches!(c, CacheCall::SetEx(key, 300, _) if key == "users:offset:10:limit:10"))
        );
    }

    #[tokio::test]
    async fn unreachable_cache_degrades_to_database_without_populating() {
        let db_users = vec![sample_user(4, "degraded")];
        let store = Arc::new(RecordingStore {
            many: Mutex::new(db_users.clone()),
            ..Default::default()
        });
        let cache = Arc::new(RecordingCache {
            unreachable: true,
            ..Default::default()
        });

        let users = service(&store, &cache).get_users(0, 10).await.unwrap();

        assert_eq!(users, db_users);
        assert_eq!(
            cache.calls(),
            vec![CacheCall::Get("users:offset:0:limit:10".into())]
        );
    }

    #[tokio::test]
    async fn database_failure_propagates_on_miss() {
        let store = Arc::new(RecordingStore {
            fail: true,
            ..Default::default()
        });
        let cache = Arc::new(RecordingCache::default());

        let result = service(&store, &cache).get_users(0, 10).await;

        assert!(matches!(result, Err(SqlxError::PoolTimedOut)));
        assert!(
            !cache
                .calls()
                .iter()
                .any(|c| matches!(c, CacheCall::SetEx(..)))
        );
    }

    #[tokio::test]
    async fn huge_limit_is_passed_through_untouched() {
        let store = Arc::new(RecordingStore::default());
        let cache = Arc::new(RecordingCache::default());

        service(&store, &cache)
            .get_users(0, i64::MAX)
            .await
            .unwrap();

        assert_eq!(
            store.calls(),
            vec![StoreCall::FindMany(FindManyParams {
                skip: 0,
                take: i64::MAX,
                order: UserOrder::CreatedAtDesc,
            })]
        );
    }

    #[tokio::test]
    async fn create_persists_then_sweeps_all_pages() {
        let store = Arc::new(RecordingStore::default());
        let cache = Arc::new(RecordingCache {
            keys: Mutex::new(vec![
                "users:offset:0:limit:10".to_string(),
                "users:offset:10:limit:10".to_string(),
            ]),
            ..Default::default()
        });
        let data = NewUser {
            name: "X".into(),
            username: "x".into(),
            email: "x@x.com".into(),
            phone: None,
            website: None,
        };

        let user = service(&store, &cache).create_user(data.clone()).await.unwrap();

        assert_eq!(user.id, 42);
        assert_eq!(user.username, "x");
        assert_eq!(store.calls(), vec![StoreCall::Create(data)]);
        assert_eq!(
            sweep_calls(&cache),
            vec![
                CacheCall::Keys("users:offset:*:limit:*".into()),
                CacheCall::Del(vec![
                    "users:offset:0:limit:10".into(),
                    "users:offset:10:limit:10".into(),
                ]),
            ]
        );
    }

    #[tokio::test]
    async fn sweep_with_no_matching_keys_skips_delete() {
        let store = Arc::new(RecordingStore::default());
        let cache = Arc::new(RecordingCache::default());

        service(&store, &cache)
            .create_user(NewUser {
                name: "Y".into(),
                username: "y".into(),
                email: "y@y.com".into(),
                phone: None,
                website: None,
            })
            .await
            .unwrap();

        assert_eq!(
            sweep_calls(&cache),
            vec![CacheCall::Keys("users:offset:*:limit:*".into())]
        );
    }

    #[tokio::test]
    async fn failed_create_does_not_sweep() {
        let store = Arc::new(RecordingStore {
            fail: true,
            ..Default::default()
        });
        let cache = Arc::new(RecordingCache::default());

        let result = service(&store, &cache)
            .create_user(NewUser {
                name: "Z".into(),
                username: "z".into(),
                email: "z@z.com".into(),
                phone: None,
                website: None,
            })
            .await;

        assert!(result.is_err());
        assert!(cache.calls().is_empty());
    }

    #[tokio::test]
    async fn unreachable_cache_does_not_fail_mutation() {
        let store = Arc::new(RecordingStore::default());
        let cache = Arc::new(RecordingCache {
            unreachable: true,
            ..Default::default()
        });

        let user = service(&store, &cache)
            .create_user(NewUser {
                name: "W".into(),
                username: "w".into(),
                email: "w@w.com".into(),
                phone: None,
                website: None,
            })
            .await
            .unwrap();

        assert_eq!(user.username, "w");
    }

    #[tokio::test]
    async fn update_existing_user_merges_and_sweeps() {
        let existing = sample_user(1, "marvo");
        let mut updated = existing.clone();
        updated.username = "marvin_updated".into();
        let store = Arc::new(RecordingStore {
            unique: Mutex::new(Some(existing)),
            updated: Mutex::new(Some(updated.clone())),
            ..Default::default()
        });
        let cache = Arc::new(RecordingCache {
            keys: Mutex::new(vec!["users:offset:0:limit:10".to_string()]),
            ..Default::default()
        });
        let changes = UserChanges {
            username: Some("marvin_updated".into()),
            ..Default::default()
        };

        let result = service(&store, &cache)
            .update_user(1, changes.clone())
            .await
            .unwrap();

        assert_eq!(result, Some(updated));
        assert_eq!(
            store.calls(),
            vec![StoreCall::FindUnique(1), StoreCall::Update(1, changes)]
        );
        assert_eq!(sweep_calls(&cache).len(), 2);
    }

    #[tokio::test]
    async fn update_missing_user_returns_none_without_side_effects() {
        let store = Arc::new(RecordingStore::default());
        let cache = Arc::new(RecordingCache::default());

        let result = service(&store, &cache)
            .update_user(
                999,
                UserChanges {
                    username: Some("should_not_work".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(result, None);
        assert_eq!(store.calls(), vec![StoreCall::FindUnique(999)]);
        assert!(cache.calls().is_empty());
    }

    #[tokio::test]
    async fn update_racing_with_delete_skips_sweep() {
        let store = Arc::new(RecordingStore {
            unique: Mutex::new(Some(sample_user(5, "gone"))),
            ..Default::default()
        });
        let cache = Arc::new(RecordingCache::default());

        let result = service(&store, &cache)
            .update_user(5, UserChanges::default())
            .await
            .unwrap();

        assert_eq!(result, None);
        assert!(cache.calls().is_empty());
    }

    #[tokio::test]
    async fn delete_existing_user_returns_snapshot_and_sweeps() {
        let user = sample_user(1, "marvo");
        let store = Arc::new(RecordingStore {
            unique: Mutex::new(Some(user.clone())),
            deleted: Mutex::new(Some(user.clone())),
            ..Default::default()
        });
        let cache = Arc::new(RecordingCache::default());

        let result = service(&store, &cache).delete_user(1).await.unwrap();

        assert_eq!(result, Some(user));
        assert_eq!(
            store.calls(),
            vec![StoreCall::FindUnique(1), StoreCall::Delete(1)]
        );
        assert_eq!(
            sweep_calls(&cache),
            vec![CacheCall::Keys("users:offset:*:limit:*".into())]
        );
    }

    #[tokio::test]
    async fn delete_race_is_soft_success() {
        let user = sample_user(6, "vanished");
        let store = Arc::new(RecordingStore {
            unique: Mutex::new(Some(user.clone())),
            deleted: Mutex::new(None),
            ..Default::default()
        });
        let cache = Arc::new(RecordingCache::default());

        let result = service(&store, &cache).delete_user(6).await.unwrap();

        assert_eq!(result, Some(user));
        assert_eq!(sweep_calls(&cache).len(), 1);
    }

    #[tokio::test]
    async fn delete_missing_user_returns_none() {
        let store = Arc::new(RecordingStore::default());
        let cache = Arc::new(RecordingCache::default());

        let result = service(&store, &cache).delete_user(1).await.unwrap();

        assert_eq!(result, None);
        assert_eq!(store.calls(), vec![StoreCall::FindUnique(1)]);
        assert!(cache.calls().is_empty());
    }

    #[tokio::test]
    async fn lookup_and_count_bypass_cache() {
        let store = Arc::new(RecordingStore {
            unique: Mutex::new(Some(sample_user(1, "marvo"))),
            many: Mutex::new(vec![sample_user(1, "marvo"), sample_user(2, "other")]),
            ..Default::default()
        });
        let cache = Arc::new(RecordingCache::default());
        let service = service(&store, &cache);

        let user = service.get_user_by_id(1).await.unwrap();
        let total = service.count_users().await.unwrap();

        assert_eq!(user.map(|u| u.email), Some("marvo@example.com".to_string()));
        assert_eq!(total, 2);
        assert!(cache.calls().is_empty());
    }
}
