//! Cached task and activity repositories.
//!
//! `refresh` pulls from an [`ApiClient`] and upserts by id into an in-memory
//! cache; `fetch_cached` only reads the cache.

use crate::error::ApiError;
use crate::models::{Activity, TaskItem};
use crate::providers::{ActivityRepository, ApiClient, ApiClientExt, Endpoint, TaskRepository};
use futures::future::BoxFuture;
use std::cmp::Reverse;
use std::sync::{Arc, Mutex, PoisonError};

fn upsert<T, K>(cache: &mut Vec<T>, items: Vec<T>, id: impl Fn(&T) -> &K)
where
    K: PartialEq + ?Sized,
{
    for item in items {
        match cache.iter_mut().find(|cached| id(cached) == id(&item)) {
            Some(cached) => *cached = item,
            None => cache.push(item),
        }
    }
}

/// [`TaskRepository`] caching tasks from the API in memory.
#[derive(Clone)]
pub struct InMemoryTaskRepository {
    api: Arc<dyn ApiClient>,
    cache: Arc<Mutex<Vec<TaskItem>>>,
}

impl InMemoryTaskRepository {
    /// Empty cache in front of `api`.
    #[must_use]
    pub fn new(api: Arc<dyn ApiClient>) -> Self {
        Self {
            api,
            cache: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Seed the cache.
    #[must_use]
    pub fn with_cached(self, tasks: Vec<TaskItem>) -> Self {
        *self.cache.lock().unwrap_or_else(PoisonError::into_inner) = tasks;
        self
    }

    fn newest(&self, limit: usize) -> Vec<TaskItem> {
        let mut tasks = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        tasks.sort_by_key(|task| Reverse(task.updated_at));
        tasks.truncate(limit);
        tasks
    }
}

impl TaskRepository for InMemoryTaskRepository {
    fn fetch_cached(&self, limit: usize) -> BoxFuture<'_, Result<Vec<TaskItem>, ApiError>> {
        Box::pin(async move { Ok(self.newest(limit)) })
    }

    fn refresh(&self, limit: usize) -> BoxFuture<'_, Result<Vec<TaskItem>, ApiError>> {
        Box::pin(async move {
            let mut fetched: Vec<TaskItem> = self.api.fetch(Endpoint::Tasks).await?;
            fetched.truncate(limit);
            {
                let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
                upsert(&mut cache, fetched, |task| task.id.as_str());
            }
            Ok(self.newest(limit))
        })
    }
}

/// [`ActivityRepository`] caching the activity feed in memory.
#[derive(Clone)]
pub struct InMemoryActivityRepository {
    api: Arc<dyn ApiClient>,
    cache: Arc<Mutex<Vec<Activity>>>,
}

impl InMemoryActivityRepository {
    /// Empty cache in front of `api`.
    #[must_use]
    pub fn new(api: Arc<dyn ApiClient>) -> Self {
        Self {
            api,
            cache: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Seed the cache.
    #[must_use]
    pub fn with_cached(self, activity: Vec<Activity>) -> Self {
        *self.cache.lock().unwrap_or_else(PoisonError::into_inner) = activity;
        self
    }

    fn newest(&self, limit: usize) -> Vec<Activity> {
        let mut activity = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        activity.sort_by_key(|entry| Reverse(entry.created_at));
        activity.truncate(limit);
        activity
    }
}

impl ActivityRepository for InMemoryActivityRepository {
    fn fetch_cached(&self, limit: usize) -> BoxFuture<'_, Result<Vec<Activity>, ApiError>> {
        Box::pin(async move { Ok(self.newest(limit)) })
    }

    fn refresh(&self, limit: usize) -> BoxFuture<'_, Result<Vec<Activity>, ApiError>> {
        Box::pin(async move {
            let mut fetched: Vec<Activity> = self.api.fetch(Endpoint::Activity { limit }).await?;
            fetched.truncate(limit);
            {
                let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
                upsert(&mut cache, fetched, |entry| entry.id.as_str());
            }
            Ok(self.newest(limit))
        })
    }
}

impl std::fmt::Debug for InMemoryTaskRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryTaskRepository").finish_non_exhaustive()
    }
}

impl std::fmt::Debug for InMemoryActivityRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryActivityRepository").finish_non_exhaustive()
    }
}
