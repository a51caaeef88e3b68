//! The dependency container handed to every feature reducer.

use crate::providers::{
    ActivityRepository, Analytics, ApiClient, Logger, SecureStorage, TaskRepository,
    TracingAnalytics, TracingLogger, UserRepository,
};
use boardflow_core::environment::Clock;
use std::sync::Arc;

/// Every capability the features use.
///
/// Built once at startup and passed to each store as its environment.
/// Cloning is cheap; effects clone the handles they need.
#[derive(Clone)]
pub struct Dependencies {
    /// Network access
    pub api: Arc<dyn ApiClient>,
    /// Token storage
    pub secure_storage: Arc<dyn SecureStorage>,
    /// Local accounts
    pub users: Arc<dyn UserRepository>,
    /// Dashboard tasks
    pub tasks: Arc<dyn TaskRepository>,
    /// Dashboard activity feed
    pub activity: Arc<dyn ActivityRepository>,
    /// Application log
    pub logger: Arc<dyn Logger>,
    /// Product analytics
    pub analytics: Arc<dyn Analytics>,
    /// Time source
    pub clock: Arc<dyn Clock>,
}

impl Dependencies {
    /// Assemble dependencies from explicit handles.
    ///
    /// Logging and analytics go to `tracing` until replaced with
    /// [`with_logger`](Self::with_logger) / [`with_analytics`](Self::with_analytics).
    #[must_use]
    pub fn new(
        api: Arc<dyn ApiClient>,
        secure_storage: Arc<dyn SecureStorage>,
        users: Arc<dyn UserRepository>,
        tasks: Arc<dyn TaskRepository>,
        activity: Arc<dyn ActivityRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            api,
            secure_storage,
            users,
            tasks,
            activity,
            logger: Arc::new(TracingLogger),
            analytics: Arc::new(TracingAnalytics),
            clock,
        }
    }

    /// Replace the logger.
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// Replace the analytics sink.
    #[must_use]
    pub fn with_analytics(mut self, analytics: Arc<dyn Analytics>) -> Self {
        self.analytics = analytics;
        self
    }
}

impl std::fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dependencies")
            .field("now", &self.clock.now())
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "test-utils")]
pub use mock::MockDependencies;

#[cfg(feature = "test-utils")]
mod mock {
    use super::Dependencies;
    use crate::mocks::{
        InMemoryActivityRepository, InMemorySecureStorage, InMemoryTaskRepository,
        MockApiClient, MockUserRepository, RecordingAnalytics, RecordingLogger,
    };
    use boardflow_core::environment::Clock;
    use boardflow_testing::test_clock;
    use std::sync::Arc;

    /// [`Dependencies`] built from in-memory doubles, keeping the concrete
    /// handles around for inspection.
    #[derive(Clone)]
    pub struct MockDependencies {
        /// Canned API
        pub api: MockApiClient,
        /// Token storage
        pub secure_storage: InMemorySecureStorage,
        /// Accounts
        pub users: MockUserRepository,
        /// Task cache
        pub tasks: InMemoryTaskRepository,
        /// Activity cache
        pub activity: InMemoryActivityRepository,
        /// Log lines
        pub logger: RecordingLogger,
        /// Analytics events
        pub analytics: RecordingAnalytics,
        /// Fixed at 2025-01-01 00:00:00 UTC unless built with [`MockDependencies::with_clock`]
        pub clock: Arc<dyn Clock>,
    }

    impl MockDependencies {
        /// Doubles sharing [`test_clock`].
        #[must_use]
        pub fn new() -> Self {
            Self::with_clock(Arc::new(test_clock()))
        }

        /// Doubles sharing `clock`.
        #[must_use]
        pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
            let api = MockApiClient::new(Arc::clone(&clock));
            Self {
                secure_storage: InMemorySecureStorage::new(),
                users: MockUserRepository::new(Arc::clone(&clock)),
                tasks: InMemoryTaskRepository::new(Arc::new(api.clone())),
                activity: InMemoryActivityRepository::new(Arc::new(api.clone())),
                logger: RecordingLogger::new(),
                analytics: RecordingAnalytics::new(),
                api,
                clock,
            }
        }

        /// The container handed to reducers. Shares state with `self`.
        #[must_use]
        pub fn dependencies(&self) -> Dependencies {
            Dependencies::new(
                Arc::new(self.api.clone()),
                Arc::new(self.secure_storage.clone()),
                Arc::new(self.users.clone()),
                Arc::new(self.tasks.clone()),
                Arc::new(self.activity.clone()),
                Arc::clone(&self.clock),
            )
            .with_logger(Arc::new(self.logger.clone()))
            .with_analytics(Arc::new(self.analytics.clone()))
        }
    }

    impl std::fmt::Debug for MockDependencies {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("MockDependencies")
                .field("api", &self.api)
                .field("users", &self.users)
                .finish_non_exhaustive()
        }
    }

    impl Default for MockDependencies {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Dependencies {
        /// Dependencies built entirely from in-memory doubles.
        ///
        /// Use [`MockDependencies`] to keep access to the doubles.
        #[must_use]
        pub fn mock() -> Self {
            MockDependencies::new().dependencies()
        }
    }
}

#[cfg(all(test, feature = "test-utils"))]
mod tests {
    use super::*;
    use crate::models::User;

    #[tokio::test]
    async fn mock_dependencies_share_state() {
        let mocks = MockDependencies::new();
        let deps = mocks.dependencies();

        let created = deps.users.create_user("Ada", "ada@example.com", "secret1").await;
        assert!(created.is_ok());
        assert_eq!(mocks.users.user_count(), 1);
        assert_eq!(deps.clock.now(), mocks.clock.now());
    }

    #[tokio::test]
    async fn independent_mocks_do_not_share() {
        let first = Dependencies::mock();
        let second = Dependencies::mock();

        let _ = first.users.create_user("Ada", "ada@example.com", "secret1").await;
        let found: Option<User> = second.users.find_user("ada@example.com").await.ok().flatten();
        assert!(found.is_none());
    }
}
