//! Mock user repository.

use crate::error::UserRepositoryError;
use crate::models::User;
use crate::password::{hash_password, verify_password};
use crate::providers::UserRepository;
use boardflow_core::environment::Clock;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct Accounts {
    by_email: HashMap<String, User>,
    current: Option<String>,
}

/// [`UserRepository`] keeping accounts in memory, keyed by email.
///
/// Clones share the same accounts.
#[derive(Clone)]
pub struct MockUserRepository {
    accounts: Arc<Mutex<Accounts>>,
    clock: Arc<dyn Clock>,
}

impl MockUserRepository {
    /// Empty repository stamping times from `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            accounts: Arc::new(Mutex::new(Accounts::default())),
            clock,
        }
    }

    /// Number of registered users.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.accounts.lock().map(|a| a.by_email.len()).unwrap_or(0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Accounts>, UserRepositoryError> {
        self.accounts
            .lock()
            .map_err(|_| UserRepositoryError::DatabaseError)
    }
}

impl UserRepository for MockUserRepository {
    fn create_user<'a>(
        &'a self,
        name: &'a str,
        email: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, Result<User, UserRepositoryError>> {
        Box::pin(async move {
            let mut accounts = self.lock()?;
            if accounts.by_email.contains_key(email) {
                return Err(UserRepositoryError::UserAlreadyExists);
            }

            let user = User {
                id: uuid::Uuid::new_v4().to_string(),
                name: name.to_string(),
                email: email.to_string(),
                password_hash: hash_password(password, email),
                last_login: None,
                is_current: false,
                created_at: self.clock.now(),
            };
            accounts.by_email.insert(email.to_string(), user.clone());
            tracing::debug!(user_id = %user.id, "User created");
            Ok(user)
        })
    }

    fn find_user<'a>(
        &'a self,
        email: &'a str,
    ) -> BoxFuture<'a, Result<Option<User>, UserRepositoryError>> {
        Box::pin(async move { Ok(self.lock()?.by_email.get(email).cloned()) })
    }

    fn authenticate_user<'a>(
        &'a self,
        email: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, Result<Option<User>, UserRepositoryError>> {
        Box::pin(async move {
            let accounts = self.lock()?;
            Ok(accounts
                .by_email
                .get(email)
                .filter(|user| verify_password(password, email, &user.password_hash))
                .cloned())
        })
    }

    fn set_current_user<'a>(
        &'a self,
        user: &'a User,
    ) -> BoxFuture<'a, Result<(), UserRepositoryError>> {
        Box::pin(async move {
            let now = self.clock.now();
            let mut accounts = self.lock()?;
            if !accounts.by_email.contains_key(&user.email) {
                return Err(UserRepositoryError::UserNotFound);
            }
            for account in accounts.by_email.values_mut() {
                account.is_current = account.id == user.id;
                if account.is_current {
                    account.last_login = Some(now);
                }
            }
            accounts.current = Some(user.email.clone());
            Ok(())
        })
    }

    fn get_current_user(&self) -> BoxFuture<'_, Result<Option<User>, UserRepositoryError>> {
        Box::pin(async move {
            let accounts = self.lock()?;
            Ok(accounts
                .current
                .as_ref()
                .and_then(|email| accounts.by_email.get(email))
                .cloned())
        })
    }

    fn sign_out(&self) -> BoxFuture<'_, Result<(), UserRepositoryError>> {
        Box::pin(async move {
            let mut accounts = self.lock()?;
            accounts.current = None;
            for account in accounts.by_email.values_mut() {
                account.is_current = false;
            }
            Ok(())
        })
    }
}

impl std::fmt::Debug for MockUserRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockUserRepository")
            .field("users", &self.user_count())
            .finish_non_exhaustive()
    }
}
