//! Session Manager - Single authority over the authenticated session
//!
//! Every writer (login, logout, startup restore, expiry sweep) goes through
//! one state cell. Restore and the sweep only ever clear the token they
//! observed, so a logout that lands while either is in flight is kept.

use super::storage::{FileSessionStore, SessionStore};
use super::types::{ExpiryCheck, RestoreOutcome, SessionState, ROLE_KEY, TOKEN_KEY, USER_ID_KEY};
use crate::auth::{decode_claims, Landing, TokenValidator};
use crate::notice::{Notice, NoticeBoard, LOGIN_FAILED, REGISTRATION_FAILED};
use crate::{ApplicationError, ApplicationResult};
use ddrp_client::BackendClient;
use ddrp_core::{
    storage_error, validation_error, DdrpError, ErrorContext, RegisterRequest, SessionSettings,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

const DEFAULT_EXPIRY_CHECK_INTERVAL: Duration = Duration::from_secs(60);
const MIN_EXPIRY_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Holds the session and keeps it consistent with durable storage
pub struct SessionManager {
    /// Current session
    state: Arc<RwLock<SessionState>>,
    /// Durable `token` / `role` / `userId` entries
    store: Arc<dyn SessionStore>,
    /// Backend check used during restore
    validator: Arc<dyn TokenValidator>,
    notices: NoticeBoard,
    /// Flips to true once restore has finished
    ready: watch::Sender<bool>,
    expiry_check_interval: Duration,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(
        store: Arc<dyn SessionStore>,
        validator: Arc<dyn TokenValidator>,
        notices: NoticeBoard,
    ) -> Self {
        let (ready, _) = watch::channel(false);

        Self {
            state: Arc::new(RwLock::new(SessionState::default())),
            store,
            validator,
            notices,
            ready,
            expiry_check_interval: DEFAULT_EXPIRY_CHECK_INTERVAL,
        }
    }

    /// File-backed manager configured from settings
    pub fn from_settings(
        settings: &SessionSettings,
        validator: Arc<dyn TokenValidator>,
        notices: NoticeBoard,
    ) -> Self {
        let store = Arc::new(FileSessionStore::new(settings.resolved_storage_path()));
        Self::new(store, validator, notices).with_expiry_check_interval(Duration::from_secs(
            settings.expiry_check_interval_secs,
        ))
    }

    /// Intervals below one second are raised to one second
    pub fn with_expiry_check_interval(mut self, interval: Duration) -> Self {
        self.expiry_check_interval = interval.max(MIN_EXPIRY_CHECK_INTERVAL);
        self
    }

    pub fn expiry_check_interval(&self) -> Duration {
        self.expiry_check_interval
    }

    pub fn notices(&self) -> &NoticeBoard {
        &self.notices
    }

    pub async fn snapshot(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub async fn token(&self) -> Option<String> {
        self.state.read().await.token.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.is_authenticated()
    }

    /// Record a fresh session in memory and durable storage
    ///
    /// The token is taken as-is; nothing is validated here. Storage is
    /// written first: if that fails the previous session stays in place,
    /// both in memory and on disk.
    pub async fn login(
        &self,
        token: &str,
        role: &str,
        user_id: Option<&str>,
    ) -> ApplicationResult<()> {
        let mut state = self.state.write().await;
        let next = SessionState {
            token: Some(token.to_string()),
            role: Some(role.to_string()),
            user_id: user_id.map(str::to_string),
        };

        let previous = state.clone();
        let entries = next.clone();
        self.with_store(move |store| {
            write_entries(store, &entries).inspect_err(|_| {
                if let Err(e) = write_entries(store, &previous) {
                    warn!("Failed to roll back session entries: {}", e);
                }
            })
        })
        .await
        .inspect_err(|e| warn!("Failed to persist session: {}", e))?;

        *state = next;
        info!(role = %role, "Session started");
        Ok(())
    }

    /// Clear the session from memory and durable storage
    pub async fn logout(&self) {
        let mut state = self.state.write().await;
        self.clear(&mut state).await;
    }

    /// Clear only if `token` is still the current one
    async fn logout_if_current(&self, token: &str) -> bool {
        let mut state = self.state.write().await;
        if state.token.as_deref() != Some(token) {
            debug!("Session changed concurrently; keeping it");
            return false;
        }
        self.clear(&mut state).await;
        true
    }

    async fn clear(&self, state: &mut SessionState) {
        *state = SessionState::default();
        let removed = self
            .with_store(|store| {
                for key in [TOKEN_KEY, ROLE_KEY, USER_ID_KEY] {
                    if let Err(e) = store.remove(key) {
                        warn!("Failed to remove session entry '{}': {}", key, e);
                    }
                }
                Ok(())
            })
            .await;
        if let Err(e) = removed {
            warn!("Failed to clear session entries: {}", e);
        }
        info!("Session cleared");
    }

    /// Run blocking store access on the blocking pool
    async fn with_store<T, F>(&self, access: F) -> ApplicationResult<T>
    where
        F: FnOnce(&dyn SessionStore) -> ApplicationResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || access(store.as_ref()))
            .await
            .map_err(|e| storage_error!("Session storage task failed", "session_manager", e))?
    }

    /// Restore the persisted session at startup
    ///
    /// Readiness is signalled on every path.
    pub async fn restore(&self) -> RestoreOutcome {
        let outcome = self.restore_persisted().await;
        debug!(?outcome, "Session restore finished");
        self.ready.send_replace(true);
        outcome
    }

    async fn restore_persisted(&self) -> RestoreOutcome {
        let persisted = self.read_entries().await;
        let token = match &persisted.token {
            Some(token) if !token.is_empty() => token.clone(),
            _ => return RestoreOutcome::NoSession,
        };

        *self.state.write().await = persisted;

        let claims = match decode_claims(&token) {
            Ok(claims) => claims,
            Err(e) => {
                warn!("Persisted token is unreadable: {}", e);
                return self.invalidate(&token).await;
            }
        };
        if claims.is_expired() {
            if self.logout_if_current(&token).await {
                self.notices.publish(Notice::session_expired());
            }
            return RestoreOutcome::Expired;
        }

        match self.validator.validate(&token).await {
            Ok(()) => {
                if self.state.read().await.token.as_deref() == Some(token.as_str()) {
                    info!("Session restored");
                    RestoreOutcome::Restored
                } else {
                    RestoreOutcome::Superseded
                }
            }
            Err(e) => {
                warn!("Token validation failed: {}", e);
                self.invalidate(&token).await
            }
        }
    }

    async fn invalidate(&self, token: &str) -> RestoreOutcome {
        if self.logout_if_current(token).await {
            self.notices.publish(Notice::session_invalid());
            RestoreOutcome::Invalid
        } else {
            RestoreOutcome::Superseded
        }
    }

    /// Unreadable entries count as absent
    async fn read_entries(&self) -> SessionState {
        let read = self
            .with_store(|store| {
                let entry = |key: &str| match store.get(key) {
                    Ok(value) => value,
                    Err(e) => {
                        warn!("Failed to read session entry '{}': {}", key, e);
                        None
                    }
                };
                Ok(SessionState {
                    token: entry(TOKEN_KEY),
                    role: entry(ROLE_KEY),
                    user_id: entry(USER_ID_KEY),
                })
            })
            .await;

        read.unwrap_or_else(|e| {
            warn!("Failed to read session entries: {}", e);
            SessionState::default()
        })
    }

    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    /// Resolves once [`restore`](Self::restore) has finished
    pub async fn wait_until_ready(&self) {
        let mut receiver = self.ready.subscribe();
        // The sender lives in `self`, so the channel cannot close here
        let _ = receiver.wait_for(|ready| *ready).await;
    }

    /// One expiry sweep tick against the in-memory token
    pub async fn check_expiry(&self) -> ExpiryCheck {
        let Some(token) = self.token().await.filter(|token| !token.is_empty()) else {
            return ExpiryCheck::NoSession;
        };

        match decode_claims(&token) {
            Ok(claims) if claims.is_expired() => {
                if self.logout_if_current(&token).await {
                    self.notices.publish(Notice::session_expired());
                }
                ExpiryCheck::Expired
            }
            Ok(_) => ExpiryCheck::Valid,
            Err(e) => {
                warn!("Held token is unreadable: {}", e);
                if self.logout_if_current(&token).await {
                    self.notices.publish(Notice::session_invalid());
                }
                ExpiryCheck::Malformed
            }
        }
    }

    /// Start the periodic expiry sweep
    ///
    /// The first check runs one interval after start. The task ends when
    /// the manager is dropped or the handle is aborted.
    pub fn spawn_expiry_sweep(self: &Arc<Self>) -> JoinHandle<()> {
        let manager = Arc::downgrade(self);
        let period = self.expiry_check_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                let Some(manager) = manager.upgrade() else {
                    debug!("Session manager dropped; stopping expiry sweep");
                    break;
                };
                manager.check_expiry().await;
            }
        })
    }

    /// Exchange credentials for a token and start the session
    pub async fn sign_in(
        &self,
        client: &BackendClient,
        email: &str,
        password: &str,
    ) -> ApplicationResult<SessionState> {
        let result = self.exchange_credentials(client, email, password).await;
        if result.is_err() {
            self.notices.error(LOGIN_FAILED);
        }
        result
    }

    async fn exchange_credentials(
        &self,
        client: &BackendClient,
        email: &str,
        password: &str,
    ) -> ApplicationResult<SessionState> {
        let response = client.login(email, password).await.map_err(|e| {
            warn!("Login rejected: {}", e);
            login_failed("login")
        })?;

        let claims = decode_claims(&response.access_token).map_err(|e| {
            warn!("Issued token is unreadable: {}", e);
            login_failed("decode_claims")
        })?;
        let role = claims.role.ok_or_else(|| login_failed("decode_claims"))?;

        self.login(&response.access_token, &role, claims.user_id.as_deref())
            .await?;
        Ok(self.snapshot().await)
    }

    /// Create an account; the caller logs in separately afterwards
    pub async fn register(
        &self,
        client: &BackendClient,
        request: &RegisterRequest,
    ) -> ApplicationResult<()> {
        let fields = [
            ("name", &request.name),
            ("email", &request.email),
            ("phone", &request.phone),
            ("password", &request.password),
        ];
        if let Some((field, _)) = fields.iter().find(|(_, value)| value.trim().is_empty()) {
            let error = validation_error!("Please fill in all fields", field, "session_manager");
            self.notices.error(error.user_message(REGISTRATION_FAILED));
            return Err(error.into());
        }

        if let Err(e) = client.register(request).await {
            self.notices.error(e.user_message(REGISTRATION_FAILED));
            return Err(e.into());
        }

        self.notices.success("Registration successful");
        Ok(())
    }

    pub async fn landing(&self) -> Landing {
        self.state.read().await.landing()
    }

    /// Token of the current session, or a permission error
    pub async fn require_authenticated(&self) -> ApplicationResult<String> {
        let state = self.state.read().await;
        match &state.token {
            Some(token) if state.is_authenticated() => Ok(token.clone()),
            _ => Err(ApplicationError::permission("Please login to continue")),
        }
    }

    /// Token of the current session if it belongs to an admin
    pub async fn require_admin(&self) -> ApplicationResult<String> {
        let state = self.state.read().await;
        match &state.token {
            Some(token) if state.is_admin() => Ok(token.clone()),
            Some(_) if state.is_authenticated() => {
                Err(ApplicationError::permission("Admin access required"))
            }
            _ => Err(ApplicationError::permission("Please login to continue")),
        }
    }

    /// End the session when the backend rejected its token
    ///
    /// Returns true if `error` was an authentication failure.
    pub async fn expire_on_auth_failure(&self, error: &DdrpError) -> bool {
        if !error.is_auth_failure() {
            return false;
        }
        let Some(token) = self.token().await else {
            return true;
        };
        if self.logout_if_current(&token).await {
            self.notices.publish(Notice::session_invalid());
        }
        true
    }
}

/// Missing fields remove their entry
fn write_entries(store: &dyn SessionStore, state: &SessionState) -> ApplicationResult<()> {
    for (key, value) in [
        (TOKEN_KEY, &state.token),
        (ROLE_KEY, &state.role),
        (USER_ID_KEY, &state.user_id),
    ] {
        match value {
            Some(value) => store.set(key, value)?,
            None => store.remove(key)?,
        }
    }
    Ok(())
}

fn login_failed(operation: &str) -> ApplicationError {
    ApplicationError::Core(DdrpError::Authentication {
        message: LOGIN_FAILED.to_string(),
        context: ErrorContext::new("session_manager")
            .with_operation(operation)
            .with_suggestion("Check your email and password"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::tests::token_with_payload;
    use crate::session::MemorySessionStore;
    use async_trait::async_trait;
    use ddrp_core::DdrpResult;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct AcceptAll {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TokenValidator for AcceptAll {
        async fn validate(&self, _token: &str) -> DdrpResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn manager() -> (SessionManager, Arc<MemorySessionStore>, Arc<AcceptAll>) {
        let store = Arc::new(MemorySessionStore::new());
        let validator = Arc::new(AcceptAll {
            calls: AtomicUsize::new(0),
        });
        let manager = SessionManager::new(store.clone(), validator.clone(), NoticeBoard::default());
        (manager, store, validator)
    }

    fn future_token() -> String {
        let exp = chrono::Utc::now().timestamp() + 3600;
        token_with_payload(&json!({"exp": exp, "role": "admin", "user_id": "u-1"}))
    }

    #[tokio::test]
    async fn test_login_persists_and_logout_clears() {
        let (manager, store, _) = manager();

        manager.login("tok", "admin", Some("u-1")).await.unwrap();
        assert!(manager.is_authenticated().await);
        assert_eq!(store.get(TOKEN_KEY).unwrap().as_deref(), Some("tok"));
        assert_eq!(store.get(USER_ID_KEY).unwrap().as_deref(), Some("u-1"));

        manager.login("tok2", "customer", None).await.unwrap();
        assert_eq!(store.get(USER_ID_KEY).unwrap(), None);
        assert_eq!(manager.landing().await, Landing::Orders);

        manager.logout().await;
        assert!(!manager.is_authenticated().await);
        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(store.get(ROLE_KEY).unwrap(), None);
        assert_eq!(manager.landing().await, Landing::Login);
    }

    #[tokio::test]
    async fn test_restore_without_session_marks_ready() {
        let (manager, _, validator) = manager();
        assert!(!manager.is_ready());

        assert_eq!(manager.restore().await, RestoreOutcome::NoSession);
        assert!(manager.is_ready());
        manager.wait_until_ready().await;
        assert_eq!(validator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_restore_valid_token() {
        let (manager, store, validator) = manager();
        let token = future_token();
        store.set(TOKEN_KEY, &token).unwrap();
        store.set(ROLE_KEY, "admin").unwrap();

        assert_eq!(manager.restore().await, RestoreOutcome::Restored);
        assert_eq!(validator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(manager.token().await.as_deref(), Some(token.as_str()));
        assert_eq!(manager.landing().await, Landing::Admin);
    }

    #[tokio::test]
    async fn test_guards() {
        let (manager, _, _) = manager();
        assert!(manager.require_authenticated().await.is_err());

        manager.login("tok", "customer", None).await.unwrap();
        assert_eq!(manager.require_authenticated().await.unwrap(), "tok");
        let denied = manager.require_admin().await.unwrap_err();
        assert_eq!(denied.user_message("x"), "Admin access required");

        manager.login("tok", "admin", None).await.unwrap();
        assert_eq!(manager.require_admin().await.unwrap(), "tok");
    }

    #[tokio::test]
    async fn test_check_expiry_leaves_valid_token() {
        let (manager, _, _) = manager();
        assert_eq!(manager.check_expiry().await, ExpiryCheck::NoSession);

        manager.login(&future_token(), "admin", None).await.unwrap();
        assert_eq!(manager.check_expiry().await, ExpiryCheck::Valid);
        assert!(manager.is_authenticated().await);

        manager.login("garbage", "admin", None).await.unwrap();
        assert_eq!(manager.check_expiry().await, ExpiryCheck::Malformed);
        assert!(!manager.is_authenticated().await);
    }

    /// Memory store that can be told to fail writes of one key
    #[derive(Default)]
    struct FlakyStore {
        inner: MemorySessionStore,
        fail_key: std::sync::Mutex<Option<&'static str>>,
        writer_threads: std::sync::Mutex<Vec<std::thread::ThreadId>>,
    }

    impl FlakyStore {
        fn fail_on(&self, key: Option<&'static str>) {
            *self.fail_key.lock().unwrap() = key;
        }
    }

    impl SessionStore for FlakyStore {
        fn get(&self, key: &str) -> ApplicationResult<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> ApplicationResult<()> {
            self.writer_threads
                .lock()
                .unwrap()
                .push(std::thread::current().id());
            if *self.fail_key.lock().unwrap() == Some(key) {
                return Err(ddrp_core::storage_error!("disk full", "flaky_store").into());
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> ApplicationResult<()> {
            self.inner.remove(key)
        }
    }

    fn flaky_manager() -> (SessionManager, Arc<FlakyStore>) {
        let store = Arc::new(FlakyStore::default());
        let validator = Arc::new(AcceptAll {
            calls: AtomicUsize::new(0),
        });
        let manager = SessionManager::new(store.clone(), validator, NoticeBoard::default());
        (manager, store)
    }

    #[tokio::test]
    async fn test_failed_first_login_leaves_no_session() {
        let (manager, store) = flaky_manager();
        store.fail_on(Some(TOKEN_KEY));

        let error = manager.login("tok", "admin", Some("u-1")).await.unwrap_err();

        assert!(matches!(
            error,
            ApplicationError::Core(DdrpError::Storage { .. })
        ));
        assert!(!manager.is_authenticated().await);
        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(store.get(ROLE_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_failed_login_keeps_previous_session() {
        let (manager, store) = flaky_manager();
        manager.login("tok-1", "admin", Some("u-1")).await.unwrap();

        store.fail_on(Some(ROLE_KEY));
        assert!(manager.login("tok-2", "customer", None).await.is_err());

        let state = manager.snapshot().await;
        assert_eq!(state.token.as_deref(), Some("tok-1"));
        assert_eq!(state.role.as_deref(), Some("admin"));
        assert_eq!(store.get(TOKEN_KEY).unwrap().as_deref(), Some("tok-1"));
        assert_eq!(store.get(ROLE_KEY).unwrap().as_deref(), Some("admin"));
        assert_eq!(store.get(USER_ID_KEY).unwrap().as_deref(), Some("u-1"));

        store.fail_on(None);
        manager.login("tok-2", "customer", None).await.unwrap();
        assert_eq!(manager.token().await.as_deref(), Some("tok-2"));
    }

    #[tokio::test]
    async fn test_store_writes_run_off_the_runtime_thread() {
        let (manager, store) = flaky_manager();
        manager.login("tok", "admin", None).await.unwrap();

        let runtime_thread = std::thread::current().id();
        let writers = store.writer_threads.lock().unwrap().clone();
        assert!(!writers.is_empty());
        assert!(writers.iter().all(|id| *id != runtime_thread));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_expiry_interval_is_raised() {
        let (manager, _, _) = manager();
        let manager = Arc::new(manager.with_expiry_check_interval(Duration::ZERO));
        assert_eq!(manager.expiry_check_interval(), Duration::from_secs(1));

        let sweep = manager.spawn_expiry_sweep();
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(!sweep.is_finished());
        sweep.abort();
    }
}
