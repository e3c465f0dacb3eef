use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tokio::sync::watch;
use tracing::warn;
use uuid::Uuid;

/// Signed-in identity as seen by the auth layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
    pub name: Option<String>,
}

/// Observable authentication state. `resolved` stays false until the first
/// bootstrap poll or live event lands, which is how consumers distinguish
/// "still loading" from "signed out".
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub resolved: bool,
    pub identity: Option<Identity>,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}

/// Auth lifecycle events fed into the store.
#[derive(Debug, Clone)]
pub enum SessionChange {
    SignedIn(Identity),
    Refreshed(Identity),
    SignedOut,
}

/// Seam for profile auto-provisioning, injected so the store can be tested
/// with a counting fake and so provisioning failures never poison auth state.
#[async_trait]
pub trait ProvisionProfiles: Send + Sync {
    async fn ensure_profile(&self, identity: &Identity);
}

/// Tracks the most recently observed authentication state. The bootstrap
/// poll and the live event feed both converge on [`SessionStore::apply`], so
/// observers never need to care which path produced an update.
///
/// Profile provisioning fires exactly once per distinct signed-in user id
/// transition; token refreshes for the same user never re-trigger it.
pub struct SessionStore {
    state: watch::Sender<SessionState>,
    provisioner: Arc<dyn ProvisionProfiles>,
    current_user: Mutex<Option<Uuid>>,
}

/// Subscription handle. Dropping it releases the listener; there is no
/// manual unsubscribe anywhere else in the request lifecycle.
pub struct SessionWatch {
    rx: watch::Receiver<SessionState>,
}

impl SessionWatch {
    /// Waits for the next state update after the one last seen.
    pub async fn changed(&mut self) -> Result<(), watch::error::RecvError> {
        self.rx.changed().await
    }

    pub fn current(&self) -> SessionState {
        self.rx.borrow().clone()
    }
}

impl SessionStore {
    pub fn new(provisioner: Arc<dyn ProvisionProfiles>) -> Arc<Self> {
        let (state, _) = watch::channel(SessionState::default());
        Arc::new(Self {
            state,
            provisioner,
            current_user: Mutex::new(None),
        })
    }

    /// Poll storage for an existing unexpired session and converge it into
    /// the same update path the live feed uses. On storage failure the state
    /// stays unresolved ("loading"); there is no retry.
    pub async fn bootstrap(self: Arc<Self>, pool: PgPool) {
        let found = sqlx::query_as::<_, (Uuid, String, Option<String>)>(
            "SELECT a.id, a.email, a.name
             FROM sessions s
             JOIN accounts a ON a.id = s.user_id
             WHERE s.expires_at > $1
             ORDER BY s.created_at DESC
             LIMIT 1",
        )
        .bind(Utc::now())
        .fetch_optional(&pool)
        .await;

        match found {
            Ok(Some((user_id, email, name))) => {
                self.apply(SessionChange::SignedIn(Identity {
                    user_id,
                    email,
                    name,
                }))
                .await;
            }
            Ok(None) => {
                self.apply(SessionChange::SignedOut).await;
            }
            Err(e) => {
                warn!("Session bootstrap failed, staying unresolved: {}", e);
            }
        }
    }

    /// Single convergence point for every session transition.
    pub async fn apply(&self, change: SessionChange) {
        let identity = match &change {
            SessionChange::SignedIn(identity) | SessionChange::Refreshed(identity) => {
                Some(identity.clone())
            }
            SessionChange::SignedOut => None,
        };

        // Decide on provisioning while holding the lock, provision after
        // releasing it: the resolver may block on the database.
        let to_provision = {
            let mut current = self.current_user.lock().expect("session store lock");
            let next = identity.as_ref().map(|i| i.user_id);
            let transition = next.is_some() && next != *current;
            *current = next;
            if transition { identity.clone() } else { None }
        };

        self.state.send_replace(SessionState {
            resolved: true,
            identity,
        });

        if let Some(identity) = to_provision {
            self.provisioner.ensure_profile(&identity).await;
        }
    }

    pub fn subscribe(&self) -> SessionWatch {
        SessionWatch {
            rx: self.state.subscribe(),
        }
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvisioner {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ProvisionProfiles for CountingProvisioner {
        async fn ensure_profile(&self, _identity: &Identity) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn identity(user_id: Uuid) -> Identity {
        Identity {
            user_id,
            email: format!("{}@example.com", user_id),
            name: None,
        }
    }

    fn store_with_counter() -> (Arc<SessionStore>, Arc<CountingProvisioner>) {
        let counter = Arc::new(CountingProvisioner {
            calls: AtomicUsize::new(0),
        });
        let store = SessionStore::new(counter.clone());
        (store, counter)
    }

    #[tokio::test]
    async fn starts_unresolved_and_absent() {
        let (store, _) = store_with_counter();
        let state = store.snapshot();
        assert!(!state.resolved);
        assert!(state.identity.is_none());
    }

    #[tokio::test]
    async fn sign_in_resolves_identity_and_provisions_once() {
        let (store, counter) = store_with_counter();
        let user = Uuid::new_v4();

        store.apply(SessionChange::SignedIn(identity(user))).await;

        let state = store.snapshot();
        assert!(state.resolved);
        assert!(state.is_authenticated());
        assert_eq!(counter.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn token_refresh_does_not_reprovision() {
        let (store, counter) = store_with_counter();
        let user = Uuid::new_v4();

        store.apply(SessionChange::SignedIn(identity(user))).await;
        store.apply(SessionChange::Refreshed(identity(user))).await;
        store.apply(SessionChange::Refreshed(identity(user))).await;

        assert_eq!(counter.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn distinct_user_transitions_each_provision() {
        let (store, counter) = store_with_counter();

        store
            .apply(SessionChange::SignedIn(identity(Uuid::new_v4())))
            .await;
        store
            .apply(SessionChange::SignedIn(identity(Uuid::new_v4())))
            .await;

        assert_eq!(counter.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn sign_out_then_sign_in_is_a_new_transition() {
        let (store, counter) = store_with_counter();
        let user = Uuid::new_v4();

        store.apply(SessionChange::SignedIn(identity(user))).await;
        store.apply(SessionChange::SignedOut).await;
        assert!(store.snapshot().identity.is_none());

        store.apply(SessionChange::SignedIn(identity(user))).await;
        assert_eq!(counter.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn subscribers_observe_updates_and_release_on_drop() {
        let (store, _) = store_with_counter();
        let mut watch = store.subscribe();
        let user = Uuid::new_v4();

        store.apply(SessionChange::SignedIn(identity(user))).await;
        watch.changed().await.expect("update");
        assert!(watch.current().is_authenticated());

        // Dropping the guard must not break later updates.
        drop(watch);
        store.apply(SessionChange::SignedOut).await;
        assert!(!store.snapshot().is_authenticated());
    }
}
