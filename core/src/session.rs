//! Session state and the reducer that owns every transition.
//!
//! The runtime performs backend calls and reports what happened as
//! [`SessionAction`]s. [`SessionReducer`] folds those into [`SessionState`]
//! and returns the effects (callbacks, expiry timers) that follow.
//!
//! Two small state machines live here:
//!
//! - Loading: `Idle → Loading → Idle`, driven by `LoadingStarted` and
//!   `LoadingFinished`. Overlapping operations are not serialized; the last
//!   `LoadingFinished` wins.
//! - Restore banner: `Absent → Shown → Absent`, shown by a restore-flavored
//!   sync, hidden by `DismissRestoreResult` or a matching
//!   `RestoreResultExpired`.

use crate::effect::{Effect, Notification};
use crate::environment::Clock;
use crate::outcome::{PurchaseOutcome, PurchaseResult, RestoreResult};
use crate::product::{Product, ProductId};
use crate::reducer::Reducer;
use crate::{DateTime, SmallVec, Utc, smallvec};
use std::sync::Arc;
use std::time::Duration;

/// Local mirror of the backend's product lists
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Catalog {
    /// Subscriptions in backend order
    pub subscriptions: Vec<Product>,
    /// One-time products in backend order
    pub non_consumables: Vec<Product>,
    /// When the lists were last replaced
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl Catalog {
    /// Looks up a product by identifier in either list
    #[must_use]
    pub fn find(&self, id: &ProductId) -> Option<&Product> {
        self.iter().find(|product| &product.id == id)
    }

    /// All products, subscriptions first
    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.subscriptions.iter().chain(self.non_consumables.iter())
    }

    /// Total number of products
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.len() + self.non_consumables.len()
    }

    /// Returns true if no products have been synced
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Observable session state
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    /// True while a purchase or sync is in flight
    pub is_loading: bool,
    /// Result of the most recent restore, until dismissed or expired
    pub restore_result: Option<RestoreResult>,
    /// Product lists from the last successful sync
    pub catalog: Catalog,
    /// Incremented every time a restore result is shown
    pub restore_generation: u64,
    /// True once the backend has started successfully
    pub backend_started: bool,
}

impl SessionState {
    /// Every field except the catalog, for cheap change detection
    #[must_use]
    pub const fn flags(&self) -> SessionFlags {
        SessionFlags {
            is_loading: self.is_loading,
            restore_result: self.restore_result,
            restore_generation: self.restore_generation,
            backend_started: self.backend_started,
        }
    }
}

/// Copyable snapshot of the scalar fields of a [`SessionState`]
///
/// Only [`SessionAction::SyncSucceeded`] touches the catalog, so comparing
/// flags before and after any other action tells whether it changed state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionFlags {
    /// See [`SessionState::is_loading`]
    pub is_loading: bool,
    /// See [`SessionState::restore_result`]
    pub restore_result: Option<RestoreResult>,
    /// See [`SessionState::restore_generation`]
    pub restore_generation: u64,
    /// See [`SessionState::backend_started`]
    pub backend_started: bool,
}

/// Everything that can happen to a session
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionAction {
    /// A purchase or sync began
    LoadingStarted,
    /// A purchase or sync ended, however it ended
    LoadingFinished,
    /// `start_or_refresh` succeeded
    SyncSucceeded {
        /// Backend subscription list
        subscriptions: Vec<Product>,
        /// Backend one-time product list
        non_consumables: Vec<Product>,
        /// Whether the backend reports any purchased product
        has_purchases: bool,
        /// Whether this was a user-initiated restore
        show_result: bool,
    },
    /// `start_or_refresh` failed
    SyncFailed {
        /// Whether this was a user-initiated restore
        show_result: bool,
    },
    /// The backend finished a purchase attempt
    PurchaseCompleted {
        /// Product that was purchased
        product_id: ProductId,
        /// Raw backend outcome
        outcome: PurchaseOutcome,
    },
    /// The user closed the restore banner
    DismissRestoreResult,
    /// A banner timer fired
    RestoreResultExpired {
        /// Generation the timer was scheduled for
        generation: u64,
    },
}

impl SessionAction {
    /// True if reducing this action replaces the catalog
    #[must_use]
    pub const fn replaces_catalog(&self) -> bool {
        matches!(self, Self::SyncSucceeded { .. })
    }
}

/// Dependencies of the session reducer
#[derive(Clone)]
pub struct SessionEnvironment {
    /// Clock for catalog timestamps
    pub clock: Arc<dyn Clock>,
    /// Restore banner lifetime; `None` disables expiry
    pub restore_result_display: Option<Duration>,
}

impl SessionEnvironment {
    /// Creates an environment with the default three-second banner
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            restore_result_display: Some(crate::config::DEFAULT_RESTORE_RESULT_DISPLAY),
        }
    }

    /// Overrides the restore banner lifetime
    #[must_use]
    pub const fn with_restore_result_display(mut self, display: Option<Duration>) -> Self {
        self.restore_result_display = display;
        self
    }
}

impl std::fmt::Debug for SessionEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionEnvironment")
            .field("restore_result_display", &self.restore_result_display)
            .finish_non_exhaustive()
    }
}

/// Reducer for a purchase session
#[derive(Clone, Copy, Debug, Default)]
pub struct SessionReducer;

impl SessionReducer {
    /// Creates a new `SessionReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Shows a restore result and schedules its expiry
    fn show_restore_result(
        state: &mut SessionState,
        result: RestoreResult,
        env: &SessionEnvironment,
    ) -> SmallVec<[Effect<SessionAction>; 4]> {
        state.restore_result = Some(result);
        state.restore_generation = state.restore_generation.wrapping_add(1);

        match env.restore_result_display {
            Some(duration) => smallvec![Effect::Delay {
                duration,
                action: Box::new(SessionAction::RestoreResultExpired {
                    generation: state.restore_generation,
                }),
            }],
            None => SmallVec::new(),
        }
    }
}

impl Reducer for SessionReducer {
    type State = SessionState;
    type Action = SessionAction;
    type Environment = SessionEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            SessionAction::LoadingStarted => {
                state.is_loading = true;
                SmallVec::new()
            },

            SessionAction::LoadingFinished => {
                state.is_loading = false;
                SmallVec::new()
            },

            SessionAction::SyncSucceeded {
                subscriptions,
                non_consumables,
                has_purchases,
                show_result,
            } => {
                state.catalog = Catalog {
                    subscriptions,
                    non_consumables,
                    last_synced_at: Some(env.clock.now()),
                };
                state.backend_started = true;

                if show_result {
                    Self::show_restore_result(state, RestoreResult::from_sync(has_purchases), env)
                } else {
                    SmallVec::new()
                }
            },

            // Catalog is left untouched on failure
            SessionAction::SyncFailed { show_result } => {
                if show_result {
                    Self::show_restore_result(state, RestoreResult::Failure, env)
                } else {
                    SmallVec::new()
                }
            },

            SessionAction::PurchaseCompleted { product_id, outcome } => {
                match PurchaseResult::from_outcome(product_id, outcome) {
                    PurchaseResult::Success(id) => smallvec![Effect::chain(vec![
                        Effect::Notify(Notification::PurchaseSucceeded(id)),
                        Effect::Notify(Notification::DismissRequested),
                    ])],
                    PurchaseResult::UserCancelled | PurchaseResult::Pending => SmallVec::new(),
                }
            },

            SessionAction::DismissRestoreResult => {
                state.restore_result = None;
                SmallVec::new()
            },

            SessionAction::RestoreResultExpired { generation } => {
                if generation == state.restore_generation {
                    state.restore_result = None;
                }
                SmallVec::new()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::SystemClock;
    use crate::product::ProductKind;

    fn env() -> SessionEnvironment {
        SessionEnvironment::new(Arc::new(SystemClock))
    }

    fn product(id: &str, kind: ProductKind) -> Product {
        Product::new(id, kind, id, "", "$1.99")
    }

    #[test]
    fn loading_flag_toggles() {
        let mut state = SessionState::default();
        let reducer = SessionReducer::new();

        reducer.reduce(&mut state, SessionAction::LoadingStarted, &env());
        assert!(state.is_loading);

        reducer.reduce(&mut state, SessionAction::LoadingFinished, &env());
        assert!(!state.is_loading);
    }

    #[test]
    fn sync_replaces_catalog_wholesale() {
        let mut state = SessionState::default();
        state.catalog.non_consumables = vec![product("old", ProductKind::NonConsumable)];

        let effects = SessionReducer::new().reduce(
            &mut state,
            SessionAction::SyncSucceeded {
                subscriptions: vec![product("pro.monthly", ProductKind::Subscription)],
                non_consumables: Vec::new(),
                has_purchases: false,
                show_result: false,
            },
            &env(),
        );

        assert!(effects.is_empty());
        assert_eq!(state.catalog.len(), 1);
        assert!(state.catalog.find(&ProductId::from("old")).is_none());
        assert!(state.catalog.last_synced_at.is_some());
        assert!(state.backend_started);
        assert_eq!(state.restore_result, None);
    }

    #[test]
    fn failed_sync_keeps_catalog() {
        let mut state = SessionState::default();
        state.catalog.subscriptions = vec![product("pro.yearly", ProductKind::Subscription)];
        let before = state.catalog.clone();

        SessionReducer::new().reduce(&mut state, SessionAction::SyncFailed { show_result: false }, &env());

        assert_eq!(state.catalog, before);
        assert_eq!(state.restore_result, None);
    }

    #[test]
    fn expiry_only_clears_matching_generation() {
        let mut state = SessionState::default();
        let reducer = SessionReducer::new();

        reducer.reduce(&mut state, SessionAction::SyncFailed { show_result: true }, &env());
        let first = state.restore_generation;
        reducer.reduce(&mut state, SessionAction::SyncFailed { show_result: true }, &env());

        reducer.reduce(&mut state, SessionAction::RestoreResultExpired { generation: first }, &env());
        assert_eq!(state.restore_result, Some(RestoreResult::Failure));

        let latest = state.restore_generation;
        reducer.reduce(&mut state, SessionAction::RestoreResultExpired { generation: latest }, &env());
        assert_eq!(state.restore_result, None);
    }

    #[test]
    fn catalog_iterates_subscriptions_first() {
        let catalog = Catalog {
            subscriptions: vec![product("sub", ProductKind::Subscription)],
            non_consumables: vec![product("tip", ProductKind::NonConsumable)],
            last_synced_at: None,
        };

        let ids: Vec<&str> = catalog.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["sub", "tip"]);
        assert!(!catalog.is_empty());
    }

    #[test]
    fn only_sync_success_touches_the_catalog() {
        let reducer = SessionReducer::new();
        let mut state = SessionState::default();
        reducer.reduce(
            &mut state,
            SessionAction::SyncSucceeded {
                subscriptions: vec![product("pro.monthly", ProductKind::Subscription)],
                non_consumables: vec![product("tip.small", ProductKind::NonConsumable)],
                has_purchases: true,
                show_result: true,
            },
            &env(),
        );
        let catalog = state.catalog.clone();

        for action in [
            SessionAction::LoadingStarted,
            SessionAction::LoadingFinished,
            SessionAction::SyncFailed { show_result: true },
            SessionAction::SyncFailed { show_result: false },
            SessionAction::PurchaseCompleted {
                product_id: ProductId::from("tip.small"),
                outcome: PurchaseOutcome::Purchased,
            },
            SessionAction::DismissRestoreResult,
            SessionAction::RestoreResultExpired { generation: 1 },
        ] {
            assert!(!action.replaces_catalog(), "{action:?}");
            let flags = state.flags();
            let full = state.clone();
            reducer.reduce(&mut state, action, &env());
            assert_eq!(state.catalog, catalog);
            // Flag equality must agree with full-state equality
            assert_eq!(state.flags() == flags, state == full);
        }
    }

    #[test]
    fn sync_success_replaces_catalog() {
        let action = SessionAction::SyncSucceeded {
            subscriptions: Vec::new(),
            non_consumables: Vec::new(),
            has_purchases: false,
            show_result: false,
        };
        assert!(action.replaces_catalog());
    }
}
