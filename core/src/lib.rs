//! # Storefront Core
//!
//! Core traits and types for the Storefront in-app purchase package.
//!
//! This crate holds everything about a purchase session that can be expressed
//! without I/O: the product and result vocabularies, the backend port, the
//! configuration surface, and the session reducer that owns every state
//! transition.
//!
//! ## Core Concepts
//!
//! - **State**: [`session::SessionState`], the catalog plus loading and restore flags
//! - **Action**: [`session::SessionAction`], everything that can happen to a session
//! - **Reducer**: Pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Descriptions of follow-up work (callbacks, delayed actions)
//! - **Environment**: Injected dependencies ([`environment::Clock`], expiry settings)
//! - **Backend**: [`backend::StoreBackend`], the purchase library consumed as a port
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use storefront_core::environment::SystemClock;
//! use storefront_core::reducer::Reducer;
//! use storefront_core::session::{
//!     SessionAction, SessionEnvironment, SessionReducer, SessionState,
//! };
//!
//! let env = SessionEnvironment::new(Arc::new(SystemClock));
//! let mut state = SessionState::default();
//!
//! SessionReducer::new().reduce(&mut state, SessionAction::LoadingStarted, &env);
//! assert!(state.is_loading);
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use smallvec::{SmallVec, smallvec};

pub mod backend;
pub mod config;
pub mod error;
pub mod outcome;
pub mod product;
pub mod session;

pub use backend::StoreBackend;
pub use config::StorefrontConfig;
pub use error::{BackendError, StoreError};
pub use outcome::{PurchaseOutcome, PurchaseResult, RestoreResult};
pub use product::{Product, ProductId, ProductInfo, ProductKind};

/// Reducer module - The core trait for session logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`
///
/// They contain all state-transition logic and are deterministic and testable.
pub mod reducer {
    use super::SmallVec;
    use super::effect::Effect;

    /// The Reducer trait - core abstraction for state transitions
    ///
    /// # Type Parameters
    ///
    /// - `State`: The state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// Updates state in place and returns effect descriptions for the
        /// runtime to execute. Must not perform I/O.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects describe work to be performed by the runtime after a reducer
/// returns. They are values (not execution), so reducer tests can assert on
/// them directly.
pub mod effect {
    use crate::product::ProductId;
    use std::time::Duration;

    /// Something the presentation layer must be told about
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum Notification {
        /// A purchase completed for this product
        PurchaseSucceeded(ProductId),
        /// The presentation should close itself
        DismissRequested,
    }

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are descriptions of what should happen,
    /// returned from reducers and executed by the session runtime.
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects one after another, in order
        Sequential(Vec<Effect<Action>>),

        /// Delayed action (restore banner expiry)
        Delay {
            /// How long to wait
            duration: Duration,
            /// Action to dispatch after delay
            action: Box<Action>,
        },

        /// Invoke a presentation callback
        Notify(Notification),
    }

    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Effect::Delay { duration, action } => f
                    .debug_struct("Effect::Delay")
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                Effect::Notify(notification) => {
                    f.debug_tuple("Effect::Notify").field(notification).finish()
                },
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Chain effects to run sequentially
        #[must_use]
        pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Sequential(effects)
        }

        /// Flatten this effect into the notifications it carries, in order
        ///
        /// Delays are skipped; they produce actions, not notifications.
        #[must_use]
        pub fn notifications(&self) -> Vec<&Notification> {
            match self {
                Effect::None | Effect::Delay { .. } => Vec::new(),
                Effect::Notify(notification) => vec![notification],
                Effect::Sequential(effects) => {
                    effects.iter().flat_map(Effect::notifications).collect()
                },
            }
        }
    }
}

/// Environment module - Dependency injection traits
///
/// All sources of non-determinism the reducer needs are abstracted behind
/// traits and injected via the Environment parameter.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```
    /// use storefront_core::environment::{Clock, SystemClock};
    ///
    /// let now = SystemClock.now();
    /// assert!(now.timestamp() > 0);
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall-clock time
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
