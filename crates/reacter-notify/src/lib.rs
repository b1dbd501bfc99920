//! Action dispatch for reportable threshold transitions.
//!
//! A [`dispatcher::ActionDispatcher`] looks at the bound set a transition
//! reached, resolves each declared action kind against the
//! [`plugin::ActionRegistry`], and runs the matching [`ActionHandler`] on a
//! background task. Built-in handlers are `exec` (shell command with an
//! environment describing the transition) and `notify` (notification sent
//! back to the collector).

pub mod actions;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod plugin;


use async_trait::async_trait;
use context::ActionContext;
use error::Result;
use reacter_common::types::ActionKind;

/// What an action reported once it finished.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionOutcome {
    /// Exit code for process-based actions; `None` if killed by a signal or
    /// not applicable.
    pub exit_code: Option<i32>,
    pub detail: Option<String>,
}

/// A handler for one action kind.
///
/// Handlers are registered in the [`plugin::ActionRegistry`] under their
/// [`kind`](ActionHandler::kind) and invoked by the dispatcher on a spawned
/// task. Their outcome never feeds back into threshold state.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// The action kind this handler serves.
    fn kind(&self) -> ActionKind;

    /// Performs the action for one transition.
    ///
    /// # Errors
    ///
    /// Returns an error if the action could not be started or completed.
    async fn dispatch(&self, context: &ActionContext) -> Result<ActionOutcome>;
}
