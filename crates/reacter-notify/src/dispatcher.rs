use crate::context::ActionContext;
use crate::error::{ActionError, Result};
use crate::plugin::ActionRegistry;
use crate::ActionOutcome;
use reacter_common::types::{ActionKind, ActionSpec, Params, Transition};
use tokio::task::JoinHandle;
use tracing;

/// Handle to one spawned action. Dropping it detaches the action; awaiting
/// [`join`](DispatchHandle::join) observes its outcome.
pub struct DispatchHandle {
    pub kind: ActionKind,
    pub host: String,
    pub metric: String,
    handle: JoinHandle<Result<ActionOutcome>>,
}

impl DispatchHandle {
    pub async fn join(self) -> Result<ActionOutcome> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(ActionError::Join(e.to_string())),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Turns reportable transitions into action invocations.
pub struct ActionDispatcher {
    registry: ActionRegistry,
    global_params: Params,
}

impl ActionDispatcher {
    pub fn new(registry: ActionRegistry, global_params: Params) -> Self {
        Self {
            registry,
            global_params,
        }
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    /// Contexts for every action kind the reached bound set declares.
    ///
    /// `true` takes the rule-level default payload, a string overrides it and
    /// `false` disables the kind. A transition without a bound set (OK on a
    /// rule with no `okay` section) plans nothing.
    pub fn plan(&self, transition: &Transition) -> Vec<ActionContext> {
        let Some(bounds) = &transition.bounds else {
            return Vec::new();
        };

        ActionKind::ALL
            .into_iter()
            .filter_map(|kind| {
                let payload = match bounds.action(kind)? {
                    ActionSpec::Enabled(false) => return None,
                    ActionSpec::Enabled(true) => {
                        transition.rule.default_action(kind).map(str::to_string)
                    }
                    ActionSpec::Override(value) => Some(value.clone()),
                };
                Some(ActionContext::from_transition(
                    kind,
                    transition,
                    payload,
                    &self.global_params,
                ))
            })
            .collect()
    }

    /// Spawns every planned action whose kind has a registered handler.
    /// Must be called from within a Tokio runtime; never waits on the
    /// actions themselves.
    pub fn dispatch(&self, transition: &Transition) -> Vec<DispatchHandle> {
        let mut handles = Vec::new();

        for context in self.plan(transition) {
            let Some(handler) = self.registry.get(context.kind) else {
                tracing::debug!(
                    kind = %context.kind,
                    metric = %context.metric,
                    "No handler registered for action kind, skipping"
                );
                continue;
            };

            tracing::info!(
                kind = %context.kind,
                host = %context.host,
                metric = %context.metric,
                direction = %context.direction,
                state = %context.classification,
                "Dispatching action"
            );

            let kind = context.kind;
            let host = context.host.clone();
            let metric = context.metric.clone();
            let handle = tokio::spawn(async move { handler.dispatch(&context).await });
            handles.push(DispatchHandle {
                kind,
                host,
                metric,
                handle,
            });
        }

        handles
    }
}
