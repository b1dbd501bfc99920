use crate::actions::exec::ExecAction;
use crate::ActionHandler;
use reacter_common::types::ActionKind;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Registry of [`ActionHandler`]s keyed by action kind.
///
/// A kind with no registered handler is simply skipped by the dispatcher.
///
/// # Examples
///
/// ```
/// use reacter_common::types::ActionKind;
/// use reacter_notify::plugin::ActionRegistry;
///
/// let registry = ActionRegistry::default();
/// assert!(registry.has_handler(ActionKind::Exec));
/// assert!(!registry.has_handler(ActionKind::Notify));
/// ```
#[derive(Clone)]
pub struct ActionRegistry {
    handlers: BTreeMap<ActionKind, Arc<dyn ActionHandler>>,
}

impl ActionRegistry {
    /// An empty registry; every action kind is skipped.
    pub fn empty() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    /// Registers `handler` under its kind, replacing any previous one.
    pub fn register(&mut self, handler: Arc<dyn ActionHandler>) {
        self.handlers.insert(handler.kind(), handler);
    }

    pub fn with(mut self, handler: Arc<dyn ActionHandler>) -> Self {
        self.register(handler);
        self
    }

    pub fn get(&self, kind: ActionKind) -> Option<Arc<dyn ActionHandler>> {
        self.handlers.get(&kind).map(Arc::clone)
    }

    pub fn has_handler(&self, kind: ActionKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    pub fn kinds(&self) -> Vec<ActionKind> {
        self.handlers.keys().copied().collect()
    }
}

impl Default for ActionRegistry {
    /// Only `exec` is built in; `notify` needs an outbound channel and is
    /// registered by the server.
    fn default() -> Self {
        Self::empty().with(Arc::new(ExecAction::default()))
    }
}
