use crate::context::ActionContext;
use crate::error::{ActionError, Result};
use crate::{ActionHandler, ActionOutcome};
use async_trait::async_trait;
use reacter_common::types::{ActionKind, Direction, Notification, OutboundMessage};
use tokio::sync::mpsc;

/// Sends a [`Notification`] back to the collector over the outbound channel.
pub struct NotifyAction {
    sender: mpsc::Sender<OutboundMessage>,
}

impl NotifyAction {
    pub fn new(sender: mpsc::Sender<OutboundMessage>) -> Self {
        Self { sender }
    }

    /// Renders the configured template, or a default message.
    pub fn message(context: &ActionContext) -> String {
        match &context.payload {
            Some(template) => context.render(template),
            None => match context.direction {
                Direction::Violating => context.render(
                    "{{metric}} on {{host}} is {{state}} (value {{value}})",
                ),
                Direction::Clearing => {
                    context.render("{{metric}} on {{host}} is back to normal (value {{value}})")
                }
            },
        }
    }

    pub fn notification(context: &ActionContext) -> Notification {
        Notification {
            time: context.time,
            severity: context.classification.severity(),
            host: context.host.clone(),
            plugin: context.plugin.clone(),
            plugin_instance: context.plugin_instance.clone(),
            type_name: context.type_name.clone(),
            type_instance: context.type_instance.clone(),
            message: Self::message(context),
        }
    }
}

#[async_trait]
impl ActionHandler for NotifyAction {
    fn kind(&self) -> ActionKind {
        ActionKind::Notify
    }

    async fn dispatch(&self, context: &ActionContext) -> Result<ActionOutcome> {
        let notification = Self::notification(context);
        let detail = notification.message.clone();
        self.sender
            .send(OutboundMessage::Notification(notification))
            .await
            .map_err(|_| ActionError::ChannelClosed)?;
        Ok(ActionOutcome {
            exit_code: None,
            detail: Some(detail),
        })
    }
}
