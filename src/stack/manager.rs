use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{BblError, Result};
use crate::events::EventSink;
use crate::stack::transport::{
    CreateStackInput, DeleteStackInput, DescribeStacksInput, HttpStatused, StackTransport,
    TransportError, UpdateStackInput,
};
use crate::stack::{Stack, StackStatus};
use crate::template::Template;

/// The remote answers 400 both for a missing stack on describe and for an
/// update with nothing to change.
const BAD_REQUEST: u16 = 400;

/// Time source for the polling loop.
#[async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// What a wait is waiting on; only deletes treat a vanished stack as done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackAction {
    Apply,
    Update,
    Delete,
}

impl StackAction {
    pub fn label(&self) -> &'static str {
        match self {
            StackAction::Apply => "applying cloudformation template",
            StackAction::Update => "updating cloudformation stack",
            StackAction::Delete => "deleting cloudformation stack",
        }
    }
}

/// Reconciles a single named stack against the remote.
#[derive(Clone)]
pub struct StackManager {
    transport: Arc<dyn StackTransport>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventSink>,
    cancel: CancellationToken,
    max_polls: Option<u32>,
}

impl StackManager {
    pub fn new(transport: Arc<dyn StackTransport>, events: Arc<dyn EventSink>) -> Self {
        Self {
            transport,
            clock: Arc::new(TokioClock),
            events,
            cancel: CancellationToken::new(),
            max_polls: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Every transport call and sleep is abandoned once `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_max_polls(mut self, max_polls: u32) -> Self {
        self.max_polls = Some(max_polls);
        self
    }

    async fn guard<T>(&self, work: impl Future<Output = T>) -> Result<T> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(BblError::Cancelled),
            out = work => Ok(out),
        }
    }

    pub async fn describe(&self, name: &str) -> Result<Stack> {
        let input = DescribeStacksInput {
            stack_name: Some(name.to_string()),
        };
        let output = self
            .guard(self.transport.describe_stacks(input))
            .await?
            .map_err(|err| not_found_or_transport(name, err))?;

        let description = output
            .stacks
            .into_iter()
            .find(|stack| stack.stack_name == name)
            .ok_or_else(|| BblError::StackNotFound {
                name: name.to_string(),
            })?;

        Ok(Stack {
            name: description.stack_name,
            status: StackStatus::from_wire(description.stack_status.as_deref()),
            outputs: description
                .outputs
                .into_iter()
                .map(|output| (output.output_key, output.output_value))
                .collect(),
        })
    }

    pub async fn create(&self, name: &str, template: &Template) -> Result<()> {
        self.events.step("creating cloudformation stack");
        let input = CreateStackInput::new(name, template.to_json()?);
        self.guard(self.transport.create_stack(input)).await??;
        info!(stack = %name, "create requested");
        Ok(())
    }

    /// A 400 from the remote means there was nothing to update.
    pub async fn update(&self, name: &str, template: &Template) -> Result<()> {
        self.events.step("updating cloudformation stack");
        let input = UpdateStackInput::new(name, template.to_json()?);
        match self.guard(self.transport.update_stack(input)).await? {
            Ok(()) => {
                info!(stack = %name, "update requested");
                Ok(())
            }
            Err(err) if err.status_code() == Some(BAD_REQUEST) => {
                info!(stack = %name, reason = %err, "no updates to perform");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn create_or_update(&self, name: &str, template: &Template) -> Result<()> {
        match self.describe(name).await {
            Ok(stack) => {
                debug!(stack = %name, status = %stack.status, "stack exists");
                self.update(name, template).await
            }
            Err(err) if err.is_stack_not_found() => self.create(name, template).await,
            Err(err) => Err(err),
        }
    }

    pub async fn delete(&self, name: &str) -> Result<()> {
        self.events.step("deleting cloudformation stack");
        let input = DeleteStackInput {
            stack_name: name.to_string(),
        };
        self.guard(self.transport.delete_stack(input)).await??;
        info!(stack = %name, "delete requested");
        Ok(())
    }

    /// Polls the stack every `interval` until it reaches a terminal status.
    ///
    /// For [`StackAction::Delete`] a stack that no longer exists counts as
    /// done. Transport errors, cancellation and an exhausted poll budget end
    /// the wait with an error.
    pub async fn wait_for_completion(
        &self,
        name: &str,
        interval: Duration,
        action: StackAction,
    ) -> Result<()> {
        let mut polls = 0u32;
        loop {
            match self.describe(name).await {
                Ok(stack) if stack.status.is_terminal() => {
                    if stack.status.is_failure() {
                        warn!(stack = %name, status = %stack.status, action = action.label(), "stack settled in a failed state");
                    } else {
                        info!(stack = %name, status = %stack.status, action = action.label(), "stack settled");
                    }
                    self.events.step(&format!("finished {}", action.label()));
                    return Ok(());
                }
                Ok(stack) => {
                    debug!(stack = %name, status = %stack.status, "stack in progress");
                }
                Err(err) if action == StackAction::Delete && err.is_stack_not_found() => {
                    info!(stack = %name, "stack deleted");
                    self.events.step(&format!("finished {}", action.label()));
                    return Ok(());
                }
                Err(err) => return Err(err),
            }

            polls += 1;
            if let Some(max_polls) = self.max_polls
                && polls >= max_polls
            {
                return Err(BblError::WaitExhausted {
                    name: name.to_string(),
                    polls,
                });
            }

            self.events.dot();
            self.guard(self.clock.sleep(interval)).await?;
        }
    }
}

fn not_found_or_transport(name: &str, err: TransportError) -> BblError {
    if err.status_code() == Some(BAD_REQUEST) {
        BblError::StackNotFound {
            name: name.to_string(),
        }
    } else {
        BblError::Transport(err)
    }
}
