use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::error::Result;
use crate::stack::{Stack, StackAction, StackManager};
use crate::template::builders::{TemplateBuilder, TemplateParams};

pub const WAIT_INTERVAL: Duration = Duration::from_secs(15);

/// Builds the desired template and drives the stack to it.
#[derive(Clone)]
pub struct InfrastructureManager {
    builder: Arc<dyn TemplateBuilder>,
    stacks: StackManager,
    interval: Duration,
}

impl InfrastructureManager {
    pub fn new(builder: Arc<dyn TemplateBuilder>, stacks: StackManager) -> Self {
        Self {
            builder,
            stacks,
            interval: WAIT_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Creates the stack, or updates it when it already exists.
    pub async fn create(&self, name: &str, params: &TemplateParams) -> Result<Stack> {
        let template = self.builder.build(params)?;
        info!(stack = %name, env_id = %params.env_id, "applying infrastructure");
        self.stacks.create_or_update(name, &template).await?;
        self.stacks
            .wait_for_completion(name, self.interval, StackAction::Apply)
            .await?;
        self.stacks.describe(name).await
    }

    pub async fn update(&self, name: &str, params: &TemplateParams) -> Result<Stack> {
        let template = self.builder.build(params)?;
        info!(stack = %name, env_id = %params.env_id, "updating infrastructure");
        self.stacks.update(name, &template).await?;
        self.stacks
            .wait_for_completion(name, self.interval, StackAction::Update)
            .await?;
        self.stacks.describe(name).await
    }

    pub async fn exists(&self, name: &str) -> Result<bool> {
        match self.stacks.describe(name).await {
            Ok(_) => Ok(true),
            Err(err) if err.is_stack_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    pub async fn describe(&self, name: &str) -> Result<Stack> {
        self.stacks.describe(name).await
    }

    pub async fn delete(&self, name: &str) -> Result<()> {
        info!(stack = %name, "deleting infrastructure");
        self.stacks.delete(name).await?;
        self.stacks
            .wait_for_completion(name, self.interval, StackAction::Delete)
            .await
    }
}
