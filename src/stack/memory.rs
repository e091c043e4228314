//! In-process stand-ins for the remote and the clock.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::stack::manager::Clock;
use crate::stack::transport::{
    CreateStackInput, DeleteStackInput, DescribeStacksInput, DescribeStacksOutput,
    StackDescription, StackOutput, StackTransport, TransportError, UpdateStackInput,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    Create(CreateStackInput),
    Update(UpdateStackInput),
    Describe(DescribeStacksInput),
    Delete(DeleteStackInput),
}

#[derive(Debug, Default)]
struct RemoteState {
    stacks: BTreeMap<String, StackDescription>,
    templates: BTreeMap<String, String>,
    describe_script: VecDeque<Result<DescribeStacksOutput, TransportError>>,
    create_failure: Option<TransportError>,
    update_failure: Option<TransportError>,
    delete_failure: Option<TransportError>,
    calls: Vec<TransportCall>,
}

/// Behaves like CloudFormation for a single caller: creates and updates
/// settle immediately, a describe or update of a missing stack answers 400,
/// and an update with an unchanged template answers 400.
///
/// Scripted describe responses are replayed first, in order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStackTransport {
    state: Arc<Mutex<RemoteState>>,
}

impl InMemoryStackTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stack(self, name: &str, status: &str) -> Self {
        self.lock().stacks.insert(
            name.to_string(),
            StackDescription {
                stack_name: name.to_string(),
                stack_status: Some(status.to_string()),
                outputs: Vec::new(),
            },
        );
        self
    }

    pub fn with_outputs(self, name: &str, outputs: &[(&str, &str)]) -> Self {
        if let Some(stack) = self.lock().stacks.get_mut(name) {
            stack.outputs = outputs
                .iter()
                .map(|(key, value)| StackOutput {
                    output_key: key.to_string(),
                    output_value: value.to_string(),
                })
                .collect();
        }
        self
    }

    pub fn script_describe(&self, response: Result<DescribeStacksOutput, TransportError>) {
        self.lock().describe_script.push_back(response);
    }

    /// Scripts one describe response per status, reporting `name` in each.
    pub fn script_statuses(&self, name: &str, statuses: &[&str]) {
        let mut state = self.lock();
        for status in statuses {
            state.describe_script.push_back(Ok(DescribeStacksOutput {
                stacks: vec![StackDescription {
                    stack_name: name.to_string(),
                    stack_status: Some(status.to_string()),
                    outputs: Vec::new(),
                }],
            }));
        }
    }

    pub fn fail_create(&self, err: TransportError) {
        self.lock().create_failure = Some(err);
    }

    pub fn fail_update(&self, err: TransportError) {
        self.lock().update_failure = Some(err);
    }

    pub fn fail_delete(&self, err: TransportError) {
        self.lock().delete_failure = Some(err);
    }

    pub fn describe_all(&self) -> DescribeStacksOutput {
        DescribeStacksOutput {
            stacks: self.lock().stacks.values().cloned().collect(),
        }
    }

    pub fn template_body(&self, name: &str) -> Option<String> {
        self.lock().templates.get(name).cloned()
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.lock().calls.clone()
    }

    pub fn create_calls(&self) -> Vec<CreateStackInput> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                TransportCall::Create(input) => Some(input),
                _ => None,
            })
            .collect()
    }

    pub fn update_calls(&self) -> Vec<UpdateStackInput> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                TransportCall::Update(input) => Some(input),
                _ => None,
            })
            .collect()
    }

    pub fn delete_calls(&self) -> Vec<DeleteStackInput> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                TransportCall::Delete(input) => Some(input),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, RemoteState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn missing(name: &str) -> TransportError {
    TransportError::request_failure(400, format!("Stack with id {name} does not exist"))
}

#[async_trait]
impl StackTransport for InMemoryStackTransport {
    async fn create_stack(&self, input: CreateStackInput) -> Result<(), TransportError> {
        let mut state = self.lock();
        state.calls.push(TransportCall::Create(input.clone()));
        if let Some(err) = state.create_failure.take() {
            return Err(err);
        }
        if state.stacks.contains_key(&input.stack_name) {
            return Err(TransportError::request_failure(
                400,
                format!("Stack [{}] already exists", input.stack_name),
            ));
        }
        state.stacks.insert(
            input.stack_name.clone(),
            StackDescription {
                stack_name: input.stack_name.clone(),
                stack_status: Some("CREATE_COMPLETE".to_string()),
                outputs: Vec::new(),
            },
        );
        state.templates.insert(input.stack_name, input.template_body);
        Ok(())
    }

    async fn update_stack(&self, input: UpdateStackInput) -> Result<(), TransportError> {
        let mut state = self.lock();
        state.calls.push(TransportCall::Update(input.clone()));
        if let Some(err) = state.update_failure.take() {
            return Err(err);
        }
        if state.templates.get(&input.stack_name) == Some(&input.template_body) {
            return Err(TransportError::request_failure(
                400,
                "No updates are to be performed.",
            ));
        }
        let Some(stack) = state.stacks.get_mut(&input.stack_name) else {
            return Err(missing(&input.stack_name));
        };
        stack.stack_status = Some("UPDATE_COMPLETE".to_string());
        state.templates.insert(input.stack_name, input.template_body);
        Ok(())
    }

    async fn describe_stacks(
        &self,
        input: DescribeStacksInput,
    ) -> Result<DescribeStacksOutput, TransportError> {
        let mut state = self.lock();
        state.calls.push(TransportCall::Describe(input.clone()));
        if let Some(response) = state.describe_script.pop_front() {
            return response;
        }
        match input.stack_name {
            Some(name) => state
                .stacks
                .get(&name)
                .cloned()
                .map(|stack| DescribeStacksOutput {
                    stacks: vec![stack],
                })
                .ok_or_else(|| missing(&name)),
            None => Ok(DescribeStacksOutput {
                stacks: state.stacks.values().cloned().collect(),
            }),
        }
    }

    async fn delete_stack(&self, input: DeleteStackInput) -> Result<(), TransportError> {
        let mut state = self.lock();
        state.calls.push(TransportCall::Delete(input.clone()));
        if let Some(err) = state.delete_failure.take() {
            return Err(err);
        }
        state.stacks.remove(&input.stack_name);
        state.templates.remove(&input.stack_name);
        Ok(())
    }
}

/// Returns from every sleep at once, remembering the requested durations.
#[derive(Debug, Clone, Default)]
pub struct RecordingClock {
    sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Clock for RecordingClock {
    async fn sleep(&self, duration: Duration) {
        self.sleeps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(duration);
        tokio::task::yield_now().await;
    }
}
