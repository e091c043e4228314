//! Operator-facing progress reporting.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{info, trace};

/// Receives lifecycle progress from the managers.
pub trait EventSink: Send + Sync {
    /// A new step in the workflow.
    fn step(&self, message: &str);
    /// One poll of a long-running wait.
    fn dot(&self);
    fn println(&self, message: &str);
}

/// Forwards every event to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn step(&self, message: &str) {
        info!(target: "bbl::step", "step: {message}");
    }

    fn dot(&self) {
        trace!(target: "bbl::step", "waiting");
    }

    fn println(&self, message: &str) {
        info!(target: "bbl::step", "{message}");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Step(String),
    Dot,
    Println(String),
}

/// Keeps events in memory for later inspection.
#[derive(Debug, Clone, Default)]
pub struct RecordingEventSink {
    events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn steps(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Step(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn dots(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| **event == Event::Dot)
            .count()
    }

    fn push(&self, event: Event) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl EventSink for RecordingEventSink {
    fn step(&self, message: &str) {
        self.push(Event::Step(message.to_string()));
    }

    fn dot(&self) {
        self.push(Event::Dot);
    }

    fn println(&self, message: &str) {
        self.push(Event::Println(message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sink_keeps_order() {
        let sink = RecordingEventSink::new();
        sink.step("creating stack");
        sink.dot();
        sink.dot();
        sink.println("done");
        assert_eq!(
            sink.events(),
            vec![
                Event::Step("creating stack".into()),
                Event::Dot,
                Event::Dot,
                Event::Println("done".into()),
            ]
        );
        assert_eq!(sink.dots(), 2);
        assert_eq!(sink.steps(), ["creating stack"]);
    }
}
