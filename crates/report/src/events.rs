//! Observer interface for batch runs.
//!
//! The batch logic never prints. It hands log lines and fractional progress
//! to a `Reporter`, and the caller decides where they go: a test collector,
//! the `log` facade, or a channel drained by another thread.

use std::sync::mpsc::Sender;

/// Severity of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

/// Events emitted during a batch run.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessEvent {
    /// Human-readable progress line.
    Log { level: Level, message: String },
    /// Overall progress in `0.0..=1.0`.
    Progress(f32),
}

/// Receiver of batch events.
pub trait Reporter {
    fn event(&mut self, event: ProcessEvent);

    fn info(&mut self, message: impl Into<String>)
    where
        Self: Sized,
    {
        self.event(ProcessEvent::Log { level: Level::Info, message: message.into() });
    }

    fn warn(&mut self, message: impl Into<String>)
    where
        Self: Sized,
    {
        self.event(ProcessEvent::Log { level: Level::Warn, message: message.into() });
    }

    fn error(&mut self, message: impl Into<String>)
    where
        Self: Sized,
    {
        self.event(ProcessEvent::Log { level: Level::Error, message: message.into() });
    }

    /// Report progress; values are clamped to `0.0..=1.0`.
    fn progress(&mut self, fraction: f32)
    where
        Self: Sized,
    {
        self.event(ProcessEvent::Progress(fraction.clamp(0.0, 1.0)));
    }
}

/// Callback type for receiving batch events.
pub type EventCallback = Box<dyn FnMut(ProcessEvent) + Send>;

impl Reporter for EventCallback {
    fn event(&mut self, event: ProcessEvent) {
        (*self)(event)
    }
}

/// Forwards events to another thread. A dropped receiver is ignored; the
/// run finishes regardless of whether anyone is listening.
impl Reporter for Sender<ProcessEvent> {
    fn event(&mut self, event: ProcessEvent) {
        let _ = self.send(event);
    }
}

/// Forwards log lines to the `log` facade; progress goes to `debug`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn event(&mut self, event: ProcessEvent) {
        match event {
            ProcessEvent::Log { level: Level::Info, message } => log::info!("{message}"),
            ProcessEvent::Log { level: Level::Warn, message } => log::warn!("{message}"),
            ProcessEvent::Log { level: Level::Error, message } => log::error!("{message}"),
            ProcessEvent::Progress(p) => log::debug!("progress {:.0}%", p * 100.0),
        }
    }
}

/// Simple event collector for testing.
#[derive(Debug, Default)]
pub struct EventCollector {
    events: Vec<ProcessEvent>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn events(&self) -> &[ProcessEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Messages logged at `level`, in order.
    pub fn messages(&self, level: Level) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ProcessEvent::Log { level: l, message } if *l == level => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn warnings(&self) -> Vec<&str> {
        self.messages(Level::Warn)
    }

    pub fn errors(&self) -> Vec<&str> {
        self.messages(Level::Error)
    }

    /// Progress values, in order.
    pub fn progress_values(&self) -> Vec<f32> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ProcessEvent::Progress(p) => Some(*p),
                _ => None,
            })
            .collect()
    }
}

impl Reporter for EventCollector {
    fn event(&mut self, event: ProcessEvent) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_collector_filters_by_level() {
        let mut collector = EventCollector::new();
        collector.info("loaded");
        collector.warn("Date not in calendar: 05-05-2026 (Cube 2)");
        collector.progress(0.4);
        collector.error("boom");
        collector.progress(3.0);

        assert_eq!(collector.len(), 5);
        assert_eq!(collector.messages(Level::Info), vec!["loaded"]);
        assert_eq!(collector.warnings(), vec!["Date not in calendar: 05-05-2026 (Cube 2)"]);
        assert_eq!(collector.errors(), vec!["boom"]);
        assert_eq!(collector.progress_values(), vec![0.4, 1.0]);
    }

    #[test]
    fn test_sender_reporter() {
        let (mut tx, rx) = mpsc::channel::<ProcessEvent>();
        tx.info("hello");
        tx.progress(0.5);
        drop(tx);

        let events: Vec<ProcessEvent> = rx.iter().collect();
        assert_eq!(
            events,
            vec![
                ProcessEvent::Log { level: Level::Info, message: "hello".to_string() },
                ProcessEvent::Progress(0.5),
            ]
        );
    }

    #[test]
    fn test_sender_ignores_dropped_receiver() {
        let (mut tx, rx) = mpsc::channel::<ProcessEvent>();
        drop(rx);
        tx.warn("nobody listening");
    }

    #[test]
    fn test_callback_reporter() {
        let (tx, rx) = mpsc::channel();
        let mut callback: EventCallback = Box::new(move |event| {
            let _ = tx.send(event);
        });
        callback.progress(0.25);
        drop(callback);
        assert_eq!(rx.recv().unwrap(), ProcessEvent::Progress(0.25));
    }
}
