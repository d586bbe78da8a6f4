use std::fmt::{self, Write};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::registry::Registry;

/// Receives one formatted log line.
pub type Sink = fn(Level, &str);

/// Forwards `tracing` events to a sink, by default the browser console.
pub struct ConsoleLayer {
    sink: Sink,
}

impl ConsoleLayer {
    pub fn new() -> Self {
        Self::with_sink(to_console)
    }

    pub fn with_sink(sink: Sink) -> Self {
        Self { sink }
    }
}

impl Default for ConsoleLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Subscriber> Layer<S> for ConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut line = LineVisitor::default();
        event.record(&mut line);

        let mut text = format!("[{}] {}", metadata.target(), line.message);
        for field in &line.fields {
            let _ = write!(text, " {field}");
        }
        (self.sink)(*metadata.level(), &text);
    }
}

#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: Vec<String>,
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push(format!("{}={value}", field.name()));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields.push(format!("{}={value:?}", field.name()));
        }
    }
}

fn to_console(level: Level, line: &str) {
    match level {
        Level::ERROR => gloo::console::error!(line),
        Level::WARN => gloo::console::warn!(line),
        Level::INFO => gloo::console::info!(line),
        _ => gloo::console::debug!(line),
    }
}

/// Installs the console subscriber for the whole app. Call once, first thing in `main`.
pub fn init(max_level: Level) {
    let subscriber = Registry::default()
        .with(LevelFilter::from_level(max_level))
        .with(ConsoleLayer::new());

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        gloo::console::warn!("a log subscriber is already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    thread_local! {
        static LINES: RefCell<Vec<(Level, String)>> = const { RefCell::new(Vec::new()) };
    }

    fn record(level: Level, line: &str) {
        LINES.with(|lines| lines.borrow_mut().push((level, line.to_string())));
    }

    fn captured(max_level: Level, log: impl FnOnce()) -> Vec<(Level, String)> {
        LINES.with(|lines| lines.borrow_mut().clear());
        let subscriber = Registry::default()
            .with(LevelFilter::from_level(max_level))
            .with(ConsoleLayer::with_sink(record));
        tracing::subscriber::with_default(subscriber, log);
        LINES.with(|lines| lines.borrow().clone())
    }

    #[test]
    fn test_event_forwarded_with_fields() {
        let lines = captured(Level::INFO, || {
            tracing::warn!(target: "gateway", key = %"[\"metrics\"]", "query failed: timeout");
        });

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].0, Level::WARN);
        assert_eq!(lines[0].1, "[gateway] query failed: timeout key=[\"metrics\"]");
    }

    #[test]
    fn test_events_below_level_dropped() {
        let lines = captured(Level::INFO, || {
            tracing::debug!("sending request");
            tracing::error!("failed to start");
        });

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].0, Level::ERROR);
        assert!(lines[0].1.ends_with("failed to start"));
    }
}
