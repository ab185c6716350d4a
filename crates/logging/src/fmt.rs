//! logfmt rendering of tracing events.

use std::fmt::Debug;

use tracing::{
    Event,
    field::{Field, Visit},
};

/// One event flattened to strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLog {
    /// `ERROR` through `TRACE`.
    pub level: String,
    /// Event target, usually a module path.
    pub target: String,
    /// The message, then any other fields as `key=value`.
    pub message: String,
}

#[derive(Default)]
struct Collect {
    message: Option<String>,
    pairs: Vec<String>,
}

impl Collect {
    fn push(&mut self, field: &Field, rendered: String) {
        if field.name() == "message" {
            self.message = Some(rendered);
        } else {
            self.pairs.push(format!("{}={}", field.name(), rendered));
        }
    }
}

impl Visit for Collect {
    fn record_str(&mut self, field: &Field, value: &str) {
        let rendered = if field.name() == "message" {
            value.to_owned()
        } else {
            format!("{value:?}")
        };
        self.push(field, rendered);
    }

    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        self.push(field, format!("{value:?}"));
    }
}

/// Flatten `event` into level, target and a single message line.
///
/// String fields other than `message` are quoted; the rest use `Debug`.
pub fn render_event(event: &Event<'_>) -> RenderedLog {
    let mut c = Collect::default();
    event.record(&mut c);
    let message = c
        .message
        .into_iter()
        .chain(c.pairs)
        .collect::<Vec<_>>()
        .join(" ");
    let meta = event.metadata();
    RenderedLog {
        level: meta.level().to_string(),
        target: meta.target().to_owned(),
        message,
    }
}
