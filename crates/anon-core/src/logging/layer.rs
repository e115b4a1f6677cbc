//! Custom tracing layer for JSONL output.
//!
//! Produces one JSON object per event on stderr, keeping stdout clean for
//! command payloads. Request correlation (`request_id`, `stage`) is lifted
//! from enclosing spans onto every event.

use std::io::{self, Write};
use std::sync::Mutex;

use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use super::events::Level;

/// Correlation fields stored on spans.
#[derive(Debug, Clone, Default)]
struct SpanContext {
    request_id: Option<String>,
    stage: Option<String>,
}

impl SpanContext {
    fn fill_from(&mut self, other: &SpanContext) {
        if self.request_id.is_none() {
            self.request_id.clone_from(&other.request_id);
        }
        if self.stage.is_none() {
            self.stage.clone_from(&other.stage);
        }
    }
}

impl Visit for SpanContext {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "request_id" => self.request_id = Some(value.to_string()),
            "stage" => self.stage = Some(value.to_string()),
            _ => {}
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        match field.name() {
            "request_id" => self.request_id = Some(format!("{:?}", value)),
            "stage" => self.stage = Some(format!("{:?}", value)),
            _ => {}
        }
    }
}

/// Extracts event fields into a JSON map.
#[derive(Default)]
struct JsonFieldVisitor {
    fields: Map<String, Value>,
    message: Option<String>,
    event: Option<String>,
}

impl JsonFieldVisitor {
    fn put_string(&mut self, field: &Field, value: String) {
        match field.name() {
            "message" => self.message = Some(value),
            "event" => self.event = Some(value),
            name => {
                self.fields.insert(name.to_string(), Value::String(value));
            }
        }
    }
}

impl Visit for JsonFieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.put_string(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.put_string(field, format!("{:?}", value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), json!(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), json!(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        if let Some(n) = serde_json::Number::from_f64(value) {
            self.fields.insert(field.name().to_string(), Value::Number(n));
        }
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), Value::Bool(value));
    }
}

/// JSONL tracing layer.
pub struct JsonlLayer<W = io::Stderr> {
    writer: Mutex<W>,
}

impl JsonlLayer<io::Stderr> {
    /// Create a new JSONL layer writing to stderr.
    pub fn stderr() -> Self {
        JsonlLayer {
            writer: Mutex::new(io::stderr()),
        }
    }
}

impl<W: Write> JsonlLayer<W> {
    /// Create a new JSONL layer with a custom writer.
    pub fn new(writer: W) -> Self {
        JsonlLayer {
            writer: Mutex::new(writer),
        }
    }
}

impl<S, W> Layer<S> for JsonlLayer<W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: Write + 'static,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut context = SpanContext::default();
        attrs.record(&mut context);

        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(context);
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let ts = Utc::now();

        // Innermost span wins.
        let mut context = SpanContext::default();
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope {
                if let Some(span_ctx) = span.extensions().get::<SpanContext>() {
                    context.fill_from(span_ctx);
                }
            }
        }

        let mut visitor = JsonFieldVisitor::default();
        event.record(&mut visitor);

        let metadata = event.metadata();
        let level: Level = (*metadata.level()).into();
        let mut obj = Map::new();

        obj.insert("ts".to_string(), json!(ts.to_rfc3339()));
        obj.insert("level".to_string(), json!(level));
        obj.insert(
            "event".to_string(),
            json!(visitor.event.as_deref().unwrap_or(metadata.target())),
        );
        obj.insert("target".to_string(), json!(metadata.target()));

        if let Some(id) = context.request_id {
            obj.insert("request_id".to_string(), json!(id));
        }
        if let Some(stage) = context.stage {
            obj.insert("stage".to_string(), json!(stage));
        }
        if let Some(msg) = visitor.message {
            obj.insert("message".to_string(), json!(msg));
        }
        if !visitor.fields.is_empty() {
            obj.insert("fields".to_string(), Value::Object(visitor.fields));
        }

        let line = serde_json::to_string(&Value::Object(obj)).unwrap_or_default();
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
        }
    }
}
