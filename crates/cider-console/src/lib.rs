//! Colorful console output for JIT compilation events.
//!
//! Provides a custom `tracing` layer that formats compile lifecycle events
//! emitted by `cider_jitlib` with colors.
//!
//! ## Log Levels
//!
//! - **INFO**: Lifecycle events (compile start/end)
//! - **ERROR**: Aborted compilations
//! - **DEBUG**: Variable declarations and IR dumps
//! - **TRACE**: Individual instruction emissions

use owo_colors::OwoColorize;
use std::io::{self, Write};
use std::sync::OnceLock;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

static INIT: OnceLock<()> = OnceLock::new();

const DEFAULT_DIRECTIVE: &str = "cider_jitlib=info";

/// Initializes console output for JIT compilation.
///
/// Safe to call multiple times - only the first call has effect. The filter
/// honours `RUST_LOG` and defaults to `cider_jitlib=info`.
pub fn init() {
    INIT.get_or_init(|| {
        let directives = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();

        let _ = tracing_subscriber::registry()
            .with(env_filter(&directives))
            .with(CodegenConsoleLayer)
            .try_init();
    });
}

fn env_filter(directives: &str) -> EnvFilter {
    let builder = EnvFilter::builder();
    let builder = match DEFAULT_DIRECTIVE.parse() {
        Ok(directive) => builder.with_default_directive(directive),
        Err(_) => builder,
    };
    builder.parse_lossy(directives)
}

/// A tracing layer that formats compile events with colors.
pub struct CodegenConsoleLayer;

impl<S: Subscriber> Layer<S> for CodegenConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if !event.metadata().target().starts_with("cider_jitlib") {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let output = format_event(&visitor);
        if !output.is_empty() {
            let _ = writeln!(io::stdout(), "{}", output);
        }
    }
}

#[derive(Debug, Default)]
struct EventVisitor {
    event: Option<String>,
    function: Option<String>,
    error: Option<String>,
    param_count: Option<u64>,
    code_size: Option<u64>,
    duration_us: Option<u64>,
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let s = format!("{:?}", value);
        let s = s.trim_matches('"').to_string();
        match field.name() {
            "event" => self.event = Some(s),
            "function" => self.function = Some(s),
            "error" => self.error = Some(s),
            _ => {}
        }
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        match field.name() {
            "param_count" => self.param_count = Some(value),
            "code_size" => self.code_size = Some(value),
            "duration_us" => self.duration_us = Some(value),
            _ => {}
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_u64(field, value as u64);
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "event" => self.event = Some(value.to_string()),
            "function" => self.function = Some(value.to_string()),
            "error" => self.error = Some(value.to_string()),
            _ => {}
        }
    }
}

fn format_event(v: &EventVisitor) -> String {
    match v.event.as_deref().unwrap_or("") {
        "compile_start" => format_compile_start(v),
        "compile_end" => format_compile_end(v),
        "compile_abort" => format_compile_abort(v),
        _ => String::new(),
    }
}

fn format_compile_start(v: &EventVisitor) -> String {
    let function = v.function.as_deref().unwrap_or("<anonymous>");
    format!(
        "{} Compiling {} │ {} params",
        "▶".bright_green().bold(),
        function.white().bold(),
        v.param_count.unwrap_or(0).bright_yellow()
    )
}

fn format_compile_end(v: &EventVisitor) -> String {
    let function = v.function.as_deref().unwrap_or("<anonymous>");
    format!(
        "{} Compiled {} │ {} bytes │ {}",
        "■".bright_cyan().bold(),
        function.white().bold(),
        v.code_size.unwrap_or(0).bright_magenta(),
        format_duration_us(v.duration_us.unwrap_or(0)).yellow()
    )
}

fn format_compile_abort(v: &EventVisitor) -> String {
    let function = v.function.as_deref().unwrap_or("<anonymous>");
    let error = v.error.as_deref().unwrap_or("unknown error");
    format!(
        "{} Aborted {} │ {}",
        "✗".bright_red().bold(),
        function.white().bold(),
        error.bright_red()
    )
}

fn format_duration_us(us: u64) -> String {
    if us < 1_000 {
        format!("{us}µs")
    } else if us < 1_000_000 {
        format!("{:.2}ms", us as f64 / 1_000.0)
    } else {
        format!("{:.2}s", us as f64 / 1_000_000.0)
    }
}
