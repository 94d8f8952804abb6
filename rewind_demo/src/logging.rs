use once_cell::sync::OnceCell;
use std::{fmt, fs, io::Write, path::Path, sync::Mutex};
use tracing::{
    field::{Field, Visit},
    Event, Level, Subscriber,
};
use tracing_log::LogTracer;
use tracing_subscriber::{
    layer::Context, prelude::__tracing_subscriber_SubscriberExt, registry::LookupSpan, Layer,
};

static LOG_FILE: OnceCell<Mutex<fs::File>> = OnceCell::new();

/// Route `tracing` and `log` output to stderr and, optionally, a log file.
///
/// Events more verbose than `max_level` are dropped.
pub fn init(log_file_path: Option<&Path>, max_level: Level) -> std::io::Result<()> {
    if let Some(path) = log_file_path {
        let log_file = fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)?;
        LOG_FILE
            .set(Mutex::new(log_file))
            .expect("called logging::init more than once");
    }

    LogTracer::init().expect("failed to install log bridge");
    tracing::subscriber::set_global_default(
        tracing_subscriber::Registry::default().with(LogLayer { max_level }),
    )
    .expect("failed to install tracing subscriber");
    Ok(())
}

fn print_to_log_file(line: &str) {
    if let Some(log_file) = LOG_FILE.get() {
        let mut log_file = log_file.lock().unwrap();
        writeln!(log_file, "{}", line).expect("failed to write to log file");
        log_file.flush().expect("failed to flush log file");
    }
}

fn format_line(level: Level, message: &str) -> String {
    let timestamp = chrono::Local::now()
        .format("%Y-%m-%d %H:%M:%S%.3f")
        .to_string();
    format!("[{}] [{}] {}", timestamp, level, message)
}

struct LogLayer {
    max_level: Level,
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    log_target: Option<String>,
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "log.target" {
            self.log_target = Some(value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        }
    }
}

impl<S> Layer<S> for LogLayer
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if *metadata.level() > self.max_level {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let span = if let Some(scope) = ctx.event_scope(event) {
            format!(
                "[{}] ",
                scope
                    .from_root()
                    .map(|span| span.name())
                    .collect::<Vec<_>>()
                    .join(".")
            )
        } else {
            String::new()
        };

        let target = visitor
            .log_target
            .unwrap_or_else(|| metadata.target().to_string());

        let line = format_line(
            *metadata.level(),
            &format!("{}[{}] {}", span, target, visitor.message),
        );
        eprintln!("{}", line);
        print_to_log_file(&line);
    }
}
