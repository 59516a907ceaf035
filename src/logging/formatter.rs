use std::fmt;
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::{format::Writer, FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// Wraps each field of a log line in brackets
/// Format: [TIMESTAMP] [LEVEL] [THREAD] [SPAN] [TARGET: FILE:LINE]: MESSAGE
///
/// Watcher callbacks, settings writes and upload workers run off the UI
/// thread, so the thread name is part of every line.
pub struct BracketedFormatter;

impl<S, N> FormatEvent<S, N> for BracketedFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();

        let now = chrono::Local::now();
        write!(writer, "[{}]  ", now.format("%Y-%m-%dT%H:%M:%S%.6f"))?;
        write!(writer, "[{:5}] ", metadata.level())?;

        let thread = std::thread::current();
        write!(writer, "[{}] ", thread.name().unwrap_or("worker"))?;

        // Innermost span if any, else the last segment of the target
        let scope_name = match ctx.event_scope() {
            Some(scope) => scope.from_root().last().map(|span| span.name()),
            None => metadata.target().rsplit("::").next(),
        };
        write!(writer, "[{}] ", scope_name.unwrap_or("unknown"))?;

        match (metadata.file(), metadata.line()) {
            (Some(file), Some(line)) => {
                write!(writer, "[{}: {}:{}]: ", metadata.target(), file, line)?
            }
            _ => write!(writer, "[{}]: ", metadata.target())?,
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
