use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

use common::configuration::Logging;
use time::macros::format_description;
use tracing::{Event, Subscriber};
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::fmt::{
    format, time::FormatTime, FmtContext, FormatEvent, FormatFields, FormattedFields,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const FILE_FIELD: &str = "file=";

struct BracketedTime;

impl FormatTime for BracketedTime {
    fn format_time(&self, w: &mut format::Writer<'_>) -> fmt::Result {
        let now = time::OffsetDateTime::now_utc();
        let stamp = now
            .format(&format_description!(
                "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
            ))
            .map_err(|_| fmt::Error)?;
        write!(w, "[{}]", stamp)
    }
}

struct BracketedFormatter;

impl<S, N> FormatEvent<S, N> for BracketedFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        BracketedTime.format_time(&mut writer)?;

        write!(
            writer,
            "[{}]",
            event.metadata().level().to_string().to_lowercase()
        )?;

        // Innermost batch span names the input file.
        if let Some(scope) = ctx.event_scope() {
            for span in scope {
                let extensions = span.extensions();
                if let Some(file) = extensions
                    .get::<FormattedFields<N>>()
                    .and_then(|fields| batch_file(fields.fields.as_str()))
                {
                    write!(writer, " file={}", file)?;
                    break;
                }
            }
        }

        write!(writer, " ")?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

fn batch_file(fields: &str) -> Option<&str> {
    let start = fields.find(FILE_FIELD)?;
    let rest = &fields[start + FILE_FIELD.len()..];
    let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    Some(&rest[..end])
}

fn file_appender(path: &Path) -> Result<RollingFileAppender, InitError> {
    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "annotator.log".to_string());

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(directory)
}

static INIT_LOGGER: OnceLock<()> = OnceLock::new();

/// Installs the global subscriber once: bracketed lines on stderr and,
/// when configured, a copy appended to a log file. `RUST_LOG` overrides
/// the default `info` filter.
pub fn init_tracer(logging: Option<&Logging>) {
    INIT_LOGGER.get_or_init(|| {
        let log_file = logging.and_then(|l| l.file.as_deref());
        eprintln!("initializing logging: log_file={:?}", log_file);

        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let stderr_layer = tracing_subscriber::fmt::layer()
            .event_format(BracketedFormatter)
            .fmt_fields(format::DefaultFields::new())
            .with_writer(std::io::stderr)
            .with_ansi(false);

        let file_layer = log_file.and_then(|path| match file_appender(path) {
            Ok(appender) => Some(
                tracing_subscriber::fmt::layer()
                    .event_format(BracketedFormatter)
                    .fmt_fields(format::DefaultFields::new())
                    .with_writer(appender)
                    .with_ansi(false),
            ),
            Err(e) => {
                eprintln!("cannot open log file {}: {}", path.display(), e);
                None
            }
        });

        if let Err(e) = tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .try_init()
        {
            eprintln!("logging already initialized: {}", e);
        }
    });
}
