use core::fmt;
use std::fs::OpenOptions;
use std::sync::Once;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::{self, FormatEvent, FormatFields};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt as tracingfmt, EnvFilter};

#[macro_export]
macro_rules! unimplemented_log {
    ( $($arg:tt)* ) => {{
        tracing::warn!(
            "unimplemented: {}",
            format_args!($($arg)*),
        );
    }};
}

/// if `cond` is false, logs a warning with your message.
#[macro_export]
macro_rules! assert_warn {
    ($cond:expr, $($arg:tt)+) => {{
        if !$cond {
            tracing::warn!(
                target: module_path!(),
                "assertion warning: `{}` failed: {} at {}:{}",
                stringify!($cond),
                format_args!($($arg)+),
                file!(),
                line!(),
            );
        }
    }};
}

struct AlignedFormatter;

/// Pulls the optional `port` field out of an event so it can be shown in the prefix
struct PortVisitor {
    port: Option<String>,
}

impl tracing::field::Visit for PortVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        if field.name() == "port" {
            self.port = Some(format!("p{:?}", value));
        }
    }
}

impl<S, N> FormatEvent<S, N> for AlignedFormatter
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();

        let mut visitor = PortVisitor { port: None };
        event.record(&mut visitor);
        let has_port = visitor.port.is_some();
        let port_str = visitor.port.unwrap_or_else(|| "   ".to_string());

        let (color_level, color_reset) = match *metadata.level() {
            tracing::Level::ERROR => ("\x1b[31m", "\x1b[0m"),
            tracing::Level::WARN => ("\x1b[33m", "\x1b[0m"),
            tracing::Level::INFO => ("\x1b[32m", "\x1b[0m"),
            tracing::Level::DEBUG => ("\x1b[34m", "\x1b[0m"),
            tracing::Level::TRACE => ("\x1b[35m", "\x1b[0m"),
        };

        // "crates/isdn-entities/src/manager/dispatch.rs" becomes "p1 [entities/manager] dispatch.rs"
        let file_path = metadata.file().unwrap_or("unknown");
        let formatted_path = if let Some(src_idx) = file_path.find("/src/") {
            let before_src = &file_path[..src_idx];
            let after_src = &file_path[src_idx + 5..];

            let crate_name = if let Some(isdn_idx) = before_src.rfind("isdn-") {
                &before_src[isdn_idx + 5..]
            } else {
                before_src.rsplit('/').next().unwrap_or("unknown")
            };

            if let Some(last_slash) = after_src.rfind('/') {
                let module_path = &after_src[..last_slash];
                let filename = &after_src[last_slash + 1..];
                let first_module = module_path.split('/').next().unwrap_or("");
                format!("{} [{}/{}] {}", port_str, crate_name, first_module, filename)
            } else {
                format!("{} [{}] {}", port_str, crate_name, after_src)
            }
        } else {
            file_path.to_string()
        };

        // Format: "LEVEL port [module] file:line: message"
        let location = format!(
            "{}{:<5}{} {}:{}:",
            color_level,
            metadata.level(),
            color_reset,
            formatted_path,
            metadata.line().unwrap_or(0)
        );

        let mut message_buf = String::new();
        let message_writer = format::Writer::new(&mut message_buf);
        ctx.field_format().format_fields(message_writer, event)?;

        // The port already sits in the prefix
        if has_port {
            if let Some(port_idx) = message_buf.find("port=") {
                if let Some(space_idx) = message_buf[port_idx..].find(' ') {
                    message_buf.replace_range(port_idx..port_idx + space_idx + 1, "");
                } else {
                    message_buf.truncate(port_idx);
                }
            }
        }

        // Frames travelling up or down get a slightly shorter indent
        let mut padding = 64;
        if message_buf.starts_with("->") || message_buf.starts_with("<-") {
            padding -= 3;
        }

        write!(writer, "{:<width$} {}", location, message_buf, width = padding)?;
        writeln!(writer)
    }
}

static INIT_LOG: Once = Once::new();

/// Sets up logging with maximum verbosity (trace level)
/// Mainly for unit tests
pub fn setup_logging_verbose() {
    let stdout_filter = EnvFilter::new("trace");
    setup_logging(stdout_filter, None);
}

/// Sets up default logging to stdout and optionally, a verbose log file
/// Returns a guard, that needs to be kept alive for logging to file to work
pub fn setup_logging_default(verbose_logfile: Option<String>) -> Option<WorkerGuard> {
    let stdout_filter = get_default_stdout_filter();
    let logfile_and_filter = verbose_logfile.map(|file| (file, get_default_logfile_filter()));
    setup_logging(stdout_filter, logfile_and_filter)
}

pub fn get_default_filter() -> EnvFilter {
    EnvFilter::new("info")
}

pub fn get_default_stdout_filter() -> EnvFilter {
    let directives = [
        // Byte-level codecs are chatty
        "isdn_core::asn1=warn",
        "isdn_core::bytecursor=warn",
        "isdn_pdus::ies=info",
        "isdn_pdus::facility=info",

        // Message table and call handling
        "isdn_pdus::messages=debug",
        "isdn_entities::manager=debug",
        "isdn_entities::stack=debug",
        "isdn_entities::workers=info",
        "isdn_entities::transport=info",
    ];

    let mut filter = get_default_filter();
    for directive in directives {
        if let Ok(d) = directive.parse() {
            filter = filter.add_directive(d);
        }
    }
    filter
}

fn get_default_logfile_filter() -> EnvFilter {
    EnvFilter::new("trace")
}

/// Installs the global subscriber once: stdout, plus a non-blocking file writer when
/// `outfile` names a file that can be opened. The returned guard flushes the file on drop.
fn setup_logging(stdout_filter: EnvFilter, outfile: Option<(String, EnvFilter)>) -> Option<WorkerGuard> {
    let file = outfile.and_then(|(path, filter)| match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(f) => Some((f, filter)),
        Err(e) => {
            eprintln!("Failed to open log file {}: {}", path, e);
            None
        }
    });

    let (file_layer, guard) = match file {
        Some((f, filter)) => {
            let (writer, guard) = tracing_appender::non_blocking(f);
            let layer = tracingfmt::layer()
                .event_format(AlignedFormatter)
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(filter);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    INIT_LOG.call_once(|| {
        let stdout_layer = tracingfmt::layer().event_format(AlignedFormatter).with_filter(stdout_filter);
        tracing_subscriber::registry().with(file_layer).with(stdout_layer).init();
    });
    guard
}
