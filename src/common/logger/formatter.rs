use core::fmt::{self as core_fmt, Write as _};

use time::{OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    fmt::{
        FmtContext,
        format::{FormatEvent, FormatFields, Writer},
    },
    registry::LookupSpan,
};

const TIMESTAMP: &[BorrowedFormatItem<'static>] =
    format_description!("[hour]:[minute]:[second].[subsecond digits:3]");

const RESET: &str = "\x1b[0m";
const DIM: &str = "\x1b[2m";

/// Single-line event format: `hh:mm:ss.mmm LEVEL module:line > message`.
///
/// Events from this crate drop the `lavabridge::` prefix so node and manager
/// lines stay short next to the host bot's own output.
pub struct LineFormatter {
    ansi: bool,
}

impl LineFormatter {
    pub fn new(ansi: bool) -> Self {
        Self { ansi }
    }

    fn paint(&self, writer: &mut Writer<'_>, colour: &str, text: &str) -> core_fmt::Result {
        if self.ansi {
            write!(writer, "{}{}{}", colour, text, RESET)
        } else {
            writer.write_str(text)
        }
    }
}

fn level_colour(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "\x1b[1;31m",
        Level::WARN => "\x1b[1;33m",
        Level::INFO => "\x1b[1;32m",
        Level::DEBUG => "\x1b[1;34m",
        Level::TRACE => "\x1b[1;35m",
    }
}

fn short_target(target: &str) -> &str {
    target
        .strip_prefix(concat!(env!("CARGO_CRATE_NAME"), "::"))
        .unwrap_or(target)
}

impl<S, N> FormatEvent<S, N> for LineFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> core_fmt::Result {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        let timestamp = now.format(TIMESTAMP).unwrap_or_default();
        self.paint(&mut writer, DIM, &timestamp)?;
        writer.write_char(' ')?;

        let metadata = event.metadata();
        let level = format!("{: <5}", metadata.level().as_str());
        self.paint(&mut writer, level_colour(metadata.level()), &level)?;
        writer.write_char(' ')?;

        let location = match metadata.line() {
            Some(line) => format!("{}:{}", short_target(metadata.target()), line),
            None => short_target(metadata.target()).to_string(),
        };
        self.paint(&mut writer, DIM, &location)?;
        writer.write_str(" > ")?;

        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
