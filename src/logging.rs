//! Log setup: stdout in the foreground, syslog when daemonised, and a
//! reloadable level filter so the `debug` control topic can flip verbosity
//! on a running gateway.

use std::io::{self, Write};

use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, Registry};

pub struct LogHandle {
    handle: reload::Handle<LevelFilter, Registry>,
}

impl LogHandle {
    pub fn set_debug(&self, on: bool) {
        let level = if on {
            LevelFilter::DEBUG
        } else {
            LevelFilter::INFO
        };
        if self.handle.reload(level).is_ok() {
            tracing::info!(debug = on, "log level changed");
        }
    }
}

pub fn init(verbose: bool, use_syslog: bool) -> LogHandle {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let (filter, handle) = reload::Layer::new(level);

    if use_syslog {
        syslog::open("xcomfortd");
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_ansi(false)
                    .without_time()
                    .with_target(false)
                    .with_writer(SyslogMakeWriter),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }

    LogHandle { handle }
}

#[derive(Clone)]
struct SyslogMakeWriter;

impl<'a> MakeWriter<'a> for SyslogMakeWriter {
    type Writer = SyslogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        SyslogWriter {
            priority: libc::LOG_INFO,
        }
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        let level = *meta.level();
        let priority = if level == Level::ERROR {
            libc::LOG_ERR
        } else if level == Level::WARN {
            libc::LOG_WARNING
        } else {
            libc::LOG_INFO
        };
        SyslogWriter { priority }
    }
}

struct SyslogWriter {
    priority: libc::c_int,
}

impl Write for SyslogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let line = buf.strip_suffix(b"\n").unwrap_or(buf);
        if !line.is_empty() {
            syslog::write(self.priority, line);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

mod syslog {
    use std::ffi::CString;
    use std::sync::OnceLock;

    // openlog keeps the ident pointer, so it has to outlive the process.
    static IDENT: OnceLock<CString> = OnceLock::new();

    pub(super) fn open(ident: &str) {
        let ident = IDENT.get_or_init(|| CString::new(ident).unwrap_or_default());
        unsafe { libc::openlog(ident.as_ptr(), libc::LOG_PID, libc::LOG_DAEMON) };
    }

    pub(super) fn write(priority: libc::c_int, line: &[u8]) {
        // A line with an embedded NUL cannot be forwarded; drop it.
        let Ok(message) = CString::new(line) else {
            return;
        };
        unsafe { libc::syslog(priority, c"%s".as_ptr(), message.as_ptr()) };
    }
}
