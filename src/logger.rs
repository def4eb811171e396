use {
    log::{Level, Log, Metadata, Record},
    std::{
        io::Write,
        sync::{
            Arc,
            atomic::{AtomicU32, Ordering::Relaxed},
        },
        time::SystemTime,
    },
};

pub struct Logger {
    level: AtomicU32,
}

impl Logger {
    pub fn install_stderr(level: Level) -> Arc<Self> {
        let slf = Arc::new(Self {
            level: AtomicU32::new(level as _),
        });
        let res = log::set_boxed_logger(Box::new(LogWrapper {
            logger: slf.clone(),
        }));
        if res.is_ok() {
            log::set_max_level(level.to_level_filter());
        }
        slf
    }
}

struct LogWrapper {
    logger: Arc<Logger>,
}

impl Log for LogWrapper {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() as u32 <= self.logger.level.load(Relaxed)
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut buffer = vec![];
        let now = SystemTime::now();
        let _ = if let Some(mp) = record.module_path() {
            writeln!(
                buffer,
                "[{} {:5} {}] {}",
                humantime::format_rfc3339_millis(now),
                record.level(),
                mp,
                record.args(),
            )
        } else {
            writeln!(
                buffer,
                "[{} {:5}] {}",
                humantime::format_rfc3339_millis(now),
                record.level(),
                record.args(),
            )
        };
        let _ = std::io::stderr().lock().write_all(&buffer);
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}
