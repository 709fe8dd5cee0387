//! Routes `log` records to the host's driver log.

use crate::host::DriverLog;
use log::{LevelFilter, Log, Metadata, Record};
use simplelog::{CombinedLogger, Config, SharedLogger};
use std::fmt;
use std::sync::{Arc, Mutex, Once};

type SinkSlot = Mutex<Option<Arc<dyn DriverLog>>>;

static SINK: SinkSlot = Mutex::new(None);
static INSTALL: Once = Once::new();

const LOG_PREFIX: &str = "driver_faceless";

/// Binds the host sink. The global logger is installed on the first call only,
/// later calls just swap the sink.
pub fn init_driver_log(sink: Arc<dyn DriverLog>) {
    *lock(&SINK) = Some(sink);
    INSTALL.call_once(|| {
        let logger = HostLogger::new(LevelFilter::Debug, &SINK);
        if let Err(error) = CombinedLogger::init(vec![Box::new(logger) as Box<dyn SharedLogger>]) {
            // another logger owns the facade, records will not reach the host
            forward(&SINK, format_args!("logging unavailable: {}", error));
        }
    });
}

pub fn cleanup_driver_log() {
    *lock(&SINK) = None;
}

fn lock(slot: &SinkSlot) -> std::sync::MutexGuard<'_, Option<Arc<dyn DriverLog>>> {
    match slot.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Writes one prefixed line to the bound sink, if any.
fn forward(slot: &SinkSlot, message: fmt::Arguments<'_>) {
    // clone out so the sink never runs under our lock
    let sink = lock(slot).clone();
    if let Some(sink) = sink {
        sink.log(&format!("{}: {}\n", LOG_PREFIX, message));
    }
}

struct HostLogger {
    level: LevelFilter,
    config: Config,
    sink: &'static SinkSlot,
}

impl HostLogger {
    fn new(level: LevelFilter, sink: &'static SinkSlot) -> Self {
        Self {
            level,
            config: Config::default(),
            sink,
        }
    }
}

impl Log for HostLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        forward(self.sink, *record.args());
    }

    fn flush(&self) {}
}

impl SharedLogger for HostLogger {
    fn level(&self) -> LevelFilter {
        self.level
    }

    fn config(&self) -> Option<&Config> {
        Some(&self.config)
    }

    fn as_log(self: Box<Self>) -> Box<dyn Log> {
        Box::new(*self)
    }
}
