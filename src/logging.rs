use log::Level;

/// Destination for leveled diagnostic messages.
///
/// Every validation and feature function takes a sink explicitly. The sink
/// only receives side-channel text; return values never depend on it.
pub trait LogSink {
    fn log(&self, level: Level, message: &str);

    fn debug(&self, message: &str) {
        self.log(Level::Debug, message);
    }

    fn info(&self, message: &str) {
        self.log(Level::Info, message);
    }

    fn warn(&self, message: &str) {
        self.log(Level::Warn, message);
    }
}

/// Discards every message
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl LogSink for NoopSink {
    fn log(&self, _level: Level, _message: &str) {}
}

/// Forwards messages to the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct StdLogSink;

impl LogSink for StdLogSink {
    fn log(&self, level: Level, message: &str) {
        log::log!(target: "churn_eda", level, "{}", message);
    }
}

#[cfg(test)]
pub(crate) use memory::MemorySink;


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_collects_warnings() {
        let sink = MemorySink::default();
        sink.info("loaded");
        sink.warn("column 'x' not found");
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.warnings(), vec!["column 'x' not found".to_string()]);
    }

    #[test]
    fn test_noop_sink_accepts_everything() {
        let sink = NoopSink;
        sink.debug("ignored");
        sink.warn("ignored");
    }
}
