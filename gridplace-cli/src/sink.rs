use std::{
    fmt,
    io::{self, Write},
    sync::Mutex,
};

use gridplace_contracts::EventSink;
use gridplace_model::PluginEvent;
use serde::Serialize;
use tracing::warn;

/// Writes every event as one JSON object per line.
pub struct JsonLinesSink<W> {
    out: Mutex<W>,
}

impl<W> fmt::Debug for JsonLinesSink<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonLinesSink")
            .field("writer", &std::any::type_name::<W>())
            .finish()
    }
}

impl JsonLinesSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Write any serializable value on its own line.
    pub fn write_line<T: Serialize>(&self, value: &T) -> io::Result<()> {
        let mut out = self
            .out
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        serde_json::to_writer(&mut *out, value)?;
        out.write_all(b"\n")?;
        out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write + Send> EventSink for JsonLinesSink<W> {
    fn emit(&self, event: PluginEvent) {
        if let Err(err) = self.write_line(&event) {
            warn!("[sink] Failed to write event: {}", err);
        }
    }
}
