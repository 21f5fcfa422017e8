use std::fs::{File, OpenOptions};
use std::io::Write;

use chrono::Utc;
use serde_json::{Value, json};
use tracing::warn;

pub enum MessageLogMode {
    Full,
    /// Mask credential material (password, token) before writing.
    Redacted,
}

const SENSITIVE_KEYS: &[&str] = &["password", "token"];
const MASK: &str = "***";

pub(crate) struct MessageLogger {
    mode: MessageLogMode,
    file: File,
}

impl MessageLogger {
    pub fn new(mode: MessageLogMode, path: &str) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { mode, file })
    }

    pub fn log_operation(&mut self, operation: &str, variables: &Value) {
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "req",
            "op": operation,
            "variables": self.filter(variables),
        });
        self.write_line(&entry);
    }

    pub fn log_response(&mut self, operation: &str, body: &Value) {
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "resp",
            "op": operation,
            "body": self.filter(body),
        });
        self.write_line(&entry);
    }

    fn filter(&self, value: &Value) -> Value {
        match self.mode {
            MessageLogMode::Full => value.clone(),
            MessageLogMode::Redacted => redact(value),
        }
    }

    fn write_line(&mut self, entry: &Value) {
        if let Ok(line) = serde_json::to_string(entry)
            && let Err(e) = writeln!(self.file, "{line}")
        {
            warn!("failed to write log entry: {e}");
        }
    }
}

fn redact(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let filtered = map
                .iter()
                .map(|(k, v)| {
                    if SENSITIVE_KEYS.contains(&k.as_str()) {
                        (k.clone(), Value::String(MASK.to_string()))
                    } else {
                        (k.clone(), redact(v))
                    }
                })
                .collect();
            Value::Object(filtered)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact).collect()),
        other => other.clone(),
    }
}
