//! JSON output formatting

use serde_json::{json, Value};

use crate::engine::RunReport;

pub fn format_json(report: &RunReport) -> String {
    let mut data: Value = serde_json::to_value(report).unwrap_or(json!(null));
    if let Value::Object(map) = &mut data {
        map.insert("duration_ms".to_string(), json!(report.duration().num_milliseconds()));
        map.insert("commands_executed".to_string(), json!(report.commands_executed()));
    }

    serde_json::to_string_pretty(&data).unwrap_or_else(|_| "{}".to_string())
}
