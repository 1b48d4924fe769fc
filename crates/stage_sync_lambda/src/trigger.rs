//! Trigger payloads are not interpreted by the sync; this only summarizes
//! them for the invocation log.

use serde_json::Value;

pub fn describe_trigger(event: &Value) -> String {
    if let Some(records) = event.get("Records").and_then(Value::as_array) {
        let mut sources: Vec<&str> = records
            .iter()
            .filter_map(|record| {
                record
                    .get("eventSource")
                    .or_else(|| record.get("EventSource"))
                    .and_then(Value::as_str)
            })
            .collect();
        sources.sort_unstable();
        sources.dedup();
        let sources = if sources.is_empty() {
            "unknown".to_string()
        } else {
            sources.join(",")
        };
        return format!("records source={sources} count={}", records.len());
    }

    if let Some(source) = event.get("source").and_then(Value::as_str) {
        let detail_type = event
            .get("detail-type")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        return format!("eventbridge source={source} detail_type={detail_type}");
    }

    match event {
        Value::Object(object) if object.is_empty() => "empty".to_string(),
        Value::Object(_) => "custom".to_string(),
        Value::Null => "empty".to_string(),
        _ => "opaque".to_string(),
    }
}
