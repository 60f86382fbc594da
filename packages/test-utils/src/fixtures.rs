//! JSON fixtures shaped like the dashboard's payloads

use serde_json::{json, Value};

/// A track as it appears in `current` and queue entries
pub fn track_json(title: &str, duration: f64) -> Value {
    json!({
        "title": title,
        "url": format!("https://media.test/{}", title.to_lowercase().replace(' ', "-")),
        "duration": duration,
        "thumbnail": null,
        "requester": "tester",
    })
}

/// A queue of tracks, each three minutes long
pub fn queue_json(titles: &[&str]) -> Value {
    Value::Array(titles.iter().map(|t| track_json(t, 180.0)).collect())
}

/// A player snapshot without `queue` or `timestamp`
///
/// `playing` follows whether a track is loaded.
pub fn player_json(current: Option<Value>, elapsed: f64, paused: bool) -> Value {
    let playing = current.is_some();
    json!({
        "current": current,
        "elapsed": elapsed,
        "paused": paused,
        "playing": playing,
        "volume": 50,
        "loop": "off",
        "filter": null,
        "in_voice": playing,
    })
}

/// Serialize a websocket envelope
pub fn frame(kind: &str, data: Value) -> String {
    json!({ "type": kind, "data": data }).to_string()
}
