//! Single-line now-playing view

use encore_sync::{format_time, ConnectionState, LoopMode, PlayerState};

/// Status line for the current player
pub fn now_playing_line(
    player: &PlayerState,
    position: f64,
    queue_len: usize,
    connection: ConnectionState,
) -> String {
    let indicator = if connection.is_connected() {
        "●"
    } else {
        "○"
    };

    let body = match &player.current_track {
        None => "Nothing playing".to_string(),
        Some(track) => {
            let mut line = track.title.clone();
            if !track.requester_name.is_empty() {
                line.push_str(&format!(" (requested by {})", track.requester_name));
            }

            let total = if track.is_live() {
                "LIVE".to_string()
            } else {
                format_time(track.duration_seconds)
            };
            line.push_str(&format!("  {} / {}", format_time(position), total));

            if player.paused {
                line.push_str("  [paused]");
            }
            line
        }
    };

    let mut extras = vec![format!("vol {}%", player.volume)];
    if player.loop_mode != LoopMode::Off {
        extras.push(format!("loop {}", player.loop_mode));
    }
    if !player.active_filter.is_empty() {
        extras.push(format!("filter {}", player.active_filter));
    }
    extras.push(format!("{} queued", queue_len));

    let mut line = format!("{} {}  |  {}", indicator, body, extras.join("  "));
    if !connection.is_connected() {
        line.push_str(&format!("  ({})", connection));
    }
    line
}
