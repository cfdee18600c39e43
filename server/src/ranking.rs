//! Ranking order and the human-readable ranking announcement.
//!
//! The order is total: score descending, then a completed player ranks above
//! a still-playing player with the same score, then among completed players
//! with equal score the smaller completion duration wins. Full ties keep the
//! players' join order.

use crate::player::{PlayerSession, PlayerStatus};
use serde::Serialize;
use std::time::Duration;

/// One row of the structured ranking snapshot.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct RankingEntry {
    pub rank: usize,
    pub player_id: String,
    pub name: String,
    pub status: PlayerStatus,
    pub score: i32,
    /// Completion duration in seconds; absent while the player is playing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_duration: Option<f64>,
}

/// Sorts the players into ranking order and assigns 1-based ranks.
pub fn rank_players(mut players: Vec<&PlayerSession>) -> Vec<RankingEntry> {
    // Stable sorts: join order is the base, so full ties keep insertion order.
    players.sort_by_key(|p| p.joined_at);
    players.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| duration_key(a).cmp(&duration_key(b)))
    });

    players
        .into_iter()
        .enumerate()
        .map(|(index, player)| RankingEntry {
            rank: index + 1,
            player_id: player.id.clone(),
            name: player.name.clone(),
            status: player.status,
            score: player.score,
            completion_duration: player.completion_duration.map(|d| d.as_secs_f64()),
        })
        .collect()
}

/// A playing player sorts as if their duration were infinite, so completed
/// players always rank above playing ones at equal score.
fn duration_key(player: &PlayerSession) -> u128 {
    player
        .completion_duration
        .map(|d| d.as_millis())
        .unwrap_or(u128::MAX)
}

/// Formats a duration as mm:ss for announcements.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Renders the multi-line ranking announcement, either as a running update
/// or tagged as final when the session has finished.
pub fn announcement(entries: &[RankingEntry], is_final: bool) -> String {
    let mut lines = Vec::with_capacity(entries.len() + 1);
    if is_final {
        lines.push("=== FINAL RANKING ===".to_string());
    } else {
        lines.push("=== CURRENT RANKING ===".to_string());
    }

    for entry in entries {
        match (entry.status, entry.completion_duration) {
            (PlayerStatus::Completed, Some(seconds)) => {
                let formatted = format_duration(Duration::from_secs_f64(seconds));
                lines.push(format!(
                    "{}. {} - {} points (completed in {})",
                    entry.rank, entry.name, entry.score, formatted
                ));
            }
            _ => {
                lines.push(format!(
                    "{}. {} - {} points (still playing)",
                    entry.rank, entry.name, entry.score
                ));
            }
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator;

    fn player(id: &str, score: i32, completion: Option<Duration>) -> PlayerSession {
        let (puzzle, _) = generator::fallback_pair();
        let mut p = PlayerSession::new(id, id, &puzzle);
        p.score = score;
        if let Some(duration) = completion {
            p.status = PlayerStatus::Completed;
            p.completion_duration = Some(duration);
        }
        p
    }

    #[test]
    fn test_score_descending() {
        let a = player("a", 10, None);
        let b = player("b", 50, None);
        let c = player("c", 30, None);

        let entries = rank_players(vec![&a, &b, &c]);
        let order: Vec<&str> = entries.iter().map(|e| e.player_id.as_str()).collect();
        assert_eq!(order, vec!["b", "c", "a"]);
        assert_eq!(entries[0].rank, 1);
        assert_eq!(entries[2].rank, 3);
    }

    #[test]
    fn test_completed_beats_playing_at_equal_score() {
        let playing = player("playing", 40, None);
        let completed = player("completed", 40, Some(Duration::from_secs(300)));

        let entries = rank_players(vec![&playing, &completed]);
        assert_eq!(entries[0].player_id, "completed");
        assert_eq!(entries[1].player_id, "playing");
    }

    #[test]
    fn test_faster_completion_wins_at_equal_score() {
        let slow = player("slow", 40, Some(Duration::from_secs(400)));
        let fast = player("fast", 40, Some(Duration::from_secs(120)));

        let entries = rank_players(vec![&slow, &fast]);
        assert_eq!(entries[0].player_id, "fast");
        assert_eq!(entries[1].player_id, "slow");
    }

    #[test]
    fn test_full_tie_keeps_join_order() {
        // player() stamps joined_at on construction, so creation order
        // is join order.
        let first = player("first", 20, None);
        let second = player("second", 20, None);

        // Presentation order reversed to prove the sort does not depend on it.
        let entries = rank_players(vec![&second, &first]);
        assert_eq!(entries[0].player_id, "first");
        assert_eq!(entries[1].player_id, "second");
    }

    #[test]
    fn test_format_duration_mm_ss() {
        assert_eq!(format_duration(Duration::from_secs(0)), "00:00");
        assert_eq!(format_duration(Duration::from_secs(59)), "00:59");
        assert_eq!(format_duration(Duration::from_secs(272)), "04:32");
        assert_eq!(format_duration(Duration::from_secs(3600)), "60:00");
    }

    #[test]
    fn test_announcement_distinguishes_completed_and_playing() {
        let done = player("done", 80, Some(Duration::from_secs(272)));
        let busy = player("busy", 20, None);

        let entries = rank_players(vec![&done, &busy]);
        let text = announcement(&entries, false);

        assert!(text.starts_with("=== CURRENT RANKING ==="));
        assert!(text.contains("1. done - 80 points (completed in 04:32)"));
        assert!(text.contains("2. busy - 20 points (still playing)"));

        let final_text = announcement(&entries, true);
        assert!(final_text.starts_with("=== FINAL RANKING ==="));
    }
}
