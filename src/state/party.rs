//! Pure party computations shared by the services: vote toggling, tallies and
//! the end-of-session ranking. Nothing in here touches the store.

use crate::dao::models::{HistoryEntity, HistoryEntryEntity, RosterEntity, VotesEntity};

/// Result of pressing a vote button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// The score is now recorded for the user, replacing `previous` if any.
    Cast {
        /// Recorded score.
        score: u32,
        /// Score that was overwritten.
        previous: Option<u32>,
    },
    /// The user pressed the score they already had; the vote is gone.
    Retracted {
        /// Score that was removed.
        score: u32,
    },
}

/// Apply a button press to the per-track vote map.
///
/// Same score twice cancels, a different score replaces.
pub fn toggle_vote(votes: &mut VotesEntity, user_id: &str, score: u32) -> VoteOutcome {
    match votes.get(user_id).copied() {
        Some(existing) if existing == score => {
            votes.shift_remove(user_id);
            VoteOutcome::Retracted { score }
        }
        previous => {
            votes.insert(user_id.to_owned(), score);
            VoteOutcome::Cast { score, previous }
        }
    }
}

/// Totals of one closed vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteTally {
    /// Sum of the scores.
    pub total_points: u64,
    /// Scores cast.
    pub voter_count: u64,
    /// Size of the eligibility snapshot, which is the averaging divisor.
    pub participant_count: u64,
}

impl VoteTally {
    /// Tally `votes` against the eligibility snapshot.
    pub fn compute(votes: &VotesEntity, eligible: &RosterEntity) -> Self {
        Self {
            total_points: votes.values().map(|score| u64::from(*score)).sum(),
            voter_count: votes.len() as u64,
            participant_count: eligible.len() as u64,
        }
    }

    /// Points per eligible listener, 0 for an empty snapshot.
    pub fn average(&self) -> f64 {
        average(self.total_points, self.participant_count)
    }
}

fn average(total_points: u64, participant_count: u64) -> f64 {
    if participant_count == 0 {
        0.0
    } else {
        total_points as f64 / participant_count as f64
    }
}

/// Add `tally` to the history entry of `track_id`, creating it on first play.
///
/// The title of an existing entry is kept.
pub fn merge_into_history(
    history: &mut HistoryEntity,
    track_id: &str,
    title: &str,
    tally: &VoteTally,
) {
    let entry = history
        .entry(track_id.to_owned())
        .or_insert_with(|| HistoryEntryEntity {
            title: title.to_owned(),
            total_points: 0,
            voter_count: 0,
            participant_count: 0,
        });
    entry.total_points += tally.total_points;
    entry.voter_count += tally.voter_count;
    entry.participant_count += tally.participant_count;
}

/// One line of the end-of-session ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackStanding {
    /// Catalog identifier.
    pub track_id: String,
    /// Display title.
    pub title: String,
    /// Points per eligible listener over the session.
    pub average: f64,
    /// Sum of all scores.
    pub total_points: u64,
    /// Scores cast.
    pub voter_count: u64,
    /// Eligible listeners summed over each vote.
    pub participant_count: u64,
}

/// Rank history entries by descending average; ties keep history order.
pub fn summarize(history: &HistoryEntity) -> Vec<TrackStanding> {
    let mut standings: Vec<TrackStanding> = history
        .iter()
        .map(|(track_id, entry)| TrackStanding {
            track_id: track_id.clone(),
            title: entry.title.clone(),
            average: average(entry.total_points, entry.participant_count),
            total_points: entry.total_points,
            voter_count: entry.voter_count,
            participant_count: entry.participant_count,
        })
        .collect();
    // `sort_by` is stable.
    standings.sort_by(|a, b| b.average.total_cmp(&a.average));
    standings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(title: &str, total_points: u64, participant_count: u64) -> HistoryEntryEntity {
        HistoryEntryEntity {
            title: title.into(),
            total_points,
            voter_count: total_points.min(participant_count),
            participant_count,
        }
    }

    #[test]
    fn same_score_twice_retracts() {
        let mut votes = VotesEntity::new();
        assert_eq!(
            toggle_vote(&mut votes, "u", 1),
            VoteOutcome::Cast {
                score: 1,
                previous: None
            }
        );
        assert_eq!(
            toggle_vote(&mut votes, "u", 1),
            VoteOutcome::Retracted { score: 1 }
        );
        assert!(!votes.contains_key("u"));
    }

    #[test]
    fn different_score_replaces() {
        let mut votes = VotesEntity::new();
        toggle_vote(&mut votes, "u", 1);
        assert_eq!(
            toggle_vote(&mut votes, "u", 2),
            VoteOutcome::Cast {
                score: 2,
                previous: Some(1)
            }
        );
        assert_eq!(votes.get("u"), Some(&2));
        assert_eq!(votes.len(), 1);
    }

    #[test]
    fn tally_divides_by_eligible_count() {
        let votes: VotesEntity = [("a".to_string(), 2), ("b".to_string(), 1)]
            .into_iter()
            .collect();
        let eligible: RosterEntity = ["a", "b", "c", "d"].into_iter().map(String::from).collect();
        let tally = VoteTally::compute(&votes, &eligible);
        assert_eq!(tally.total_points, 3);
        assert_eq!(tally.voter_count, 2);
        assert_eq!(tally.participant_count, 4);
        assert_eq!(tally.average(), 0.75);
    }

    #[test]
    fn empty_snapshot_averages_to_zero() {
        let tally = VoteTally::compute(&VotesEntity::new(), &RosterEntity::new());
        assert_eq!(tally.average(), 0.0);
    }

    #[test]
    fn repeated_plays_accumulate() {
        let mut history = HistoryEntity::new();
        let first = VoteTally {
            total_points: 3,
            voter_count: 2,
            participant_count: 2,
        };
        let second = VoteTally {
            total_points: 1,
            voter_count: 1,
            participant_count: 3,
        };
        merge_into_history(&mut history, "t", "Song", &first);
        merge_into_history(&mut history, "t", "Renamed", &second);
        let merged = &history["t"];
        assert_eq!(merged.title, "Song");
        assert_eq!(merged.total_points, 4);
        assert_eq!(merged.voter_count, 3);
        assert_eq!(merged.participant_count, 5);
    }

    #[test]
    fn summary_orders_by_descending_average() {
        let mut history = HistoryEntity::new();
        history.insert("x".into(), entry("X", 4, 2));
        history.insert("y".into(), entry("Y", 0, 0));
        history.insert("z".into(), entry("Z", 3, 2));
        let averages: Vec<f64> = summarize(&history).iter().map(|s| s.average).collect();
        assert_eq!(averages, vec![2.0, 1.5, 0.0]);
    }

    #[test]
    fn summary_ties_keep_history_order() {
        let mut history = HistoryEntity::new();
        history.insert("b".into(), entry("B", 1, 1));
        history.insert("a".into(), entry("A", 2, 2));
        history.insert("c".into(), entry("C", 0, 3));
        history.insert("d".into(), entry("D", 0, 0));
        let order: Vec<_> = summarize(&history)
            .into_iter()
            .map(|s| s.track_id)
            .collect();
        assert_eq!(order, vec!["b", "a", "c", "d"]);
    }
}
