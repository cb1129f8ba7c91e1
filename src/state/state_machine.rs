use thiserror::Error;

use crate::error::Rejection;

/// Session-scoped phases of a listening party.
///
/// The phase is never stored; it is derived from `SESSION_ACTIVE` and
/// `CURRENT_SONG` on every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No session is open.
    Closed,
    /// A session is open and nothing is playing.
    Open,
    /// A session is open and a track is open for voting.
    Voting,
}

impl SessionPhase {
    /// Derive the phase from the session flag and current-song presence.
    pub fn derive(session_active: bool, has_current_song: bool) -> Self {
        match (session_active, has_current_song) {
            (false, _) => SessionPhase::Closed,
            (true, false) => SessionPhase::Open,
            (true, true) => SessionPhase::Voting,
        }
    }
}

/// Events that can be applied to the party state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartyEvent {
    /// Manager opens a session.
    StartSession,
    /// Manager closes the session.
    EndSession,
    /// A track starts, either from a URL or from the queue head.
    StartVote,
    /// Manager closes voting on the current track.
    EndVote,
    /// Join, leave, kick or participant listing.
    Roster,
    /// A participant presses a vote button.
    CastVote,
}

/// Error returned when an event is not valid from the current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the party was in when the event was received.
    pub from: SessionPhase,
    /// The event that cannot be applied from this phase.
    pub event: PartyEvent,
}

impl InvalidTransition {
    /// User-facing rejection for this guard violation.
    pub fn rejection(&self) -> Rejection {
        use PartyEvent::*;
        use SessionPhase::*;

        match (self.from, self.event) {
            (Open | Voting, StartSession) => Rejection::AlreadyActive,
            (Voting, EndSession | StartVote) => Rejection::VoteInProgress,
            (_, EndVote) => Rejection::NoCurrentSong,
            (Closed, CastVote) => Rejection::SessionClosed,
            (_, CastVote) => Rejection::VoteClosed,
            (Closed, _) => Rejection::NotActive,
            // Every remaining pair is a valid transition.
            (Open | Voting, _) => Rejection::NotActive,
        }
    }
}

/// Compute the phase reached by applying `event` from `from`.
pub fn compute_transition(
    from: SessionPhase,
    event: PartyEvent,
) -> Result<SessionPhase, InvalidTransition> {
    let next = match (from, event) {
        (SessionPhase::Closed, PartyEvent::StartSession) => SessionPhase::Open,
        (SessionPhase::Open, PartyEvent::EndSession) => SessionPhase::Closed,
        (SessionPhase::Open, PartyEvent::StartVote) => SessionPhase::Voting,
        (SessionPhase::Voting, PartyEvent::EndVote) => SessionPhase::Open,
        (phase @ (SessionPhase::Open | SessionPhase::Voting), PartyEvent::Roster) => phase,
        (SessionPhase::Voting, PartyEvent::CastVote) => SessionPhase::Voting,
        (from, event) => return Err(InvalidTransition { from, event }),
    };

    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejection(from: SessionPhase, event: PartyEvent) -> Rejection {
        compute_transition(from, event).unwrap_err().rejection()
    }

    #[test]
    fn phase_is_derived_from_flag_and_current_song() {
        assert_eq!(SessionPhase::derive(false, false), SessionPhase::Closed);
        assert_eq!(SessionPhase::derive(false, true), SessionPhase::Closed);
        assert_eq!(SessionPhase::derive(true, false), SessionPhase::Open);
        assert_eq!(SessionPhase::derive(true, true), SessionPhase::Voting);
    }

    #[test]
    fn full_happy_path_through_session() {
        let mut phase = SessionPhase::Closed;
        for (event, expected) in [
            (PartyEvent::StartSession, SessionPhase::Open),
            (PartyEvent::Roster, SessionPhase::Open),
            (PartyEvent::StartVote, SessionPhase::Voting),
            (PartyEvent::CastVote, SessionPhase::Voting),
            (PartyEvent::Roster, SessionPhase::Voting),
            (PartyEvent::EndVote, SessionPhase::Open),
            (PartyEvent::EndSession, SessionPhase::Closed),
        ] {
            phase = compute_transition(phase, event).unwrap();
            assert_eq!(phase, expected, "after {event:?}");
        }
    }

    #[test]
    fn closed_session_rejections() {
        use PartyEvent::*;
        assert_eq!(rejection(SessionPhase::Closed, EndSession), Rejection::NotActive);
        assert_eq!(rejection(SessionPhase::Closed, StartVote), Rejection::NotActive);
        assert_eq!(rejection(SessionPhase::Closed, Roster), Rejection::NotActive);
        assert_eq!(rejection(SessionPhase::Closed, EndVote), Rejection::NoCurrentSong);
        assert_eq!(rejection(SessionPhase::Closed, CastVote), Rejection::SessionClosed);
    }

    #[test]
    fn open_vote_blocks_session_end_and_new_tracks() {
        assert_eq!(
            rejection(SessionPhase::Voting, PartyEvent::EndSession),
            Rejection::VoteInProgress
        );
        assert_eq!(
            rejection(SessionPhase::Voting, PartyEvent::StartVote),
            Rejection::VoteInProgress
        );
        assert_eq!(
            rejection(SessionPhase::Voting, PartyEvent::StartSession),
            Rejection::AlreadyActive
        );
    }

    #[test]
    fn open_session_without_track_rejects_vote_actions() {
        assert_eq!(
            rejection(SessionPhase::Open, PartyEvent::EndVote),
            Rejection::NoCurrentSong
        );
        assert_eq!(
            rejection(SessionPhase::Open, PartyEvent::CastVote),
            Rejection::VoteClosed
        );
        assert_eq!(
            rejection(SessionPhase::Open, PartyEvent::StartSession),
            Rejection::AlreadyActive
        );
    }
}
