//! Service helpers that expose read-only public projections of the party.

use tokio::try_join;

use crate::{
    dto::party::PartyOverview,
    error::ServiceError,
    state::SharedState,
};

/// Return whether a session runs, what is playing and how busy the room is.
pub async fn party_overview(state: &SharedState) -> Result<PartyOverview, ServiceError> {
    let repo = state.repository().await?;
    let (active, current, queue, participants) = try_join!(
        repo.session_active(),
        repo.current_song(),
        repo.queue(),
        repo.participants()
    )?;

    if !active {
        return Ok(PartyOverview {
            session_active: false,
            current_song: None,
            queue_length: 0,
            participant_count: 0,
        });
    }

    Ok(PartyOverview {
        session_active: true,
        current_song: current.map(Into::into),
        queue_length: queue.len(),
        participant_count: participants.len(),
    })
}
