//! Lifecycle events.
//!
//! Emitted after the state change they describe is committed, and delivered outside of any
//! store or ledger lock.

use serde::{Deserialize, Serialize};

use crate::tournament::{
    ParticipantId, PrizeDistribution, RankedEntry, Tournament, TournamentId,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TournamentCreated {
        tournament: Tournament,
    },
    TournamentStarted {
        id: TournamentId,
        start_at_ms: u64,
        participant_count: u32,
    },
    ParticipantJoined {
        id: TournamentId,
        participant_id: ParticipantId,
        participant_count: u32,
        prize_pool: u64,
    },
    ScoreSubmitted {
        id: TournamentId,
        participant_id: ParticipantId,
        score: u64,
        rank: u32,
        is_new_best: bool,
    },
    TournamentEnded {
        id: TournamentId,
        final_ranking: Vec<RankedEntry>,
        distribution: PrizeDistribution,
    },
}

impl Event {
    pub fn tournament_id(&self) -> TournamentId {
        match self {
            Self::TournamentCreated { tournament } => tournament.id,
            Self::TournamentStarted { id, .. }
            | Self::ParticipantJoined { id, .. }
            | Self::ScoreSubmitted { id, .. }
            | Self::TournamentEnded { id, .. } => *id,
        }
    }

    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TournamentCreated { .. } => "tournament_created",
            Self::TournamentStarted { .. } => "tournament_started",
            Self::ParticipantJoined { .. } => "participant_joined",
            Self::ScoreSubmitted { .. } => "score_submitted",
            Self::TournamentEnded { .. } => "tournament_ended",
        }
    }

    /// Encode as a single JSON line (no trailing newline).
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tournament::{PayoutCurve, TournamentConfig, TournamentKind};

    #[test]
    fn test_event_tagged_encoding() {
        let event = Event::ScoreSubmitted {
            id: 4,
            participant_id: "alice".to_string(),
            score: 1_200,
            rank: 1,
            is_new_best: true,
        };
        let line = event.to_json_line().unwrap();
        assert!(line.starts_with("{\"type\":\"score_submitted\""));
        let decoded: Event = serde_json::from_str(&line).unwrap();
        assert_eq!(decoded, event);
        assert_eq!(decoded.kind(), "score_submitted");
        assert_eq!(decoded.tournament_id(), 4);
    }

    #[test]
    fn test_created_event_carries_tournament() {
        let tournament = Tournament::new(
            11,
            TournamentConfig {
                kind: TournamentKind::Weekly,
                game_id: "blackjack".to_string(),
                start_at_ms: 0,
                end_at_ms: 10,
                entry_fee: 0,
                max_participants: 2,
                prize_weights: Vec::new(),
            },
            0,
        );
        let event = Event::TournamentCreated { tournament };
        assert_eq!(event.tournament_id(), 11);
        assert!(event.to_json_line().unwrap().contains("\"status\":\"scheduled\""));
    }

    #[test]
    fn test_ended_event_with_empty_ranking() {
        let event = Event::TournamentEnded {
            id: 2,
            final_ranking: Vec::new(),
            distribution: PrizeDistribution {
                prize_pool: 900,
                curve: PayoutCurve::Hyperbolic,
                awards: Vec::new(),
                undistributed: 900,
            },
        };
        let line = event.to_json_line().unwrap();
        assert!(line.contains("\"undistributed\":900"));
        assert!(line.contains("\"curve\":\"hyperbolic\""));
    }
}
