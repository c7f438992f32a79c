use super::*;

fn config() -> TournamentConfig {
    TournamentConfig {
        kind: TournamentKind::Daily,
        game_id: "slots".to_string(),
        start_at_ms: 1_000,
        end_at_ms: 1_000 + DAY_MS,
        entry_fee: 500,
        max_participants: 100,
        prize_weights: Vec::new(),
    }
}

fn entry(participant: &str, score: u64, submitted_at_ms: u64, sequence: u64) -> ScoreEntry {
    ScoreEntry {
        tournament_id: 1,
        participant_id: participant.to_string(),
        score,
        submitted_at_ms,
        sequence,
        metadata: String::new(),
    }
}

#[test]
fn test_config_validate_accepts_defaults() {
    assert!(config().validate(60_000).is_ok());
}

#[test]
fn test_config_rejects_inverted_window() {
    let mut cfg = config();
    cfg.end_at_ms = cfg.start_at_ms;
    assert!(matches!(
        cfg.validate(0),
        Err(ConfigError::InvalidWindow { .. })
    ));
}

#[test]
fn test_config_rejects_short_duration() {
    let mut cfg = config();
    cfg.end_at_ms = cfg.start_at_ms + 1_000;
    assert_eq!(
        cfg.validate(60_000),
        Err(ConfigError::DurationTooShort {
            duration_ms: 1_000,
            min_ms: 60_000,
        })
    );
}

#[test]
fn test_config_rejects_zero_capacity() {
    let mut cfg = config();
    cfg.max_participants = 0;
    assert!(matches!(
        cfg.validate(0),
        Err(ConfigError::InvalidMaxParticipants { value: 0, .. })
    ));
}

#[test]
fn test_config_rejects_bad_game_id() {
    let mut cfg = config();
    cfg.game_id = String::new();
    assert!(matches!(cfg.validate(0), Err(ConfigError::InvalidGameId { .. })));
    cfg.game_id = "g".repeat(MAX_GAME_ID_LENGTH + 1);
    assert!(matches!(cfg.validate(0), Err(ConfigError::InvalidGameId { .. })));
}

#[test]
fn test_prize_weights_validation() {
    assert!(validate_prize_weights(&[]).is_ok());
    assert!(validate_prize_weights(&[0.5, 0.3, 0.2]).is_ok());
    assert!(matches!(
        validate_prize_weights(&[0.6, 0.5]),
        Err(ConfigError::PrizeWeightsExceedPool { .. })
    ));
    assert_eq!(
        validate_prize_weights(&[0.5, f64::NAN]),
        Err(ConfigError::InvalidPrizeWeight { index: 1 })
    );
    assert_eq!(
        validate_prize_weights(&[-0.1]),
        Err(ConfigError::InvalidPrizeWeight { index: 0 })
    );
    assert_eq!(
        validate_prize_weights(&[0.2, 0.3]),
        Err(ConfigError::PrizeWeightsIncreasing { index: 1 })
    );
    assert!(matches!(
        validate_prize_weights(&[0.1; MAX_PAYOUT_POSITIONS + 1]),
        Err(ConfigError::TooManyPrizeWeights { .. })
    ));
}

#[test]
fn test_status_transitions_only_move_forward() {
    use TournamentStatus::*;
    assert!(Scheduled.can_transition_to(Active));
    assert!(Active.can_transition_to(Ended));
    assert!(Scheduled.can_transition_to(Ended));
    assert!(!Active.can_transition_to(Scheduled));
    assert!(!Ended.can_transition_to(Active));
    assert!(!Ended.can_transition_to(Scheduled));
    assert!(!Active.can_transition_to(Active));
    assert!(Scheduled < Active && Active < Ended);
}

#[test]
fn test_status_serde_lowercase() {
    let json = serde_json::to_string(&TournamentStatus::Active).unwrap();
    assert_eq!(json, "\"active\"");
    let kind: TournamentKind = serde_json::from_str("\"weekly\"").unwrap();
    assert_eq!(kind, TournamentKind::Weekly);
}

#[test]
fn test_tournament_membership() {
    let mut tournament = Tournament::new(7, config(), 0);
    assert_eq!(tournament.status, TournamentStatus::Scheduled);
    assert!(tournament.add_participant("alice".to_string()));
    assert!(!tournament.add_participant("alice".to_string()));
    assert!(tournament.contains_participant("alice"));
    assert!(!tournament.contains_participant("bob"));
    assert_eq!(tournament.participant_count(), 1);
    assert!(!tournament.is_full());
}

#[test]
fn test_due_status_and_time_remaining() {
    let mut tournament = Tournament::new(1, config(), 0);
    let start = tournament.start_at_ms;
    let end = tournament.end_at_ms;
    assert_eq!(tournament.due_status(start - 1), TournamentStatus::Scheduled);
    assert_eq!(tournament.due_status(start), TournamentStatus::Active);
    assert_eq!(tournament.due_status(end), TournamentStatus::Ended);

    assert_eq!(tournament.time_remaining_ms(0), start);
    tournament.status = TournamentStatus::Active;
    assert_eq!(tournament.time_remaining_ms(end - 10), 10);
    assert_eq!(tournament.time_remaining_ms(end + 10), 0);
    tournament.status = TournamentStatus::Ended;
    assert_eq!(tournament.info(start).time_remaining_ms, 0);
}

#[test]
fn test_natural_key_matches_config() {
    let cfg = config();
    let tournament = Tournament::new(3, cfg.clone(), 0);
    assert_eq!(tournament.natural_key(), cfg.natural_key());
    assert_eq!(tournament.config(), cfg);
}

#[test]
fn test_rank_entries_orders_by_score_then_time() {
    let ranked = rank_entries(vec![
        entry("late", 900, 20, 3),
        entry("low", 100, 1, 0),
        entry("early", 900, 10, 2),
        entry("top", 1_000, 30, 4),
    ]);
    let order: Vec<_> = ranked.iter().map(|r| r.participant_id.as_str()).collect();
    assert_eq!(order, vec!["top", "early", "late", "low"]);
    let ranks: Vec<_> = ranked.iter().map(|r| r.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3, 4]);
}

#[test]
fn test_sequence_breaks_timestamp_ties() {
    let first = entry("a", 500, 10, 1);
    let second = entry("b", 500, 10, 2);
    assert!(first.ranks_ahead_of(&second));
    assert!(!second.ranks_ahead_of(&first));
    assert!(!first.ranks_ahead_of(&first));
}

#[test]
fn test_validate_submission_bounds() {
    assert!(validate_submission(MAX_SCORE, "").is_ok());
    assert!(matches!(
        validate_submission(MAX_SCORE + 1, ""),
        Err(ScoreError::InvalidScore { .. })
    ));
    assert!(matches!(
        validate_submission(1, &"m".repeat(MAX_METADATA_LENGTH + 1)),
        Err(ScoreError::InvalidScore { .. })
    ));
}

#[test]
fn test_lookup_error_conversions() {
    assert_eq!(JoinError::from(LookupError::NotFound(9)), JoinError::NotFound(9));
    assert_eq!(ScoreError::from(LookupError::NotFound(9)), ScoreError::NotFound(9));
    assert_eq!(
        SettlementError::from(LookupError::NotFound(9)),
        SettlementError::NotFound(9)
    );
}

#[test]
fn test_fifty_entrants_fund_pool() {
    let (contribution, _) = prize::split_entry_fee(500, DEFAULT_POOL_CONTRIBUTION_BPS);
    assert_eq!(contribution * 50, 22_500);
}
