//! Tests for RoomSession
//!
//! Verifies that:
//! - Stage transitions follow lobby → story → vote/battle → story
//! - Character claims are exclusive and locked during battle
//! - Votes finalize exactly once, by majority or deadline
//! - Battle results flow back into players and the story position

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use ancestral_types::ServerConfig;

use super::{DiceKind, RewardGrant, RoomError, RoomEvent, RoomSession, Stage};
use crate::battle::{BattleError, LogKind, Side, TurnSlot};
use crate::catalog::Catalog;
use crate::combatant::ClientId;
use crate::dice::scripted::ScriptedDice;
use crate::test_support::{client, small_catalog, small_story};

// ═══════════════════════════════════════════════════════════════════════════
// Test Helpers
// ═══════════════════════════════════════════════════════════════════════════

fn new_room(config: ServerConfig, catalog: Arc<Catalog>) -> RoomSession {
    RoomSession::new(
        "ROOM01".into(),
        client("p1"),
        Some("Ana"),
        catalog,
        small_story(),
        Arc::new(config),
    )
}

/// Two players with striker and mender, story started at the intro node.
fn story_room() -> RoomSession {
    let mut room = new_room(ServerConfig::default(), small_catalog());
    room.join(client("p2"), Some("Beto")).unwrap();
    room.update_player(&client("p1"), Some("striker"), Some(true)).unwrap();
    room.update_player(&client("p2"), Some("mender"), Some(true)).unwrap();
    room.start_story(&client("p1")).unwrap();
    room
}

/// Story room moved to the throne node by unanimous vote.
fn throne_room() -> RoomSession {
    let mut room = story_room();
    let (p1, p2) = (client("p1"), client("p2"));
    room.start_vote(&p1, None, None, None).unwrap();
    room.cast_vote(&p1, "right").unwrap();
    room.cast_vote(&p2, "right").unwrap();
    room
}

fn names(events: &[RoomEvent]) -> Vec<&'static str> {
    events.iter().map(RoomEvent::name).collect()
}

/// One fragile hero against a boss that cannot miss-kill.
fn deadly_catalog() -> Arc<Catalog> {
    let toml = r#"
        [[character]]
        id = "glass"
        name = "Glass"
        base = { health = 30, attack = 10, defense = 0, speed = 1, resource = 0 }
        abilities = [{ id = "tap", name = "Tap", kind = "physical", power = 1 }]

        [[enemy]]
        id = "ogre"
        name = "Ogre"
        base = { health = 500, attack = 50, defense = 0, speed = 50 }
        abilities = [{ id = "crush", name = "Crush", kind = "physical", power = 100 }]
    "#;
    Arc::new(Catalog::from_toml_str(toml, Path::new("deadly")).unwrap())
}

// ═══════════════════════════════════════════════════════════════════════════
// Lobby
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn join_is_rejected_when_full_or_started() {
    let config = ServerConfig {
        max_players: 2,
        ..Default::default()
    };
    let mut room = new_room(config, small_catalog());
    room.join(client("p2"), None).unwrap();
    assert_eq!(room.players()[1].name, "Player 2");

    assert_eq!(
        room.join(client("p3"), None).unwrap_err(),
        RoomError::RoomFull { max: 2 }
    );
    assert_eq!(room.join(client("p2"), None).unwrap_err(), RoomError::RoomFull { max: 2 });

    let mut room = story_room();
    assert_eq!(room.join(client("p3"), None).unwrap_err(), RoomError::AlreadyStarted);
}

#[test]
fn characters_are_exclusive_and_released_on_switch() {
    let mut room = new_room(ServerConfig::default(), small_catalog());
    let (p1, p2) = (client("p1"), client("p2"));
    room.join(p2.clone(), None).unwrap();

    room.update_player(&p1, Some("striker"), None).unwrap();
    assert_eq!(
        room.update_player(&p2, Some("striker"), None).unwrap_err(),
        RoomError::CharacterTaken { id: "striker".into() }
    );

    // reselecting your own character is a no-op, not a conflict
    room.update_player(&p1, Some("striker"), None).unwrap();

    room.update_player(&p1, Some("spare"), None).unwrap();
    assert!(!room.is_claimed("striker"));
    assert!(room.is_claimed("spare"));
    room.update_player(&p2, Some("striker"), None).unwrap();

    let p1_player = room.player(&p1).unwrap();
    assert_eq!(p1_player.character_id.as_deref(), Some("spare"));
    assert_eq!(p1_player.stats.unwrap().health, 80);
}

#[test]
fn unknown_character_and_foreign_client_are_rejected() {
    let mut room = new_room(ServerConfig::default(), small_catalog());
    assert_eq!(
        room.update_player(&client("p1"), Some("nobody"), None).unwrap_err(),
        RoomError::UnknownCharacter { id: "nobody".into() }
    );
    assert_eq!(
        room.update_player(&client("ghost"), None, Some(true)).unwrap_err(),
        RoomError::NotInRoom
    );
}

#[test]
fn story_start_requires_host_and_enough_players() {
    let mut room = new_room(ServerConfig::default(), small_catalog());
    assert_eq!(
        room.start_story(&client("p1")).unwrap_err(),
        RoomError::NotEnoughPlayers { required: 2, present: 1 }
    );
    room.join(client("p2"), None).unwrap();
    assert_eq!(room.start_story(&client("p2")).unwrap_err(), RoomError::NotHost);
    assert_eq!(room.stage(), Stage::Lobby);
}

// ═══════════════════════════════════════════════════════════════════════════
// Story
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn opening_node_rewards_are_capped_and_buff_is_queued() {
    let mut room = new_room(ServerConfig::default(), small_catalog());
    room.join(client("p2"), None).unwrap();
    room.update_player(&client("p1"), Some("striker"), None).unwrap();
    let events = room.start_story(&client("p1")).unwrap();

    assert_eq!(room.stage(), Stage::Story);
    assert_eq!(room.position(), ("one", "intro"));
    assert_eq!(
        names(&events),
        vec!["story_reward", "story_reward", "story_node", "room_updated"]
    );
    assert!(events.iter().any(|e| matches!(
        e,
        RoomEvent::StoryReward(RewardGrant::Heal { amount: 10 })
    )));

    // already at full health
    assert_eq!(room.player(&client("p1")).unwrap().stats.unwrap().health, 100);
    // no character, nothing to restore
    assert!(room.player(&client("p2")).unwrap().stats.is_none());
    assert_eq!(room.pending_buffs().len(), 1);
}

// ═══════════════════════════════════════════════════════════════════════════
// Voting
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn vote_requires_host_story_stage_and_options() {
    let mut lobby = new_room(ServerConfig::default(), small_catalog());
    assert!(matches!(
        lobby.start_vote(&client("p1"), None, None, None).unwrap_err(),
        RoomError::WrongStage { expected: Stage::Story, actual: Stage::Lobby }
    ));

    let mut room = story_room();
    assert_eq!(
        room.start_vote(&client("p2"), None, None, None).unwrap_err(),
        RoomError::NotHost
    );
    assert_eq!(
        room.start_vote(&client("p1"), Some("fight"), None, None).unwrap_err(),
        RoomError::NoVoteOptions
    );

    room.start_vote(&client("p1"), None, None, None).unwrap();
    assert_eq!(
        room.start_vote(&client("p1"), None, None, None).unwrap_err(),
        RoomError::VoteInProgress
    );
}

#[test]
fn deadline_picks_plurality_and_finalizes_once() {
    let mut room = story_room();
    let p1 = client("p1");
    let (events, ticket) = room
        .start_vote(&p1, None, None, Some(Duration::from_secs(1)))
        .unwrap();
    assert_eq!(ticket.vote_id, 1);
    assert_eq!(ticket.duration, Duration::from_secs(1));
    assert_eq!(names(&events), vec!["vote_started", "room_updated"]);
    assert_eq!(room.stage(), Stage::Vote);

    let events = room.cast_vote(&p1, "left").unwrap();
    assert_eq!(names(&events), vec!["vote_updated"]);
    assert_eq!(room.stage(), Stage::Vote);

    let mut dice = ScriptedDice::default();
    let events = room.vote_deadline(1, &mut dice);
    assert!(dice.calls.is_empty());
    assert!(matches!(
        &events[0],
        RoomEvent::VoteFinalized { vote_id: 1, chosen: Some(c), by_majority: false } if c == "left"
    ));
    assert_eq!(room.stage(), Stage::Story);
    assert_eq!(room.position(), ("one", "fight"));
    assert!(room.vote().is_none());

    assert!(room.vote_deadline(1, &mut dice).is_empty());
}

#[test]
fn majority_finalizes_early_and_ignores_later_deadline() {
    let mut room = story_room();
    let (p1, p2) = (client("p1"), client("p2"));
    room.start_vote(&p1, None, None, None).unwrap();
    room.cast_vote(&p1, "right").unwrap();
    let events = room.cast_vote(&p2, "right").unwrap();

    assert!(events.iter().any(|e| matches!(
        e,
        RoomEvent::VoteFinalized { by_majority: true, .. }
    )));
    // throne grants resource, already full
    assert!(events.iter().any(|e| matches!(
        e,
        RoomEvent::StoryReward(RewardGrant::Resource { amount: 5 })
    )));
    assert_eq!(room.position(), ("one", "throne"));
    assert_eq!(room.player(&p1).unwrap().stats.unwrap().resource, 50);

    let mut dice = ScriptedDice::default();
    assert!(room.vote_deadline(1, &mut dice).is_empty());
    assert_eq!(room.position(), ("one", "throne"));
}

#[test]
fn invalid_and_stale_votes() {
    let mut room = story_room();
    let p1 = client("p1");
    assert!(room.cast_vote(&p1, "left").unwrap().is_empty());

    room.start_vote(&p1, None, None, None).unwrap();
    assert_eq!(
        room.cast_vote(&p1, "up").unwrap_err(),
        RoomError::InvalidOption { option: "up".into() }
    );
}

#[test]
fn deadline_with_no_votes_picks_random_option() {
    let mut room = story_room();
    room.start_vote(&client("p1"), None, None, None).unwrap();
    let mut dice = ScriptedDice::new(&[2]);
    room.vote_deadline(1, &mut dice);
    assert_eq!(dice.calls, vec![2]);
    assert_eq!(room.position(), ("one", "throne"));
}

// ═══════════════════════════════════════════════════════════════════════════
// Battle
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn battle_needs_a_boss_and_heroes() {
    let mut room = story_room();
    let mut dice = ScriptedDice::default();
    assert_eq!(
        room.start_battle(&client("p1"), None, &mut dice).unwrap_err(),
        RoomError::NoBoss
    );
    assert_eq!(
        room.start_battle(&client("p1"), Some("dragon"), &mut dice).unwrap_err(),
        RoomError::UnknownEnemy { id: "dragon".into() }
    );

    let mut empty = new_room(ServerConfig::default(), small_catalog());
    empty.join(client("p2"), None).unwrap();
    empty.start_story(&client("p1")).unwrap();
    assert_eq!(
        empty.start_battle(&client("p1"), Some("king"), &mut dice).unwrap_err(),
        RoomError::NoHeroes
    );
}

#[test]
fn battle_start_applies_blessings_and_locks_characters() {
    let mut room = throne_room();
    let p1 = client("p1");
    let mut dice = ScriptedDice::default();
    let events = room.start_battle(&p1, None, &mut dice).unwrap();

    assert_eq!(names(&events), vec!["battle_started", "turn_changed", "room_updated"]);
    assert_eq!(room.stage(), Stage::Battle);
    assert!(room.pending_buffs().is_empty());

    let battle = room.battle().unwrap();
    assert_eq!(battle.boss().definition_id(), "king");
    // striker 30+5, mender 20+5, king 5: no ties
    assert_eq!(
        battle.order(),
        &[TurnSlot::Hero(0), TurnSlot::Hero(1), TurnSlot::Boss]
    );
    assert!(dice.calls.is_empty());
    assert_eq!(room.player(&p1).unwrap().effects.len(), 1);

    assert_eq!(
        room.update_player(&p1, Some("spare"), None).unwrap_err(),
        RoomError::CharacterLocked
    );
}

#[test]
fn battle_errors_reach_the_requester() {
    let mut room = throne_room();
    let mut dice = ScriptedDice::default();
    room.start_battle(&client("p1"), None, &mut dice).unwrap();

    assert_eq!(
        room.perform_ability(&client("p2"), "jab", &mut dice).unwrap_err(),
        RoomError::Battle(BattleError::NotYourTurn)
    );
    assert_eq!(
        room.boss_turn(&client("p2"), &mut dice).unwrap_err(),
        RoomError::Battle(BattleError::NotBossTurn)
    );
}

#[test]
fn victory_over_final_boss_opens_next_chapter() {
    let mut room = throne_room();
    let p1 = client("p1");
    let mut dice = ScriptedDice::new(&[20]);
    room.start_battle(&p1, None, &mut dice).unwrap();

    // nat 20: (30 + 35/5) * 2 = 74 against 40 health
    let events = room.perform_ability(&p1, "strike", &mut dice).unwrap();
    assert!(matches!(&events[0], RoomEvent::BattleLog(entry) if entry.kind == LogKind::Hit));
    assert!(events.iter().any(|e| matches!(
        e,
        RoomEvent::BattleEnded { winner: Side::Heroes }
    )));
    assert!(matches!(events.last(), Some(RoomEvent::RoomUpdated(_))));

    assert_eq!(room.stage(), Stage::Story);
    assert!(room.battle().is_none());
    assert_eq!(room.position(), ("two", "gate"));

    let player = room.player(&p1).unwrap();
    assert!(player.effects.is_empty());
    assert!(player.cooldowns.is_empty());

    // characters unlock after the fight
    room.update_player(&p1, Some("spare"), None).unwrap();
}

#[test]
fn turn_passes_after_hero_action() {
    let mut room = throne_room();
    let p1 = client("p1");
    let mut dice = ScriptedDice::new(&[1]);
    room.start_battle(&p1, None, &mut dice).unwrap();

    let events = room.perform_ability(&p1, "strike", &mut dice).unwrap();
    assert_eq!(names(&events), vec!["battle_log", "turn_changed", "room_updated"]);
    assert!(matches!(
        events[1],
        RoomEvent::TurnChanged { turn_index: 1, slot: Some(TurnSlot::Hero(1)) }
    ));
}

#[test]
fn lost_battle_revives_heroes_at_one_health() {
    let config = ServerConfig {
        min_players_to_start: 1,
        ..Default::default()
    };
    let mut room = new_room(config, deadly_catalog());
    let p1 = client("p1");
    room.update_player(&p1, Some("glass"), None).unwrap();
    room.start_story(&p1).unwrap();

    let mut dice = ScriptedDice::default();
    room.start_battle(&p1, Some("ogre"), &mut dice).unwrap();
    assert_eq!(room.battle().unwrap().current_slot(), Some(TurnSlot::Boss));

    // d4, d4, to-hit, effect
    let mut dice = ScriptedDice::new(&[1, 1, 15, 1]);
    let events = room.boss_turn(&p1, &mut dice).unwrap();
    assert!(events.iter().any(|e| matches!(
        e,
        RoomEvent::BattleEnded { winner: Side::Boss }
    )));

    let player = room.player(&p1).unwrap();
    assert_eq!(player.stats.unwrap().health, 1);
    assert!(player.alive);
    assert_eq!(room.stage(), Stage::Story);
    // a loss does not move the story
    assert_eq!(room.position(), ("one", "intro"));
}

#[test]
fn stale_battle_intents_are_ignored() {
    let mut room = story_room();
    let mut dice = ScriptedDice::default();
    assert!(room.perform_ability(&client("p1"), "strike", &mut dice).unwrap().is_empty());
    assert!(room.boss_turn(&client("p2"), &mut dice).unwrap().is_empty());
    assert!(dice.calls.is_empty());
}

// ═══════════════════════════════════════════════════════════════════════════
// Leaving and misc
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn host_leaving_hands_over_and_releases_character() {
    let mut room = story_room();
    let events = room.leave(&client("p1"));
    assert_eq!(names(&events), vec!["room_updated"]);
    assert_eq!(room.host(), &client("p2"));
    assert!(!room.is_claimed("striker"));

    let events = room.leave(&client("p2"));
    assert!(events.is_empty());
    assert!(room.is_empty());
}

#[test]
fn leaving_mid_battle_forfeits_and_passes_turn() {
    let mut room = throne_room();
    let mut dice = ScriptedDice::default();
    room.start_battle(&client("p1"), None, &mut dice).unwrap();

    let events = room.leave(&client("p1"));
    assert!(matches!(&events[0], RoomEvent::BattleLog(entry) if entry.kind == LogKind::Forfeit));
    assert!(matches!(
        events[1],
        RoomEvent::TurnChanged { slot: Some(TurnSlot::Hero(1)), .. }
    ));
    assert_eq!(room.stage(), Stage::Battle);
    assert_eq!(room.members(), vec![ClientId::from("p2")]);
}

#[test]
fn public_dice_roll_is_broadcast() {
    let mut room = story_room();
    let mut dice = ScriptedDice::new(&[2, 3, 17, 12]);
    let (values, events) = room
        .roll_dice(&client("p2"), DiceKind::Villain, &mut dice)
        .unwrap();
    assert_eq!(values, vec![2, 3, 17, 12]);
    assert!(matches!(
        &events[0],
        RoomEvent::DiceRolled { kind: DiceKind::Villain, .. }
    ));
}
