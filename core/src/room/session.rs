//! Room session state machine
//!
//! ```text
//!   lobby ──start_story──► story ──start_vote──► vote
//!                            ▲  ▲                  │
//!                            │  └──majority/deadline┘
//!                            │
//!                            └──win condition── battle ◄──start_battle── story
//! ```
//!
//! Every operation validates first and mutates only after all checks pass.
//! Stale intents (no battle, no vote) are ignored and produce no events.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use ancestral_types::ServerConfig;
use hashbrown::HashSet;
use serde::Serialize;
use tokio::task::AbortHandle;
use tracing::{debug, info};

use super::{
    ActiveVote, BattleSnapshot, DiceKind, Player, RewardGrant, RoomError, RoomEvent, RoomSnapshot,
    StoryNodeView, VoteTicket,
};
use crate::battle::{BattleSession, Side, TurnOutcome};
use crate::catalog::Catalog;
use crate::combatant::{ClientId, Combatant};
use crate::dice::{Dice, VillainPack, d20};
use crate::narrative::{Story, StoryBuff};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Lobby,
    Story,
    Vote,
    Battle,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Lobby => "lobby",
            Self::Story => "story",
            Self::Vote => "vote",
            Self::Battle => "battle",
        };
        f.write_str(name)
    }
}

pub struct RoomSession {
    code: String,
    host: ClientId,
    stage: Stage,
    /// Join order is preserved; host hand-over picks the earliest remaining
    players: Vec<Player>,
    claimed: HashSet<String>,
    chapter_id: String,
    node_id: String,
    pending_buffs: Vec<StoryBuff>,
    vote: Option<ActiveVote>,
    battle: Option<BattleSession>,
    next_vote_id: u64,
    catalog: Arc<Catalog>,
    story: Arc<Story>,
    config: Arc<ServerConfig>,
}

impl RoomSession {
    /// New room in the lobby with `host` as its only player.
    pub fn new(
        code: String,
        host: ClientId,
        host_name: Option<&str>,
        catalog: Arc<Catalog>,
        story: Arc<Story>,
        config: Arc<ServerConfig>,
    ) -> Self {
        let (chapter_id, node_id) = story.opening();
        let name = host_name.unwrap_or("Host").to_string();
        Self {
            players: vec![Player::new(host.clone(), name)],
            code,
            host,
            stage: Stage::Lobby,
            claimed: HashSet::new(),
            chapter_id,
            node_id,
            pending_buffs: Vec::new(),
            vote: None,
            battle: None,
            next_vote_id: 1,
            catalog,
            story,
            config,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn host(&self) -> &ClientId {
        &self.host
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, client: &ClientId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == client)
    }

    pub fn members(&self) -> Vec<ClientId> {
        self.players.iter().map(|p| p.id.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn is_claimed(&self, character_id: &str) -> bool {
        self.claimed.contains(character_id)
    }

    pub fn position(&self) -> (&str, &str) {
        (&self.chapter_id, &self.node_id)
    }

    pub fn pending_buffs(&self) -> &[StoryBuff] {
        &self.pending_buffs
    }

    pub fn vote(&self) -> Option<&ActiveVote> {
        self.vote.as_ref()
    }

    pub fn battle(&self) -> Option<&BattleSession> {
        self.battle.as_ref()
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            code: self.code.clone(),
            host: self.host.clone(),
            stage: self.stage,
            players: self.players.clone(),
            chapter_id: self.chapter_id.clone(),
            node_id: self.node_id.clone(),
            pending_buffs: self.pending_buffs.clone(),
            vote: self.vote.as_ref().map(ActiveVote::snapshot),
            battle: self.battle.as_ref().map(BattleSnapshot::from),
        }
    }

    fn updated(&self) -> RoomEvent {
        RoomEvent::RoomUpdated(self.snapshot())
    }

    fn player_index(&self, client: &ClientId) -> Result<usize, RoomError> {
        self.players
            .iter()
            .position(|p| &p.id == client)
            .ok_or(RoomError::NotInRoom)
    }

    fn require_host(&self, client: &ClientId) -> Result<(), RoomError> {
        if &self.host != client {
            return Err(RoomError::NotHost);
        }
        Ok(())
    }

    fn require_stage(&self, expected: Stage) -> Result<(), RoomError> {
        if self.stage != expected {
            return Err(RoomError::WrongStage {
                expected,
                actual: self.stage,
            });
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lobby
    // ─────────────────────────────────────────────────────────────────────────

    pub fn join(&mut self, client: ClientId, name: Option<&str>) -> Result<Vec<RoomEvent>, RoomError> {
        if self.stage != Stage::Lobby {
            return Err(RoomError::AlreadyStarted);
        }
        if self.players.len() >= self.config.max_players {
            return Err(RoomError::RoomFull {
                max: self.config.max_players,
            });
        }
        if self.player(&client).is_some() {
            return Err(RoomError::AlreadyInRoom);
        }

        let name = name
            .map(str::to_string)
            .unwrap_or_else(|| format!("Player {}", self.players.len() + 1));
        info!(room = %self.code, client = %client, "Player joined");
        self.players.push(Player::new(client, name));
        Ok(vec![self.updated()])
    }

    /// Select a character and/or toggle readiness.
    ///
    /// Switching releases the previous character before claiming the new
    /// one and resets combat state to the new character's base.
    pub fn update_player(
        &mut self,
        client: &ClientId,
        character: Option<&str>,
        ready: Option<bool>,
    ) -> Result<Vec<RoomEvent>, RoomError> {
        let index = self.player_index(client)?;

        if let Some(id) = character {
            if self.stage == Stage::Battle {
                return Err(RoomError::CharacterLocked);
            }
            let definition = self
                .catalog
                .character(id)
                .cloned()
                .ok_or_else(|| RoomError::UnknownCharacter { id: id.to_string() })?;

            let player = &self.players[index];
            if player.character_id.as_deref() != Some(id) {
                if self.claimed.contains(id) {
                    return Err(RoomError::CharacterTaken { id: id.to_string() });
                }
                if let Some(previous) = &player.character_id {
                    self.claimed.remove(previous);
                }
                self.claimed.insert(id.to_string());
                self.players[index].assign_character(&definition);
                debug!(room = %self.code, client = %client, character = id, "Character selected");
            }
        }

        if let Some(ready) = ready {
            self.players[index].ready = ready;
        }
        Ok(vec![self.updated()])
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Story
    // ─────────────────────────────────────────────────────────────────────────

    pub fn start_story(&mut self, client: &ClientId) -> Result<Vec<RoomEvent>, RoomError> {
        self.require_host(client)?;
        self.require_stage(Stage::Lobby)?;
        let required = self.config.min_players_to_start;
        if self.players.len() < required {
            return Err(RoomError::NotEnoughPlayers {
                required,
                present: self.players.len(),
            });
        }

        info!(room = %self.code, players = self.players.len(), "Story started");
        self.stage = Stage::Story;
        let mut events = Vec::new();
        self.enter_node(&mut events);
        events.push(self.updated());
        Ok(events)
    }

    /// Apply the current node's rewards and announce it.
    fn enter_node(&mut self, events: &mut Vec<RoomEvent>) {
        let story = Arc::clone(&self.story);
        let chapter = story.chapter(&self.chapter_id);
        let node = story.node(&self.chapter_id, &self.node_id);

        if let Some(reward) = node.and_then(|n| n.reward.as_ref()) {
            if let Some(buff) = reward.buff {
                self.pending_buffs.push(buff);
                events.push(RoomEvent::StoryReward(RewardGrant::Buff { buff }));
            }
            if let Some(amount) = reward.heal {
                self.restore_players(amount, 0);
                events.push(RoomEvent::StoryReward(RewardGrant::Heal { amount }));
            }
            if let Some(amount) = reward.resource {
                self.restore_players(0, amount);
                events.push(RoomEvent::StoryReward(RewardGrant::Resource { amount }));
            }
        }

        events.push(RoomEvent::StoryNode(StoryNodeView {
            chapter_id: self.chapter_id.clone(),
            node_id: self.node_id.clone(),
            title: chapter.map(|c| c.title.clone()),
            narrative: chapter.map(|c| c.narrative.clone()),
            boss: node.and_then(|n| n.boss.clone()),
            dialogue: node.map(|n| n.dialogue.clone()).unwrap_or_default(),
        }));
        debug!(room = %self.code, chapter = %self.chapter_id, node = %self.node_id, "Entered story node");
    }

    fn restore_players(&mut self, health: i32, resource: i32) {
        for player in &mut self.players {
            let Some(definition) = player
                .character_id
                .as_deref()
                .and_then(|id| self.catalog.character(id))
            else {
                continue;
            };
            player.restore(definition, health, resource);
        }
    }

    fn move_to_chapter(&mut self, chapter_id: &str, events: &mut Vec<RoomEvent>) {
        self.chapter_id = chapter_id.to_string();
        if let Some(start) = self.story.chapter_start(chapter_id) {
            self.node_id = start.to_string();
        }
        self.enter_node(events);
    }

    fn move_to_node(&mut self, node_id: &str, events: &mut Vec<RoomEvent>) {
        self.node_id = node_id.to_string();
        self.enter_node(events);
    }

    /// Follow `option` from the current node. Unknown options leave the
    /// position unchanged.
    fn next_from_option(&mut self, option: &str, events: &mut Vec<RoomEvent>) {
        let story = Arc::clone(&self.story);
        let Some(chosen) = story
            .node(&self.chapter_id, &self.node_id)
            .and_then(|n| n.option(option))
        else {
            debug!(room = %self.code, option, "Option not on current node");
            return;
        };
        if let Some(chapter) = &chosen.next_chapter {
            self.move_to_chapter(chapter, events);
        } else if let Some(node) = &chosen.next {
            self.move_to_node(node, events);
        }
    }

    /// After a victory: a chapter's final boss with a chapter link opens the
    /// next chapter, otherwise a direct successor node is entered.
    fn advance_after_boss(&mut self, events: &mut Vec<RoomEvent>) {
        let story = Arc::clone(&self.story);
        let Some(node) = story.node(&self.chapter_id, &self.node_id) else {
            return;
        };
        let final_boss = story
            .chapter(&self.chapter_id)
            .and_then(|c| c.final_boss.as_deref());

        let closes_chapter = node.boss.is_some() && node.boss.as_deref() == final_boss;
        match (&node.next_chapter, &node.next) {
            (Some(chapter), _) if closes_chapter => self.move_to_chapter(chapter, events),
            (_, Some(next)) => self.move_to_node(next, events),
            _ => {}
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Voting
    // ─────────────────────────────────────────────────────────────────────────

    /// Open a poll. Without explicit options the current node's options are
    /// offered. The returned ticket is used to schedule the deadline.
    pub fn start_vote(
        &mut self,
        client: &ClientId,
        node_id: Option<&str>,
        options: Option<Vec<String>>,
        duration: Option<Duration>,
    ) -> Result<(Vec<RoomEvent>, VoteTicket), RoomError> {
        self.require_host(client)?;
        if self.vote.is_some() {
            return Err(RoomError::VoteInProgress);
        }
        self.require_stage(Stage::Story)?;

        let node_id = node_id.unwrap_or(&self.node_id).to_string();
        let options = match options {
            Some(options) => options,
            None => self
                .story
                .node(&self.chapter_id, &node_id)
                .map(|n| n.option_ids())
                .unwrap_or_default(),
        };
        if options.is_empty() {
            return Err(RoomError::NoVoteOptions);
        }
        let duration = duration.unwrap_or(Duration::from_secs(self.config.default_vote_secs));

        let id = self.next_vote_id;
        self.next_vote_id += 1;
        self.node_id = node_id;
        self.stage = Stage::Vote;
        let vote = ActiveVote::new(id, self.node_id.clone(), options, duration);
        info!(room = %self.code, vote = id, options = ?vote.options, ?duration, "Vote started");

        let started = RoomEvent::VoteStarted {
            vote_id: id,
            node_id: vote.node_id.clone(),
            options: vote.options.clone(),
            ends_at: vote.ends_at(),
        };
        self.vote = Some(vote);
        let events = vec![started, self.updated()];
        let ticket = VoteTicket {
            room: self.code.clone(),
            vote_id: id,
            duration,
        };
        Ok((events, ticket))
    }

    /// Park the deadline task's abort handle on the matching vote. A handle
    /// for a vote that already ended is aborted on the spot.
    pub fn attach_vote_timer(&mut self, vote_id: u64, handle: AbortHandle) {
        match self.vote.as_mut() {
            Some(vote) if vote.id == vote_id => vote.set_timer(handle),
            _ => handle.abort(),
        }
    }

    pub fn cast_vote(&mut self, client: &ClientId, option: &str) -> Result<Vec<RoomEvent>, RoomError> {
        self.player_index(client)?;
        let player_count = self.players.len();
        let Some(vote) = self.vote.as_mut() else {
            debug!(room = %self.code, client = %client, "Vote cast with no active vote, ignoring");
            return Ok(Vec::new());
        };

        vote.record(client, option)?;
        let mut events = vec![RoomEvent::VoteUpdated {
            votes: vote.votes.clone(),
        }];

        if let Some(winner) = vote.majority(player_count) {
            events.extend(self.finalize_vote(Some(winner), true));
        }
        Ok(events)
    }

    /// Deadline expiry for `vote_id`. Does nothing if that vote already ended.
    pub fn vote_deadline(&mut self, vote_id: u64, dice: &mut dyn Dice) -> Vec<RoomEvent> {
        let chosen = match &self.vote {
            Some(vote) if vote.id == vote_id => vote.deadline_choice(dice),
            _ => {
                debug!(room = %self.code, vote = vote_id, "Stale vote deadline, ignoring");
                return Vec::new();
            }
        };
        self.finalize_vote(chosen, false)
    }

    fn finalize_vote(&mut self, chosen: Option<String>, by_majority: bool) -> Vec<RoomEvent> {
        let Some(mut vote) = self.vote.take() else {
            return Vec::new();
        };
        if by_majority {
            vote.cancel_timer();
        }
        info!(room = %self.code, vote = vote.id, ?chosen, by_majority, "Vote finalized");

        self.stage = Stage::Story;
        let mut events = vec![RoomEvent::VoteFinalized {
            vote_id: vote.id,
            chosen: chosen.clone(),
            by_majority,
        }];
        if let Some(option) = chosen {
            self.next_from_option(&option, &mut events);
        }
        events.push(self.updated());
        events
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Battle
    // ─────────────────────────────────────────────────────────────────────────

    /// Start a battle against the current node's boss or `boss_override`.
    pub fn start_battle(
        &mut self,
        client: &ClientId,
        boss_override: Option<&str>,
        dice: &mut dyn Dice,
    ) -> Result<Vec<RoomEvent>, RoomError> {
        self.require_host(client)?;
        self.require_stage(Stage::Story)?;

        let boss_id = match boss_override {
            Some(id) => id.to_string(),
            None => self
                .story
                .node(&self.chapter_id, &self.node_id)
                .and_then(|n| n.boss.clone())
                .ok_or(RoomError::NoBoss)?,
        };
        let boss = self
            .catalog
            .enemy(&boss_id)
            .cloned()
            .ok_or_else(|| RoomError::UnknownEnemy { id: boss_id.clone() })?;

        let heroes: Vec<Combatant> = self
            .players
            .iter()
            .filter_map(|p| {
                let definition = self.catalog.character(p.character_id.as_deref()?)?;
                Some(Combatant::hero(p.id.clone(), definition.clone(), p.stats?))
            })
            .collect();
        if heroes.is_empty() {
            return Err(RoomError::NoHeroes);
        }

        let blessings = std::mem::take(&mut self.pending_buffs);
        let battle = BattleSession::start(boss, heroes, &blessings, self.config.rules.clone(), dice);
        info!(room = %self.code, boss = %boss_id, heroes = battle.heroes().len(), "Battle started");

        self.stage = Stage::Battle;
        let mut events = vec![
            RoomEvent::BattleStarted(BattleSnapshot::from(&battle)),
            RoomEvent::TurnChanged {
                turn_index: battle.turn_index(),
                slot: battle.current_slot(),
            },
        ];
        self.battle = Some(battle);
        self.mirror_heroes();
        events.push(self.updated());
        Ok(events)
    }

    pub fn perform_ability(
        &mut self,
        client: &ClientId,
        ability_id: &str,
        dice: &mut dyn Dice,
    ) -> Result<Vec<RoomEvent>, RoomError> {
        self.player_index(client)?;
        let Some(battle) = self.battle.as_mut() else {
            debug!(room = %self.code, client = %client, "Ability with no active battle, ignoring");
            return Ok(Vec::new());
        };
        let outcome = battle.perform_hero_ability(client, ability_id, dice)?;
        let mut events = self.battle_events(outcome);
        events.push(self.updated());
        Ok(events)
    }

    /// Any member may trigger the boss's turn.
    pub fn boss_turn(&mut self, client: &ClientId, dice: &mut dyn Dice) -> Result<Vec<RoomEvent>, RoomError> {
        self.player_index(client)?;
        let Some(battle) = self.battle.as_mut() else {
            debug!(room = %self.code, client = %client, "Boss turn with no active battle, ignoring");
            return Ok(Vec::new());
        };
        let outcome = battle.perform_boss_turn(dice)?;
        let mut events = self.battle_events(outcome);
        events.push(self.updated());
        Ok(events)
    }

    fn mirror_heroes(&mut self) {
        let Some(battle) = &self.battle else {
            return;
        };
        for player in &mut self.players {
            if let Some(hero) = battle.hero_of(&player.id) {
                player.mirror(hero);
            }
        }
    }

    /// Log lines plus either the next turn or the battle's end.
    fn battle_events(&mut self, outcome: TurnOutcome) -> Vec<RoomEvent> {
        self.mirror_heroes();
        let mut events: Vec<RoomEvent> = outcome.log.into_iter().map(RoomEvent::BattleLog).collect();

        match outcome.winner {
            Some(winner) => self.end_battle(winner, &mut events),
            None => {
                let slot = self.battle.as_ref().and_then(|b| b.current_slot());
                events.push(RoomEvent::TurnChanged {
                    turn_index: outcome.turn_index,
                    slot,
                });
            }
        }
        events
    }

    fn end_battle(&mut self, winner: Side, events: &mut Vec<RoomEvent>) {
        let Some(battle) = self.battle.take() else {
            return;
        };
        for player in &mut self.players {
            if let Some(hero) = battle.hero_of(&player.id) {
                player.finish_battle(hero);
            }
        }
        info!(room = %self.code, ?winner, "Battle ended");

        self.stage = Stage::Story;
        events.push(RoomEvent::BattleEnded { winner });
        if winner == Side::Heroes {
            self.advance_after_boss(events);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Misc
    // ─────────────────────────────────────────────────────────────────────────

    /// Informational public roll. Returns the rolled values and the broadcast.
    pub fn roll_dice(
        &mut self,
        client: &ClientId,
        kind: DiceKind,
        dice: &mut dyn Dice,
    ) -> Result<(Vec<u32>, Vec<RoomEvent>), RoomError> {
        self.player_index(client)?;
        let values = match kind {
            DiceKind::D20 => vec![d20(dice)],
            DiceKind::Villain => {
                let pack = VillainPack::roll(dice);
                vec![pack.d4[0], pack.d4[1], pack.d20[0], pack.d20[1]]
            }
        };
        let event = RoomEvent::DiceRolled {
            by: client.clone(),
            kind,
            values: values.clone(),
        };
        Ok((values, vec![event]))
    }

    /// Remove `client` from the room.
    ///
    /// Releases its character and hands the host role to the earliest
    /// remaining player. A hero in a running battle forfeits. Votes already
    /// cast stay counted.
    pub fn leave(&mut self, client: &ClientId) -> Vec<RoomEvent> {
        let Ok(index) = self.player_index(client) else {
            return Vec::new();
        };
        let player = self.players.remove(index);
        if let Some(character) = &player.character_id {
            self.claimed.remove(character);
        }
        info!(room = %self.code, client = %client, "Player left");

        let mut events = match self.battle.as_mut().and_then(|b| b.forfeit(client)) {
            Some(outcome) => self.battle_events(outcome),
            None => Vec::new(),
        };

        if &self.host == client {
            if let Some(next) = self.players.first() {
                self.host = next.id.clone();
                info!(room = %self.code, host = %self.host, "Host reassigned");
            }
        }

        if self.players.is_empty() {
            if let Some(vote) = self.vote.as_mut() {
                vote.cancel_timer();
            }
            return events;
        }
        events.push(self.updated());
        events
    }

    /// Abort any pending timer before the room is dropped.
    pub fn close(&mut self) {
        if let Some(vote) = self.vote.as_mut() {
            vote.cancel_timer();
        }
    }
}
