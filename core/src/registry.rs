//! Room registry
//!
//! `SessionManager` owns every active room by code plus an explicit
//! client → room map, so intents only need the acting client's id.
//! Rooms are dropped as soon as their last player leaves.

use std::sync::Arc;
use std::time::Duration;

use ancestral_types::ServerConfig;
use hashbrown::HashMap;
use tokio::task::AbortHandle;
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::combatant::ClientId;
use crate::dice::Dice;
use crate::narrative::Story;
use crate::room::{DiceKind, RoomError, RoomEvent, RoomSession, VoteTicket};

/// Unambiguous uppercase alphabet: no I, O, 0 or 1.
pub const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Events from one intent and the room members that should receive them.
#[derive(Debug, Clone)]
pub struct Broadcast {
    pub room: String,
    pub recipients: Vec<ClientId>,
    pub events: Vec<RoomEvent>,
}

impl Broadcast {
    fn of(room: &RoomSession, events: Vec<RoomEvent>) -> Self {
        Self {
            room: room.code().to_string(),
            recipients: room.members(),
            events,
        }
    }
}

pub struct SessionManager {
    rooms: HashMap<String, RoomSession>,
    client_rooms: HashMap<ClientId, String>,
    catalog: Arc<Catalog>,
    story: Arc<Story>,
    config: Arc<ServerConfig>,
    dice: Box<dyn Dice>,
}

impl SessionManager {
    pub fn new(
        catalog: Arc<Catalog>,
        story: Arc<Story>,
        config: ServerConfig,
        dice: Box<dyn Dice>,
    ) -> Self {
        Self {
            rooms: HashMap::new(),
            client_rooms: HashMap::new(),
            catalog,
            story,
            config: Arc::new(config),
            dice,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn room(&self, code: &str) -> Option<&RoomSession> {
        self.rooms.get(code)
    }

    pub fn room_of(&self, client: &ClientId) -> Option<&str> {
        self.client_rooms.get(client).map(String::as_str)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Fresh code from [`ROOM_CODE_ALPHABET`], regenerated while it collides
    /// with an active room.
    fn generate_code(&mut self) -> String {
        loop {
            let code: String = (0..self.config.room_code_length)
                .map(|_| {
                    let index = self.dice.roll(ROOM_CODE_ALPHABET.len() as u32) as usize - 1;
                    ROOM_CODE_ALPHABET[index] as char
                })
                .collect();
            if !self.rooms.contains_key(&code) {
                return code;
            }
            debug!(code, "Room code collision, regenerating");
        }
    }

    /// The caller's room together with the shared dice.
    fn locate(&mut self, client: &ClientId) -> Result<(&mut RoomSession, &mut dyn Dice), RoomError> {
        let code = self.client_rooms.get(client).ok_or(RoomError::NotInRoom)?;
        let room = self
            .rooms
            .get_mut(code.as_str())
            .ok_or_else(|| RoomError::RoomNotFound { code: code.clone() })?;
        Ok((room, self.dice.as_mut()))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Membership
    // ─────────────────────────────────────────────────────────────────────────

    pub fn create_room(&mut self, client: ClientId, name: Option<&str>) -> Result<Broadcast, RoomError> {
        if self.client_rooms.contains_key(&client) {
            return Err(RoomError::AlreadyInRoom);
        }
        let code = self.generate_code();
        let room = RoomSession::new(
            code.clone(),
            client.clone(),
            name,
            Arc::clone(&self.catalog),
            Arc::clone(&self.story),
            Arc::clone(&self.config),
        );
        info!(room = %code, host = %client, "Room created");

        let broadcast = Broadcast {
            room: code.clone(),
            recipients: vec![client.clone()],
            events: vec![RoomEvent::RoomUpdated(room.snapshot())],
        };
        self.rooms.insert(code.clone(), room);
        self.client_rooms.insert(client, code);
        Ok(broadcast)
    }

    pub fn join_room(&mut self, client: ClientId, code: &str, name: Option<&str>) -> Result<Broadcast, RoomError> {
        if self.client_rooms.contains_key(&client) {
            return Err(RoomError::AlreadyInRoom);
        }
        let code = code.trim().to_ascii_uppercase();
        let room = self
            .rooms
            .get_mut(&code)
            .ok_or_else(|| RoomError::RoomNotFound { code: code.clone() })?;
        let events = room.join(client.clone(), name)?;
        let broadcast = Broadcast::of(room, events);
        self.client_rooms.insert(client, code);
        Ok(broadcast)
    }

    /// Remove the client from its room. Returns the broadcast for the
    /// remaining members, or `None` if the client was in no room or the
    /// room was destroyed.
    pub fn disconnect(&mut self, client: &ClientId) -> Option<Broadcast> {
        let code = self.client_rooms.remove(client)?;
        let room = self.rooms.get_mut(&code)?;
        let events = room.leave(client);

        if room.is_empty() {
            room.close();
            self.rooms.remove(&code);
            info!(room = %code, "Room closed");
            return None;
        }
        Some(Broadcast::of(room, events))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Intents
    // ─────────────────────────────────────────────────────────────────────────

    pub fn update_player(
        &mut self,
        client: &ClientId,
        character: Option<&str>,
        ready: Option<bool>,
    ) -> Result<Broadcast, RoomError> {
        let (room, _) = self.locate(client)?;
        let events = room.update_player(client, character, ready)?;
        Ok(Broadcast::of(room, events))
    }

    pub fn start_story(&mut self, client: &ClientId) -> Result<Broadcast, RoomError> {
        let (room, _) = self.locate(client)?;
        let events = room.start_story(client)?;
        Ok(Broadcast::of(room, events))
    }

    pub fn start_vote(
        &mut self,
        client: &ClientId,
        node_id: Option<&str>,
        options: Option<Vec<String>>,
        duration: Option<Duration>,
    ) -> Result<(Broadcast, VoteTicket), RoomError> {
        let (room, _) = self.locate(client)?;
        let (events, ticket) = room.start_vote(client, node_id, options, duration)?;
        Ok((Broadcast::of(room, events), ticket))
    }

    pub fn cast_vote(&mut self, client: &ClientId, option: &str) -> Result<Broadcast, RoomError> {
        let (room, _) = self.locate(client)?;
        let events = room.cast_vote(client, option)?;
        Ok(Broadcast::of(room, events))
    }

    pub fn start_battle(&mut self, client: &ClientId, boss: Option<&str>) -> Result<Broadcast, RoomError> {
        let (room, dice) = self.locate(client)?;
        let events = room.start_battle(client, boss, dice)?;
        Ok(Broadcast::of(room, events))
    }

    pub fn perform_ability(&mut self, client: &ClientId, ability: &str) -> Result<Broadcast, RoomError> {
        let (room, dice) = self.locate(client)?;
        let events = room.perform_ability(client, ability, dice)?;
        Ok(Broadcast::of(room, events))
    }

    pub fn boss_turn(&mut self, client: &ClientId) -> Result<Broadcast, RoomError> {
        let (room, dice) = self.locate(client)?;
        let events = room.boss_turn(client, dice)?;
        Ok(Broadcast::of(room, events))
    }

    pub fn roll_dice(&mut self, client: &ClientId, kind: DiceKind) -> Result<(Vec<u32>, Broadcast), RoomError> {
        let (room, dice) = self.locate(client)?;
        let (values, events) = room.roll_dice(client, kind, dice)?;
        Ok((values, Broadcast::of(room, events)))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Vote timers
    // ─────────────────────────────────────────────────────────────────────────

    /// Deadline callback. A room that is gone or has moved past `vote_id`
    /// yields `None`.
    pub fn finalize_vote_deadline(&mut self, code: &str, vote_id: u64) -> Option<Broadcast> {
        let room = self.rooms.get_mut(code)?;
        let events = room.vote_deadline(vote_id, self.dice.as_mut());
        if events.is_empty() {
            return None;
        }
        Some(Broadcast::of(room, events))
    }

    pub fn attach_vote_timer(&mut self, code: &str, vote_id: u64, handle: AbortHandle) {
        match self.rooms.get_mut(code) {
            Some(room) => room.attach_vote_timer(vote_id, handle),
            None => handle.abort(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::scripted::ScriptedDice;
    use crate::room::Stage;
    use crate::test_support::{client, small_catalog, small_story};

    fn manager(rolls: &[u32]) -> SessionManager {
        SessionManager::new(
            small_catalog(),
            small_story(),
            ServerConfig::default(),
            Box::new(ScriptedDice::new(rolls)),
        )
    }

    #[test]
    fn room_codes_use_the_alphabet_and_avoid_collisions() {
        // first room: six 1s -> "AAAAAA"; second collides once then gets "BAAAAA"
        let mut rolls = vec![1; 12];
        rolls.extend([2, 1, 1, 1, 1, 1]);
        let mut mgr = manager(&rolls);

        let first = mgr.create_room(client("p1"), None).unwrap();
        assert_eq!(first.room, "AAAAAA");
        let second = mgr.create_room(client("p2"), None).unwrap();
        assert_eq!(second.room, "BAAAAA");
        assert_eq!(mgr.room_count(), 2);
    }

    #[test]
    fn clients_belong_to_one_room_at_a_time() {
        let mut mgr = manager(&[]);
        let code = mgr.create_room(client("p1"), Some("Ana")).unwrap().room;
        assert_eq!(
            mgr.create_room(client("p1"), None).unwrap_err(),
            RoomError::AlreadyInRoom
        );

        let joined = mgr.join_room(client("p2"), &code.to_lowercase(), None).unwrap();
        assert_eq!(joined.recipients, vec![client("p1"), client("p2")]);
        assert_eq!(mgr.room_of(&client("p2")), Some(code.as_str()));
        assert_eq!(
            mgr.join_room(client("p2"), &code, None).unwrap_err(),
            RoomError::AlreadyInRoom
        );
    }

    #[test]
    fn unknown_room_and_roomless_client() {
        let mut mgr = manager(&[]);
        assert_eq!(
            mgr.join_room(client("p1"), "ZZZZZZ", None).unwrap_err(),
            RoomError::RoomNotFound { code: "ZZZZZZ".into() }
        );
        assert_eq!(mgr.start_story(&client("p1")).unwrap_err(), RoomError::NotInRoom);
    }

    #[test]
    fn last_disconnect_destroys_room() {
        let mut mgr = manager(&[]);
        let code = mgr.create_room(client("p1"), None).unwrap().room;
        mgr.join_room(client("p2"), &code, None).unwrap();
        mgr.update_player(&client("p1"), Some("striker"), None).unwrap();

        let remaining = mgr.disconnect(&client("p1")).unwrap();
        assert_eq!(remaining.recipients, vec![client("p2")]);
        assert_eq!(mgr.room(&code).unwrap().host(), &client("p2"));
        assert!(!mgr.room(&code).unwrap().is_claimed("striker"));

        assert!(mgr.disconnect(&client("p2")).is_none());
        assert!(mgr.room(&code).is_none());
        assert!(mgr.room_of(&client("p2")).is_none());
        assert!(mgr.disconnect(&client("p2")).is_none());
    }

    #[test]
    fn deadline_for_gone_or_finished_vote_is_ignored() {
        let mut mgr = manager(&[]);
        let code = mgr.create_room(client("p1"), None).unwrap().room;
        mgr.join_room(client("p2"), &code, None).unwrap();
        mgr.start_story(&client("p1")).unwrap();
        let (_, ticket) = mgr.start_vote(&client("p1"), None, None, None).unwrap();

        mgr.cast_vote(&client("p1"), "left").unwrap();
        let finalized = mgr.finalize_vote_deadline(&code, ticket.vote_id).unwrap();
        assert_eq!(mgr.room(&code).unwrap().stage(), Stage::Story);
        assert_eq!(finalized.recipients.len(), 2);

        assert!(mgr.finalize_vote_deadline(&code, ticket.vote_id).is_none());
        assert!(mgr.finalize_vote_deadline("NOROOM", ticket.vote_id).is_none());
    }
}
