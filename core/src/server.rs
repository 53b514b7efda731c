//! Async game server
//!
//! Wraps the [`SessionManager`] in a single `tokio::sync::Mutex` so intents
//! are applied one at a time in arrival order, and fans the resulting
//! events out as [`Dispatch`] messages on an unbounded channel. The
//! transport owns the receiving end.
//!
//! Vote deadlines run as spawned sleeps that re-enter the manager by room
//! code and vote id. Early majority aborts them through the handle parked
//! on the vote.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tracing::{debug, warn};

use crate::combatant::ClientId;
use crate::registry::{Broadcast, SessionManager};
use crate::room::{DiceKind, RoomError, RoomEvent, RoomSnapshot, VoteTicket};

/// One event addressed to a set of clients.
#[derive(Debug, Clone)]
pub struct Dispatch {
    pub room: String,
    pub recipients: Vec<ClientId>,
    pub event: RoomEvent,
}

/// Client request, transport-agnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    CreateRoom {
        name: Option<String>,
    },
    JoinRoom {
        code: String,
        name: Option<String>,
    },
    UpdatePlayer {
        character: Option<String>,
        ready: Option<bool>,
    },
    StartStory,
    StartVote {
        node: Option<String>,
        options: Option<Vec<String>>,
        duration: Option<Duration>,
    },
    CastVote {
        option: String,
    },
    StartBattle {
        boss: Option<String>,
    },
    PerformAbility {
        ability: String,
    },
    BossTurn,
    RollDice {
        kind: DiceKind,
    },
    Disconnect,
}

/// Direct answer to the requesting client. Everything else arrives as
/// dispatched events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentReply {
    Done,
    Room(String),
    Rolled(Vec<u32>),
}

#[derive(Clone)]
pub struct GameServer {
    inner: Arc<Mutex<SessionManager>>,
    events: mpsc::UnboundedSender<Dispatch>,
}

impl GameServer {
    pub fn new(manager: SessionManager) -> (Self, mpsc::UnboundedReceiver<Dispatch>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let server = Self {
            inner: Arc::new(Mutex::new(manager)),
            events: tx,
        };
        (server, rx)
    }

    /// Apply one intent from `client`. Validation errors are returned here
    /// and never dispatched.
    pub async fn handle(&self, client: ClientId, intent: Intent) -> Result<IntentReply, RoomError> {
        let mut manager = self.inner.lock().await;
        debug!(client = %client, ?intent, "Handling intent");

        let broadcast = match intent {
            Intent::CreateRoom { name } => {
                let broadcast = manager.create_room(client, name.as_deref())?;
                let code = broadcast.room.clone();
                self.publish(broadcast);
                return Ok(IntentReply::Room(code));
            }
            Intent::JoinRoom { code, name } => {
                let broadcast = manager.join_room(client, &code, name.as_deref())?;
                let code = broadcast.room.clone();
                self.publish(broadcast);
                return Ok(IntentReply::Room(code));
            }
            Intent::UpdatePlayer { character, ready } => {
                manager.update_player(&client, character.as_deref(), ready)?
            }
            Intent::StartStory => manager.start_story(&client)?,
            Intent::StartVote {
                node,
                options,
                duration,
            } => {
                let (broadcast, ticket) =
                    manager.start_vote(&client, node.as_deref(), options, duration)?;
                self.schedule_vote_deadline(&mut manager, ticket);
                broadcast
            }
            Intent::CastVote { option } => manager.cast_vote(&client, &option)?,
            Intent::StartBattle { boss } => manager.start_battle(&client, boss.as_deref())?,
            Intent::PerformAbility { ability } => manager.perform_ability(&client, &ability)?,
            Intent::BossTurn => manager.boss_turn(&client)?,
            Intent::RollDice { kind } => {
                let (values, broadcast) = manager.roll_dice(&client, kind)?;
                self.publish(broadcast);
                return Ok(IntentReply::Rolled(values));
            }
            Intent::Disconnect => {
                let Some(code) = manager.room_of(&client).map(str::to_string) else {
                    return Err(RoomError::NotInRoom);
                };
                if let Some(broadcast) = manager.disconnect(&client) {
                    self.publish(broadcast);
                }
                self.send(Dispatch {
                    room: code.clone(),
                    recipients: vec![client],
                    event: RoomEvent::RoomClosed { code },
                });
                return Ok(IntentReply::Done);
            }
        };

        self.publish(broadcast);
        Ok(IntentReply::Done)
    }

    /// Current snapshot of `code`, if the room exists.
    pub async fn room_snapshot(&self, code: &str) -> Option<RoomSnapshot> {
        self.inner.lock().await.room(code).map(|room| room.snapshot())
    }

    pub async fn room_of(&self, client: &ClientId) -> Option<String> {
        self.inner.lock().await.room_of(client).map(str::to_string)
    }

    fn schedule_vote_deadline(&self, manager: &mut SessionManager, ticket: VoteTicket) {
        let server = self.clone();
        let VoteTicket {
            room,
            vote_id,
            duration,
        } = ticket;
        let code = room.clone();

        let task = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            server.finalize_vote(&code, vote_id).await;
        });
        manager.attach_vote_timer(&room, vote_id, task.abort_handle());
    }

    async fn finalize_vote(&self, code: &str, vote_id: u64) {
        let mut manager = self.inner.lock().await;
        match manager.finalize_vote_deadline(code, vote_id) {
            Some(broadcast) => self.publish(broadcast),
            None => debug!(room = code, vote = vote_id, "Vote deadline fired after finalization"),
        }
    }

    fn publish(&self, broadcast: Broadcast) {
        let Broadcast {
            room,
            recipients,
            events,
        } = broadcast;
        for event in events {
            self.send(Dispatch {
                room: room.clone(),
                recipients: recipients.clone(),
                event,
            });
        }
    }

    fn send(&self, dispatch: Dispatch) {
        if self.events.send(dispatch).is_err() {
            warn!("Event receiver dropped, dispatch discarded");
        }
    }
}

#[cfg(test)]
mod tests {
    use ancestral_types::ServerConfig;

    use super::*;
    use crate::dice::scripted::ScriptedDice;
    use crate::room::Stage;
    use crate::test_support::{client, small_catalog, small_story};

    fn server() -> (GameServer, mpsc::UnboundedReceiver<Dispatch>) {
        let manager = SessionManager::new(
            small_catalog(),
            small_story(),
            ServerConfig::default(),
            Box::new(ScriptedDice::default()),
        );
        GameServer::new(manager)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<Dispatch>) -> Vec<Dispatch> {
        let mut out = Vec::new();
        while let Ok(dispatch) = rx.try_recv() {
            out.push(dispatch);
        }
        out
    }

    async fn two_player_story(server: &GameServer) -> String {
        let Ok(IntentReply::Room(code)) = server
            .handle(client("p1"), Intent::CreateRoom { name: None })
            .await
        else {
            panic!("room not created");
        };
        let join = Intent::JoinRoom {
            code: code.clone(),
            name: None,
        };
        server.handle(client("p2"), join).await.unwrap();
        for (id, character) in [("p1", "striker"), ("p2", "mender")] {
            let update = Intent::UpdatePlayer {
                character: Some(character.into()),
                ready: Some(true),
            };
            server.handle(client(id), update).await.unwrap();
        }
        server.handle(client("p1"), Intent::StartStory).await.unwrap();
        code
    }

    fn one_second_vote() -> Intent {
        Intent::StartVote {
            node: None,
            options: None,
            duration: Some(Duration::from_secs(1)),
        }
    }

    fn finalizations(dispatches: &[Dispatch]) -> Vec<(Option<String>, bool)> {
        dispatches
            .iter()
            .filter_map(|d| match &d.event {
                RoomEvent::VoteFinalized {
                    chosen, by_majority, ..
                } => Some((chosen.clone(), *by_majority)),
                _ => None,
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn vote_times_out_and_story_advances() {
        let (server, mut rx) = server();
        let code = two_player_story(&server).await;
        server.handle(client("p1"), one_second_vote()).await.unwrap();
        drain(&mut rx);

        tokio::time::sleep(Duration::from_millis(900)).await;
        assert_eq!(server.room_snapshot(&code).await.unwrap().stage, Stage::Vote);

        tokio::time::sleep(Duration::from_millis(200)).await;
        let dispatches = drain(&mut rx);
        // no votes: uniform pick, scripted dice roll 1 -> first option
        assert_eq!(finalizations(&dispatches), vec![(Some("left".into()), false)]);
        assert!(dispatches.iter().all(|d| d.recipients.len() == 2));

        let snapshot = server.room_snapshot(&code).await.unwrap();
        assert_eq!(snapshot.stage, Stage::Story);
        assert_eq!(snapshot.node_id, "fight");
        assert!(snapshot.vote.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn majority_finalizes_once_and_cancels_timer() {
        let (server, mut rx) = server();
        let code = two_player_story(&server).await;
        server.handle(client("p1"), one_second_vote()).await.unwrap();

        for id in ["p1", "p2"] {
            let vote = Intent::CastVote {
                option: "right".into(),
            };
            server.handle(client(id), vote).await.unwrap();
        }
        tokio::time::sleep(Duration::from_secs(5)).await;

        let dispatches = drain(&mut rx);
        assert_eq!(finalizations(&dispatches), vec![(Some("right".into()), true)]);
        assert_eq!(server.room_snapshot(&code).await.unwrap().node_id, "throne");
    }

    #[tokio::test(start_paused = true)]
    async fn second_vote_is_not_finalized_by_first_timer() {
        let (server, mut rx) = server();
        let code = two_player_story(&server).await;
        server.handle(client("p1"), one_second_vote()).await.unwrap();
        for id in ["p1", "p2"] {
            let vote = Intent::CastVote { option: "left".into() };
            server.handle(client(id), vote).await.unwrap();
        }

        // fight node has no options of its own
        let vote = Intent::StartVote {
            node: None,
            options: Some(vec!["a".into(), "b".into()]),
            duration: Some(Duration::from_secs(10)),
        };
        server.handle(client("p1"), vote).await.unwrap();
        drain(&mut rx);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(finalizations(&drain(&mut rx)).is_empty());
        assert_eq!(server.room_snapshot(&code).await.unwrap().stage, Stage::Vote);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(finalizations(&drain(&mut rx)).len(), 1);
    }

    #[tokio::test]
    async fn errors_go_to_requester_only() {
        let (server, mut rx) = server();
        let code = two_player_story(&server).await;
        drain(&mut rx);

        let err = server.handle(client("p2"), Intent::StartStory).await.unwrap_err();
        assert_eq!(err, RoomError::NotHost);
        let err = server
            .handle(client("p3"), Intent::JoinRoom { code, name: None })
            .await
            .unwrap_err();
        assert_eq!(err, RoomError::AlreadyStarted);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn disconnect_notifies_departing_client_and_room() {
        let (server, mut rx) = server();
        let code = two_player_story(&server).await;
        drain(&mut rx);

        server.handle(client("p1"), Intent::Disconnect).await.unwrap();
        let dispatches = drain(&mut rx);
        let closed = dispatches.last().unwrap();
        assert!(matches!(&closed.event, RoomEvent::RoomClosed { code: c } if *c == code));
        assert_eq!(closed.recipients, vec![client("p1")]);
        assert!(matches!(dispatches[0].event, RoomEvent::RoomUpdated(_)));
        assert_eq!(dispatches[0].recipients, vec![client("p2")]);

        assert_eq!(server.room_of(&client("p1")).await, None);
        assert_eq!(
            server.handle(client("p1"), Intent::Disconnect).await.unwrap_err(),
            RoomError::NotInRoom
        );

        server.handle(client("p2"), Intent::Disconnect).await.unwrap();
        assert!(server.room_snapshot(&code).await.is_none());
    }

    #[tokio::test]
    async fn public_roll_replies_and_broadcasts() {
        let (server, mut rx) = server();
        two_player_story(&server).await;
        drain(&mut rx);

        let reply = server
            .handle(client("p2"), Intent::RollDice { kind: DiceKind::D20 })
            .await
            .unwrap();
        assert_eq!(reply, IntentReply::Rolled(vec![1]));
        let dispatches = drain(&mut rx);
        assert_eq!(dispatches.len(), 1);
        assert_eq!(dispatches[0].event.name(), "dice_rolled");
    }
}
