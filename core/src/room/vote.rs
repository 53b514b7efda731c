//! Timed option polls
//!
//! A vote ends exactly once: either early when one option holds a strict
//! majority of the room, or at its deadline. The deadline timer lives
//! outside the room; its abort handle is parked here so an early finish
//! can cancel it.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tokio::task::AbortHandle;

use super::RoomError;
use crate::combatant::ClientId;
use crate::dice::{Dice, choose};

/// Handed to the caller that opened a vote so it can schedule the deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteTicket {
    pub room: String,
    pub vote_id: u64,
    pub duration: Duration,
}

#[derive(Debug)]
pub struct ActiveVote {
    pub id: u64,
    pub node_id: String,
    pub options: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    /// client -> chosen option
    pub votes: BTreeMap<ClientId, String>,
    timer: Option<AbortHandle>,
}

impl ActiveVote {
    pub fn new(id: u64, node_id: String, options: Vec<String>, duration: Duration) -> Self {
        Self {
            id,
            node_id,
            options,
            started_at: Utc::now(),
            duration,
            votes: BTreeMap::new(),
            timer: None,
        }
    }

    pub fn ends_at(&self) -> DateTime<Utc> {
        self.started_at + TimeDelta::from_std(self.duration).unwrap_or(TimeDelta::zero())
    }

    /// Record or change `client`'s vote.
    pub fn record(&mut self, client: &ClientId, option: &str) -> Result<(), RoomError> {
        if !self.options.iter().any(|o| o == option) {
            return Err(RoomError::InvalidOption {
                option: option.to_string(),
            });
        }
        self.votes.insert(client.clone(), option.to_string());
        Ok(())
    }

    /// Count per offered option, in option order.
    pub fn tally(&self) -> Vec<(&str, usize)> {
        self.options
            .iter()
            .map(|option| {
                let count = self.votes.values().filter(|v| *v == option).count();
                (option.as_str(), count)
            })
            .collect()
    }

    /// Option holding strictly more than half of `player_count`, if any.
    pub fn majority(&self, player_count: usize) -> Option<String> {
        self.tally()
            .into_iter()
            .find(|&(_, count)| count > player_count / 2)
            .map(|(option, _)| option.to_string())
    }

    /// Deadline rule: a unique plurality leader wins; otherwise a uniform
    /// pick among the tied leaders, or among every option when nobody voted.
    pub fn deadline_choice(&self, dice: &mut dyn Dice) -> Option<String> {
        let tally = self.tally();
        let top = tally.iter().map(|&(_, count)| count).max().unwrap_or(0);
        let leaders: Vec<&str> = if top == 0 {
            self.options.iter().map(String::as_str).collect()
        } else {
            tally
                .iter()
                .filter(|&&(_, count)| count == top)
                .map(|&(option, _)| option)
                .collect()
        };
        choose(dice, &leaders).map(|o| o.to_string())
    }

    pub fn set_timer(&mut self, handle: AbortHandle) {
        if let Some(previous) = self.timer.replace(handle) {
            previous.abort();
        }
    }

    /// Abort the pending deadline task, if one was attached.
    pub fn cancel_timer(&mut self) {
        if let Some(handle) = self.timer.take() {
            handle.abort();
        }
    }

    pub fn snapshot(&self) -> VoteSnapshot {
        VoteSnapshot {
            id: self.id,
            node_id: self.node_id.clone(),
            options: self.options.clone(),
            started_at: self.started_at,
            ends_at: self.ends_at(),
            votes: self.votes.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoteSnapshot {
    pub id: u64,
    pub node_id: String,
    pub options: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub votes: BTreeMap<ClientId, String>,
}
