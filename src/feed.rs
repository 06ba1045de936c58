//! Event Log and Feed
//!
//! The [`EventLog`] is the ordered record of a game. It is append-only while
//! the game runs and read-only afterwards. [`EventFeed`] fans a finished log
//! out to in-process subscribers, and [`stream_paced`] replays it over a
//! tokio channel at a fixed cadence for live-style presentation.

use std::time::Duration;

use serde::{Serialize, Deserialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

use crate::core::hash::{HashDomain, StateHash, StateHasher};
use crate::game::events::{GameEvent, GameEventData};
use crate::game::state::Half;

/// Channel depth for paced replay.
const FEED_CHANNEL_DEPTH: usize = 64;

// =============================================================================
// EVENT LOG
// =============================================================================

/// Ordered, append-only list of game events.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<GameEvent>,
}

impl EventLog {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event, assigning the next sequence number.
    pub fn push(&mut self, inning: u16, half: Half, data: GameEventData) -> &GameEvent {
        let seq = self.events.len() as u32;
        self.events.push(GameEvent::new(seq, inning, half, data));
        &self.events[self.events.len() - 1]
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// No events recorded yet.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// All events in order.
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Iterate events in order.
    pub fn iter(&self) -> std::slice::Iter<'_, GameEvent> {
        self.events.iter()
    }

    /// Most recent event.
    pub fn last(&self) -> Option<&GameEvent> {
        self.events.last()
    }

    /// Number of pitches recorded.
    pub fn pitch_count(&self) -> usize {
        self.events.iter().filter(|e| e.as_pitch().is_some()).count()
    }

    /// The log ends with a `GameEnded` event.
    pub fn is_complete(&self) -> bool {
        matches!(self.last().map(|e| &e.data), Some(GameEventData::GameEnded { .. }))
    }

    /// Pretty JSON rendering for external consumers.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Decode a log written by `to_json`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Compact binary encoding.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Decode a log written by `to_bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }

    /// Digest of the binary encoding. Two runs with the same inputs and seed
    /// produce the same digest.
    pub fn digest(&self) -> Result<StateHash, bincode::Error> {
        let bytes = self.to_bytes()?;
        let mut hasher = StateHasher::new(HashDomain::EventLog);
        hasher.put(&(self.events.len() as u64)).write(&bytes);
        Ok(hasher.finalize())
    }
}

impl<'a> IntoIterator for &'a EventLog {
    type Item = &'a GameEvent;
    type IntoIter = std::slice::Iter<'a, GameEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

// =============================================================================
// SUBSCRIBERS
// =============================================================================

/// Callback invoked once per event.
pub type Subscriber = Box<dyn FnMut(&GameEvent) + Send>;

/// Fans events out to registered subscribers in log order.
#[derive(Default)]
pub struct EventFeed {
    subscribers: Vec<Subscriber>,
}

impl EventFeed {
    /// Feed with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for every published event.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&GameEvent) + Send + 'static,
    {
        self.subscribers.push(Box::new(callback));
    }

    /// Number of registered callbacks.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Deliver every event to every subscriber. Returns deliveries made.
    pub fn publish(&mut self, log: &EventLog) -> usize {
        let mut delivered = 0;
        for event in log {
            for subscriber in self.subscribers.iter_mut() {
                subscriber(event);
                delivered += 1;
            }
        }
        debug!("Published {} events to {} subscribers", log.len(), self.subscribers.len());
        delivered
    }
}

impl std::fmt::Debug for EventFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventFeed")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

/// Replay a log over a channel, one event per `pace`.
///
/// A zero `pace` sends every event as fast as the receiver takes them. Must
/// be called inside a tokio runtime. The task stops early when the receiver
/// is dropped.
pub fn stream_paced(log: EventLog, pace: Duration) -> mpsc::Receiver<GameEvent> {
    let (tx, rx) = mpsc::channel(FEED_CHANNEL_DEPTH);
    spawn_replay(log, pace, tx);
    rx
}

/// Spawn the replay task. It resolves to the number of events delivered.
fn spawn_replay(log: EventLog, pace: Duration, tx: mpsc::Sender<GameEvent>) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut ticker = (!pace.is_zero()).then(|| {
            let mut ticker = interval(pace);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });

        let mut sent = 0;
        for event in log.events {
            if let Some(ticker) = ticker.as_mut() {
                ticker.tick().await;
            }
            if tx.send(event).await.is_err() {
                debug!(sent, "Feed receiver dropped, stopping replay");
                break;
            }
            sent += 1;
        }
        sent
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use crate::game::state::{Score, TeamSide};
    use crate::stats::player::PlayerId;

    fn sample_log() -> EventLog {
        let mut log = EventLog::new();
        log.push(1, Half::Top, GameEventData::HalfInningStarted {
            batting: TeamSide::Away,
            pitcher: PlayerId(30),
        });
        log.push(1, Half::Top, GameEventData::HalfInningEnded {
            runs: 0,
            hits: 0,
            left_on_base: 0,
            score: Score::default(),
        });
        log.push(1, Half::Bottom, GameEventData::GameEnded {
            final_score: Score { away: 0, home: 1 },
            innings: 1,
            walk_off: true,
            winner: Some(TeamSide::Home),
            total_pitches: 0,
        });
        log
    }

    #[test]
    fn test_push_assigns_sequence() {
        let log = sample_log();
        let seqs: Vec<u32> = log.iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
        assert!(log.is_complete());
        assert_eq!(log.pitch_count(), 0);
    }

    #[test]
    fn test_digest_is_stable() {
        let a = sample_log();
        let b = sample_log();
        assert_eq!(a.digest().unwrap(), b.digest().unwrap());

        let mut c = sample_log();
        c.push(2, Half::Top, GameEventData::HalfInningStarted {
            batting: TeamSide::Away,
            pitcher: PlayerId(30),
        });
        assert_ne!(a.digest().unwrap(), c.digest().unwrap());
    }

    #[test]
    fn test_json_and_binary_decode() {
        let log = sample_log();
        let json = log.to_json().unwrap();
        assert!(json.contains("HalfInningStarted"));
        assert_eq!(EventLog::from_json(&json).unwrap(), log);
        assert_eq!(EventLog::from_bytes(&log.to_bytes().unwrap()).unwrap(), log);
    }

    #[test]
    fn test_feed_delivers_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut feed = EventFeed::new();
        let sink = seen.clone();
        feed.subscribe(move |event| sink.lock().unwrap().push(event.seq));
        feed.subscribe(|_| {});

        let delivered = feed.publish(&sample_log());
        assert_eq!(delivered, 6);
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_stream_paced_replays_everything() {
        let log = sample_log();
        let mut rx = stream_paced(log.clone(), Duration::from_millis(1));

        let mut received = Vec::new();
        while let Some(event) = rx.recv().await {
            received.push(event);
        }
        assert_eq!(received, log.events().to_vec());
    }

    #[tokio::test]
    async fn test_zero_pace_replays_everything() {
        let log = sample_log();
        let mut rx = stream_paced(log.clone(), Duration::ZERO);

        let mut received = Vec::new();
        while let Some(event) = rx.recv().await {
            received.push(event);
        }
        assert_eq!(received, log.events().to_vec());
    }

    #[tokio::test]
    async fn test_stream_stops_when_receiver_dropped() {
        let mut log = EventLog::new();
        for _ in 0..200 {
            log.push(1, Half::Top, GameEventData::HalfInningStarted {
                batting: TeamSide::Away,
                pitcher: PlayerId(30),
            });
        }

        let (tx, mut rx) = mpsc::channel(1);
        let replay = spawn_replay(log, Duration::from_millis(1), tx);
        assert_eq!(rx.recv().await.map(|e| e.seq), Some(0));
        drop(rx);

        let sent = tokio::time::timeout(Duration::from_secs(5), replay)
            .await
            .expect("replay task kept running")
            .unwrap();
        assert!(sent < 200, "sent {sent}");
    }
}
