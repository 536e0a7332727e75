//! CHAOS / FORMED state machine.

use std::fmt;
use std::sync::mpsc::{channel, Receiver, Sender};

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SceneState {
    #[default]
    Chaos,
    Formed,
}

impl SceneState {
    pub fn toggled(self) -> Self {
        match self {
            SceneState::Chaos => SceneState::Formed,
            SceneState::Formed => SceneState::Chaos,
        }
    }
}

impl fmt::Display for SceneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneState::Chaos => f.write_str("CHAOS"),
            SceneState::Formed => f.write_str("FORMED"),
        }
    }
}

/// Where a transition request came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionSource {
    Gesture,
    Command,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StateTransition {
    pub from: SceneState,
    pub to: SceneState,
    pub source: TransitionSource,
}

/// Holds the single current state and notifies subscribers on change.
///
/// Requests are level-triggered: asking for the state the machine is already
/// in does nothing and notifies nobody.
#[derive(Debug, Default)]
pub struct SceneStateMachine {
    state: SceneState,
    subscribers: Vec<Sender<StateTransition>>,
}

impl SceneStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SceneState {
        self.state
    }

    /// Receive every future transition. Dropped receivers are pruned lazily.
    pub fn subscribe(&mut self) -> Receiver<StateTransition> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    /// Move to `next`. Returns the transition if the state actually changed.
    pub fn request(&mut self, next: SceneState, source: TransitionSource) -> Option<StateTransition> {
        if next == self.state {
            return None;
        }
        let transition = StateTransition {
            from: self.state,
            to: next,
            source,
        };
        self.state = next;
        log::info!("Scene state {} -> {} ({:?})", transition.from, transition.to, source);
        self.subscribers.retain(|tx| tx.send(transition).is_ok());
        Some(transition)
    }

    pub fn toggle(&mut self) -> Option<StateTransition> {
        self.request(self.state.toggled(), TransitionSource::Command)
    }

    /// Camera auto-rotation runs only while scattered.
    pub fn auto_rotate(&self) -> bool {
        self.state == SceneState::Chaos
    }
}
