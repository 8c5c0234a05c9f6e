//! Event payloads delivered to viewers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a published event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Control,
}

/// Playback command carried by a control event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlCommand {
    Play,
    Pause,
    Toggle,
}

impl ControlCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Play => "play",
            Self::Pause => "pause",
            Self::Toggle => "toggle",
        }
    }

    /// Capitalized name used in acknowledgement messages
    pub fn title(&self) -> &'static str {
        match self {
            Self::Play => "Play",
            Self::Pause => "Pause",
            Self::Toggle => "Toggle",
        }
    }
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single event as seen by viewers: `{"type": ..., "command": ...}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMessage {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub command: ControlCommand,
}

impl EventMessage {
    pub fn new(event_type: EventType, command: ControlCommand) -> Self {
        Self {
            event_type,
            command,
        }
    }

    pub fn control(command: ControlCommand) -> Self {
        Self::new(EventType::Control, command)
    }
}
