//! Input types handed to the Tempo action by the host
//!
//! The host owns device discovery and event generation. This module only
//! describes the shape of what arrives: an [`InputEvent`] identifying the
//! physical input and an [`InputValue`] carrying its state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of physical input an event originates from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputType {
    JoystickAxis,
    JoystickButton,
    JoystickHat,
    Keyboard,
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputType::JoystickAxis => write!(f, "joystick-axis"),
            InputType::JoystickButton => write!(f, "joystick-button"),
            InputType::JoystickHat => write!(f, "joystick-hat"),
            InputType::Keyboard => write!(f, "keyboard"),
        }
    }
}

/// Identifies the physical input an event came from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputEvent {
    pub device_id: String,
    pub input_type: InputType,
    pub identifier: u32,
}

impl InputEvent {
    pub fn new(device_id: impl Into<String>, input_type: InputType, identifier: u32) -> Self {
        Self {
            device_id: device_id.into(),
            input_type,
            identifier,
        }
    }
}

/// State reported by an input
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputState {
    Button(bool),
    Axis(f64),
    Hat(i8, i8),
}

impl InputState {
    /// Returns the pressed state for button inputs
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            InputState::Button(pressed) => Some(*pressed),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            InputState::Button(_) => "button",
            InputState::Axis(_) => "axis",
            InputState::Hat(..) => "hat",
        }
    }
}

/// Value payload of an event.
///
/// Only `current` is interpreted by the Tempo action; `raw` is forwarded
/// unchanged to the branches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputValue {
    pub current: InputState,
    pub raw: InputState,
}

impl InputValue {
    pub fn new(current: InputState) -> Self {
        Self {
            current,
            raw: current,
        }
    }

    pub fn button(pressed: bool) -> Self {
        Self::new(InputState::Button(pressed))
    }
}
