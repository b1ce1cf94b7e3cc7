//! Flight-state enumeration and the command legality table.
//!
//! Every guard in the crate is derived from [`FlightState`] through
//! [`Command::allowed_in`]; nothing else decides whether a command may go out.

use crate::state::InputFlags;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlightState {
    Disconnected,
    Landed,
    Flying,
    Hovering,
    Emergency,
}

impl FlightState {
    /// Collapses the link's state flags. Disconnection wins over everything,
    /// then emergency, then hovering, then flying.
    pub fn from_flags(connected: bool, flying: bool, hovering: bool, emergency: bool) -> Self {
        if !connected {
            Self::Disconnected
        } else if emergency {
            Self::Emergency
        } else if hovering {
            Self::Hovering
        } else if flying {
            Self::Flying
        } else {
            Self::Landed
        }
    }

    pub fn is_connected(self) -> bool {
        self != Self::Disconnected
    }

    pub fn is_flying(self) -> bool {
        matches!(self, Self::Flying | Self::Hovering)
    }

    pub fn is_hovering(self) -> bool {
        self == Self::Hovering
    }

    pub fn is_emergency(self) -> bool {
        self == Self::Emergency
    }

    pub fn input_flags(self) -> InputFlags {
        InputFlags {
            connected: self.is_connected(),
            emergency: self.is_emergency(),
            flying: self.is_flying(),
            hovering: self.is_hovering(),
        }
    }
}

/// Scaled stick values sent with a navigate command.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FlightData {
    pub roll: f32,
    pub pitch: f32,
    pub gaz: f32,
    pub yaw: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    Connect,
    Disconnect,
    ChangeCamera,
    Takeoff,
    Land,
    Emergency,
    FlatTrim,
    EnterHover,
    LeaveHover,
    Navigate(FlightData),
}

impl Command {
    /// Legality table: the states in which each command may be issued.
    pub fn allowed_in(&self, state: FlightState) -> bool {
        use FlightState::*;
        match self {
            Command::Connect => state == Disconnected,
            Command::Disconnect | Command::ChangeCamera | Command::Emergency => {
                state != Disconnected
            }
            Command::Takeoff | Command::FlatTrim => state == Landed,
            Command::Land => matches!(state, Flying | Hovering),
            Command::EnterHover => state == Flying,
            Command::LeaveHover => state == Hovering,
            Command::Navigate(_) => state == Flying,
        }
    }

    /// Line appended to the operator output when the command is issued.
    pub fn status_message(&self) -> Option<&'static str> {
        match self {
            Command::ChangeCamera => Some("Changing camera"),
            Command::Takeoff => Some("Taking off"),
            Command::Land => Some("Landing"),
            Command::Emergency => Some("Emergency button hit"),
            Command::FlatTrim => Some("Sending flat trim"),
            Command::EnterHover => Some("Entering hover mode"),
            Command::LeaveHover => Some("Leaving hover mode"),
            Command::Connect | Command::Disconnect | Command::Navigate(_) => None,
        }
    }
}

/// Capability flags, recomputed from the flight state on every query.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlightCapabilityFlags {
    pub can_connect: bool,
    pub can_disconnect: bool,
    pub can_change_camera: bool,
    pub can_takeoff: bool,
    pub can_land: bool,
    pub can_enter_hover: bool,
    pub can_leave_hover: bool,
    pub can_emergency: bool,
    pub can_flat_trim: bool,
    pub can_fly_freely: bool,
}

impl FlightCapabilityFlags {
    pub fn for_state(state: FlightState) -> Self {
        let allowed = |cmd: Command| cmd.allowed_in(state);
        Self {
            can_connect: allowed(Command::Connect),
            can_disconnect: allowed(Command::Disconnect),
            can_change_camera: allowed(Command::ChangeCamera),
            can_takeoff: allowed(Command::Takeoff),
            can_land: allowed(Command::Land),
            can_enter_hover: allowed(Command::EnterHover),
            can_leave_hover: allowed(Command::LeaveHover),
            can_emergency: allowed(Command::Emergency),
            can_flat_trim: allowed(Command::FlatTrim),
            can_fly_freely: allowed(Command::Navigate(FlightData::default())),
        }
    }

    /// Whether `cmd` passes its guard under these flags.
    pub fn permits(&self, cmd: &Command) -> bool {
        match cmd {
            Command::Connect => self.can_connect,
            Command::Disconnect => self.can_disconnect,
            Command::ChangeCamera => self.can_change_camera,
            Command::Takeoff => self.can_takeoff,
            Command::Land => self.can_land,
            Command::Emergency => self.can_emergency,
            Command::FlatTrim => self.can_flat_trim,
            Command::EnterHover => self.can_enter_hover,
            Command::LeaveHover => self.can_leave_hover,
            Command::Navigate(_) => self.can_fly_freely,
        }
    }
}
