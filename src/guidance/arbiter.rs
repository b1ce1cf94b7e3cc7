use crate::guidance::flight::{Command, FlightCapabilityFlags, FlightData};
use crate::state::InputState;

/// Upper bound of commands one input tick can produce: camera, takeoff/land,
/// hover, emergency/flat trim and the axis command.
pub const MAX_COMMANDS_PER_TICK: usize = 5;

pub type TickCommands = heapless::Vec<Command, MAX_COMMANDS_PER_TICK>;

const ROLL_SCALE: f32 = 1.0;
const PITCH_SCALE: f32 = 1.0;
const YAW_SCALE: f32 = 0.5;
const GAZ_SCALE: f32 = 0.5;

/// Turns one input snapshot into the commands that pass their guards.
///
/// `caps` must be freshly queried for this tick. Guarded commands that fail
/// are dropped without trace; if the input still asks for them next tick they
/// are evaluated again.
pub fn arbitrate(input: &InputState, caps: &FlightCapabilityFlags) -> TickCommands {
    let mut out = TickCommands::new();
    let mut issue = |cmd: Command| {
        if caps.permits(&cmd) {
            // Capacity covers every branch below.
            let _ = out.push(cmd);
        }
    };

    if input.camera_swap {
        issue(Command::ChangeCamera);
    }

    if input.takeoff && caps.can_takeoff {
        issue(Command::Takeoff);
    } else if input.land {
        issue(Command::Land);
    }

    if input.hover {
        if caps.can_enter_hover {
            issue(Command::EnterHover);
        } else {
            issue(Command::LeaveHover);
        }
    }

    // Emergency shadows flat trim even when its own guard fails.
    if input.emergency {
        issue(Command::Emergency);
    } else if input.flat_trim {
        issue(Command::FlatTrim);
    }

    issue(Command::Navigate(scale_axes(input)));

    out
}

pub fn scale_axes(input: &InputState) -> FlightData {
    FlightData {
        roll: input.roll.clamp(-1.0, 1.0) * ROLL_SCALE,
        pitch: input.pitch.clamp(-1.0, 1.0) * PITCH_SCALE,
        gaz: input.gaz.clamp(-1.0, 1.0) * GAZ_SCALE,
        yaw: input.yaw.clamp(-1.0, 1.0) * YAW_SCALE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guidance::flight::FlightState;

    fn only(caps: impl FnOnce(&mut FlightCapabilityFlags)) -> FlightCapabilityFlags {
        let mut flags = FlightCapabilityFlags::default();
        caps(&mut flags);
        flags
    }

    #[test]
    fn takeoff_wins_over_land() {
        let caps = only(|c| c.can_takeoff = true);
        let input = InputState { takeoff: true, land: true, ..Default::default() };
        let cmds = arbitrate(&input, &caps);
        assert_eq!(cmds.as_slice(), &[Command::Takeoff]);
    }

    #[test]
    fn land_fires_when_takeoff_is_not_legal() {
        let caps = only(|c| c.can_land = true);
        let input = InputState { takeoff: true, land: true, ..Default::default() };
        assert_eq!(arbitrate(&input, &caps).as_slice(), &[Command::Land]);
    }

    #[test]
    fn emergency_suppresses_flat_trim() {
        let caps = only(|c| {
            c.can_emergency = true;
            c.can_flat_trim = true;
        });
        let input = InputState { emergency: true, flat_trim: true, ..Default::default() };
        assert_eq!(arbitrate(&input, &caps).as_slice(), &[Command::Emergency]);
    }

    #[test]
    fn blocked_emergency_still_shadows_flat_trim() {
        let caps = only(|c| c.can_flat_trim = true);
        let input = InputState { emergency: true, flat_trim: true, ..Default::default() };
        assert!(arbitrate(&input, &caps).is_empty());
    }

    #[test]
    fn flat_trim_alone() {
        let caps = FlightCapabilityFlags::for_state(FlightState::Landed);
        let input = InputState { flat_trim: true, ..Default::default() };
        assert_eq!(arbitrate(&input, &caps).as_slice(), &[Command::FlatTrim]);
    }

    #[test]
    fn hover_toggles_by_capability() {
        let input = InputState { hover: true, ..Default::default() };

        let enter = arbitrate(&input, &only(|c| c.can_enter_hover = true));
        assert_eq!(enter.as_slice(), &[Command::EnterHover]);

        let leave = arbitrate(&input, &only(|c| c.can_leave_hover = true));
        assert_eq!(leave.as_slice(), &[Command::LeaveHover]);

        assert!(arbitrate(&input, &FlightCapabilityFlags::default()).is_empty());
    }

    #[test]
    fn unguarded_commands_are_dropped_silently() {
        let caps = FlightCapabilityFlags::for_state(FlightState::Disconnected);
        let input = InputState {
            roll: 0.5,
            takeoff: true,
            hover: true,
            emergency: true,
            camera_swap: true,
            ..Default::default()
        };
        assert!(arbitrate(&input, &caps).is_empty());
    }

    #[test]
    fn axes_are_scaled_when_flying_freely() {
        let caps = FlightCapabilityFlags::for_state(FlightState::Flying);
        let input = InputState { roll: 0.4, pitch: -0.6, yaw: 1.0, gaz: -0.5, ..Default::default() };
        let cmds = arbitrate(&input, &caps);
        assert_eq!(
            cmds.as_slice(),
            &[Command::Navigate(FlightData { roll: 0.4, pitch: -0.6, gaz: -0.25, yaw: 0.5 })]
        );
    }

    #[test]
    fn axes_are_clamped_before_scaling() {
        let input = InputState { yaw: 3.0, roll: -2.0, ..Default::default() };
        let data = scale_axes(&input);
        assert_eq!(data.yaw, 0.5);
        assert_eq!(data.roll, -1.0);
    }

    #[test]
    fn order_is_fixed_within_a_tick() {
        let caps = FlightCapabilityFlags::for_state(FlightState::Flying);
        let input = InputState {
            camera_swap: true,
            land: true,
            hover: true,
            emergency: true,
            ..Default::default()
        };
        let cmds = arbitrate(&input, &caps);
        assert_eq!(cmds.len(), 5);
        assert_eq!(cmds[0], Command::ChangeCamera);
        assert_eq!(cmds[1], Command::Land);
        assert_eq!(cmds[2], Command::EnterHover);
        assert_eq!(cmds[3], Command::Emergency);
        assert!(matches!(cmds[4], Command::Navigate(_)));
    }
}
