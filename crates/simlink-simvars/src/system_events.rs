//! Named system events.
//!
//! These are plain strings passed through to the simulator when subscribing;
//! the client attaches no meaning to them.

/// Fires every second while the simulation runs
pub const ONE_SEC: &str = "1sec";
/// Fires every four seconds while the simulation runs
pub const FOUR_SEC: &str = "4sec";
/// Fires six times a second while the simulation runs
pub const SIX_HZ: &str = "6Hz";
/// Aircraft file loaded; carries the file name
pub const AIRCRAFT_LOADED: &str = "AircraftLoaded";
/// User aircraft crashed
pub const CRASHED: &str = "Crashed";
/// Crash cut-scene finished and the flight was reset
pub const CRASH_RESET: &str = "CrashReset";
/// Flight file loaded; carries the file name
pub const FLIGHT_LOADED: &str = "FlightLoaded";
/// Flight file saved; carries the file name
pub const FLIGHT_SAVED: &str = "FlightSaved";
/// Flight plan activated; carries the file name
pub const FLIGHT_PLAN_ACTIVATED: &str = "FlightPlanActivated";
/// Flight plan deactivated
pub const FLIGHT_PLAN_DEACTIVATED: &str = "FlightPlanDeactivated";
/// Every visual frame
pub const FRAME: &str = "Frame";
/// Pause state changed; data is 1 when paused
pub const PAUSE: &str = "Pause";
/// Simulation paused
pub const PAUSED: &str = "Paused";
/// Every visual frame while paused
pub const PAUSE_FRAME: &str = "PauseFrame";
/// User moved the aircraft
pub const POSITION_CHANGED: &str = "PositionChanged";
/// Simulation state changed; data is 1 when running
pub const SIM: &str = "Sim";
/// Simulation started running
pub const SIM_START: &str = "SimStart";
/// Simulation stopped running
pub const SIM_STOP: &str = "SimStop";
/// Master sound switch changed
pub const SOUND: &str = "Sound";
/// Simulation resumed
pub const UNPAUSED: &str = "Unpaused";
/// Cockpit view changed
pub const VIEW: &str = "View";

/// Every event name above
pub const ALL: &[&str] = &[
    ONE_SEC,
    FOUR_SEC,
    SIX_HZ,
    AIRCRAFT_LOADED,
    CRASHED,
    CRASH_RESET,
    FLIGHT_LOADED,
    FLIGHT_SAVED,
    FLIGHT_PLAN_ACTIVATED,
    FLIGHT_PLAN_DEACTIVATED,
    FRAME,
    PAUSE,
    PAUSED,
    PAUSE_FRAME,
    POSITION_CHANGED,
    SIM,
    SIM_START,
    SIM_STOP,
    SOUND,
    UNPAUSED,
    VIEW,
];

/// Whether the event carries a file name
pub fn carries_filename(name: &str) -> bool {
    [
        AIRCRAFT_LOADED,
        FLIGHT_LOADED,
        FLIGHT_SAVED,
        FLIGHT_PLAN_ACTIVATED,
    ]
    .contains(&name)
}
