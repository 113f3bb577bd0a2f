//! Common input event names for `transmit_event`.

/// Toggle the parking brake
pub const PARKING_BRAKES: &str = "PARKING_BRAKES";
/// Apply wheel brakes
pub const BRAKES: &str = "BRAKES";
/// Toggle the landing gear handle
pub const GEAR_TOGGLE: &str = "GEAR_TOGGLE";
/// Gear handle up
pub const GEAR_UP: &str = "GEAR_UP";
/// Gear handle down
pub const GEAR_DOWN: &str = "GEAR_DOWN";
/// Extend flaps one notch
pub const FLAPS_INCR: &str = "FLAPS_INCR";
/// Retract flaps one notch
pub const FLAPS_DECR: &str = "FLAPS_DECR";
/// Set throttle; data is 0..16383
pub const THROTTLE_SET: &str = "THROTTLE_SET";
/// Full throttle
pub const THROTTLE_FULL: &str = "THROTTLE_FULL";
/// Cut throttle
pub const THROTTLE_CUT: &str = "THROTTLE_CUT";
/// Toggle the autopilot master
pub const AP_MASTER: &str = "AP_MASTER";
/// Set the autopilot heading bug; data in degrees
pub const HEADING_BUG_SET: &str = "HEADING_BUG_SET";
/// Set the autopilot altitude; data in feet
pub const AP_ALT_VAR_SET_ENGLISH: &str = "AP_ALT_VAR_SET_ENGLISH";
/// Toggle navigation lights
pub const TOGGLE_NAV_LIGHTS: &str = "TOGGLE_NAV_LIGHTS";
/// Toggle the beacon
pub const TOGGLE_BEACON_LIGHTS: &str = "TOGGLE_BEACON_LIGHTS";
/// Toggle landing lights
pub const LANDING_LIGHTS_TOGGLE: &str = "LANDING_LIGHTS_TOGGLE";
/// Toggle strobes
pub const STROBES_TOGGLE: &str = "STROBES_TOGGLE";
/// Toggle the simulation pause
pub const PAUSE_TOGGLE: &str = "PAUSE_TOGGLE";
/// Pause the simulation
pub const PAUSE_ON: &str = "PAUSE_ON";
/// Resume the simulation
pub const PAUSE_OFF: &str = "PAUSE_OFF";
/// Set the simulation rate
pub const SIM_RATE_SET: &str = "SIM_RATE_SET";
/// Toggle the master battery
pub const TOGGLE_MASTER_BATTERY: &str = "TOGGLE_MASTER_BATTERY";
/// Set the transponder code; data is BCD16
pub const XPNDR_SET: &str = "XPNDR_SET";
