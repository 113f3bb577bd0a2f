//! Catalog of common flight-simulator variables.
//!
//! Every entry is a factory function returning a
//! [`VariableDescriptor`] with the variable's name, its default unit and
//! whether the simulator accepts writes to it. Indexed variables (engines,
//! fuel tanks, radios) take their index as an argument and produce names of
//! the form `NAME:index`.
//!
//! The same entries are available as data through [`catalog`] and [`find`].
//!
//! ```
//! use simlink_simvars::{find, general_eng_rpm, plane_altitude};
//!
//! assert_eq!(plane_altitude().unit, "Feet");
//! assert_eq!(general_eng_rpm(2).name, "GENERAL ENG RPM:2");
//! assert!(find("GENERAL ENG RPM:2").is_some_and(|entry| entry.indexed));
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod input_events;
pub mod system_events;

use simlink_protocol::VariableDescriptor;

/// One catalog row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CatalogEntry {
    /// Variable name without any index suffix
    pub name: &'static str,
    /// Default unit
    pub unit: &'static str,
    /// Whether the simulator accepts writes
    pub settable: bool,
    /// Whether the name takes a `:index` suffix
    pub indexed: bool,
}

impl CatalogEntry {
    /// Descriptor for this entry; `index` is used only for indexed entries
    pub fn descriptor(&self, index: u32) -> VariableDescriptor {
        let name = if self.indexed {
            format!("{}:{index}", self.name)
        } else {
            self.name.to_string()
        };
        VariableDescriptor {
            name,
            unit: self.unit.to_string(),
            settable: self.settable,
        }
    }

    /// Descriptor with a different unit, e.g. `Meters` instead of `Feet`
    pub fn with_unit(&self, index: u32, unit: &str) -> VariableDescriptor {
        VariableDescriptor {
            unit: unit.to_string(),
            ..self.descriptor(index)
        }
    }
}

macro_rules! simvars {
    ($( $func:ident $([$index:ident])? => $name:literal, $unit:literal, $settable:literal; )*) => {
        $( simvars!(@factory $func $([$index])? $name $unit $settable); )*

        static CATALOG: &[CatalogEntry] = &[
            $( CatalogEntry {
                name: $name,
                unit: $unit,
                settable: $settable,
                indexed: simvars!(@indexed $([$index])?),
            }, )*
        ];
    };
    (@factory $func:ident $name:literal $unit:literal $settable:literal) => {
        #[doc = concat!("`", $name, "` in ", $unit)]
        pub fn $func() -> VariableDescriptor {
            VariableDescriptor {
                name: $name.to_string(),
                unit: $unit.to_string(),
                settable: $settable,
            }
        }
    };
    (@factory $func:ident [$index:ident] $name:literal $unit:literal $settable:literal) => {
        #[doc = concat!("`", $name, ":", stringify!($index), "` in ", $unit)]
        pub fn $func($index: u32) -> VariableDescriptor {
            VariableDescriptor {
                name: format!("{}:{}", $name, $index),
                unit: $unit.to_string(),
                settable: $settable,
            }
        }
    };
    (@indexed) => { false };
    (@indexed [$index:ident]) => { true };
}

simvars! {
    // Position and attitude
    plane_altitude => "PLANE ALTITUDE", "Feet", true;
    plane_alt_above_ground => "PLANE ALT ABOVE GROUND", "Feet", false;
    plane_latitude => "PLANE LATITUDE", "Radians", true;
    plane_longitude => "PLANE LONGITUDE", "Radians", true;
    plane_heading_degrees_true => "PLANE HEADING DEGREES TRUE", "Radians", true;
    plane_heading_degrees_magnetic => "PLANE HEADING DEGREES MAGNETIC", "Radians", true;
    plane_pitch_degrees => "PLANE PITCH DEGREES", "Radians", true;
    plane_bank_degrees => "PLANE BANK DEGREES", "Radians", true;
    indicated_altitude => "INDICATED ALTITUDE", "Feet", true;
    pressure_altitude => "PRESSURE ALTITUDE", "Meters", false;
    ground_altitude => "GROUND ALTITUDE", "Meters", false;
    structure_latlonalt => "STRUCT LATLONALT", "SIMCONNECT_DATA_LATLONALT", false;
    structure_world_velocity => "STRUCT WORLDVELOCITY", "SIMCONNECT_DATA_XYZ", false;
    magvar => "MAGVAR", "Degrees", false;

    // Speeds and accelerations
    airspeed_indicated => "AIRSPEED INDICATED", "Knots", true;
    airspeed_true => "AIRSPEED TRUE", "Knots", true;
    airspeed_mach => "AIRSPEED MACH", "Mach", false;
    ground_velocity => "GROUND VELOCITY", "Knots", false;
    vertical_speed => "VERTICAL SPEED", "Feet per second", true;
    velocity_world_x => "VELOCITY WORLD X", "Feet per second", true;
    velocity_world_y => "VELOCITY WORLD Y", "Feet per second", true;
    velocity_world_z => "VELOCITY WORLD Z", "Feet per second", true;
    acceleration_body_x => "ACCELERATION BODY X", "Feet per second squared", true;
    acceleration_body_y => "ACCELERATION BODY Y", "Feet per second squared", true;
    acceleration_body_z => "ACCELERATION BODY Z", "Feet per second squared", true;
    g_force => "G FORCE", "GForce", false;
    incidence_alpha => "INCIDENCE ALPHA", "Radians", false;
    incidence_beta => "INCIDENCE BETA", "Radians", false;
    stall_warning => "STALL WARNING", "Bool", false;
    overspeed_warning => "OVERSPEED WARNING", "Bool", false;

    // Engines
    number_of_engines => "NUMBER OF ENGINES", "Number", false;
    general_eng_rpm[index] => "GENERAL ENG RPM", "Rpm", true;
    general_eng_throttle_lever_position[index] => "GENERAL ENG THROTTLE LEVER POSITION", "Percent", true;
    general_eng_mixture_lever_position[index] => "GENERAL ENG MIXTURE LEVER POSITION", "Percent", true;
    general_eng_propeller_lever_position[index] => "GENERAL ENG PROPELLER LEVER POSITION", "Percent", true;
    general_eng_combustion[index] => "GENERAL ENG COMBUSTION", "Bool", true;
    general_eng_oil_temperature[index] => "GENERAL ENG OIL TEMPERATURE", "Rankine", true;
    general_eng_oil_pressure[index] => "GENERAL ENG OIL PRESSURE", "Psf", true;
    general_eng_fuel_pressure[index] => "GENERAL ENG FUEL PRESSURE", "Psi", true;
    general_eng_exhaust_gas_temperature[index] => "GENERAL ENG EXHAUST GAS TEMPERATURE", "Rankine", true;
    general_eng_starter[index] => "GENERAL ENG STARTER", "Bool", false;
    eng_fuel_flow_gph[index] => "ENG FUEL FLOW GPH", "Gallons per hour", false;
    eng_manifold_pressure[index] => "ENG MANIFOLD PRESSURE", "Inches of mercury", false;
    eng_n1_rpm[index] => "ENG N1 RPM", "Percent", false;
    eng_n2_rpm[index] => "ENG N2 RPM", "Percent", false;
    turb_eng_corrected_n1[index] => "TURB ENG CORRECTED N1", "Percent", true;
    prop_rpm[index] => "PROP RPM", "Rpm", true;
    prop_beta[index] => "PROP BETA", "Radians", false;

    // Fuel
    fuel_total_quantity => "FUEL TOTAL QUANTITY", "Gallons", false;
    fuel_total_capacity => "FUEL TOTAL CAPACITY", "Gallons", false;
    fuel_tank_left_main_quantity => "FUEL TANK LEFT MAIN QUANTITY", "Gallons", true;
    fuel_tank_right_main_quantity => "FUEL TANK RIGHT MAIN QUANTITY", "Gallons", true;
    fuel_tank_center_quantity => "FUEL TANK CENTER QUANTITY", "Gallons", true;
    fuel_selected_quantity_percent => "FUEL SELECTED QUANTITY PERCENT", "Percent over 100", false;
    fuel_weight_per_gallon => "FUEL WEIGHT PER GALLON", "Pounds", false;

    // Flight controls
    aileron_position => "AILERON POSITION", "Position", true;
    elevator_position => "ELEVATOR POSITION", "Position", true;
    rudder_position => "RUDDER POSITION", "Position", true;
    elevator_trim_position => "ELEVATOR TRIM POSITION", "Radians", true;
    aileron_trim_pct => "AILERON TRIM PCT", "Percent over 100", true;
    rudder_trim_pct => "RUDDER TRIM PCT", "Percent over 100", true;
    yoke_x_position => "YOKE X POSITION", "Position", true;
    yoke_y_position => "YOKE Y POSITION", "Position", true;
    brake_left_position => "BRAKE LEFT POSITION", "Position", true;
    brake_right_position => "BRAKE RIGHT POSITION", "Position", true;
    brake_parking_position => "BRAKE PARKING POSITION", "Bool", true;

    // Surfaces
    flaps_handle_index => "FLAPS HANDLE INDEX", "Number", true;
    flaps_handle_percent => "FLAPS HANDLE PERCENT", "Percent over 100", false;
    flaps_num_handle_positions => "FLAPS NUM HANDLE POSITIONS", "Number", false;
    trailing_edge_flaps_left_percent => "TRAILING EDGE FLAPS LEFT PERCENT", "Percent over 100", true;
    trailing_edge_flaps_right_percent => "TRAILING EDGE FLAPS RIGHT PERCENT", "Percent over 100", true;
    spoilers_handle_position => "SPOILERS HANDLE POSITION", "Percent over 100", true;
    spoilers_armed => "SPOILERS ARMED", "Bool", false;

    // Landing gear
    gear_handle_position => "GEAR HANDLE POSITION", "Bool", true;
    gear_center_position => "GEAR CENTER POSITION", "Percent over 100", true;
    gear_left_position => "GEAR LEFT POSITION", "Percent over 100", true;
    gear_right_position => "GEAR RIGHT POSITION", "Percent over 100", true;
    is_gear_retractable => "IS GEAR RETRACTABLE", "Bool", false;
    sim_on_ground => "SIM ON GROUND", "Bool", false;
    on_any_runway => "ON ANY RUNWAY", "Bool", false;

    // Lights
    light_nav => "LIGHT NAV", "Bool", false;
    light_beacon => "LIGHT BEACON", "Bool", false;
    light_landing => "LIGHT LANDING", "Bool", false;
    light_taxi => "LIGHT TAXI", "Bool", false;
    light_strobe => "LIGHT STROBE", "Bool", false;
    light_panel => "LIGHT PANEL", "Bool", false;

    // Autopilot
    autopilot_master => "AUTOPILOT MASTER", "Bool", false;
    autopilot_heading_lock => "AUTOPILOT HEADING LOCK", "Bool", false;
    autopilot_heading_lock_dir => "AUTOPILOT HEADING LOCK DIR", "Degrees", false;
    autopilot_altitude_lock => "AUTOPILOT ALTITUDE LOCK", "Bool", false;
    autopilot_altitude_lock_var => "AUTOPILOT ALTITUDE LOCK VAR", "Feet", false;
    autopilot_vertical_hold_var => "AUTOPILOT VERTICAL HOLD VAR", "Feet per minute", false;
    autopilot_airspeed_hold_var => "AUTOPILOT AIRSPEED HOLD VAR", "Knots", false;
    autopilot_nav1_lock => "AUTOPILOT NAV1 LOCK", "Bool", false;
    autopilot_approach_hold => "AUTOPILOT APPROACH HOLD", "Bool", false;
    autopilot_throttle_arm => "AUTOPILOT THROTTLE ARM", "Bool", false;

    // Radios and navigation
    com_active_frequency[index] => "COM ACTIVE FREQUENCY", "MHz", false;
    com_standby_frequency[index] => "COM STANDBY FREQUENCY", "MHz", false;
    nav_active_frequency[index] => "NAV ACTIVE FREQUENCY", "MHz", false;
    nav_standby_frequency[index] => "NAV STANDBY FREQUENCY", "MHz", false;
    nav_obs[index] => "NAV OBS", "Degrees", false;
    nav_cdi[index] => "NAV CDI", "Number", false;
    nav_has_glide_slope[index] => "NAV HAS GLIDE SLOPE", "Bool", false;
    adf_active_frequency[index] => "ADF ACTIVE FREQUENCY", "Frequency ADF BCD32", false;
    transponder_code[index] => "TRANSPONDER CODE", "BCO16", false;
    gps_ground_speed => "GPS GROUND SPEED", "Meters per second", false;
    gps_wp_distance => "GPS WP DISTANCE", "Meters", false;
    gps_wp_next_id => "GPS WP NEXT ID", "String64", false;
    kohlsman_setting_hg => "KOHLSMAN SETTING HG", "Inches of mercury", false;

    // Electrical
    electrical_master_battery => "ELECTRICAL MASTER BATTERY", "Bool", true;
    electrical_main_bus_voltage => "ELECTRICAL MAIN BUS VOLTAGE", "Volts", true;
    general_eng_master_alternator[index] => "GENERAL ENG MASTER ALTERNATOR", "Bool", false;
    avionics_master_switch => "AVIONICS MASTER SWITCH", "Bool", false;

    // Environment
    ambient_temperature => "AMBIENT TEMPERATURE", "Celsius", false;
    ambient_pressure => "AMBIENT PRESSURE", "Inches of mercury", false;
    ambient_wind_velocity => "AMBIENT WIND VELOCITY", "Knots", false;
    ambient_wind_direction => "AMBIENT WIND DIRECTION", "Degrees", false;
    ambient_visibility => "AMBIENT VISIBILITY", "Meters", false;
    ambient_in_cloud => "AMBIENT IN CLOUD", "Bool", false;
    sea_level_pressure => "SEA LEVEL PRESSURE", "Millibars", false;
    local_time => "LOCAL TIME", "Seconds", false;
    zulu_time => "ZULU TIME", "Seconds", false;

    // Aircraft and simulation state
    title => "TITLE", "String256", false;
    atc_id => "ATC ID", "String64", true;
    atc_airline => "ATC AIRLINE", "String64", true;
    atc_flight_number => "ATC FLIGHT NUMBER", "String8", true;
    atc_model => "ATC MODEL", "String32", false;
    atc_type => "ATC TYPE", "String32", false;
    total_weight => "TOTAL WEIGHT", "Pounds", false;
    empty_weight => "EMPTY WEIGHT", "Pounds", false;
    design_speed_vs0 => "DESIGN SPEED VS0", "Feet per second", false;
    design_speed_vs1 => "DESIGN SPEED VS1", "Feet per second", false;
    realism => "REALISM", "Number", true;
    sim_disabled => "SIM DISABLED", "Bool", true;
    simulation_rate => "SIMULATION RATE", "Number", false;
    crash_flag => "CRASH FLAG", "Enum", false;
    crash_sequence => "CRASH SEQUENCE", "Enum", false;
    is_user_sim => "IS USER SIM", "Bool", false;
}

/// Every catalog entry, in declaration order
pub fn catalog() -> &'static [CatalogEntry] {
    CATALOG
}

/// Find an entry by name.
///
/// Matching ignores ASCII case and a trailing `:index` suffix, so
/// `general eng rpm:3` finds the `GENERAL ENG RPM` entry.
pub fn find(name: &str) -> Option<&'static CatalogEntry> {
    let base = match name.rsplit_once(':') {
        Some((base, index)) if index.parse::<u32>().is_ok() => base,
        _ => name,
    };
    CATALOG
        .iter()
        .find(|entry| entry.name.eq_ignore_ascii_case(base.trim()))
}

/// Descriptor for a catalog name, keeping any index the caller gave.
///
/// Indexed entries looked up without an index get index 1.
pub fn descriptor(name: &str) -> Option<VariableDescriptor> {
    let entry = find(name)?;
    let index = name
        .rsplit_once(':')
        .and_then(|(_, index)| index.parse::<u32>().ok())
        .unwrap_or(1);
    Some(entry.descriptor(index))
}
