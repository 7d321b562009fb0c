pub mod members;
pub mod media;
pub mod offices;
pub mod open_houses;
pub mod problematic_properties;
pub mod progress_history;
pub mod properties;
pub mod rate_limit_events;
pub mod rooms;
pub mod settings;
pub mod sync_state;
pub mod unit_types;
