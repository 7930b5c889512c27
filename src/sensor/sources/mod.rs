pub mod charging;
pub mod connectivity;
pub mod interaction;
pub mod motion;
pub mod screen;
pub mod ui_events;
