pub mod button;
pub mod ranging;

pub use button::{PRESS_EVENTS, handle_button};
pub use ranging::watch_echo;
