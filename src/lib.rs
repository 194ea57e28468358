#![no_std]

pub mod drivers;
pub mod tasks;

pub use tasks::*;

/// Presses shorter than this are treated as switch bounce, in milliseconds
pub const MIN_PRESS_MS: u32 = 100;

/// How long to wait for an echo before a reading is abandoned, in
/// microseconds. Budgets a generous 500 us/cm of round trip out to 30 cm.
pub const ECHO_TIMEOUT_US: u64 = 500 * 2 * 30;

/// The maximum number of press events queued for the application
pub const MAX_PENDING_PRESSES: usize = 4;

/// The interval between distance measurements in milliseconds
pub const RANGE_POLL_MS: u64 = 200;
