pub mod button;
pub mod hcsr04;
