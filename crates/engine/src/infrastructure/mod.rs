//! External dependency implementations (ports + adapters).

pub mod clock;
pub mod ports;

#[cfg(test)]
pub use ports::MockClockPort;
pub use ports::ClockPort;
