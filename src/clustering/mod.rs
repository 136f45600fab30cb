//! Grouping of pulse times into candidate event ranges.

pub mod builder;
pub mod window;

pub use builder::EventBuilder;
pub use window::sliding_window;
