pub mod event;
pub mod processor;
pub mod range;

pub use event::{Event, Peak, Pulse, RawPulse};
pub use processor::EventProcessor;
pub use range::TimeRange;
