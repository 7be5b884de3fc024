pub mod controller;
pub mod events;

pub use controller::{render_result, ControllerState, Firing, TickOutcome, ViewportController};
pub use events::{MapCommand, ViewportEvent, ViewportListener};
