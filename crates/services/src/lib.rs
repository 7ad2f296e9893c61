// Services layer for event records
// Services own presentation (display-name joins) and request parsing, calling storage directly

pub mod event;

pub use event::{EventService, EventView};
