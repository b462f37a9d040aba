pub mod machine;
pub mod schedule;
pub mod target;

pub use machine::{InteractionState, Layer, MeasureMode, PointerEvent, ScreenPoint, UiEffect};
pub use schedule::Debounced;
pub use target::Hit;
