//! TUI widget modules

pub mod comparison;
pub mod header;
pub mod popup;
pub mod progress_bars;
pub mod shortcuts;
pub mod statistics;

pub use comparison::*;
pub use header::*;
pub use popup::*;
pub use progress_bars::*;
pub use shortcuts::*;
pub use statistics::*;
