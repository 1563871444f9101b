//! Timeline widgets.
//!
//! A [`TimelineWidget`] owns one container and moves through the states in
//! [`WidgetState`]. Self-fetching widgets are driven by a task behind a
//! [`WidgetHandle`]; widgets fed by a batch controller are called directly.

mod options;
mod runner;
mod timeline;

pub use options::*;
pub use runner::*;
pub use timeline::*;
