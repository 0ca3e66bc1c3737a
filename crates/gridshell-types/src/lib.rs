pub mod app;
pub mod catalog;
pub mod error;
pub mod event;
pub mod geometry;
pub mod widget;
pub mod workspace;

pub use app::*;
pub use catalog::*;
pub use error::{Error, Result};
pub use event::*;
pub use geometry::*;
pub use widget::*;
pub use workspace::*;
