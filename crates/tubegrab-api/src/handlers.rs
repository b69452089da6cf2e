//! Request handlers.

pub mod download;
pub mod health;
pub mod ui;
pub mod video_info;

pub use download::*;
pub use health::*;
pub use ui::*;
pub use video_info::*;
