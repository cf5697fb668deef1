pub mod api;
pub mod cli;
pub mod render;
pub mod theme;
pub mod tui;

pub use api::{ApiClient, Task};
pub use theme::Theme;
