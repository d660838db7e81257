//! Terminal front-end: roster table, search bar, student form and statistics.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
