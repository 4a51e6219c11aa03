pub mod background;
pub mod config;
pub mod error;
pub mod extract;
pub mod library;
pub mod shell;
pub mod swatch;
pub mod ui;
pub mod viewer;
