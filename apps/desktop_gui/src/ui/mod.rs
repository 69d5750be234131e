//! UI layer for the desktop GUI: app shell, the view adapter, and zone painting.

pub mod app;
pub mod view;
pub mod zones;

pub use app::ClassifierApp;
