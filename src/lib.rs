// Library exports for integration tests and reusable components

pub mod catalog;
pub mod config;
pub mod generation;
pub mod playback;
pub mod progress;
pub mod screen;
pub mod subscription;
#[doc(hidden)]
pub mod ui;

// Re-export the UI context at crate root for easier access
pub use ui::AppContext;

// Test support (unit tests, or integration tests via the test-utils feature)
#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;
