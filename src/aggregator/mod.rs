/// Bounded per-device event window
pub mod device_window;

/// Periodic full-window rollup
pub mod rollup;

pub use device_window::{DeviceWindow, WindowSnapshot};
