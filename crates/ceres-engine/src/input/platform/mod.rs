mod winit;

pub use self::winit::{apply_window_event, map_key};
