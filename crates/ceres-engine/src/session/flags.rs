use std::sync::atomic::{AtomicBool, Ordering};

/// Session-wide switches written by the input thread and read by the render loop.
#[derive(Debug, Default)]
pub struct SessionFlags {
    area: AtomicBool,
}

impl SessionFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` while the alternate area is shown.
    #[inline]
    pub fn is_area(&self) -> bool {
        self.area.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set_area(&self, area: bool) {
        self.area.store(area, Ordering::Release);
    }
}
