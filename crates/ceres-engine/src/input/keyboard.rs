use std::sync::atomic::{AtomicBool, Ordering};

use super::types::{Key, KeyState};

/// Read side of the keyboard: "is this key held right now?".
pub trait KeySource {
    fn is_down(&self, key: Key) -> bool;
}

/// Held-key table shared between the platform event pump and the input driver.
///
/// Writes happen on the thread that owns the window; reads happen on the input thread.
/// Each key is an independent flag, so no cross-key consistency is implied.
#[derive(Debug)]
pub struct SharedKeyboard {
    keys: [AtomicBool; Key::COUNT],
}

impl SharedKeyboard {
    pub fn new() -> Self {
        Self {
            keys: std::array::from_fn(|_| AtomicBool::new(false)),
        }
    }

    #[inline]
    pub fn set(&self, key: Key, state: KeyState) {
        self.keys[key.index()].store(state.is_down(), Ordering::Release);
    }

    #[cfg(test)]
    pub(crate) fn press(&self, key: Key) {
        self.set(key, KeyState::Pressed);
    }

    #[cfg(test)]
    pub(crate) fn release(&self, key: Key) {
        self.set(key, KeyState::Released);
    }

    /// Releases every key. Used on focus loss so nothing stays stuck.
    pub fn clear(&self) {
        for k in &self.keys {
            k.store(false, Ordering::Release);
        }
    }
}

impl Default for SharedKeyboard {
    fn default() -> Self {
        Self::new()
    }
}

impl KeySource for SharedKeyboard {
    #[inline]
    fn is_down(&self, key: Key) -> bool {
        self.keys[key.index()].load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_and_release_are_independent_per_key() {
        let kb = SharedKeyboard::new();
        kb.press(Key::W);
        kb.press(Key::D);
        assert!(kb.is_down(Key::W));
        assert!(kb.is_down(Key::D));
        assert!(!kb.is_down(Key::A));

        kb.release(Key::W);
        assert!(!kb.is_down(Key::W));
        assert!(kb.is_down(Key::D));
    }

    #[test]
    fn clear_releases_everything() {
        let kb = SharedKeyboard::new();
        kb.press(Key::Space);
        kb.press(Key::F12);
        kb.clear();
        assert!(!kb.is_down(Key::Space));
        assert!(!kb.is_down(Key::F12));
    }
}
