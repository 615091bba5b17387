use std::io;
use std::sync::Arc;

use crate::audio::AudioHandle;
use crate::scene::{Direction, MoverHandle};
use crate::session::{InputConfig, SessionFlags};
use crate::task::BackgroundTask;

use super::keyboard::KeySource;

/// Samples the keyboard and turns held keys into player movement, sound requests and
/// the session's area flag.
///
/// One cycle reads every bound key independently; simultaneous keys all apply. The
/// spawned loop polls without blocking or throttling, so movement speed follows the
/// poll rate. The driver never touches GPU state.
pub struct InputDriver {
    keys: Arc<dyn KeySource + Send + Sync>,
    player: MoverHandle,
    flags: Arc<SessionFlags>,
    audio: AudioHandle,
    config: InputConfig,
}

impl InputDriver {
    pub fn new(
        keys: Arc<dyn KeySource + Send + Sync>,
        player: MoverHandle,
        flags: Arc<SessionFlags>,
        audio: AudioHandle,
        config: InputConfig,
    ) -> Self {
        Self {
            keys,
            player,
            flags,
            audio,
            config,
        }
    }

    /// Runs one poll cycle.
    pub fn poll_once(&self) {
        let bindings = self.config.bindings;

        if self.keys.is_down(bindings.up) {
            self.player.movement(Direction::Up);
        }
        if self.keys.is_down(bindings.down) {
            self.player.movement(Direction::Down);
        }
        if self.keys.is_down(bindings.left) {
            self.player.movement(Direction::Left);
            self.step_sound();
        }
        if self.keys.is_down(bindings.right) {
            self.player.movement(Direction::Right);
            self.step_sound();
        }

        // Level-triggered in both branches: re-asserted every cycle.
        if self.keys.is_down(bindings.area) {
            self.flags.set_area(true);
            self.audio.play_sound_effect(self.config.area_sound.as_deref());
        } else {
            self.flags.set_area(false);
        }
    }

    fn step_sound(&self) {
        if self.player.transform().y() == self.config.ground_level {
            self.audio.play_sound_effect(self.config.step_sound.as_deref());
        }
    }

    /// Moves the driver onto its own thread and busy-polls until stopped.
    pub fn spawn(self) -> io::Result<BackgroundTask> {
        BackgroundTask::spawn("ceres-input", move |stop| {
            log::debug!("input driver running");
            let mut cycles: u64 = 0;
            while !stop.is_raised() {
                self.poll_once();
                cycles = cycles.wrapping_add(1);
                std::hint::spin_loop();
            }
            log::debug!("input driver stopped after {cycles} cycles");
        })
    }
}
