use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};

use crate::session::AudioConfig;
use crate::task::BackgroundTask;

use super::player::SoundPlayer;

/// Pending requests beyond this are dropped; the input loop can request a sound per cycle.
const QUEUE_CAPACITY: usize = 64;

/// How often an idle task re-checks its stop flag.
const IDLE_WAKE: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioCommand {
    PlayEffect(PathBuf),
    Stop,
}

/// Cloneable request side of the audio task.
#[derive(Debug, Clone)]
pub struct AudioHandle {
    tx: Sender<AudioCommand>,
}

impl AudioHandle {
    /// Requests a one-shot effect. `None` or an empty path is a no-op.
    ///
    /// Never blocks: when the queue is full or the task has stopped the request is dropped.
    pub fn play_sound_effect(&self, path: Option<&Path>) {
        let Some(path) = path.filter(|p| !p.as_os_str().is_empty()) else {
            return;
        };
        match self.tx.try_send(AudioCommand::PlayEffect(path.to_path_buf())) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                log::trace!("audio queue full, dropped {}", path.display());
            }
            Err(TrySendError::Disconnected(_)) => {
                log::trace!("audio task gone, dropped {}", path.display());
            }
        }
    }
}

/// Unbounded handle and its receiving end, for code that drains requests itself.
#[cfg(test)]
pub(crate) fn channel() -> (AudioHandle, Receiver<AudioCommand>) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (AudioHandle { tx }, rx)
}

/// Background thread that owns the sound player.
#[derive(Debug)]
pub struct AudioTask {
    handle: AudioHandle,
    task: BackgroundTask,
}

impl AudioTask {
    pub fn spawn(config: &AudioConfig, mut player: Box<dyn SoundPlayer>) -> io::Result<Self> {
        let (tx, rx) = crossbeam_channel::bounded(QUEUE_CAPACITY);
        let music = config.music.clone();

        let task = BackgroundTask::spawn("ceres-audio", move |stop| {
            if let Some(music) = music.as_deref() {
                player.start_music(music);
            }
            while !stop.is_raised() {
                match rx.recv_timeout(IDLE_WAKE) {
                    Ok(AudioCommand::PlayEffect(path)) => player.play_effect(&path),
                    Ok(AudioCommand::Stop) | Err(RecvTimeoutError::Disconnected) => break,
                    Err(RecvTimeoutError::Timeout) => {}
                }
            }
            player.stop_all();
        })?;

        Ok(Self {
            handle: AudioHandle { tx },
            task,
        })
    }

    pub fn handle(&self) -> AudioHandle {
        self.handle.clone()
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.task.is_running()
    }

    /// Stops playback and joins the thread. Queued effects that have not started are discarded.
    pub fn stop(&mut self) {
        if !self.task.is_running() {
            return;
        }
        // A full queue is fine; the stop flag still ends the loop.
        let _ = self.handle.tx.try_send(AudioCommand::Stop);
        self.task.stop();
    }
}
