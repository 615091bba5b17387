use std::path::Path;

/// Output side of the audio task. Decoding and device output live behind this trait.
pub trait SoundPlayer: Send {
    /// Starts the looping background track.
    fn start_music(&mut self, path: &Path);

    /// Plays a one-shot effect over whatever is already playing.
    fn play_effect(&mut self, path: &Path);

    /// Silences everything. Called once when the task stops.
    fn stop_all(&mut self);
}

/// Player that only logs what it would play.
#[derive(Debug, Default)]
pub struct LogSoundPlayer;

impl SoundPlayer for LogSoundPlayer {
    fn start_music(&mut self, path: &Path) {
        log::info!("music: {}", path.display());
    }

    fn play_effect(&mut self, path: &Path) {
        log::trace!("effect: {}", path.display());
    }

    fn stop_all(&mut self) {
        log::debug!("audio stopped");
    }
}
