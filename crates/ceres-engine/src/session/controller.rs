use std::sync::Arc;

use crate::audio::{AudioTask, LogSoundPlayer, SoundPlayer};
use crate::gfx::{FrameStatus, GraphicsDevice, RenderBackend, ShadingStage};
use crate::input::{InputDriver, KeySource};
use crate::resource::{ImageLoader, ResourceCounts, ResourceRegistry};
use crate::scene::{build_entity, Camera, EntityError, Movement, RenderableEntity, SceneComposer};
use crate::task::BackgroundTask;

use super::config::SessionConfig;
use super::error::{SessionError, SessionState};
use super::flags::SessionFlags;

/// The built scene: the normal paint order and, optionally, the alternate area's.
///
/// Both lists share the player and foreground entities.
#[derive(Debug)]
struct Scenes {
    primary: SceneComposer,
    area: Option<SceneComposer>,
    player: Arc<RenderableEntity>,
}

impl Scenes {
    fn active(&self, area: bool) -> &SceneComposer {
        match (&self.area, area) {
            (Some(scene), true) => scene,
            _ => &self.primary,
        }
    }
}

/// Owns one game session: its entities, GPU handles and background tasks.
///
/// All methods taking a device or backend must be called on the thread that owns the
/// graphics context. Background tasks only see atomics and the audio queue.
pub struct SessionController {
    config: SessionConfig,
    state: SessionState,
    registry: ResourceRegistry,
    flags: Arc<SessionFlags>,
    keys: Arc<dyn KeySource + Send + Sync>,
    camera: Camera,
    scenes: Option<Scenes>,
    sound_player: Option<Box<dyn SoundPlayer>>,
    audio: Option<AudioTask>,
    input: Option<BackgroundTask>,
    showing_area: bool,
}

impl SessionController {
    pub fn new(config: SessionConfig, keys: Arc<dyn KeySource + Send + Sync>) -> Self {
        let camera = Camera::new(&config.camera);
        Self {
            config,
            state: SessionState::Constructed,
            registry: ResourceRegistry::new(),
            flags: Arc::new(SessionFlags::new()),
            keys,
            camera,
            scenes: None,
            sound_player: None,
            audio: None,
            input: None,
            showing_area: false,
        }
    }

    /// Replaces the default logging player used by the audio task.
    pub fn with_sound_player(mut self, player: Box<dyn SoundPlayer>) -> Self {
        self.sound_player = Some(player);
        self
    }

    #[inline]
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    pub fn flags(&self) -> &Arc<SessionFlags> {
        &self.flags
    }

    /// The player entity, once started.
    pub fn player(&self) -> Option<&Arc<RenderableEntity>> {
        self.scenes.as_ref().map(|s| &s.player)
    }

    /// The paint list the next frame will draw, once started.
    #[cfg(test)]
    fn active_scene(&self) -> Option<&SceneComposer> {
        let area = self.flags.is_area();
        self.scenes.as_ref().map(|s| s.active(area))
    }

    /// Builds the entity set, then starts the audio task and the input driver.
    ///
    /// On failure every handle allocated so far is released, any started task is stopped,
    /// and the session stays `Constructed`.
    pub fn start<D, L>(&mut self, device: &mut D, loader: &L) -> Result<(), SessionError>
    where
        D: GraphicsDevice + ?Sized,
        L: ImageLoader + ?Sized,
    {
        self.expect_state(SessionState::Constructed, "start")?;
        log::info!("starting session");

        match self.launch(device, loader) {
            Ok(()) => {
                self.state = SessionState::Running;
                let counts = self.registry.counts();
                log::info!(
                    "session running: {} vertex arrays, {} buffers, {} textures",
                    counts.vertex_arrays,
                    counts.buffers,
                    counts.textures
                );
                Ok(())
            }
            Err(e) => {
                log::error!("session start failed: {e}");
                self.stop_tasks();
                self.scenes = None;
                self.registry.release_all(device);
                Err(e)
            }
        }
    }

    fn launch<D, L>(&mut self, device: &mut D, loader: &L) -> Result<(), SessionError>
    where
        D: GraphicsDevice + ?Sized,
        L: ImageLoader + ?Sized,
    {
        let scenes = build_scenes(&mut self.registry, device, loader, &self.config)?;
        let mover = scenes
            .player
            .mover()
            .ok_or_else(|| SessionError::Input("player entity is not movable".to_string()))?;
        self.scenes = Some(scenes);

        let sounds = self
            .sound_player
            .take()
            .unwrap_or_else(|| Box::new(LogSoundPlayer));
        let audio = AudioTask::spawn(&self.config.audio, sounds)
            .map_err(|e| SessionError::Audio(e.to_string()))?;
        let driver = InputDriver::new(
            Arc::clone(&self.keys),
            mover,
            Arc::clone(&self.flags),
            audio.handle(),
            self.config.input.clone(),
        );
        self.audio = Some(audio);

        let input = driver
            .spawn()
            .map_err(|e| SessionError::Input(e.to_string()))?;
        self.input = Some(input);
        Ok(())
    }

    /// Draws one frame: prepare, start, load view, draw every entity in order, stop, present.
    ///
    /// Returns the backend's frame status; nothing is drawn unless it is `Ready`.
    pub fn render_frame<B>(&mut self, backend: &mut B) -> Result<FrameStatus, SessionError>
    where
        B: RenderBackend + ?Sized,
    {
        self.expect_state(SessionState::Running, "render")?;
        let area = self.flags.is_area();
        let Some(scenes) = self.scenes.as_ref() else {
            return Err(self.invalid("render"));
        };

        let status = backend.prepare();
        if status != FrameStatus::Ready {
            return Ok(status);
        }

        if area != self.showing_area {
            log::info!("area {}", if area { "entered" } else { "left" });
            self.showing_area = area;
        }

        backend.start();
        backend.load_view_matrix(&self.camera);
        scenes.active(area).draw_all(&mut *backend);
        backend.stop();
        backend.present();
        Ok(FrameStatus::Ready)
    }

    /// Stops the input driver and audio task, releases every registered handle, then the
    /// stage's own resources.
    ///
    /// Returns the counts released.
    pub fn close<B>(&mut self, backend: &mut B) -> Result<ResourceCounts, SessionError>
    where
        B: GraphicsDevice + ShadingStage + ?Sized,
    {
        if self.state == SessionState::Closed {
            return Err(self.invalid("close"));
        }
        log::info!("closing session");

        self.stop_tasks();
        self.scenes = None;
        let released = self.registry.release_all(&mut *backend);
        backend.release();

        self.state = SessionState::Closed;
        Ok(released)
    }

    fn stop_tasks(&mut self) {
        if let Some(mut input) = self.input.take() {
            input.stop();
        }
        if let Some(mut audio) = self.audio.take() {
            audio.stop();
        }
    }

    fn expect_state(
        &self,
        expected: SessionState,
        operation: &'static str,
    ) -> Result<(), SessionError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(self.invalid(operation))
        }
    }

    fn invalid(&self, operation: &'static str) -> SessionError {
        log::warn!("rejected `{operation}` in state {}", self.state);
        SessionError::InvalidState {
            operation,
            state: self.state,
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if self.state == SessionState::Running {
            log::warn!("session dropped while running; stopping tasks");
            self.stop_tasks();
        }
    }
}

/// Builds background, player and foreground (and the optional area background).
///
/// Paint order is back to front: background, player, foreground.
fn build_scenes<D, L>(
    registry: &mut ResourceRegistry,
    device: &mut D,
    loader: &L,
    config: &SessionConfig,
) -> Result<Scenes, EntityError>
where
    D: GraphicsDevice + ?Sized,
    L: ImageLoader + ?Sized,
{
    let background = Arc::new(build_entity(registry, device, loader, &config.background, None)?);
    let player = Arc::new(build_entity(
        registry,
        device,
        loader,
        &config.player,
        Some(Movement::new(config.input.step)),
    )?);
    let foreground = Arc::new(build_entity(registry, device, loader, &config.foreground, None)?);

    let area_background = match &config.area_background {
        Some(spec) => Some(Arc::new(build_entity(registry, device, loader, spec, None)?)),
        None => None,
    };

    let mut primary = SceneComposer::new();
    primary.append(background);
    primary.append(Arc::clone(&player));
    primary.append(Arc::clone(&foreground));

    let area = area_background.map(|bg| {
        let mut scene = SceneComposer::new();
        scene.append(bg);
        scene.append(Arc::clone(&player));
        scene.append(Arc::clone(&foreground));
        scene
    });

    Ok(Scenes {
        primary,
        area,
        player,
    })
}
