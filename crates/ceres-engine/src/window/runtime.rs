use std::sync::Arc;

use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::device::{Gpu, GpuInit, WgpuBackend};
use crate::gfx::{FrameStatus, RenderBackend};
use crate::input::platform::apply_window_event;
use crate::input::{Key, KeyState, SharedKeyboard};
use crate::resource::FileImageLoader;
use crate::session::{SessionConfig, SessionController};

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    /// Pressing this key ends the session.
    pub kill_key: Key,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "Ultra Ceres Station".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
            kill_key: Key::F,
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens the window, runs the session until the window closes or the kill key is
    /// pressed, then tears the session down.
    pub fn run(config: RuntimeConfig, gpu_init: GpuInit, session: SessionConfig) -> Result<()> {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, session);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[covariant]
    backend: WgpuBackend<'this>,
}

struct AppState {
    config: RuntimeConfig,
    gpu_init: GpuInit,

    keys: Arc<SharedKeyboard>,
    loader: FileImageLoader,
    session: SessionController,

    window: Option<WindowEntry>,
    failure: Option<anyhow::Error>,
}

impl AppState {
    fn new(config: RuntimeConfig, gpu_init: GpuInit, session: SessionConfig) -> Self {
        let keys = Arc::new(SharedKeyboard::new());
        let loader = FileImageLoader::new(session.asset_root.clone());
        let session = SessionController::new(session, keys.clone());
        Self {
            config,
            gpu_init,
            keys,
            loader,
            session,
            window: None,
            failure: None,
        }
    }

    fn create_window_entry(&self, event_loop: &ActiveEventLoop) -> Result<WindowEntry> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();
        let camera = self.session.config().camera;

        WindowEntryTryBuilder {
            window,
            backend_builder: |w| {
                let clear_color = gpu_init.clear_color;
                pollster::block_on(Gpu::new(w, gpu_init))
                    .map(|gpu| WgpuBackend::new(gpu, camera, clear_color))
            },
        }
        .try_build()
        .context("GPU initialization failed for window")
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.failure = Some(err);
        self.shutdown(event_loop);
    }

    /// Closes the session on the render thread, then drops the backend and window.
    fn close_session(&mut self) {
        let Some(mut entry) = self.window.take() else {
            return;
        };
        let session = &mut self.session;
        entry.with_backend_mut(|backend| match session.close(backend) {
            Ok(released) => log::info!("session closed, {} handles released", released.total()),
            Err(e) => log::warn!("{e}"),
        });
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        self.close_session();
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(entry) = self.window.as_mut() else {
            return;
        };
        let session = &mut self.session;

        entry.with_window(|w| w.pre_present_notify());
        let result = entry.with_backend_mut(|backend| session.render_frame(backend));

        match result {
            Ok(FrameStatus::Fatal) => {
                self.fail(event_loop, anyhow::anyhow!("unrecoverable surface error"));
            }
            Ok(_) => {}
            Err(e) => self.fail(event_loop, e.into()),
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let mut entry = match self.create_window_entry(event_loop) {
            Ok(entry) => entry,
            Err(e) => {
                self.fail(event_loop, e);
                return;
            }
        };

        let (session, loader) = (&mut self.session, &self.loader);
        let started = entry.with_backend_mut(|backend| session.start(backend, loader));
        entry.with_window(|w| w.request_redraw());
        self.window = Some(entry);

        if let Err(e) = started {
            self.fail(event_loop, anyhow::Error::new(e).context("failed to start session"));
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw: every entity is drawn every frame.
        if let Some(entry) = self.window.as_ref() {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some((key, KeyState::Pressed)) = apply_window_event(&self.keys, &event) {
            if key == self.config.kill_key {
                log::info!("kill key {key} pressed");
                self.shutdown(event_loop);
                return;
            }
        }

        match &event {
            WindowEvent::CloseRequested => {
                log::info!("close requested");
                self.shutdown(event_loop);
            }

            WindowEvent::Resized(new_size) => {
                if let Some(entry) = self.window.as_mut() {
                    entry.with_backend_mut(|b| b.resize(new_size.width, new_size.height));
                    entry.with_window(|w| w.request_redraw());
                }
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(entry) = self.window.as_mut() {
                    let new_size = entry.with_window(|w| w.inner_size());
                    entry.with_backend_mut(|b| b.resize(new_size.width, new_size.height));
                    entry.with_window(|w| w.request_redraw());
                }
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.close_session();
    }
}
