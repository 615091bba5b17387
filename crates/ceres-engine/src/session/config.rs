use std::path::PathBuf;

use crate::input::KeyBindings;
use crate::scene::{CameraConfig, EntitySpec};

/// Everything a session needs to build its scene and start its tasks.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Prefix for relative image paths.
    pub asset_root: PathBuf,
    pub player: EntitySpec,
    pub background: EntitySpec,
    pub foreground: EntitySpec,
    /// Drawn in place of `background` while the area flag is set.
    pub area_background: Option<EntitySpec>,
    pub camera: CameraConfig,
    pub input: InputConfig,
    pub audio: AudioConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("."),
            player: EntitySpec::new(
                "player",
                "resources/images/Ariff.png",
                [0.0, -0.2, -1.0],
                0.2,
                0.2,
            ),
            background: EntitySpec::new(
                "background",
                "resources/images/Background.png",
                [1.1, -0.4, -1.5],
                8.0,
                4.0,
            ),
            foreground: EntitySpec::new(
                "foreground",
                "resources/images/snowforeground.png",
                [0.26, -0.05, -0.5],
                2.2,
                2.0,
            ),
            area_background: None,
            camera: CameraConfig::default(),
            input: InputConfig::default(),
            audio: AudioConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputConfig {
    pub bindings: KeyBindings,
    /// Distance moved per poll cycle per held direction key.
    pub step: f32,
    /// Player height at which horizontal movement plays `step_sound`.
    pub ground_level: f32,
    pub step_sound: Option<PathBuf>,
    /// Requested every cycle the area key is held. `None` requests nothing.
    pub area_sound: Option<PathBuf>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            bindings: KeyBindings::default(),
            step: 0.00001,
            ground_level: 0.0,
            step_sound: Some(PathBuf::from("resources/audio/step.wav")),
            area_sound: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioConfig {
    /// Looping background track started with the audio task.
    pub music: Option<PathBuf>,
}
