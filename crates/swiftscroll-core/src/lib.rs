pub mod engine;
pub mod error;
pub mod resolver;
pub mod settings;

pub use engine::{
    Axis, EngineHandle, EngineParams, NotchEvent, ScrollEngine, TargetWindow, WheelEmitter,
};
pub use error::{Error, Result};
pub use resolver::{resolve, Resolution, GLOBAL_PROFILE_KEY};
pub use settings::{AppProfileBinding, AppSettings, ScrollProfile, DEFAULT_PROFILE_NAME};
