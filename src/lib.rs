mod app;
mod async_task;
mod config;
mod gateway;
mod image_utils;
mod mask;
mod session;

pub use app::StudioApp;
pub use config::Config;
pub use gateway::{
    fake::{Invocation, ScriptedGateway},
    gemini::GeminiGateway,
    GatewayError, ModelGateway,
};
pub use image_utils::PngImage;
pub use mask::{Brush, BrushMode, MaskCanvas};
pub use session::{Busy, Session, SessionEvent, DEFAULT_PROMPT};
