// Errors from the outer surfaces only: fonts, config, progress file, snapshots, window.
// Tracing, scoring and the session itself never fail; they degrade to no-ops.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// No bold sans-serif face could be located on this system.
    #[error("no suitable system font found")]
    FontNotFound,

    /// Font bytes were found but fontdue refused them.
    #[error("font load error: {0}")]
    FontLoad(String),

    /// Creating the window failed.
    #[error("window init error: {0}")]
    WindowInit(String),

    /// Pushing a frame to the window failed.
    #[error("window update error: {0}")]
    WindowUpdate(String),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("progress file error: {0}")]
    Progress(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
