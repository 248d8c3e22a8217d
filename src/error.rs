//! Error types

use std::path::PathBuf;

use thiserror::Error;

/// Startup failures. None of these are recoverable; the binary logs and exits.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("Event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("Window creation failed: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("Surface creation failed: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("No suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("Device creation failed: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("Surface is not supported by the adapter")]
    UnsupportedSurface,

    #[error("Failed to read texture {path}: {source}")]
    TextureIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode texture {path}: {source}")]
    TextureDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Texture {path} is {width}x{height}, the device allows at most {max}x{max}")]
    TextureTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max: u32,
    },

    #[error("{max_instances} instances per flush exceed the device buffer limit of {max_bytes} bytes")]
    InstanceBufferTooLarge { max_instances: usize, max_bytes: u64 },

    #[error("Out of GPU memory")]
    OutOfMemory,
}

/// Settings file failures
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Settings I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Settings JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
