//! wgpu rendering
//!
//! Sprites are drawn as instanced quads, batched per texture. The batching
//! logic in [`batch`] is GPU-independent; [`sprite`] feeds it to wgpu.

pub mod batch;
pub mod device;
pub mod instance;
pub mod sprite;
pub mod text;
pub mod texture;

pub use batch::{BatchPass, BatchStats, BatchTexture, Binding, InstanceSink, SpriteBatch};
pub use device::GraphicsDevice;
pub use instance::{SpriteInstance, UvRect};
pub use sprite::{SpritePass, SpriteRenderer};
pub use texture::{Pixels, Texture, TextureHandle, TextureId};
