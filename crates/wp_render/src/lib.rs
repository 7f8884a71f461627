pub mod canvas;
pub mod gpu_context;
pub mod still_image;

pub use canvas::{CanvasTransform, EguiCanvas};
pub use gpu_context::GpuContext;
pub use still_image::{StillImageSource, TestPatternSource};
