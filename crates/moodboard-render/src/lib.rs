//! Moodboard Render Library
//!
//! Rasterizer abstraction, a tiny-skia software rasterizer, the
//! PNG/JPEG/WEBP/PDF encoders and the snapshot export pipeline.

mod renderer;
pub mod encode;
pub mod export;
pub mod pdf;
pub mod software;

pub use encode::{EncodeError, ExportFormat};
pub use export::{
    BusyFlag, Delivery, DeliveryError, DeliveryOutcome, ExportError, ExportReport, Exporter, Snapshot,
};
pub use renderer::{Overlay, RenderContext, RenderResult, Rasterizer, RendererError, overlays};
pub use software::SoftwareRasterizer;
