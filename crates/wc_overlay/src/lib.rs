pub mod debug_overlay;
pub mod text_layer;

pub use debug_overlay::{DebugOverlay, OverlayStats};
pub use text_layer::{Anchor, FontSource, PreparedText, TextItem, TextLayer};
