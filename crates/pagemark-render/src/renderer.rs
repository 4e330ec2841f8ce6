//! Renderer trait abstraction.

use peniko::Color;
use thiserror::Error;

use crate::display_list::PageDrawList;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Initialization failed: {0}")]
    InitFailed(String),
    #[error("Render failed: {0}")]
    RenderFailed(String),
    /// The page surface is missing or has no area. Callers skip the frame.
    #[error("Render target unavailable")]
    TargetUnavailable,
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Trait for rendering backends.
///
/// A backend turns one page's draw list into whatever its surface needs
/// (a GPU scene, a canvas call sequence, a recording for tests).
pub trait Renderer {
    /// Draw a page. Called once per re-composed page.
    fn render_page(&mut self, list: &PageDrawList) -> RenderResult<()>;

    /// Color the page surface is cleared to under the raster.
    fn background_color(&self) -> Color {
        Color::WHITE
    }
}

/// Render every list, skipping pages whose surface is unavailable.
///
/// Returns the number of pages drawn.
pub fn render_all(renderer: &mut dyn Renderer, lists: &[PageDrawList]) -> RenderResult<usize> {
    let mut drawn = 0;
    for list in lists {
        match renderer.render_page(list) {
            Ok(()) => drawn += 1,
            Err(RendererError::TargetUnavailable) => {
                log::trace!("Skipping page {}: no render target", list.page_index);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(drawn)
}
