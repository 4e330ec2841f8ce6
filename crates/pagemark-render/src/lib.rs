//! Pagemark Render Library
//!
//! Turns engine state into ordered per-page draw lists and hands them to
//! a renderer backend. The optional Vello backend builds GPU scenes.

mod compositor;
mod display_list;
pub mod draw;
mod renderer;

#[cfg(feature = "vello-renderer")]
mod vello_impl;

pub use compositor::{Compositor, PageFrame};
pub use display_list::{DrawCommand, Layer, PageDrawList};
pub use renderer::{RenderResult, Renderer, RendererError, render_all};

#[cfg(feature = "vello-renderer")]
pub use vello_impl::VelloRenderer;
