use std::{io, sync::Arc};

use eframe::egui::{self, Color32, ColorImage, Sense, TextureHandle, TextureOptions, Vec2};
use image::RgbaImage;
use log::warn;

use crate::image_utils::{self, PngImage};

mod brush;

pub use brush::{Brush, BrushMode, BRUSH_MAX, BRUSH_MIN, MASK_COLOR};

/// Freehand mask editor. Owns a transparent overlay at the photo's native
/// resolution; strokes paint into the overlay, never into the photo. Display
/// happens at a fitted scale, painting always at native resolution. On every
/// completed stroke the canvas flattens photo + overlay into one PNG and hands
/// it to the caller by value.
pub struct MaskCanvas {
    original: Arc<RgbaImage>,
    overlay: RgbaImage,
    pub brush: Brush,
    last_point: Option<(f32, f32)>,
    photo_texture: Option<TextureHandle>,
    overlay_texture: Option<TextureHandle>,
}

impl MaskCanvas {
    pub fn new(original: Arc<RgbaImage>) -> Self {
        let (w, h) = original.dimensions();
        Self {
            original,
            overlay: RgbaImage::new(w, h),
            brush: Brush::default(),
            last_point: None,
            photo_texture: None,
            overlay_texture: None,
        }
    }

    pub fn native_size(&self) -> (u32, u32) {
        self.original.dimensions()
    }

    /// Fit-to-width scale, capped at 1.0 so the photo never upscales.
    pub fn display_scale(&self, container_width: f32) -> f32 {
        let native_width = self.original.width() as f32;
        if native_width <= 0.0 || container_width <= 0.0 {
            return 1.0;
        }
        (container_width / native_width).min(1.0)
    }

    /// Begins a stroke at a surface-local position (already offset by the
    /// surface origin). Positions are in display space; `scale` maps them back
    /// to native pixels. No-op while the surface has no usable scale yet.
    pub fn pointer_down(&mut self, surface_pos: (f32, f32), scale: f32) {
        if scale <= 0.0 {
            return;
        }
        let point = (surface_pos.0 / scale, surface_pos.1 / scale);
        self.brush.stamp(&mut self.overlay, point);
        self.last_point = Some(point);
        self.overlay_texture = None;
    }

    /// Extends the active stroke; no-op if no stroke is active.
    pub fn pointer_move(&mut self, surface_pos: (f32, f32), scale: f32) {
        if scale <= 0.0 {
            return;
        }
        let Some(last) = self.last_point else {
            return;
        };
        let point = (surface_pos.0 / scale, surface_pos.1 / scale);
        self.brush.stamp_segment(&mut self.overlay, last, point);
        self.last_point = Some(point);
        self.overlay_texture = None;
    }

    /// Ends the active stroke and emits the flattened composite; None if no
    /// stroke was active or the encode failed.
    pub fn pointer_up(&mut self) -> Option<PngImage> {
        self.last_point.take()?;
        match self.composite() {
            Ok(composite) => Some(composite),
            Err(e) => {
                warn!("Failed to flatten mask composite: {e}");
                None
            }
        }
    }

    /// Photo plus overlay at the photo's native resolution, rebuilt from the
    /// live overlay every time it is called.
    pub fn composite(&self) -> io::Result<PngImage> {
        PngImage::from_rgba(&image_utils::flatten(&self.original, &self.overlay))
    }

    /// Draws the scaled surface and routes pointer/touch interaction into the
    /// stroke handlers. Returns a composite when a stroke just finished.
    pub fn ui(&mut self, ui: &mut egui::Ui) -> Option<PngImage> {
        let scale = self.display_scale(ui.available_width());
        let (w, h) = self.native_size();
        let display_size = Vec2::new(w as f32 * scale, h as f32 * scale);
        let (rect, response) = ui.allocate_exact_size(display_size, Sense::drag());

        let texture_options = TextureOptions {
            magnification: egui::TextureFilter::Nearest,
            ..Default::default()
        };
        if self.photo_texture.is_none() {
            self.photo_texture = Some(ui.ctx().load_texture(
                "photo",
                color_image(&self.original),
                texture_options,
            ));
        }
        if self.overlay_texture.is_none() {
            self.overlay_texture = Some(ui.ctx().load_texture(
                "mask-overlay",
                color_image(&self.overlay),
                texture_options,
            ));
        }

        let uv = egui::Rect::from_min_max(egui::Pos2::ZERO, egui::Pos2::new(1.0, 1.0));
        let painter = ui.painter().with_clip_rect(rect);
        for texture in [&self.photo_texture, &self.overlay_texture].into_iter().flatten() {
            painter.image(texture.id(), rect, uv, Color32::WHITE);
        }

        // Pointer and single-touch input arrive through the same response.
        let local = |pos: egui::Pos2| (pos.x - rect.min.x, pos.y - rect.min.y);
        if response.drag_started() {
            if let Some(pos) = response.interact_pointer_pos() {
                self.pointer_down(local(pos), scale);
            }
        } else if response.dragged() {
            if let Some(pos) = response.interact_pointer_pos() {
                self.pointer_move(local(pos), scale);
            }
        }
        if response.drag_stopped() {
            return self.pointer_up();
        }
        None
    }
}

pub(crate) fn color_image(image: &RgbaImage) -> ColorImage {
    ColorImage {
        size: [image.width() as usize, image.height() as usize],
        pixels: image
            .pixels()
            .map(|image::Rgba([r, g, b, a])| Color32::from_rgba_unmultiplied(*r, *g, *b, *a))
            .collect(),
    }
}
