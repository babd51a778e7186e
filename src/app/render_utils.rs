use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2, vec2};

use crate::layout::{NODE_HEIGHT, NODE_WIDTH};

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, pan: Vec2, zoom: f32) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let step = (64.0 * zoom.clamp(0.6, 1.8)).max(22.0);
    let origin = rect.center() + pan;

    let mut x = origin.x.rem_euclid(step);
    while x < rect.right() {
        painter.line_segment(
            [Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())],
            Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70)),
        );
        x += step;
    }

    let mut y = origin.y.rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment(
            [Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)],
            Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70)),
        );
        y += step;
    }
}

/// World coordinates are node top-left corners; the screen origin sits at the
/// viewport center so panning and zooming stay symmetric around it.
pub(super) fn world_to_screen(rect: Rect, pan: Vec2, zoom: f32, world: Vec2) -> Pos2 {
    rect.center() + pan + world * zoom
}

pub(super) fn screen_to_world(rect: Rect, pan: Vec2, zoom: f32, screen: Pos2) -> Vec2 {
    (screen - rect.center() - pan) / zoom
}

pub(super) fn node_screen_rect(rect: Rect, pan: Vec2, zoom: f32, world_pos: Vec2) -> Rect {
    Rect::from_min_size(
        world_to_screen(rect, pan, zoom, world_pos),
        vec2(NODE_WIDTH, NODE_HEIGHT) * zoom,
    )
}
