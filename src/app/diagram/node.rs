use eframe::egui::{
    Align2, Color32, CornerRadius, FontId, Painter, Rect, Stroke, StrokeKind, pos2, vec2,
};

use crate::relation::RelationType;
use crate::util::ellipsize;

use super::super::DiagramNode;
use super::super::render_utils::blend_color;

/// Below this zoom the boxes are too small for text, so only the colored
/// shells and anchors are painted.
pub(in crate::app) const MIN_DETAIL_ZOOM: f32 = 0.45;

const SELECTED_BORDER: Color32 = Color32::from_rgb(245, 206, 93);
const BODY_FILL: Color32 = Color32::from_rgb(38, 42, 50);
const HEADER_HEIGHT: f32 = 26.0;

pub(in crate::app) const fn relation_fill(relation_type: RelationType) -> Color32 {
    match relation_type {
        RelationType::Source => Color32::from_rgb(66, 133, 215),
        RelationType::Sink => Color32::from_rgb(156, 104, 220),
        RelationType::MaterializedView => Color32::from_rgb(226, 150, 59),
        RelationType::Table => Color32::from_rgb(82, 166, 98),
        RelationType::SystemTable => Color32::from_rgb(110, 118, 128),
    }
}

pub(in crate::app) fn draw_node(
    painter: &Painter,
    node: &DiagramNode,
    screen: Rect,
    zoom: f32,
    selection_mix: f32,
    hovered: bool,
    expanded: bool,
) {
    let accent = relation_fill(node.relation_type);

    painter.rect_filled(screen, 4.0, BODY_FILL);

    let header_height = (HEADER_HEIGHT * zoom).min(screen.height());
    let header = Rect::from_min_size(screen.min, vec2(screen.width(), header_height));
    painter.rect_filled(
        header,
        CornerRadius {
            nw: 4,
            ne: 4,
            sw: 0,
            se: 0,
        },
        accent,
    );

    let base_border = if hovered {
        Color32::from_gray(200)
    } else {
        Color32::from_gray(15)
    };
    let border = blend_color(base_border, SELECTED_BORDER, selection_mix);
    painter.rect_stroke(
        screen,
        4.0,
        Stroke::new(1.0 + (selection_mix * 1.4), border),
        StrokeKind::Inside,
    );

    // Edge anchors: dependencies arrive on the left, dependents leave on the right.
    let anchor_radius = (3.2 * zoom.sqrt()).clamp(1.6, 4.0);
    for anchor in [
        pos2(screen.left(), screen.center().y),
        pos2(screen.right(), screen.center().y),
    ] {
        painter.circle_filled(anchor, anchor_radius, Color32::from_gray(165));
        painter.circle_stroke(anchor, anchor_radius, Stroke::new(1.0, Color32::from_gray(15)));
    }

    if zoom < MIN_DETAIL_ZOOM {
        return;
    }

    let padding = 8.0 * zoom;
    let badge_font = FontId::proportional((10.0 * zoom).clamp(7.0, 14.0));
    let name_font = FontId::proportional((13.0 * zoom).clamp(8.0, 19.0));
    let body_font = FontId::proportional((12.0 * zoom).clamp(8.0, 17.0));

    let badge = Rect::from_min_size(
        pos2(screen.left() + (padding * 0.6), header.center().y - (7.0 * zoom)),
        vec2(34.0 * zoom, 14.0 * zoom),
    );
    painter.rect_filled(badge, 2.0, Color32::from_rgba_unmultiplied(0, 0, 0, 80));
    painter.text(
        badge.center(),
        Align2::CENTER_CENTER,
        node.relation_type.badge(),
        badge_font.clone(),
        Color32::WHITE,
    );

    painter.text(
        pos2(badge.right() + (padding * 0.6), header.center().y),
        Align2::LEFT_CENTER,
        ellipsize(&node.name, 24),
        name_font,
        Color32::WHITE,
    );

    let toggle = expander_rect(screen, zoom);
    painter.rect_filled(toggle, 2.0, Color32::from_rgba_unmultiplied(255, 255, 255, 30));
    painter.text(
        toggle.center(),
        Align2::CENTER_CENTER,
        if expanded { "-" } else { "+" },
        badge_font,
        Color32::from_gray(235),
    );

    painter.text(
        pos2(screen.left() + padding, screen.top() + header_height + (padding * 0.8)),
        Align2::LEFT_TOP,
        &node.throughput_label,
        body_font,
        Color32::from_gray(235),
    );
    painter.text(
        pos2(screen.left() + padding, screen.bottom() - (padding * 0.8)),
        Align2::LEFT_BOTTOM,
        format!("{} columns", node.columns.len()),
        FontId::proportional((10.5 * zoom).clamp(7.0, 15.0)),
        Color32::from_gray(150),
    );
}

/// Hit target for the column expander in the header's right corner.
pub(in crate::app) fn expander_rect(screen: Rect, zoom: f32) -> Rect {
    let size = (14.0 * zoom).clamp(8.0, 18.0).min(screen.height() * 0.5);
    let header_height = (HEADER_HEIGHT * zoom).min(screen.height());

    Rect::from_center_size(
        pos2(screen.right() - size, screen.top() + (header_height * 0.5)),
        vec2(size, size),
    )
}

/// Column popup below an expanded node. Drawn at a fixed font size so the
/// schema stays legible at any zoom.
pub(in crate::app) fn draw_column_overlay(painter: &Painter, node: &DiagramNode, screen: Rect) {
    const ROW_HEIGHT: f32 = 17.0;
    const MAX_ROWS: usize = 12;

    let shown = node.columns.len().min(MAX_ROWS);
    let hidden = node.columns.len() - shown;
    let row_count = shown.max(1) + usize::from(hidden > 0);

    let width = screen.width().max(230.0);
    let height = 26.0 + (ROW_HEIGHT * row_count as f32);
    let overlay = Rect::from_min_size(
        pos2(screen.left(), screen.bottom() + 4.0),
        vec2(width, height),
    );

    painter.rect_filled(overlay, 4.0, Color32::from_rgba_unmultiplied(24, 27, 33, 247));
    painter.rect_stroke(
        overlay,
        4.0,
        Stroke::new(1.0, relation_fill(node.relation_type)),
        StrokeKind::Inside,
    );

    painter.text(
        pos2(overlay.left() + 8.0, overlay.top() + 6.0),
        Align2::LEFT_TOP,
        format!("columns ({})", node.columns.len()),
        FontId::proportional(11.0),
        Color32::from_gray(160),
    );

    let font = FontId::proportional(11.5);

    if node.columns.is_empty() {
        painter.text(
            pos2(overlay.left() + 8.0, overlay.top() + 24.0),
            Align2::LEFT_TOP,
            "none in this snapshot",
            font,
            Color32::from_gray(150),
        );
        return;
    }

    for (row, column) in node.columns.iter().take(MAX_ROWS).enumerate() {
        let y = overlay.top() + 24.0 + (row as f32 * ROW_HEIGHT);

        let name_color = if column.is_primary_key {
            SELECTED_BORDER
        } else {
            Color32::from_gray(225)
        };
        painter.text(
            pos2(overlay.left() + 8.0, y),
            Align2::LEFT_TOP,
            &column.name,
            font.clone(),
            name_color,
        );

        let type_text = if column.is_primary_key {
            format!("{} (PK)", column.data_type)
        } else {
            column.data_type.clone()
        };
        painter.text(
            pos2(overlay.right() - 8.0, y),
            Align2::RIGHT_TOP,
            type_text,
            font.clone(),
            Color32::from_gray(150),
        );
    }

    if hidden > 0 {
        painter.text(
            pos2(overlay.left() + 8.0, overlay.top() + 24.0 + (shown as f32 * ROW_HEIGHT)),
            Align2::LEFT_TOP,
            format!("... and {hidden} more"),
            font,
            Color32::from_gray(150),
        );
    }
}
