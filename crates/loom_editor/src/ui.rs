// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph canvas rendering.
//!
//! Features:
//! - Node rendering with live ports
//! - Edge rendering (bezier curves)
//! - Pan/zoom navigation
//! - Node dragging
//! - Edge drag-to-create
//! - Compute order label on debug nodes
//! - Exposed parameter toggles

use crate::graph_view::GraphView;
use crate::node_view::NodeView;
use crate::port_view::{PortView, PortViewId};
use crate::settings::NodeStyle;
use egui::{Color32, Pos2, Rect, Stroke, Vec2};
use loom_graph::{NodeId, PortDirection, PortRef};

const NODE_SHADOW_OFFSET: f32 = 3.0;
const NODE_BOTTOM_PADDING: f32 = 8.0;

const BEZIER_CURVATURE: f32 = 50.0;
const EDGE_THICKNESS: f32 = 2.5;

const GRID_SPACING: f32 = 20.0;

/// Edge being dragged out of a port
#[derive(Debug, Clone)]
struct EdgeDrag {
    from: PortRef,
    direction: PortDirection,
    current_pos: Pos2,
}

#[derive(Debug, Clone, Default)]
enum InteractionMode {
    #[default]
    Normal,
    Panning,
    DraggingNode(NodeId),
    CreatingEdge(EdgeDrag),
}

/// Node body in graph space.
///
/// Collapsed nodes show only their header. Expanded nodes get one row per
/// port pair, plus one for the compute order label in debug mode.
pub fn node_rect(view: &NodeView, style: &NodeStyle) -> Rect {
    let height = if view.is_expanded() {
        let ports = view.ports();
        let mut rows = ports.inputs().count().max(ports.outputs().count());
        if view.is_debug() {
            rows += 1;
        }
        style.header_height + rows as f32 * style.port_height + NODE_BOTTOM_PADDING
    } else {
        style.header_height
    };

    let [x, y] = view.position();
    Rect::from_min_size(Pos2::new(x, y), Vec2::new(style.node_width, height))
}

/// Center of a port's circle in graph space.
///
/// Inputs sit on the left edge and outputs on the right, in display order.
pub fn port_anchor(view: &NodeView, port: PortViewId, style: &NodeStyle) -> Option<Pos2> {
    let ports = view.ports();
    let direction = ports.port(port)?.direction();
    let row = ports.in_direction(direction).position(|p| p.id() == port)?;

    let rect = node_rect(view, style);
    let x = match direction {
        PortDirection::Input => rect.left(),
        PortDirection::Output => rect.right(),
    };
    let y = if view.is_expanded() {
        rect.top() + style.header_height + row as f32 * style.port_height + style.port_height / 2.0
    } else {
        rect.top() + style.header_height / 2.0
    };
    Some(Pos2::new(x, y))
}

fn port_color(port: &PortView) -> Color32 {
    let [r, g, b] = port.display_type().color();
    Color32::from_rgb(r, g, b)
}

/// Interactive canvas for a [`GraphView`]
#[derive(Debug)]
pub struct GraphCanvas {
    /// Current pan offset (graph space)
    pub pan: Vec2,
    /// Current zoom level
    pub zoom: f32,
    /// Show grid
    pub show_grid: bool,
    mode: InteractionMode,
    last_mouse_pos: Pos2,
    hovered_port: Option<(PortRef, PortDirection)>,
}

impl GraphCanvas {
    /// Create a canvas centered on the origin
    pub fn new() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
            show_grid: true,
            mode: InteractionMode::Normal,
            last_mouse_pos: Pos2::ZERO,
            hovered_port: None,
        }
    }

    /// Convert screen position to graph position
    pub fn screen_to_graph(&self, screen_pos: Pos2, rect: Rect) -> Pos2 {
        let center = rect.center();
        Pos2::new(
            (screen_pos.x - center.x) / self.zoom - self.pan.x,
            (screen_pos.y - center.y) / self.zoom - self.pan.y,
        )
    }

    /// Convert graph position to screen position
    pub fn graph_to_screen(&self, graph_pos: Pos2, rect: Rect) -> Pos2 {
        let center = rect.center();
        Pos2::new(
            (graph_pos.x + self.pan.x) * self.zoom + center.x,
            (graph_pos.y + self.pan.y) * self.zoom + center.y,
        )
    }

    /// Port under the pointer, if any
    pub fn hovered_port(&self) -> Option<&PortRef> {
        self.hovered_port.as_ref().map(|(port, _)| port)
    }

    /// Render the canvas and apply user edits to `view`
    pub fn ui(&mut self, ui: &mut egui::Ui, view: &mut GraphView) {
        let rect = ui.available_rect_before_wrap();
        let response = ui.allocate_rect(rect, egui::Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        let style = view.settings().style.clone();

        if self.show_grid {
            self.draw_grid(&painter, rect);
        }

        let mouse_pos = ui.input(|i| i.pointer.hover_pos().unwrap_or(self.last_mouse_pos));
        let graph_pos = self.screen_to_graph(mouse_pos, rect);
        self.hovered_port = self.port_at(view, graph_pos, &style);

        self.handle_input(ui, &response, rect, mouse_pos, view, &style);

        self.draw_edges(&painter, rect, view, &style);
        if let InteractionMode::CreatingEdge(drag) = &self.mode {
            self.draw_edge_drag(&painter, rect, view, drag, &style);
        }
        self.draw_nodes(&painter, rect, view, &style);
        self.draw_status_bar(&painter, rect, view);
    }

    /// Exposed parameter list with its inspector toggles
    pub fn parameters_ui(&self, ui: &mut egui::Ui, view: &mut GraphView) {
        let parameters: Vec<_> = view
            .graph()
            .parameters()
            .map(|p| (p.id, p.name.clone(), p.settings))
            .collect();

        if parameters.is_empty() {
            ui.weak("No exposed parameters");
            return;
        }

        for (id, name, mut settings) in parameters {
            ui.horizontal(|ui| {
                ui.label(name);
                if ui.checkbox(&mut settings.is_hidden, "Hide in Inspector").changed() {
                    if let Err(err) = view.set_parameter_hidden(id, settings.is_hidden) {
                        tracing::debug!("parameter edit failed: {err}");
                    }
                }
                if ui.checkbox(&mut settings.is_input_parameter, "Is Input").changed() {
                    if let Err(err) = view.set_parameter_input(id, settings.is_input_parameter) {
                        tracing::debug!("parameter edit failed: {err}");
                    }
                }
            });
        }
    }

    fn draw_grid(&self, painter: &egui::Painter, rect: Rect) {
        let spacing = GRID_SPACING * self.zoom;
        let major_spacing = spacing * 5.0;

        let grid_color_minor = Color32::from_rgba_unmultiplied(60, 60, 60, 100);
        let grid_color_major = Color32::from_rgba_unmultiplied(80, 80, 80, 150);

        let offset_x = (self.pan.x * self.zoom) % major_spacing;
        let offset_y = (self.pan.y * self.zoom) % major_spacing;

        for (step, color) in [(spacing, grid_color_minor), (major_spacing, grid_color_major)] {
            let mut x = rect.left() + offset_x % step;
            while x < rect.right() {
                painter.line_segment(
                    [Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())],
                    Stroke::new(1.0, color),
                );
                x += step;
            }

            let mut y = rect.top() + offset_y % step;
            while y < rect.bottom() {
                painter.line_segment(
                    [Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)],
                    Stroke::new(1.0, color),
                );
                y += step;
            }
        }

        let origin = self.graph_to_screen(Pos2::ZERO, rect);
        if rect.contains(origin) {
            let axis = Stroke::new(2.0, Color32::from_rgba_unmultiplied(100, 100, 150, 180));
            painter.line_segment([Pos2::new(origin.x, rect.top()), Pos2::new(origin.x, rect.bottom())], axis);
            painter.line_segment([Pos2::new(rect.left(), origin.y), Pos2::new(rect.right(), origin.y)], axis);
        }
    }

    fn handle_input(
        &mut self,
        ui: &egui::Ui,
        response: &egui::Response,
        rect: Rect,
        mouse_pos: Pos2,
        view: &mut GraphView,
        style: &NodeStyle,
    ) {
        let delta = mouse_pos - self.last_mouse_pos;
        self.last_mouse_pos = mouse_pos;
        let graph_pos = self.screen_to_graph(mouse_pos, rect);

        // Zoom toward the pointer
        let scroll_delta = ui.input(|i| i.raw_scroll_delta.y);
        if scroll_delta != 0.0 && rect.contains(mouse_pos) {
            let old_zoom = self.zoom;
            self.zoom = (self.zoom * (1.0 + scroll_delta * 0.001)).clamp(0.1, 4.0);
            if self.zoom != old_zoom {
                let zoom_ratio = self.zoom / old_zoom;
                self.pan.x += graph_pos.x * (1.0 - zoom_ratio);
                self.pan.y += graph_pos.y * (1.0 - zoom_ratio);
            }
        }

        if response.double_clicked() {
            if let Some(node_id) = node_at(view, graph_pos, style) {
                if let Err(err) = view.toggle_debug(node_id) {
                    tracing::debug!("debug toggle failed: {err}");
                }
            }
        }

        self.mode = match std::mem::take(&mut self.mode) {
            InteractionMode::Normal => {
                if response.dragged_by(egui::PointerButton::Middle) {
                    InteractionMode::Panning
                } else if response.drag_started_by(egui::PointerButton::Primary) {
                    if let Some((port, direction)) = self.hovered_port.clone() {
                        InteractionMode::CreatingEdge(EdgeDrag {
                            from: port,
                            direction,
                            current_pos: mouse_pos,
                        })
                    } else if let Some(node_id) = node_at(view, graph_pos, style) {
                        InteractionMode::DraggingNode(node_id)
                    } else {
                        InteractionMode::Panning
                    }
                } else {
                    InteractionMode::Normal
                }
            }

            InteractionMode::Panning => {
                if response.dragged() {
                    self.pan += delta / self.zoom;
                }
                if response.drag_stopped() {
                    InteractionMode::Normal
                } else {
                    InteractionMode::Panning
                }
            }

            InteractionMode::DraggingNode(node_id) => {
                if response.dragged() {
                    let graph_delta = delta / self.zoom;
                    if let Some(node_view) = view.node_view(node_id) {
                        let [x, y] = node_view.position();
                        if let Err(err) = view.move_node(node_id, [x + graph_delta.x, y + graph_delta.y]) {
                            tracing::debug!("node move failed: {err}");
                        }
                    }
                }
                if response.drag_stopped() {
                    InteractionMode::Normal
                } else {
                    InteractionMode::DraggingNode(node_id)
                }
            }

            InteractionMode::CreatingEdge(mut drag) => {
                drag.current_pos = mouse_pos;
                if response.drag_stopped() {
                    self.complete_edge(view, drag);
                    InteractionMode::Normal
                } else {
                    InteractionMode::CreatingEdge(drag)
                }
            }
        };
    }

    fn complete_edge(&self, view: &mut GraphView, drag: EdgeDrag) {
        let Some((target, target_direction)) = self.hovered_port.clone() else {
            return;
        };
        if target_direction == drag.direction {
            return;
        }

        let (output, input) = match drag.direction {
            PortDirection::Output => (drag.from, target),
            PortDirection::Input => (target, drag.from),
        };
        if let Err(err) = view.connect(output, input) {
            tracing::debug!("edge rejected: {err}");
        }
    }

    fn port_at(&self, view: &GraphView, graph_pos: Pos2, style: &NodeStyle) -> Option<(PortRef, PortDirection)> {
        let reach = style.port_radius * 1.5;
        view.node_views().find_map(|node_view| {
            node_view.ports().iter().find_map(|port| {
                let anchor = port_anchor(node_view, port.id(), style)?;
                (anchor.distance(graph_pos) < reach).then(|| (port.port_ref(), port.direction()))
            })
        })
    }

    fn draw_edges(&self, painter: &egui::Painter, rect: Rect, view: &GraphView, style: &NodeStyle) {
        for edge in view.graph().edges() {
            let output = self.port_screen_pos(view, &edge.output, style, rect);
            let input = self.port_screen_pos(view, &edge.input, style, rect);

            if let (Some((from, color)), Some((to, _))) = (output, input) {
                self.draw_bezier(painter, from, to, color);
            }
        }
    }

    fn port_screen_pos(
        &self,
        view: &GraphView,
        port: &PortRef,
        style: &NodeStyle,
        rect: Rect,
    ) -> Option<(Pos2, Color32)> {
        let node_view = view.node_view(port.node)?;
        let port_view = node_view.port_for_field(&port.field_name, &port.identifier)?;
        let anchor = port_anchor(node_view, port_view.id(), style)?;
        Some((self.graph_to_screen(anchor, rect), port_color(port_view)))
    }

    fn draw_bezier(&self, painter: &egui::Painter, from: Pos2, to: Pos2, color: Color32) {
        let distance = (to.x - from.x).abs();
        let curvature = (BEZIER_CURVATURE * self.zoom).min(distance * 0.5);

        let ctrl1 = Pos2::new(from.x + curvature, from.y);
        let ctrl2 = Pos2::new(to.x - curvature, to.y);

        let points = bezier_points(from, ctrl1, ctrl2, to, 32);
        for segment in points.windows(2) {
            painter.line_segment(
                [segment[0], segment[1]],
                Stroke::new(EDGE_THICKNESS * self.zoom, color),
            );
        }
    }

    fn draw_edge_drag(
        &self,
        painter: &egui::Painter,
        rect: Rect,
        view: &GraphView,
        drag: &EdgeDrag,
        style: &NodeStyle,
    ) {
        let Some((from, color)) = self.port_screen_pos(view, &drag.from, style, rect) else {
            return;
        };
        match drag.direction {
            PortDirection::Output => self.draw_bezier(painter, from, drag.current_pos, color),
            PortDirection::Input => self.draw_bezier(painter, drag.current_pos, from, color),
        }
    }

    fn draw_nodes(&self, painter: &egui::Painter, rect: Rect, view: &GraphView, style: &NodeStyle) {
        for node_view in view.node_views() {
            let node_rect = node_rect(node_view, style);
            let screen_rect = Rect::from_min_size(
                self.graph_to_screen(node_rect.min, rect),
                node_rect.size() * self.zoom,
            );
            if !screen_rect.intersects(rect) {
                continue;
            }

            let rounding = style.rounding * self.zoom;
            painter.rect_filled(
                screen_rect.translate(Vec2::splat(NODE_SHADOW_OFFSET)),
                rounding,
                Color32::from_rgba_unmultiplied(0, 0, 0, 60),
            );
            painter.rect_filled(screen_rect, rounding, Color32::from_rgb(45, 45, 48));

            let header_rect = Rect::from_min_size(
                screen_rect.min,
                Vec2::new(screen_rect.width(), style.header_height * self.zoom),
            );
            let header_color = view
                .graph()
                .node(node_view.node_id())
                .and_then(|node| node.color)
                .map_or(Color32::from_rgb(70, 100, 130), |[r, g, b]| Color32::from_rgb(r, g, b));
            let header_rounding = if node_view.is_expanded() {
                egui::Rounding {
                    nw: rounding,
                    ne: rounding,
                    sw: 0.0,
                    se: 0.0,
                }
            } else {
                egui::Rounding::same(rounding)
            };
            painter.rect_filled(header_rect, header_rounding, header_color);
            painter.text(
                header_rect.center(),
                egui::Align2::CENTER_CENTER,
                node_view.title(),
                egui::FontId::proportional(12.0 * self.zoom),
                Color32::WHITE,
            );

            self.draw_ports(painter, rect, node_view, style);

            if node_view.is_debug() && node_view.is_expanded() {
                let label_pos = Pos2::new(
                    screen_rect.center().x,
                    screen_rect.bottom() - (NODE_BOTTOM_PADDING + style.port_height / 2.0) * self.zoom,
                );
                painter.text(
                    label_pos,
                    egui::Align2::CENTER_CENTER,
                    node_view.compute_order_label(),
                    egui::FontId::monospace(10.0 * self.zoom),
                    Color32::from_rgb(230, 200, 90),
                );
            }
        }
    }

    fn draw_ports(&self, painter: &egui::Painter, rect: Rect, node_view: &NodeView, style: &NodeStyle) {
        let radius = style.port_radius * self.zoom;
        let padding = style.port_padding * self.zoom;

        for port in node_view.ports().iter() {
            let Some(anchor) = port_anchor(node_view, port.id(), style) else {
                continue;
            };
            let pos = self.graph_to_screen(anchor, rect);
            let color = port_color(port);

            let hovered = self
                .hovered_port
                .as_ref()
                .is_some_and(|(hovered, _)| port.matches(hovered));
            let radius = if hovered { radius * 1.3 } else { radius };

            // Hollow until something is attached
            if port.is_attached() {
                painter.circle_filled(pos, radius, color);
            } else {
                painter.circle_filled(pos, radius, Color32::from_gray(30));
                painter.circle_stroke(pos, radius, Stroke::new(1.5, color));
            }

            if !node_view.is_expanded() {
                continue;
            }
            let (label_pos, align) = match port.direction() {
                PortDirection::Input => (Pos2::new(pos.x + padding, pos.y), egui::Align2::LEFT_CENTER),
                PortDirection::Output => (Pos2::new(pos.x - padding, pos.y), egui::Align2::RIGHT_CENTER),
            };
            painter.text(
                label_pos,
                align,
                port.display_name(),
                egui::FontId::proportional(10.0 * self.zoom),
                Color32::from_gray(200),
            );
        }
    }

    fn draw_status_bar(&self, painter: &egui::Painter, rect: Rect, view: &GraphView) {
        painter.text(
            Pos2::new(rect.left() + 5.0, rect.bottom() - 11.0),
            egui::Align2::LEFT_CENTER,
            format!(
                "Nodes: {} | Edges: {} | Zoom: {:.0}%",
                view.graph().node_count(),
                view.graph().edge_count(),
                self.zoom * 100.0,
            ),
            egui::FontId::proportional(11.0),
            Color32::from_gray(150),
        );
    }
}

impl Default for GraphCanvas {
    fn default() -> Self {
        Self::new()
    }
}

/// Topmost node containing a graph position
fn node_at(view: &GraphView, graph_pos: Pos2, style: &NodeStyle) -> Option<NodeId> {
    view.node_views()
        .filter(|node_view| node_rect(node_view, style).contains(graph_pos))
        .last()
        .map(NodeView::node_id)
}

/// Generate points along a cubic bezier curve
fn bezier_points(p0: Pos2, p1: Pos2, p2: Pos2, p3: Pos2, segments: usize) -> Vec<Pos2> {
    let mut points = Vec::with_capacity(segments + 1);
    for i in 0..=segments {
        let t = i as f32 / segments as f32;
        let t2 = t * t;
        let t3 = t2 * t;
        let mt = 1.0 - t;
        let mt2 = mt * mt;
        let mt3 = mt2 * mt;

        let x = mt3 * p0.x + 3.0 * mt2 * t * p1.x + 3.0 * mt * t2 * p2.x + t3 * p3.x;
        let y = mt3 * p0.y + 3.0 * mt2 * t * p1.y + 3.0 * mt * t2 * p2.y + t3 * p3.y;

        points.push(Pos2::new(x, y));
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::EditorSettings;
    use loom_graph::graphs::create_default_registry;
    use loom_graph::Graph;

    fn multi_add_view() -> (GraphView, NodeId, NodeId) {
        let registry = create_default_registry();
        let mut view = GraphView::new(Graph::new("canvas"), EditorSettings::default());
        let c = view.add_node(registry.create_node("constant").unwrap());
        let sum = view.add_node(registry.create_node("multi_add").unwrap());
        view.move_node(sum, [100.0, 50.0]).unwrap();
        (view, c, sum)
    }

    #[test]
    fn test_node_rect_grows_with_ports() {
        let style = NodeStyle::default();
        let (mut view, c, sum) = multi_add_view();

        let rect = node_rect(view.node_view(sum).unwrap(), &style);
        assert_eq!(rect.min, Pos2::new(100.0, 50.0));
        assert_eq!(rect.height(), 24.0 + 22.0 + 8.0);

        view.connect(PortRef::field(c, "value"), PortRef::new(sum, "inputs", "0"))
            .unwrap();
        let rect = node_rect(view.node_view(sum).unwrap(), &style);
        assert_eq!(rect.height(), 24.0 + 2.0 * 22.0 + 8.0);

        view.toggle_debug(sum).unwrap();
        let rect = node_rect(view.node_view(sum).unwrap(), &style);
        assert_eq!(rect.height(), 24.0 + 3.0 * 22.0 + 8.0);
    }

    #[test]
    fn test_port_anchor_rows() {
        let style = NodeStyle::default();
        let (mut view, c, sum) = multi_add_view();
        view.connect(PortRef::field(c, "value"), PortRef::new(sum, "inputs", "0"))
            .unwrap();

        let node_view = view.node_view(sum).unwrap();
        let second = node_view.port_for_field("inputs", "1").unwrap().id();
        let out = node_view.first_port_for_field("out").unwrap().id();

        assert_eq!(
            port_anchor(node_view, second, &style),
            Some(Pos2::new(100.0, 50.0 + 24.0 + 22.0 + 11.0))
        );
        assert_eq!(
            port_anchor(node_view, out, &style),
            Some(Pos2::new(280.0, 50.0 + 24.0 + 11.0))
        );
        assert_eq!(port_anchor(node_view, PortViewId::new(), &style), None);
    }

    #[test]
    fn test_collapsed_node_anchors_on_header() {
        let style = NodeStyle::default();
        let (mut view, _, sum) = multi_add_view();
        view.set_expanded(sum, false).unwrap();

        let node_view = view.node_view(sum).unwrap();
        assert_eq!(node_rect(node_view, &style).height(), 24.0);
        let first = node_view.first_port_for_field("inputs").unwrap().id();
        assert_eq!(port_anchor(node_view, first, &style), Some(Pos2::new(100.0, 62.0)));
    }

    #[test]
    fn test_transform_round_trip() {
        let canvas = GraphCanvas {
            pan: Vec2::new(30.0, -10.0),
            zoom: 2.0,
            ..GraphCanvas::default()
        };
        let rect = Rect::from_min_size(Pos2::ZERO, Vec2::new(800.0, 600.0));
        let graph_pos = Pos2::new(12.0, 34.0);
        let back = canvas.screen_to_graph(canvas.graph_to_screen(graph_pos, rect), rect);
        assert!((back - graph_pos).length() < 1e-4);
    }

    #[test]
    fn test_bezier_endpoints() {
        let points = bezier_points(
            Pos2::new(0.0, 0.0),
            Pos2::new(10.0, 0.0),
            Pos2::new(20.0, 10.0),
            Pos2::new(30.0, 10.0),
            8,
        );
        assert_eq!(points.len(), 9);
        assert_eq!(points[0], Pos2::new(0.0, 0.0));
        assert_eq!(points[8], Pos2::new(30.0, 10.0));
    }

    #[test]
    fn test_canvas_renders_headless() {
        let (mut view, c, sum) = multi_add_view();
        view.connect(PortRef::field(c, "value"), PortRef::new(sum, "inputs", "0"))
            .unwrap();
        view.toggle_debug(sum).unwrap();
        let mut canvas = GraphCanvas::new();

        let ctx = egui::Context::default();
        let output = ctx.run(egui::RawInput::default(), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| canvas.ui(ui, &mut view));
        });
        assert!(!output.shapes.is_empty());
        assert!(canvas.hovered_port().is_none());
        assert_eq!(view.graph().edge_count(), 1);
    }

    #[test]
    fn test_parameter_panel_renders_headless() {
        let mut graph = Graph::new("canvas");
        let speed = graph.add_parameter("speed", loom_graph::PortType::Float).unwrap();
        let mut view = GraphView::new(graph, EditorSettings::default());
        view.set_parameter_hidden(speed, true).unwrap();
        let canvas = GraphCanvas::new();

        let ctx = egui::Context::default();
        let output = ctx.run(egui::RawInput::default(), |ctx| {
            egui::SidePanel::left("parameters").show(ctx, |ui| canvas.parameters_ui(ui, &mut view));
        });
        assert!(!output.shapes.is_empty());

        // Drawing alone leaves the flags as they were
        let settings = view.graph().parameter(speed).unwrap().settings;
        assert!(settings.is_hidden);
        assert!(!settings.is_input_parameter);
    }
}
