use std::iter;

use chrono::Utc;
use ratatui::{
    prelude::*,
    symbols::Marker,
    widgets::{
        Block, Borders, Paragraph, Wrap,
        canvas::{Canvas, Context, Line as CanvasLine},
    },
};
use wastemap_core::{
    BinIcon, Category, LegendGroup, MapFrame, MapMode, Polyline, Priority,
    RECENT_COLLECTION_WINDOW_DAYS, Rgb, Tone, classify, format_last_collection, legend_entries,
};

use crate::app::App;

/// Segments each dashed polyline leg is split into; every other one is drawn.
const DASH_PIECES: u32 = 10;

const CONTROLS_HINT: &str = "+/- zoom · arrows pan · m map type · g home · f/0-5 filter · l legend · \
     Tab bin · Shift-Tab route · Esc clear · r reload · q quit";

/// Draw the whole screen and return the inner area of the map widget.
pub(crate) fn draw(frame: &mut Frame<'_>, app: &App) -> Rect {
    let area = frame.area();
    let scene = app.canvas.frame(Utc::now());

    // Outer layout: title, filter chips, map + side panel, status line
    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [header_area, chips_area, content_area, status_area] = chunks else {
        return Rect::default();
    };

    let header = Paragraph::new(format!(
        "{} · {} map",
        app.service.source().name,
        scene.mode
    ))
    .block(Block::default().borders(Borders::ALL).title("Wastemap"));
    frame.render_widget(header, *header_area);

    draw_chips(frame, &scene, *chips_area);

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(40)])
        .split(*content_area);
    let [map_area, side_area] = content_chunks.as_ref() else {
        return Rect::default();
    };

    let map_inner = draw_map(frame, app, &scene, *map_area);
    draw_side_panel(frame, app, &scene, *side_area);
    draw_status(frame, app, *status_area);

    map_inner
}

const fn color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.red, rgb.green, rgb.blue)
}

const fn background(mode: MapMode) -> Color {
    match mode {
        MapMode::Standard => Color::Reset,
        MapMode::Satellite => Color::Rgb(18, 28, 22),
        MapMode::Hybrid => Color::Rgb(22, 24, 34),
        MapMode::Terrain => Color::Rgb(34, 30, 22),
    }
}

const fn glyph(icon: BinIcon) -> &'static str {
    match icon {
        BinIcon::Bin => "●",
        BinIcon::FullBin => "▲",
        BinIcon::Wrench => "⚒",
        BinIcon::SignalOff => "✕",
    }
}

fn draw_chips(frame: &mut Frame<'_>, scene: &MapFrame, area: Rect) {
    let mut spans = Vec::with_capacity(scene.chips.len() * 2);
    for (index, chip) in scene.chips.iter().enumerate() {
        let mut style = Style::default();
        if chip.active {
            style = style.add_modifier(Modifier::REVERSED | Modifier::BOLD);
        }
        spans.push(Span::styled(
            format!(" {index} {} ({}) ", chip.label, chip.count),
            style,
        ));
        spans.push(Span::raw(" "));
    }

    let chips = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title("Filter (f / 0-5)"));
    frame.render_widget(chips, area);
}

fn draw_map(frame: &mut Frame<'_>, app: &App, scene: &MapFrame, area: Rect) -> Rect {
    let bounds = app.camera.region().bounds();
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Map · {} · {}", scene.mode, scene.category));
    let inner = block.inner(area);

    let selected_bin = app.selected_bin().map(|bin| &bin.id);
    let selected_route = app.selected_route().map(|route| &route.id);

    let mut lines: Vec<&Polyline> = scene
        .routes
        .iter()
        .flat_map(|overlay| iter::once(&overlay.base).chain(overlay.progress.as_ref()))
        .collect();
    lines.sort_by_key(|line| line.z_index);

    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .background_color(background(scene.mode))
        .x_bounds([bounds.west, bounds.east])
        .y_bounds([bounds.south, bounds.north])
        .paint(|ctx| {
            let mut z_index = None;
            for line in &lines {
                if z_index.is_some_and(|current| current != line.z_index) {
                    ctx.layer();
                }
                z_index = Some(line.z_index);
                draw_polyline(ctx, line);
            }
            ctx.layer();

            for overlay in &scene.routes {
                let highlighted = selected_route == Some(&overlay.route_id);
                for stop in &overlay.stops {
                    let mut style = Style::default().fg(color(stop.color));
                    if highlighted {
                        style = style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
                    }
                    ctx.print(
                        stop.coordinates.longitude,
                        stop.coordinates.latitude,
                        Span::styled(stop.label.text(), style),
                    );
                }
            }

            for marker in &scene.markers {
                let mut style = Style::default().fg(color(marker.color));
                if marker.priority == Priority::Urgent {
                    style = style.add_modifier(Modifier::BOLD);
                }
                let text = if selected_bin == Some(&marker.bin_id) {
                    style = style.add_modifier(Modifier::REVERSED);
                    format!("{} {}", glyph(marker.icon), marker.label)
                } else {
                    glyph(marker.icon).to_owned()
                };
                ctx.print(
                    marker.coordinates.longitude,
                    marker.coordinates.latitude,
                    Span::styled(text, style),
                );
            }
        });

    frame.render_widget(canvas, area);
    inner
}

fn draw_polyline(ctx: &mut Context<'_>, polyline: &Polyline) {
    let line_color = color(polyline.color);
    for (from, to) in polyline.points.iter().zip(polyline.points.iter().skip(1)) {
        let (x1, y1) = (from.longitude, from.latitude);
        let (dx, dy) = (to.longitude - x1, to.latitude - y1);
        if polyline.dashed {
            for piece in (0..DASH_PIECES).step_by(2) {
                let start = f64::from(piece) / f64::from(DASH_PIECES);
                let end = f64::from(piece + 1) / f64::from(DASH_PIECES);
                ctx.draw(&CanvasLine::new(
                    x1 + dx * start,
                    y1 + dy * start,
                    x1 + dx * end,
                    y1 + dy * end,
                    line_color,
                ));
            }
        } else {
            ctx.draw(&CanvasLine::new(x1, y1, x1 + dx, y1 + dy, line_color));
        }
    }
}

fn draw_side_panel(frame: &mut Frame<'_>, app: &App, scene: &MapFrame, area: Rect) {
    let legend_height = if scene.legend_expanded { 18 } else { 3 };
    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8),
            Constraint::Length(legend_height),
            Constraint::Min(0),
        ])
        .split(area);
    let [stats_area, legend_area, details_area] = layout_chunks.as_ref() else {
        return;
    };

    draw_stats(frame, app, scene, *stats_area);
    draw_legend(frame, app, scene.legend_expanded, *legend_area);
    draw_details(frame, app, *details_area);
}

fn draw_stats(frame: &mut Frame<'_>, app: &App, scene: &MapFrame, area: Rect) {
    let stats = &scene.stats;
    let palette = app.canvas.palette();
    let counter = |tone: Tone, text: String| {
        Span::styled(text, Style::default().fg(color(palette.color(tone))))
    };

    let lines = vec![
        Line::from(format!(
            "Bins {} · average fill {:.0}%",
            stats.total, stats.average_fill
        )),
        Line::from(vec![
            counter(Tone::Error, format!("Urgent {}", stats.urgent)),
            Span::raw("  "),
            counter(Tone::Warning, format!("Filling {}", stats.filling)),
            Span::raw("  "),
            counter(Tone::Success, format!("Normal {}", stats.normal)),
        ]),
        Line::from(vec![
            counter(Tone::Offline, format!("Offline {}", stats.offline)),
            Span::raw("  "),
            counter(Tone::Caution, format!("Maintenance {}", stats.maintenance)),
        ]),
        Line::from(format!(
            "Collected in last {RECENT_COLLECTION_WINDOW_DAYS} days: {}%",
            stats.collected_recently
        )),
        Line::from(format!(
            "On map {} · without location {}",
            scene.markers.len(),
            scene.unplaced_bins
        )),
        Line::from(format!("Routes {}", scene.routes.len())),
    ];

    let paragraph =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Statistics"));
    frame.render_widget(paragraph, area);
}

fn draw_legend(frame: &mut Frame<'_>, app: &App, expanded: bool, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Legend (l)");
    if !expanded {
        frame.render_widget(Paragraph::new("press l to expand").block(block), area);
        return;
    }

    let mut lines = Vec::new();
    let mut group = None;
    for entry in legend_entries(app.canvas.palette()) {
        if group != Some(entry.group) {
            group = Some(entry.group);
            let title = match entry.group {
                LegendGroup::Bins => "Bins",
                LegendGroup::Routes => "Routes",
                LegendGroup::Stops => "Stops",
            };
            lines.push(Line::from(Span::styled(
                title,
                Style::default().add_modifier(Modifier::BOLD),
            )));
        }
        lines.push(Line::from(vec![
            Span::styled(" ■ ", Style::default().fg(color(entry.color))),
            Span::raw(entry.label),
        ]));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_details(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Details");

    let lines = if let Some(bin) = app.selected_bin() {
        let category = classify(bin);
        let mut lines = vec![
            Line::from(Span::styled(
                bin.label().to_owned(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(format!("Fill level: {}% ({})", bin.fill_level(), category)),
            Line::from(format!("Status: {:?}", bin.status)),
            Line::from(format!(
                "Last collection: {}",
                format_last_collection(bin, Utc::now())
            )),
        ];
        if let Some(address) = bin.location.as_ref().and_then(|location| location.address.as_deref())
        {
            lines.push(Line::from(address.to_owned()));
        }
        if bin.coordinates().is_none() {
            lines.push(Line::from("No location, not shown on the map"));
        }
        if Category::Offline.matches(bin) {
            lines.push(Line::from("Sensor offline"));
        }
        lines
    } else if let Some(route) = app.selected_route() {
        let computed = route.completion_percentage();
        let reported = route.reported_completion();
        let progress = if computed == reported {
            format!("Progress: {computed}%")
        } else {
            format!("Progress: {computed}% (reported {reported}%)")
        };
        vec![
            Line::from(Span::styled(
                route.label().to_owned(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(format!("Status: {}", route.status.label())),
            Line::from(format!(
                "Stops: {} of {} done",
                route.completed_stops(),
                route.stops.len()
            )),
            Line::from(progress),
        ]
    } else {
        vec![Line::from(
            "Click a marker, or use Tab for bins and Shift-Tab for routes.",
        )]
    };

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn draw_status(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let status_text = if app.is_loading {
        format!("Loading… · {CONTROLS_HINT}")
    } else if let Some(msg) = &app.error_message {
        format!("{msg} · {CONTROLS_HINT}")
    } else if let Some(msg) = &app.status_message {
        format!("{msg} · {CONTROLS_HINT}")
    } else {
        CONTROLS_HINT.to_owned()
    };

    let status_style = if app.error_message.is_some() {
        Style::default().fg(Color::Red)
    } else if app.is_loading {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };

    let status = Paragraph::new(status_text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(status_style)
        .wrap(Wrap { trim: true });

    frame.render_widget(status, area);
}
