pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph, Widget},
};
use unicode_width::UnicodeWidthStr;

use crate::assets::ColumnContent;
use crate::config::NodeKind;
use crate::emoji::{EmojiCounter, EmojiParticle};
use crate::host::{AudioSink, VideoHost};
use crate::kiosk::Kiosk;
use crate::node_machine::NodeState;
use crate::timing::Millis;

use self::screen::current_screen;

/// Where the panel of the node in view is in its slide.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Slide {
    Settled,
    /// Outgoing node leaving; `upward` for forward travel.
    Out { progress: f64, upward: bool },
    /// Outgoing node gone, incoming not landed yet.
    Gap,
    In { progress: f64, upward: bool },
}

/// Everything needed to paint one frame, copied out of the kiosk so the
/// screens do not depend on its host types.
#[derive(Debug, Clone)]
pub struct NodeView<'a> {
    pub now: Millis,
    pub node: usize,
    pub node_count: usize,
    pub kind: NodeKind,
    pub slide: Slide,
    pub attract_prompt: bool,
    pub swipe_prompt: bool,
    pub video_playing: Option<usize>,
    pub playback_started_ms: Option<Millis>,
    pub counters: &'a [EmojiCounter],
    pub particles: &'a [EmojiParticle],
    pub fade_opacity: f64,
    pub column_positions: Vec<f64>,
    pub columns: &'a [ColumnContent],
    pub tile_height_px: f64,
    pub cell_height_px: f64,
}

impl<'a> NodeView<'a> {
    pub fn capture<V: VideoHost, A: AudioSink>(
        kiosk: &'a Kiosk<V, A>,
        columns: &'a [ColumnContent],
        cell_height_px: f64,
        now: Millis,
    ) -> Self {
        let config = kiosk.config();
        let machine = kiosk.machine();
        let elapsed = now.saturating_sub(machine.changed_at_ms());
        let progress = elapsed as f64 / config.node_slide_ms.max(1) as f64;
        let slide = match (machine.state(), machine.previous()) {
            (NodeState::Transitioning { .. }, _) if progress >= 1.0 => Slide::Gap,
            (NodeState::Transitioning { from, to, .. }, _) => Slide::Out {
                progress,
                upward: to > from,
            },
            (NodeState::Idle { node }, Some(prev)) if progress < 1.0 => Slide::In {
                progress,
                upward: node > prev,
            },
            (NodeState::Idle { .. }, _) => Slide::Settled,
        };
        let session = kiosk.session();

        Self {
            now,
            node: kiosk.current_node(),
            node_count: config.node_count,
            kind: kiosk.current_kind(),
            slide,
            attract_prompt: session.attract_prompt_visible,
            swipe_prompt: kiosk.watchdog().swipe_prompt_visible(),
            video_playing: kiosk.watchdog().playing(),
            playback_started_ms: kiosk.watchdog().playback_started_ms(),
            counters: &kiosk.emoji().counters,
            particles: &kiosk.emoji().particles,
            fade_opacity: session.fade.opacity(now, config.fade_duration_ms),
            column_positions: kiosk.background().positions(),
            columns,
            tile_height_px: config.tile_height_px,
            cell_height_px,
        }
    }

    /// Content nodes show the emoji counters.
    pub fn shows_counters(&self) -> bool {
        self.node > 0 && self.node + 1 < self.node_count
    }
}

impl Widget for &NodeView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        render_background(self, area, buf);

        let height = area.height as f64;
        let offset = match self.slide {
            Slide::Settled => Some(0),
            Slide::Out { progress, upward } => {
                let shift = (progress * height).round() as i32;
                Some(if upward { -shift } else { shift })
            }
            Slide::Gap => None,
            // Forward travel brings the next node up from below.
            Slide::In { progress, upward } => {
                let shift = ((1.0 - progress) * height).round() as i32;
                Some(if upward { shift } else { -shift })
            }
        };
        if let Some(offset) = offset {
            render_panel(self, area, offset, buf);
        }

        if self.shows_counters() && self.slide == Slide::Settled {
            render_counters(self, area, buf);
        }
        render_particles(self, area, buf);
        render_fade(self.fade_opacity, area, buf);
    }
}

/// Panel occupies the middle half of the screen, shifted vertically by `offset` rows.
fn render_panel(view: &NodeView<'_>, area: Rect, offset: i32, buf: &mut Buffer) {
    let width = (area.width / 2).max(20).min(area.width);
    let height = (area.height / 2).max(5).min(area.height);
    let x = area.x + (area.width - width) / 2;
    let y = area.y as i32 + (area.height - height) as i32 / 2 + offset;
    if y + height as i32 <= area.y as i32 || y >= area.bottom() as i32 {
        return;
    }
    let top = y.max(area.y as i32) as u16;
    let bottom = ((y + height as i32) as u16).min(area.bottom());
    let panel = Rect::new(x, top, width, bottom - top);

    Clear.render(panel, buf);
    current_screen(view.kind).render(view, panel, buf);
}

fn render_background(view: &NodeView<'_>, area: Rect, buf: &mut Buffer) {
    let count = view.columns.len() as u16;
    if count == 0 || area.width < count {
        return;
    }
    let tile_style = Style::default().fg(Color::DarkGray);
    let label_style = Style::default()
        .fg(Color::Gray)
        .add_modifier(Modifier::DIM);
    let col_width = area.width / count;

    for (i, column) in view.columns.iter().enumerate() {
        if column.tiles.is_empty() {
            continue;
        }
        let x = area.x + i as u16 * col_width;
        let position = view.column_positions.get(i).copied().unwrap_or(0.0);
        for row in 0..area.height {
            // Screen row in content pixels; a negative position scrolls content up.
            let content_px = row as f64 * view.cell_height_px - position;
            let tile_px = view.tile_height_px.max(1.0);
            let total = column.tiles.len() as f64 * tile_px;
            let wrapped = content_px.rem_euclid(total);
            let index = (wrapped / tile_px) as usize % column.tiles.len();
            let first_row = wrapped % tile_px < view.cell_height_px;

            let line = if first_row {
                Line::from(Span::styled(
                    format!("┌ {}", column.tiles[index]),
                    label_style,
                ))
            } else {
                Line::from(Span::styled("│", tile_style))
            };
            let cell = Rect::new(x + 1, area.y + row, col_width.saturating_sub(2), 1);
            Paragraph::new(line).render(cell, buf);
        }
    }
}

fn render_counters(view: &NodeView<'_>, area: Rect, buf: &mut Buffer) {
    let spans: Vec<Span> = view
        .counters
        .iter()
        .enumerate()
        .flat_map(|(i, c)| {
            [
                Span::styled(format!("[{}] ", i + 1), Style::default().fg(Color::DarkGray)),
                Span::styled(
                    format!("{} {}   ", c.symbol, c.count),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
            ]
        })
        .collect();
    let line = Line::from(spans);
    let width = (line.width() as u16).min(area.width);
    let row = Rect::new(
        area.right().saturating_sub(width + 1),
        area.bottom().saturating_sub(2),
        width,
        1,
    );
    Paragraph::new(line).render(row, buf);
}

fn render_particles(view: &NodeView<'_>, area: Rect, buf: &mut Buffer) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    for particle in view.particles {
        let Some(rise) = particle.rise(view.now) else {
            continue;
        };
        let x = (particle.x * area.width as f64) as u16;
        let lifted = (rise * area.height as f64) as u16;
        if lifted >= area.height || x >= area.width {
            continue;
        }
        let y = area.height - 1 - lifted;
        let style = if particle.opacity(view.now) < 0.5 {
            Style::default().add_modifier(Modifier::DIM)
        } else {
            Style::default().fg(Color::Magenta)
        };
        let symbol = particle.symbol.to_string();
        if x + symbol.width() as u16 > area.width {
            continue;
        }
        if let Some(cell) = buf.cell_mut((area.x + x, area.y + y)) {
            cell.set_symbol(&symbol).set_style(style);
        }
    }
}

/// White overlay; fully opaque blanks the screen.
fn render_fade(opacity: f64, area: Rect, buf: &mut Buffer) {
    if opacity <= 0.0 {
        return;
    }
    let level = (opacity * 255.0).round() as u8;
    if opacity >= 1.0 {
        buf.set_style(area, Style::default().fg(Color::White).bg(Color::White));
        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                if let Some(cell) = buf.cell_mut((x, y)) {
                    cell.set_symbol(" ");
                }
            }
        }
    } else {
        buf.set_style(area, Style::default().bg(Color::Rgb(level, level, level)));
    }
}

/// Centered line helper shared by the screens.
pub(crate) fn centered(text: impl Into<Line<'static>>) -> Paragraph<'static> {
    Paragraph::new(text.into()).alignment(Alignment::Center)
}
