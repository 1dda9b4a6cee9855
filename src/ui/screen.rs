use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

use crate::config::NodeKind;
use crate::ui::{centered, NodeView};

/// A node panel: draws the node in view into its panel area
pub trait Screen {
    fn title(&self, view: &NodeView<'_>) -> String;
    fn render_body(&self, view: &NodeView<'_>, area: Rect, buf: &mut Buffer);

    fn render(&self, view: &NodeView<'_>, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(self.title(view));
        let inner = block.inner(area);
        block.render(area, buf);
        self.render_body(view, inner, buf);
    }
}

/// Rows for body text and an optional prompt at the bottom of the panel.
fn body_and_prompt(area: Rect) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);
    (chunks[0], chunks[1])
}

fn prompt_line(text: &'static str) -> Line<'static> {
    Line::from(Span::styled(
        text,
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD | Modifier::ITALIC),
    ))
}

/// Attract screen - idle display waiting for the first swipe
pub struct AttractScreen;

impl Screen for AttractScreen {
    fn title(&self, _view: &NodeView<'_>) -> String {
        " driftdeck ".into()
    }

    fn render_body(&self, view: &NodeView<'_>, area: Rect, buf: &mut Buffer) {
        let (body, prompt) = body_and_prompt(area);
        centered(Line::from("Welcome")).render(body, buf);
        if view.attract_prompt {
            centered(prompt_line("↑ Swipe up to begin")).render(prompt, buf);
        }
    }
}

/// Video node - a simulated player showing playback state
pub struct VideoScreen;

impl Screen for VideoScreen {
    fn title(&self, view: &NodeView<'_>) -> String {
        format!(" {} / {} ", view.node, view.node_count - 1)
    }

    fn render_body(&self, view: &NodeView<'_>, area: Rect, buf: &mut Buffer) {
        let (body, prompt) = body_and_prompt(area);
        let status = match (view.video_playing, view.playback_started_ms) {
            (Some(node), Some(started)) if node == view.node => {
                let secs = view.now.saturating_sub(started) as f64 / 1000.0;
                format!("▶ playing {secs:.1}s")
            }
            _ => match view.kind {
                NodeKind::Video { .. } => "■ stopped".to_string(),
                _ => String::new(),
            },
        };
        centered(Line::from(status)).render(body, buf);
        if view.swipe_prompt {
            centered(prompt_line("↑ Swipe up to continue")).render(prompt, buf);
        }
    }
}

/// Still node - one image, its own prompt and reset timer
pub struct StillScreen;

impl Screen for StillScreen {
    fn title(&self, view: &NodeView<'_>) -> String {
        format!(" {} / {} ", view.node, view.node_count - 1)
    }

    fn render_body(&self, view: &NodeView<'_>, area: Rect, buf: &mut Buffer) {
        let (body, prompt) = body_and_prompt(area);
        centered(Line::from("◆")).render(body, buf);
        if view.swipe_prompt {
            centered(prompt_line("↑ Swipe up to finish")).render(prompt, buf);
        }
    }
}

/// Closing node - shown briefly on the way back to the start
pub struct ClosingScreen;

impl Screen for ClosingScreen {
    fn title(&self, _view: &NodeView<'_>) -> String {
        String::new()
    }

    fn render_body(&self, _view: &NodeView<'_>, area: Rect, buf: &mut Buffer) {
        centered(Line::from(Span::styled(
            "Thank you",
            Style::default().add_modifier(Modifier::BOLD),
        )))
        .render(area, buf);
    }
}

/// Helper to construct the screen for a node kind
pub fn current_screen(kind: NodeKind) -> Box<dyn Screen> {
    match kind {
        NodeKind::Attract => Box::new(AttractScreen),
        // Panels are video nodes with no clip.
        NodeKind::Video { .. } | NodeKind::Panel => Box::new(VideoScreen),
        NodeKind::Still => Box::new(StillScreen),
        NodeKind::Closing => Box::new(ClosingScreen),
    }
}
