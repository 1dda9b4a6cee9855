use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{
    self, Event as CtEvent, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use tracing::debug;

use crate::gesture::{Direction, TouchEvent};
use crate::host::{AudioSink, VideoHost};
use crate::kiosk::Kiosk;
use crate::timing::Millis;

/// Unified event type consumed by the frame loop
#[derive(Clone, Debug, PartialEq)]
pub enum KioskEvent {
    Touch(TouchEvent),
    Key(KeyEvent),
    Resize,
    /// Nothing arrived within one frame interval.
    Frame,
}

/// Source of terminal events (mouse, keyboard, resize)
pub trait KioskEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<KioskEvent, RecvTimeoutError>;
}

/// Map a left-button press/release to a single-finger touch. The touch Y is
/// the middle of the clicked cell row, in pixels.
pub fn mouse_to_touch(mouse: MouseEvent, cell_height_px: f64) -> Option<TouchEvent> {
    let y = (mouse.row as f64 + 0.5) * cell_height_px;
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => Some(TouchEvent::Start { touches: 1, y }),
        MouseEventKind::Up(MouseButton::Left) => Some(TouchEvent::End {
            touches: 1,
            y: Some(y),
        }),
        _ => None,
    }
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<KioskEvent>,
}

impl CrosstermEventSource {
    pub fn new(cell_height_px: f64) -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let ev = match event::read() {
                Ok(CtEvent::Key(key)) => Some(KioskEvent::Key(key)),
                Ok(CtEvent::Mouse(mouse)) => {
                    mouse_to_touch(mouse, cell_height_px).map(KioskEvent::Touch)
                }
                Ok(CtEvent::Resize(_, _)) => Some(KioskEvent::Resize),
                Ok(CtEvent::FocusLost) => Some(KioskEvent::Touch(TouchEvent::Cancel)),
                Ok(_) => None,
                Err(_) => break,
            };
            if let Some(ev) = ev {
                if tx.send(ev).is_err() {
                    break;
                }
            }
        });

        Self { rx }
    }
}

impl KioskEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<KioskEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source fed from a channel
pub struct TestEventSource {
    rx: Receiver<KioskEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<KioskEvent>) -> Self {
        Self { rx }
    }
}

impl KioskEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<KioskEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the loop one event/frame at a time
pub struct Runner<E: KioskEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: KioskEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    pub fn frame_interval(&self) -> Duration {
        self.ticker.interval()
    }

    /// Blocks up to one frame interval and returns the next event, or Frame on timeout
    pub fn step(&self) -> KioskEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                KioskEvent::Frame
            }
        }
    }
}

/// What the loop should do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Redraw,
    Quit,
}

/// Feed one event to the kiosk. Keys stand in for gestures on hosts without
/// a pointer: Up/k and Down/j swipe, 1-9 tap an emoji counter.
pub fn apply_event<V: VideoHost, A: AudioSink>(
    kiosk: &mut Kiosk<V, A>,
    event: KioskEvent,
    now: Millis,
) -> Flow {
    match event {
        KioskEvent::Frame => {
            kiosk.on_frame(now);
            Flow::Redraw
        }
        KioskEvent::Resize => Flow::Redraw,
        KioskEvent::Touch(touch) => {
            let outcome = kiosk.touch(touch, now);
            debug!(?outcome, "touch");
            Flow::Continue
        }
        KioskEvent::Key(key) => {
            if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
                return Flow::Quit;
            }
            match key.code {
                KeyCode::Esc => Flow::Quit,
                KeyCode::Up | KeyCode::Char('k') => {
                    // Rejections are logged by the kiosk.
                    let _ = kiosk.navigate(Direction::Forward, now);
                    Flow::Continue
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    let _ = kiosk.navigate(Direction::Backward, now);
                    Flow::Continue
                }
                KeyCode::Char(c @ '1'..='9') => {
                    let index = c as usize - '1' as usize;
                    kiosk.tap_emoji(index, now);
                    Flow::Continue
                }
                _ => Flow::Continue,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KioskConfig;
    use crate::host::{RecordingAudio, RecordingVideoHost};
    use crossterm::event::KeyEventKind;
    use std::sync::mpsc;

    fn mouse(kind: MouseEventKind, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column: 4,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn kiosk() -> Kiosk<RecordingVideoHost, RecordingAudio> {
        Kiosk::new(
            KioskConfig::default(),
            &[1000.0; 3],
            RecordingVideoHost::new(),
            RecordingAudio::default(),
        )
        .unwrap()
    }

    #[test]
    fn step_returns_frame_on_timeout() {
        let (_tx, rx) = mpsc::channel();
        let runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(1)),
        );
        assert_eq!(runner.step(), KioskEvent::Frame);
    }

    #[test]
    fn step_passes_through_events() {
        let (tx, rx) = mpsc::channel();
        tx.send(KioskEvent::Resize).unwrap();
        let runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(10)),
        );
        assert_eq!(runner.step(), KioskEvent::Resize);
    }

    #[test]
    fn mouse_rows_become_touch_pixels() {
        let down = mouse_to_touch(mouse(MouseEventKind::Down(MouseButton::Left), 20), 32.0);
        assert_eq!(
            down,
            Some(TouchEvent::Start {
                touches: 1,
                y: 656.0
            })
        );
        let up = mouse_to_touch(mouse(MouseEventKind::Up(MouseButton::Left), 5), 32.0);
        assert_eq!(
            up,
            Some(TouchEvent::End {
                touches: 1,
                y: Some(176.0)
            })
        );
        assert_eq!(
            mouse_to_touch(mouse(MouseEventKind::Drag(MouseButton::Left), 5), 32.0),
            None
        );
        assert_eq!(
            mouse_to_touch(mouse(MouseEventKind::Down(MouseButton::Right), 5), 32.0),
            None
        );
    }

    #[test]
    fn keys_drive_navigation_and_quit() {
        let mut k = kiosk();
        let up = KeyEvent::new(KeyCode::Up, KeyModifiers::NONE);
        assert_eq!(apply_event(&mut k, KioskEvent::Key(up), 0), Flow::Continue);
        assert!(k.is_transitioning());

        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(apply_event(&mut k, KioskEvent::Key(ctrl_c), 1), Flow::Quit);

        let mut esc = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
        esc.kind = KeyEventKind::Press;
        assert_eq!(apply_event(&mut k, KioskEvent::Key(esc), 2), Flow::Quit);
    }

    #[test]
    fn frame_event_advances_timers() {
        let mut k = kiosk();
        let j = KeyEvent::new(KeyCode::Char('k'), KeyModifiers::NONE);
        apply_event(&mut k, KioskEvent::Key(j), 0);
        assert_eq!(apply_event(&mut k, KioskEvent::Frame, 2300), Flow::Redraw);
        assert_eq!(k.current_node(), 1);

        let tap = KeyEvent::new(KeyCode::Char('2'), KeyModifiers::NONE);
        let before = k.emoji().counters[1].count;
        apply_event(&mut k, KioskEvent::Key(tap), 2400);
        assert_eq!(k.emoji().counters[1].count, before + 1);
    }
}
