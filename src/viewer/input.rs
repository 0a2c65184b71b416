//! Input processing layer: key/mouse mapping and numeric prefix accumulator.
//!
//! Pure logic, no I/O. All functions are deterministic and testable.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

const MAX_COUNT: u32 = 9_999;

/// Accumulated numeric prefix: `3o` follows menu entry 3, `10j` scrolls ten
/// steps down.
pub(super) struct InputAccumulator {
    count: Option<u32>,
}

impl InputAccumulator {
    pub(super) fn new() -> Self {
        Self { count: None }
    }

    /// Feed a digit. Digits past the cap are dropped.
    fn push_digit(&mut self, d: u32) {
        let next = self.count.unwrap_or(0).saturating_mul(10).saturating_add(d);
        if next <= MAX_COUNT {
            self.count = Some(next);
        }
    }

    fn take(&mut self) -> Option<u32> {
        self.count.take()
    }

    pub(super) fn peek(&self) -> Option<u32> {
        self.count
    }

    pub(super) fn reset(&mut self) {
        self.count = None;
    }

    pub(super) fn is_active(&self) -> bool {
        self.count.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Action {
    Quit,
    ScrollDown(u32),
    ScrollUp(u32),
    HalfPageDown(u32),
    HalfPageUp(u32),
    JumpToTop,
    JumpToBottom,
    /// Follow the N-th (1-based) navigation entry.
    FollowEntry(u32),
    FollowPrompt,
    BackToTop,
    Click { col: u16, row: u16 },
    CancelInput,
    /// A digit was accumulated; caller should redraw status bar.
    Digit,
}

/// Map a key event to an `Action`, consuming/updating the accumulator as needed.
///
/// Returns `None` for unknown keys (caller should reset accumulator).
pub(super) fn map_key_event(key: KeyEvent, acc: &mut InputAccumulator) -> Option<Action> {
    let KeyEvent { code, modifiers, .. } = key;

    match (code, modifiers) {
        (KeyCode::Char('q'), _) | (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(Action::Quit),

        (KeyCode::Esc, _) => {
            acc.reset();
            Some(Action::CancelInput)
        }

        (KeyCode::Char(c @ '0'..='9'), KeyModifiers::NONE) => {
            acc.push_digit(c as u32 - '0' as u32);
            Some(Action::Digit)
        }

        (KeyCode::Char('j'), _) | (KeyCode::Down, _) => {
            Some(Action::ScrollDown(acc.take().unwrap_or(1)))
        }
        (KeyCode::Char('k'), _) | (KeyCode::Up, _) => {
            Some(Action::ScrollUp(acc.take().unwrap_or(1)))
        }
        (KeyCode::Char('d'), _) | (KeyCode::PageDown, _) => {
            Some(Action::HalfPageDown(acc.take().unwrap_or(1)))
        }
        (KeyCode::Char('u'), _) | (KeyCode::PageUp, _) => {
            Some(Action::HalfPageUp(acc.take().unwrap_or(1)))
        }
        (KeyCode::Char('g'), _) | (KeyCode::Home, _) => {
            acc.reset();
            Some(Action::JumpToTop)
        }
        (KeyCode::Char('G'), _) | (KeyCode::End, _) => {
            acc.reset();
            Some(Action::JumpToBottom)
        }

        (KeyCode::Char('o'), _) | (KeyCode::Enter, _) => match acc.take() {
            None => Some(Action::FollowPrompt),
            Some(n) => Some(Action::FollowEntry(n)),
        },

        (KeyCode::Char('t'), _) => {
            acc.reset();
            Some(Action::BackToTop)
        }

        _ => None,
    }
}

/// Wheel scrolls by one step; a left press becomes a click at the cell.
pub(super) fn map_mouse_event(ev: MouseEvent) -> Option<Action> {
    match ev.kind {
        MouseEventKind::ScrollDown => Some(Action::ScrollDown(1)),
        MouseEventKind::ScrollUp => Some(Action::ScrollUp(1)),
        MouseEventKind::Down(MouseButton::Left) => Some(Action::Click {
            col: ev.column,
            row: ev.row,
        }),
        _ => None,
    }
}
