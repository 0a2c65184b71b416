//! Terminal Markdown viewer with a scroll-synchronized navigation sidebar.
//!
//! Layout:
//!   col 0..sidebar_cols : navigation menu (active entry highlighted)
//!   col sidebar_cols    : separator
//!   col content_col..   : active-section gutter, then the wrapped document
//!   row term_rows-1     : status bar
//!
//! The document is a [`MarkdownPage`](crate::document::MarkdownPage) driven by
//! a [`NavigationController`](crate::controller::NavigationController). The
//! loop below plays the browser's part: it turns offset changes into scroll
//! signals, fires expired timers and advances smooth scrolling against a
//! monotonic clock.

mod input;
mod state;
mod terminal;

use anyhow::Context;
use crossterm::{
    event::{self, Event, KeyEventKind},
    terminal as crossterm_terminal,
};
use log::{debug, info};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::page::{EventDisposition, PageDocument};
use crate::watch::DocumentWatcher;

use input::{Action, InputAccumulator, map_key_event, map_mouse_event};
use state::{ExitReason, Layout, Session, ViewState};

const IDLE_POLL: Duration = Duration::from_secs(86400);

pub struct ViewerOptions {
    pub watch: bool,
    /// Section id to open at, like a URL fragment on first load.
    pub start_section: Option<String>,
}

/// Run the terminal viewer on `md_path`.
pub fn run(md_path: PathBuf, config: Config, options: ViewerOptions) -> anyhow::Result<()> {
    let filename = md_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string();

    terminal::check_tty()?;

    let mut markdown = std::fs::read_to_string(&md_path)
        .with_context(|| format!("failed to read {}", md_path.display()))?;

    let watcher = if options.watch {
        Some(DocumentWatcher::new(&md_path)?)
    } else {
        None
    };

    let (term_cols, term_rows) =
        crossterm_terminal::size().context("failed to get terminal size")?;
    let mut layout = state::compute_layout(term_cols, term_rows, config.viewer.sidebar_cols);

    let mut guard = terminal::RawGuard::enter()?;
    let clock = Instant::now();
    let mut view = ViewState {
        filename,
        flash: None,
    };
    let mut start_section = options.start_section;
    let mut offset_carry: Option<f64> = None;

    // Outer loop: each iteration lays out the document afresh (initial + reload)
    loop {
        info!("viewer: opening document ({} bytes)", markdown.len());
        let mut session = Session::open(
            &markdown,
            &config.navigation,
            &config.viewer,
            &layout,
            clock.elapsed(),
        );
        if let Some(id) = start_section.take()
            && !session.jump_to(&id)
        {
            view.flash = Some(format!("No section #{id}"));
        }
        if let Some(offset) = offset_carry.take() {
            session.page.set_scroll_offset(offset);
        }

        let exit = event_loop(
            &mut session,
            &mut layout,
            &mut view,
            &config,
            watcher.as_ref(),
            clock,
        )?;

        match exit {
            ExitReason::Quit => break,
            ExitReason::Reload => {
                offset_carry = Some(session.page.scroll_offset());
                match std::fs::read_to_string(&md_path) {
                    Ok(text) => {
                        markdown = text;
                        view.flash = Some("Reloaded".into());
                    }
                    Err(e) => {
                        debug!("viewer: reload failed: {e}");
                        view.flash = Some(format!("Reload failed: {e}"));
                    }
                }
            }
        }
    }

    guard.cleanup();
    Ok(())
}

fn event_loop(
    session: &mut Session,
    layout: &mut Layout,
    view: &mut ViewState,
    config: &Config,
    watcher: Option<&DocumentWatcher>,
    clock: Instant,
) -> anyhow::Result<ExitReason> {
    let frame_budget = config.viewer.frame_budget;
    let scroll_step = f64::from(config.viewer.scroll_step);
    let mut acc = InputAccumulator::new();
    let mut dirty = true;
    let mut last_render: Option<Instant> = None;
    let mut last_watch = Instant::now();

    loop {
        if session.pump(clock.elapsed()) {
            dirty = true;
        }

        let frame_due = last_render.is_none_or(|t| t.elapsed() >= frame_budget);
        if dirty && frame_due {
            terminal::draw(layout, session, view, acc.peek())?;
            dirty = false;
            last_render = Some(Instant::now());
        }

        if let Some(w) = watcher
            && last_watch.elapsed() >= config.viewer.watch_interval
        {
            last_watch = Instant::now();
            if w.poll_changed() {
                info!("viewer: document changed on disk, reloading");
                return Ok(ExitReason::Reload);
            }
        }

        let mut timeout = IDLE_POLL;
        if let Some(deadline) = session.next_deadline() {
            timeout = timeout.min(deadline.saturating_sub(clock.elapsed()));
        }
        if dirty || session.page.is_animating() {
            let since = last_render.map_or(frame_budget, |t| t.elapsed());
            timeout = timeout.min(frame_budget.saturating_sub(since));
        }
        if watcher.is_some() {
            timeout = timeout.min(config.viewer.watch_interval);
        }

        if !event::poll(timeout)? {
            continue;
        }
        let ev = event::read()?;
        debug!("event: {:?}", ev);

        let action = match ev {
            Event::Key(key) if key.kind != KeyEventKind::Release => {
                let had_flash = view.flash.take().is_some();
                let action = map_key_event(key, &mut acc);
                if action.is_none() && (acc.is_active() || had_flash) {
                    // Unknown key: reset accumulator
                    acc.reset();
                    dirty = true;
                }
                action
            }
            Event::Mouse(mouse) => map_mouse_event(mouse),
            Event::Resize(cols, rows) => {
                *layout = state::compute_layout(cols, rows, config.viewer.sidebar_cols);
                session.resize(layout);
                debug!("resize: {cols}x{rows}, content {}x{}", layout.content_cols, layout.content_rows);
                dirty = true;
                None
            }
            _ => None,
        };
        let Some(action) = action else { continue };

        let half_page = f64::from((layout.content_rows / 2).max(1));
        match action {
            Action::Quit => return Ok(ExitReason::Quit),
            Action::CancelInput | Action::Digit => {}
            Action::ScrollDown(count) => session.scroll_lines(f64::from(count) * scroll_step),
            Action::ScrollUp(count) => session.scroll_lines(-f64::from(count) * scroll_step),
            Action::HalfPageDown(count) => session.scroll_lines(f64::from(count) * half_page),
            Action::HalfPageUp(count) => session.scroll_lines(-f64::from(count) * half_page),
            Action::JumpToTop => session.scroll_lines(f64::MIN),
            Action::JumpToBottom => session.scroll_lines(f64::MAX),
            Action::FollowPrompt => {
                view.flash = Some("Type No to follow menu entry N".into());
            }
            Action::FollowEntry(n) => match session.follow(n) {
                Ok(label) => debug!("follow entry {n}: {label}"),
                Err(msg) => view.flash = Some(msg),
            },
            Action::BackToTop => {
                if !session.back_to_top() {
                    view.flash = Some("Already near the top".into());
                }
            }
            Action::Click { col, row } => {
                let rows = session.menu_rows();
                if let Some(target) = state::hit_test_menu(layout, &rows, col, row) {
                    let disposition = session.click(target);
                    debug!("click at {col},{row} on {target:?}: {disposition:?}");
                    if disposition == EventDisposition::Ignored {
                        view.flash = Some("Click the label to follow".into());
                    }
                }
            }
        }
        dirty = true;
    }
}
