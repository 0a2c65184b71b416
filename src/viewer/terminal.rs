//! Terminal I/O layer: raw mode, mouse capture, frame drawing, status bar.

use crossterm::{
    ExecutableCommand, QueueableCommand, cursor, event,
    style::{self, Stylize},
    terminal,
};
use std::io::{self, Write, stdout};

use super::state::{GUTTER_COLS, Layout, MENU_FIRST_ROW, MENU_LABEL_COL, Session, ViewState};
use crate::document::LineKind;
use crate::page::PageDocument;

// ---------------------------------------------------------------------------
// RawGuard: restores raw mode / alternate screen / mouse capture on Drop
// ---------------------------------------------------------------------------

pub(super) struct RawGuard {
    cleaned: bool,
}

impl RawGuard {
    pub(super) fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        stdout().execute(terminal::EnterAlternateScreen)?;
        stdout().execute(event::EnableMouseCapture)?;
        stdout().execute(cursor::Hide)?;
        Ok(Self { cleaned: false })
    }

    pub(super) fn cleanup(&mut self) {
        if self.cleaned {
            return;
        }
        self.cleaned = true;
        let mut out = stdout();
        let _ = out.execute(cursor::Show);
        let _ = out.execute(event::DisableMouseCapture);
        let _ = out.execute(terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

impl Drop for RawGuard {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Pad or cut `text` to exactly `width` columns.
fn fit(text: &str, width: usize) -> String {
    let cut: String = text.chars().take(width).collect();
    format!("{cut:<width$}")
}

/// Full redraw: sidebar menu, content with the active-section gutter, status bar.
pub(super) fn draw(
    layout: &Layout,
    session: &Session,
    view: &ViewState,
    acc_peek: Option<u32>,
) -> io::Result<()> {
    let mut out = stdout();
    draw_sidebar(&mut out, layout, session)?;
    draw_content(&mut out, layout, session)?;
    draw_status_bar(&mut out, layout, session, view, acc_peek)?;
    out.flush()
}

fn draw_sidebar(out: &mut impl Write, layout: &Layout, session: &Session) -> io::Result<()> {
    if layout.sidebar_cols == 0 {
        return Ok(());
    }
    let width = layout.sidebar_cols as usize;
    let class = session.active_class();
    let rows = session.menu_rows();

    out.queue(cursor::MoveTo(0, 0))?;
    write!(out, "{}", fit(" Contents", width).bold())?;

    for screen_row in MENU_FIRST_ROW..layout.content_rows {
        out.queue(cursor::MoveTo(0, screen_row))?;
        match rows.get((screen_row - MENU_FIRST_ROW) as usize) {
            Some(row) => {
                let bullet = fit(" •", MENU_LABEL_COL as usize);
                let label = fit(&row.label, width.saturating_sub(MENU_LABEL_COL as usize));
                if session.page.has_class(row.anchor, class) {
                    write!(out, "{}{}", bullet.cyan(), label.black().on_cyan())?;
                } else {
                    write!(out, "{bullet}{label}")?;
                }
            }
            None => write!(out, "{}", fit("", width))?,
        }
    }

    for screen_row in 0..layout.content_rows {
        out.queue(cursor::MoveTo(layout.sidebar_cols, screen_row))?;
        write!(out, "{}", "│".dark_grey())?;
    }
    Ok(())
}

fn draw_content(out: &mut impl Write, layout: &Layout, session: &Session) -> io::Result<()> {
    let page = &session.page;
    let lines = page.lines();
    let width = layout.content_cols as usize;
    let top = page.scroll_offset().round() as usize;
    let active = page
        .active_section(session.active_class())
        .map(|s| (s.start, s.end));

    for screen_row in 0..layout.content_rows {
        out.queue(cursor::MoveTo(layout.content_col, screen_row))?;
        let idx = top + screen_row as usize;
        let in_active = active.is_some_and(|(start, end)| (start..end).contains(&idx));
        let gutter = fit(if in_active { "┃" } else { "" }, GUTTER_COLS as usize);
        write!(out, "{}", gutter.cyan())?;

        let Some(line) = lines.get(idx) else {
            write!(out, "{}", fit("", width))?;
            continue;
        };
        let text = fit(&line.text, width);
        match line.kind {
            LineKind::Heading(_) => write!(out, "{}", text.bold())?,
            LineKind::Code => write!(out, "{}", text.green())?,
            LineKind::Rule => write!(out, "{}", text.dark_grey())?,
            LineKind::Blank | LineKind::Body => write!(out, "{text}")?,
        }
    }
    Ok(())
}

/// Status bar on the last terminal row.
///
/// `acc_peek`: shows `:3_` while a count is being typed.
/// `view.flash`: one-shot message, cleared by the next key.
fn draw_status_bar(
    out: &mut impl Write,
    layout: &Layout,
    session: &Session,
    view: &ViewState,
    acc_peek: Option<u32>,
) -> io::Result<()> {
    out.queue(cursor::MoveTo(0, layout.status_row))?;

    let page = &session.page;
    let max = page.max_scroll();
    let offset = page.scroll_offset();
    let pct = if max <= 0.0 { 100 } else { (offset * 100.0 / max).round() as u32 };
    let section = page
        .active_section(session.active_class())
        .map(|s| s.title.as_str())
        .unwrap_or("-");
    let top = if session.is_scrolling_to_top() {
        "  [returning to top]"
    } else if page.back_to_top_visible() {
        "  [t:top]"
    } else {
        ""
    };
    let position = format!("L{}/{} {pct}%", offset.round() as usize + 1, page.lines().len());

    let middle = if let Some(msg) = &view.flash {
        format!(" {} | {msg} | {position}", view.filename)
    } else if let Some(n) = acc_peek {
        format!(" {} | :{n}_ | {position}", view.filename)
    } else {
        format!(
            " {} | {section} | {position}{top}  [j/k d/u g/G No:follow t:top q:quit]",
            view.filename
        )
    };

    write!(out, "{}", fit(&middle, layout.term_cols as usize).on_dark_grey().white())?;
    out.queue(style::ResetColor)?;
    Ok(())
}

pub(super) fn check_tty() -> anyhow::Result<()> {
    use std::io::IsTerminal;
    // Only stdout matters. crossterm's `use-dev-tty` reads keyboard from /dev/tty
    // (Unix) or Console API (Windows), so stdin being a pipe is always fine.
    if !io::stdout().is_terminal() {
        anyhow::bail!(
            "navspy viewer requires an interactive terminal.\n\
             \n\
             To list the navigation entries instead, use: navspy outline <input.md>"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_pads_and_cuts() {
        assert_eq!(fit("ab", 4), "ab  ");
        assert_eq!(fit("abcdef", 3), "abc");
        assert_eq!(fit("│é", 1), "│");
        assert_eq!(fit("", 0), "");
    }
}
