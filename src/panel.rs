//! Draws an [`AtmView`] as the machine's face: a bordered monospace panel, centered on screen, with every hot zone
//! reported back so input can be mapped to what the player actually clicked.

use crate::{
    constants::{panel, script},
    io::{clifmt::Text, output::Screen, XY},
    session, text, text1,
    view::{AtmView, BodyView, LockSeverity, LockView},
};

/// Rows the panel occupies: borders, header, spacer, status, seven body rows, cash.
const PANEL_HEIGHT: usize = 13;

/// What a region of the panel means when clicked (or hovered).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ZoneKind {
    /// The fee readout: pays the fee.
    Fee,
    /// The withdraw / proceed control.
    Withdraw,
    /// The Nth option of the active event.
    Option(usize),
    /// The lock readout; not clickable, but it has a hover hint.
    LockInfo,
}

/// A rectangle of meaning: one row high, `w` cells wide.
#[derive(Clone, Debug)]
pub struct Zone {
    pub kind: ZoneKind,
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub hint: Option<String>,
}

impl Zone {
    pub fn hit(&self, pos: XY) -> bool {
        pos.y() == self.y && pos.x() >= self.x && pos.x() < self.x + self.w
    }
}

/// One run of text in a row, optionally meaningful to click.
struct Group {
    chunks: Vec<Text>,
    zone: Option<(ZoneKind, Option<String>)>,
}

impl Group {
    fn plain(chunks: Vec<Text>) -> Self {
        Self { chunks, zone: None }
    }

    fn zoned(chunks: Vec<Text>, kind: ZoneKind, hint: Option<String>) -> Self {
        Self {
            chunks,
            zone: Some((kind, hint)),
        }
    }
}

struct PanelWriter<'a> {
    screen: &'a mut Screen,
    ox: usize,
    oy: usize,
    y: usize,
    zones: Vec<Zone>,
}

impl<'a> PanelWriter<'a> {
    fn new(screen: &'a mut Screen) -> Self {
        let size = screen.size();
        let ox = size.x().saturating_sub(panel::INTERIOR_WIDTH + 2) / 2;
        let oy = size.y().saturating_sub(PANEL_HEIGHT) / 2;
        Self {
            screen,
            ox,
            oy,
            y: 0,
            zones: vec![],
        }
    }

    fn border(&mut self) {
        let line = format!("+{}+", "-".repeat(panel::INTERIOR_WIDTH));
        self.screen
            .write(XY(self.ox, self.oy + self.y), vec![Text::plain(&line)]);
        self.y += 1;
    }

    fn blank(&mut self) {
        self.bars();
        self.y += 1;
    }

    fn bars(&mut self) {
        let y = self.oy + self.y;
        self.screen.write(XY(self.ox, y), text!("|"));
        self.screen
            .write(XY(self.ox + panel::INTERIOR_WIDTH + 1, y), text!("|"));
    }

    /// Write one interior row, centered, registering any zones. Content wider than the interior is truncated.
    fn row(&mut self, groups: Vec<Group>) {
        self.bars();
        let y = self.oy + self.y;

        let total: usize = groups
            .iter()
            .flat_map(|g| g.chunks.iter())
            .map(|c| c.text.chars().count())
            .sum();
        let visible = total.min(panel::INTERIOR_WIDTH);
        let left = (panel::INTERIOR_WIDTH - visible) / 2;

        let mut x = self.ox + 1 + left;
        let mut remaining = visible;
        for group in groups {
            let start = x;
            for chunk in group.chunks {
                if remaining == 0 {
                    break;
                }
                let len = chunk.text.chars().count().min(remaining);
                let cut: String = chunk.text.chars().take(len).collect();
                self.screen.write(XY(x, y), vec![chunk.with_text(cut)]);
                x += len;
                remaining -= len;
            }
            if let Some((kind, hint)) = group.zone {
                self.zones.push(Zone {
                    kind,
                    x: start,
                    y,
                    w: x - start,
                    hint,
                });
            }
        }
        self.y += 1;
    }
}

/// Render the machine's face onto the screen and report its hot zones.
pub fn render(view: &AtmView, screen: &mut Screen) -> Vec<Zone> {
    let mut w = PanelWriter::new(screen);

    w.border();
    w.row(vec![Group::plain(text!(
        yellow "BANK",
        " OF ",
        yellow "MONEY",
        " ATM",
    ))]);
    w.blank();
    status_row(&mut w, view);
    body_rows(&mut w, &view.body);
    w.row(vec![Group::plain(text!(
        "CASH DISPENSED: ${}"(session::dollars(view.cash_cents))
    ))]);
    w.border();

    w.zones
}

fn status_row(w: &mut PanelWriter, view: &AtmView) {
    use crate::io::clifmt::FormattedExt as _;

    let lock_value = match &view.lock {
        LockView::Hidden => text1!("??"),
        LockView::Value(pct, severity) => {
            let t = text1!("{}%"(pct));
            match severity {
                LockSeverity::Calm => t,
                LockSeverity::Warn => t.yellow(),
                LockSeverity::Danger => t.red(),
                LockSeverity::Blink => t.red().bold(),
            }
        }
    };

    let fee = session::dollars_trim(view.fee_cents);
    let fee_hint = if view.fee_available {
        format!("Pay ${} to reset lock chance to 0", fee)
    } else {
        format!("Need at least ${}", fee)
    };
    let fee_value = if view.fee_available {
        text1!(green "${}"(fee))
    } else {
        text1!(red "${}"(fee))
    };

    w.row(vec![
        Group::zoned(
            vec![text1!("LOCK CHANCE: "), lock_value],
            ZoneKind::LockInfo,
            Some(script::LOCK_HINT.into()),
        ),
        Group::plain(text!("    ")),
        Group::zoned(
            vec![text1!("ATM FEE: "), fee_value],
            ZoneKind::Fee,
            Some(fee_hint),
        ),
    ]);
}

fn body_rows(w: &mut PanelWriter, body: &BodyView) {
    match body {
        BodyView::Idle { label, proceed } => {
            w.blank();
            w.blank();
            if *proceed {
                w.row(vec![Group::zoned(
                    text!(green "{}"(label)),
                    ZoneKind::Withdraw,
                    None,
                )]);
            } else {
                w.row(vec![Group::zoned(
                    text!("{}"(label)),
                    ZoneKind::Withdraw,
                    None,
                )]);
            }
            for _ in 0..4 {
                w.blank();
            }
        }
        BodyView::Message { lines, danger } => {
            w.blank();
            for line in lines {
                if *danger {
                    w.row(vec![Group::plain(text!(red "{}"(line)))]);
                } else {
                    w.row(vec![Group::plain(text!("{}"(line)))]);
                }
            }
            for _ in 0..3 {
                w.blank();
            }
        }
        BodyView::Event {
            lines,
            options,
            hover,
        } => {
            w.blank();
            for i in 0..panel::PROMPT_LINES {
                match lines.get(i) {
                    Some(line) if !line.is_empty() => w.row(vec![Group::plain(text!("{}"(line)))]),
                    _ => w.blank(),
                }
            }
            w.blank();

            let mut rows_left = 2;
            if !options.is_empty() {
                let option_group = |i: usize| {
                    let opt: &crate::view::OptionView = &options[i];
                    let label = if *hover == Some(i) {
                        text!(green underline "{}"(opt.label))
                    } else {
                        text!(green "{}"(opt.label))
                    };
                    Group::zoned(label, ZoneKind::Option(i), Some(opt.hint.clone()))
                };
                let combined_len = options
                    .iter()
                    .map(|o| o.label.chars().count())
                    .sum::<usize>()
                    + panel::OPTION_GAP;
                if options.len() == 1 {
                    w.row(vec![option_group(0)]);
                    rows_left -= 1;
                } else if combined_len <= panel::INTERIOR_WIDTH {
                    w.row(vec![
                        option_group(0),
                        Group::plain(text!("{:1$}"("", panel::OPTION_GAP))),
                        option_group(1),
                    ]);
                    rows_left -= 1;
                } else {
                    w.row(vec![option_group(0)]);
                    w.row(vec![option_group(1)]);
                    rows_left -= 2;
                }
            }

            // any hovered hint borrows the last body row
            let hovered_hint = hover
                .and_then(|i| options.get(i))
                .map(|o| o.hint.clone())
                .filter(|h| !h.is_empty() && rows_left > 0);
            if let Some(hint) = hovered_hint {
                while rows_left > 1 {
                    w.blank();
                    rows_left -= 1;
                }
                w.row(vec![Group::plain(text!(bright_black "{}"(hint)))]);
            } else {
                for _ in 0..rows_left {
                    w.blank();
                }
            }
        }
    }
}
