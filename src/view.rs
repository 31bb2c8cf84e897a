//! The view-model the machine hands to the panel renderer: everything on the ATM face, as data. The machine decides
//! *what* is on screen; the panel decides where every character goes.

use crate::{
    constants::panel,
    session::Session,
};

/// How alarming the lock readout should look.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LockSeverity {
    Calm,
    Warn,
    Danger,
    Blink,
}

/// The lock-chance readout: a percentage, or the obscured marker.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum LockView {
    Value(u8, LockSeverity),
    Hidden,
}

impl LockView {
    pub fn of(session: &Session) -> Self {
        if session.lock_hidden {
            return LockView::Hidden;
        }
        let pct = session.lock_chance;
        let severity = if pct >= panel::LOCK_BLINK {
            LockSeverity::Blink
        } else if pct >= panel::LOCK_DANGER {
            LockSeverity::Danger
        } else if pct >= panel::LOCK_WARN {
            LockSeverity::Warn
        } else {
            LockSeverity::Calm
        };
        LockView::Value(pct, severity)
    }
}

/// One selectable option: its label, and the hint shown while the mouse hovers it.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct OptionView {
    pub label: String,
    pub hint: String,
}

/// What fills the middle of the panel.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum BodyView {
    /// The idle machine: just the withdraw (or proceed) control.
    Idle { label: String, proceed: bool },
    /// A three-line status message, possibly alarming.
    Message { lines: [String; 3], danger: bool },
    /// An active event: its (possibly still-typing) prompt lines, and its options once the prompt is done.
    Event {
        lines: Vec<String>,
        options: Vec<OptionView>,
        hover: Option<usize>,
    },
}

/// The whole face of the machine.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AtmView {
    pub lock: LockView,
    pub fee_cents: u32,
    pub fee_available: bool,
    pub cash_cents: u32,
    pub body: BodyView,
}

#[cfg(test)]
mod view_test {
    use super::*;

    #[test]
    fn severity_thresholds() {
        let mut s = Session::default();
        let expect = [
            (0, LockSeverity::Calm),
            (14, LockSeverity::Calm),
            (15, LockSeverity::Warn),
            (24, LockSeverity::Warn),
            (25, LockSeverity::Danger),
            (49, LockSeverity::Danger),
            (50, LockSeverity::Blink),
            (99, LockSeverity::Blink),
        ];
        for (pct, sev) in expect {
            s.lock_chance = pct;
            assert_eq!(LockView::of(&s), LockView::Value(pct, sev));
        }
    }

    #[test]
    fn hidden_beats_severity() {
        let mut s = Session::default();
        s.lock_chance = 70;
        s.lock_hidden = true;
        assert_eq!(LockView::of(&s), LockView::Hidden);
    }
}
