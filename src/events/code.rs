//! The code-entry sub-flow: four guarded slots, filled left to right, auto-submitting against a fixed table of
//! codes somebody scratched into the machine's firmware.

use crate::{constants::script, io::input::Key, session::Session};

use super::EventId;

pub const CODE_LEN: usize = 4;

/// What a keypress did to the buffer.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CodeKey {
    /// Nothing; the key wasn't part of the flow.
    Ignored,
    /// The buffer changed and needs re-rendering.
    Changed,
    /// The fourth character landed; time to look the code up.
    Submitted,
}

/// The in-progress buffer. Digits are the expected input, but any printable character is accepted -- going
/// off-script just flips a flag that changes the result message (and the withdraw label, as a souvenir).
#[derive(Clone, Debug, Default)]
pub struct CodeEntry {
    buf: String,
    non_numeric: bool,
}

impl CodeEntry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keypress(&mut self, key: Key) -> CodeKey {
        match key {
            Key::Backspace => {
                if self.buf.pop().is_some() {
                    CodeKey::Changed
                } else {
                    CodeKey::Ignored
                }
            }
            _ if self.buf.chars().count() >= CODE_LEN => CodeKey::Ignored,
            Key::Char(ch) => {
                if !ch.is_ascii_digit() {
                    self.non_numeric = true;
                }
                self.buf.push(ch);
                if self.buf.chars().count() == CODE_LEN {
                    CodeKey::Submitted
                } else {
                    CodeKey::Changed
                }
            }
            _ => CodeKey::Ignored,
        }
    }

    /// The `_ _ _ _` readout, with typed characters filled in.
    pub fn slots(&self) -> String {
        let mut slots = ['_'; CODE_LEN];
        for (slot, ch) in slots.iter_mut().zip(self.buf.chars()) {
            *slot = ch;
        }
        slots
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Look the finished code up and apply its effect. Returns the message to dwell on and, for one special code,
    /// the event to chain into afterwards.
    pub fn submit(&self, session: &mut Session) -> (&'static str, Option<EventId>) {
        process_code(&self.buf, self.non_numeric, session)
    }
}

fn process_code(
    code: &str,
    non_numeric: bool,
    session: &mut Session,
) -> (&'static str, Option<EventId>) {
    if non_numeric {
        session.withdraw_label = script::GLITCH_WITHDRAW_LABEL;
        return ("You think differently than the rest?", None);
    }
    match code {
        "1234" => {
            session.discount_fee(100);
            ("This machine isn’t so secure…", None)
        }
        "6969" => {
            session.add_cash(69);
            ("Funny….", None)
        }
        "0000" => ("Sign in successful…", Some(14)),
        "6666" => ("This isn’t that kind of ATM", None),
        "4200" | "0420" => ("Is that really what you wanted to enter?", None),
        "4321" => {
            session.add_cash(300);
            ("Clever…", None)
        }
        "8008" => ("There are cameras here…", None),
        _ => ("nothing seems to happen...", None),
    }
}

#[cfg(test)]
mod code_test {
    use super::*;

    fn type_code(entry: &mut CodeEntry, code: &str) -> CodeKey {
        let mut last = CodeKey::Ignored;
        for ch in code.chars() {
            last = entry.keypress(Key::Char(ch));
        }
        last
    }

    #[test]
    fn fills_left_to_right_and_submits() {
        let mut entry = CodeEntry::new();
        assert_eq!(entry.slots(), "_ _ _ _");
        assert_eq!(entry.keypress(Key::Char('1')), CodeKey::Changed);
        assert_eq!(entry.slots(), "1 _ _ _");
        assert_eq!(entry.keypress(Key::Char('2')), CodeKey::Changed);
        assert_eq!(entry.keypress(Key::Char('3')), CodeKey::Changed);
        assert_eq!(entry.keypress(Key::Char('4')), CodeKey::Submitted);
        assert_eq!(entry.slots(), "1 2 3 4");
    }

    #[test]
    fn backspace_works_at_any_fill() {
        let mut entry = CodeEntry::new();
        assert_eq!(entry.keypress(Key::Backspace), CodeKey::Ignored);
        entry.keypress(Key::Char('7'));
        entry.keypress(Key::Char('8'));
        assert_eq!(entry.keypress(Key::Backspace), CodeKey::Changed);
        assert_eq!(entry.slots(), "7 _ _ _");
    }

    #[test]
    fn non_key_input_is_ignored() {
        let mut entry = CodeEntry::new();
        assert_eq!(entry.keypress(Key::Enter), CodeKey::Ignored);
        assert_eq!(entry.keypress(Key::Left), CodeKey::Ignored);
        assert_eq!(entry.slots(), "_ _ _ _");
    }

    #[test]
    fn fee_discount_code() {
        let mut s = Session::default();
        let mut entry = CodeEntry::new();
        assert_eq!(type_code(&mut entry, "1234"), CodeKey::Submitted);
        let (msg, chain) = entry.submit(&mut s);
        assert_eq!(msg, "This machine isn’t so secure…");
        assert_eq!(chain, None);
        assert_eq!(s.atm_fee, 200);
    }

    #[test]
    fn cash_codes() {
        let mut s = Session::default();
        let mut entry = CodeEntry::new();
        type_code(&mut entry, "6969");
        entry.submit(&mut s);
        assert_eq!(s.cash, 69);

        let mut entry = CodeEntry::new();
        type_code(&mut entry, "4321");
        let (msg, _) = entry.submit(&mut s);
        assert_eq!(msg, "Clever…");
        assert_eq!(s.cash, 369);
    }

    #[test]
    fn sign_in_defers_a_chain() {
        let mut s = Session::default();
        let mut entry = CodeEntry::new();
        type_code(&mut entry, "0000");
        let (msg, chain) = entry.submit(&mut s);
        assert_eq!(msg, "Sign in successful…");
        assert_eq!(chain, Some(14));
        assert_eq!(s, Session::default());
    }

    #[test]
    fn flavor_codes_change_nothing() {
        for code in ["6666", "4200", "0420", "8008", "5555"] {
            let mut s = Session::default();
            let mut entry = CodeEntry::new();
            type_code(&mut entry, code);
            let (_, chain) = entry.submit(&mut s);
            assert_eq!(chain, None);
            assert_eq!(s, Session::default(), "code {} mutated the session", code);
        }
    }

    #[test]
    fn going_off_script_relabels_the_withdraw() {
        let mut s = Session::default();
        let mut entry = CodeEntry::new();
        entry.keypress(Key::Char('1'));
        entry.keypress(Key::Char('a'));
        entry.keypress(Key::Char('2'));
        assert_eq!(entry.keypress(Key::Char('3')), CodeKey::Submitted);
        let (msg, chain) = entry.submit(&mut s);
        assert_eq!(msg, "You think differently than the rest?");
        assert_eq!(chain, None);
        assert_eq!(s.withdraw_label, "( W1THD24W )");
    }

    #[test]
    fn backspacing_an_oddity_still_counts() {
        // the flag remembers that the player ever went off the digits
        let mut s = Session::default();
        let mut entry = CodeEntry::new();
        entry.keypress(Key::Char('x'));
        entry.keypress(Key::Backspace);
        type_code(&mut entry, "1234");
        let (msg, _) = entry.submit(&mut s);
        assert_eq!(msg, "You think differently than the rest?");
    }
}
