//! The typewriter: progressive reveal of a few lines of text, driven by metronome ticks, cancellable by a click --
//! but only once it's armed, so the click that started the animation can't also skip it.

use crate::{agents::WaitHandle, constants::pacing};

pub struct Typewriter {
    lines: Vec<String>,
    line: usize,
    col: usize,
    hold: u32,
    armed: bool,
    cancel: WaitHandle,
}

impl Typewriter {
    pub fn new<S: Into<String>>(lines: impl IntoIterator<Item = S>) -> Self {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            line: 0,
            col: 0,
            hold: 0,
            armed: false,
            cancel: WaitHandle::new(),
        }
    }

    /// The cancellation token shared with the metronome agent driving this animation. Woken when the animation
    /// finishes or is skipped, which tells the metronome to die.
    pub fn cancel_handle(&self) -> WaitHandle {
        self.cancel.clone()
    }

    /// Whether a click is allowed to skip the animation yet.
    pub fn armed(&self) -> bool {
        self.armed
    }

    pub fn done(&self) -> bool {
        self.line >= self.lines.len()
    }

    /// Advance one tick: reveal the next character, or burn a tick of the between-lines hold. Returns whether
    /// anything visible changed.
    pub fn tick(&mut self) -> bool {
        self.armed = true;
        if self.done() {
            self.cancel.wake();
            return false;
        }
        if self.hold > 0 {
            self.hold -= 1;
            if self.hold == 0 {
                self.line += 1;
                self.col = 0;
            }
            return false;
        }
        let len = self.lines[self.line].chars().count();
        self.col += 1;
        if self.col >= len {
            if self.line + 1 == self.lines.len() {
                self.line += 1;
                self.col = 0;
                self.cancel.wake();
            } else {
                self.hold = pacing::LINE_HOLD_TICKS;
            }
        }
        true
    }

    /// Skip to the end: every line fully revealed, animation over.
    pub fn reveal(&mut self) {
        self.line = self.lines.len();
        self.col = 0;
        self.armed = true;
        self.cancel.wake();
    }

    /// The lines as currently revealed: everything before the cursor in full, the current line up to it.
    pub fn revealed(&self) -> Vec<String> {
        let mut out = vec![];
        for (i, line) in self.lines.iter().enumerate() {
            if i < self.line {
                out.push(line.clone());
            } else if i == self.line {
                out.push(line.chars().take(self.col).collect());
            }
        }
        out
    }
}

#[cfg(test)]
mod typing_test {
    use super::*;

    #[test]
    fn reveals_one_char_per_tick() {
        let mut t = Typewriter::new(["ab"]);
        assert_eq!(t.revealed(), vec![""]);
        assert!(t.tick());
        assert_eq!(t.revealed(), vec!["a"]);
        assert!(t.tick());
        assert_eq!(t.revealed(), vec!["ab"]);
        assert!(t.done());
        assert!(t.cancel_handle().is_woken());
    }

    #[test]
    fn holds_between_lines() {
        let mut t = Typewriter::new(["ab", "c"]);
        t.tick();
        t.tick();
        assert_eq!(t.revealed(), vec!["ab"]);
        assert!(!t.done());
        // the hold burns LINE_HOLD_TICKS ticks without revealing anything
        for _ in 0..crate::constants::pacing::LINE_HOLD_TICKS {
            assert!(!t.tick());
        }
        assert!(t.tick());
        assert_eq!(t.revealed(), vec!["ab", "c"]);
        assert!(t.done());
    }

    #[test]
    fn arms_on_first_tick_only() {
        let mut t = Typewriter::new(["hi"]);
        assert!(!t.armed());
        t.tick();
        assert!(t.armed());
    }

    #[test]
    fn reveal_skips_to_full_text() {
        let mut t = Typewriter::new(["one", "two"]);
        t.tick();
        t.reveal();
        assert!(t.done());
        assert_eq!(t.revealed(), vec!["one", "two"]);
        assert!(t.cancel_handle().is_woken());
    }
}
