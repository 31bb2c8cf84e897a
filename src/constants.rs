//! Various constants, for use in various places. Mostly tuning for the ATM itself, plus the narrative text.

/// Constants with gameplay implications.
pub mod gameplay {
    /// Cash total that ends the run, in cents.
    pub const WIN_CENTS: u32 = 2000;
    /// What the ATM charges to reset the lock chance, in cents, at the start of a run.
    pub const STARTING_FEE_CENTS: u32 = 300;
    /// Lock chance never escalates past this.
    pub const LOCK_CHANCE_CAP: u8 = 99;
    /// A narrative event fires on every Nth successful withdraw.
    pub const WITHDRAWS_PER_EVENT: u32 = 5;
}

/// Constants controlling the pacing of animations and dwells.
pub mod pacing {
    use std::time::Duration;

    /// Delay between typed characters.
    pub const CHAR_DELAY: Duration = Duration::from_millis(50);
    /// How many typing ticks to hold at the end of a line before starting the next.
    pub const LINE_HOLD_TICKS: u32 = 11;
    /// How long the card-retained message stays up before the run resets.
    pub const LOSS_DWELL: Duration = Duration::from_millis(1200);
    /// How long a code-entry result message stays up before the event resolves.
    pub const CODE_DWELL: Duration = Duration::from_millis(900);
}

/// Constants specifically relating to how the panel renders.
pub mod panel {
    /// Number of characters between the vertical bars.
    pub const INTERIOR_WIDTH: usize = 60;
    /// Event prompts word-wrap to this many columns.
    pub const PROMPT_WRAP: usize = 56;
    /// Event prompts occupy at most this many lines.
    pub const PROMPT_LINES: usize = 3;
    /// Gap between two option labels sharing a row.
    pub const OPTION_GAP: usize = 3;
    /// Lock chance at which the readout turns cautionary.
    pub const LOCK_WARN: u8 = 15;
    /// Lock chance at which the readout turns alarming.
    pub const LOCK_DANGER: u8 = 25;
    /// Lock chance at which the readout starts blinking.
    pub const LOCK_BLINK: u8 = 50;
}

/// The narrative text, verbatim.
pub mod script {
    pub const INTRO_LINES: [&str; 3] = [
        "You need $20.",
        "Rumour has it the ATM in the warehouse dispenses money.",
        "You already told them you had the cash.",
    ];

    pub const WIN_LINES: [&str; 2] = ["You paid them off.", "For now..."];

    pub const LOSS_LINES: [&str; 3] = ["CARD RETAINED", "", "TRANSACTION CANCELLED"];

    pub const HEADER: &str = "BANK OF MONEY ATM";

    pub const WITHDRAW_LABEL: &str = "( WITHDRAW )";
    pub const PROCEED_LABEL: &str = "( PROCEED )";
    pub const GLITCH_WITHDRAW_LABEL: &str = "( W1THD24W )";

    pub const LOCK_HINT: &str = "Chance card is retained on next withdraw";
}
