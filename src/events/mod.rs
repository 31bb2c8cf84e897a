//! The narrative event catalog.
//!
//! Each event is data: a prompt, up to two options, and a resolve function that applies the chosen branch to the
//! session and says what happens next. Chains between events are expressed in the returned [`After`], never by one
//! event calling another, so the machine can drive them trampoline-style and tests can check each hop.

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::{constants::panel, outcome::Outcomes, session::Session};

pub mod code;

pub type EventId = u8;

/// How often an event comes up, and which draw pool it lives in.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Rarity {
    Common = 0,
    Uncommon = 1,
    Rare = 2,
}

/// The ids a rarity tier draws from. Everything else is reachable only by chaining.
pub fn pool(rarity: Rarity) -> &'static [EventId] {
    match rarity {
        Rarity::Common => &[1, 2, 3, 6],
        Rarity::Uncommon => &[4, 11],
        Rarity::Rare => &[5, 9, 10],
    }
}

/// What the machine should do once an event's choice has been applied.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum After {
    /// Back to the ATM (honoring any deferred chain first).
    End,
    /// Run another event immediately.
    Chain(EventId),
    /// Walk away: full session reset, back to the intro.
    Reset,
    /// The machine eats the card: danger message, then full reset.
    Loss,
    /// Hand input over to the code-entry sub-flow.
    EnterCode,
}

/// One entry in the catalog.
pub struct EventSpec {
    pub id: EventId,
    prompt: &'static str,
    /// Raw option strings; any trailing parenthesized chunk is the hover hint.
    options: &'static [&'static str],
    resolve: fn(usize, &mut Session, &mut dyn Outcomes) -> After,
}

impl EventSpec {
    /// The prompt, word-wrapped for the panel.
    pub fn prompt_lines(&self) -> Vec<String> {
        wrap_prompt(self.prompt)
    }

    /// The options, split into label + hover hint.
    pub fn option_views(&self) -> Vec<(String, String)> {
        self.options.iter().map(|o| split_option(o)).collect()
    }

    /// Apply the chosen branch. `choice` must be a valid option index (or 0 for an optionless event).
    pub fn resolve(
        &self,
        choice: usize,
        session: &mut Session,
        outcomes: &mut dyn Outcomes,
    ) -> After {
        (self.resolve)(choice, session, outcomes)
    }
}

/// Split an option string into its label and hover hint: `"Keep going (+$1)"` becomes `("Keep going", "+$1")`.
/// Options without a trailing parenthesized hint get a placeholder.
pub fn split_option(raw: &str) -> (String, String) {
    let raw = raw.trim_end();
    if raw.ends_with(')') {
        if let Some(open) = raw.find('(') {
            let label = raw[..open].trim_end();
            let hint = raw[open + 1..raw.len() - 1].trim();
            if !label.is_empty() {
                let hint = if hint.is_empty() { "??" } else { hint };
                return (label.into(), hint.into());
            }
        }
    }
    (raw.into(), "??".into())
}

/// Word-wrap a prompt to the panel's prompt width, at most two lines. (Longer prompts just lose their tail; the
/// catalog doesn't have any.)
pub fn wrap_prompt(text: &str) -> Vec<String> {
    let mut lines = vec![];
    let mut current = String::new();
    let mut current_len = 0;
    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= panel::PROMPT_WRAP {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines.truncate(2);
    lines
}

fn machine_hums(choice: usize, s: &mut Session, _o: &mut dyn Outcomes) -> After {
    match choice {
        0 => s.add_cash(100),
        _ => s.bump_lock(-3),
    }
    After::End
}

fn camera_moves(choice: usize, s: &mut Session, o: &mut dyn Outcomes) -> After {
    if choice == 0 {
        return After::Reset;
    }
    s.bump_lock(o.camera_delta());
    s.lock_hidden = true;
    After::End
}

fn noise_inside(choice: usize, _s: &mut Session, o: &mut dyn Outcomes) -> After {
    let chained = match choice {
        0 => 12,
        _ => 10,
    };
    if o.coin() {
        After::Chain(chained)
    } else {
        After::End
    }
}

fn ten_peeking(choice: usize, s: &mut Session, o: &mut dyn Outcomes) -> After {
    if choice == 0 {
        if o.coin() {
            s.add_cash(1000);
            After::End
        } else {
            After::Loss
        }
    } else {
        s.bump_lock(-10);
        After::End
    }
}

fn number_flash(choice: usize, _s: &mut Session, _o: &mut dyn Outcomes) -> After {
    if choice == 0 {
        After::EnterCode
    } else {
        After::End
    }
}

fn already_said(choice: usize, s: &mut Session, _o: &mut dyn Outcomes) -> After {
    match choice {
        0 => s.discount_fee(100),
        _ => s.add_cash(300),
    }
    After::End
}

fn symbols_blink(choice: usize, _s: &mut Session, _o: &mut dyn Outcomes) -> After {
    if choice == 0 {
        After::Chain(17)
    } else {
        After::End
    }
}

fn lucky_penny(_choice: usize, s: &mut Session, _o: &mut dyn Outcomes) -> After {
    s.add_cash(1);
    // round(lock * 0.75), rounding halves up like the display does
    s.lock_chance = ((s.lock_chance as u32 * 3 + 2) / 4) as u8;
    After::End
}

fn rhythm(_choice: usize, s: &mut Session, _o: &mut dyn Outcomes) -> After {
    s.add_cash(500);
    After::End
}

fn another_dollar(_choice: usize, s: &mut Session, _o: &mut dyn Outcomes) -> After {
    s.add_cash(100);
    After::End
}

fn clock_in(choice: usize, _s: &mut Session, _o: &mut dyn Outcomes) -> After {
    if choice == 0 {
        After::Chain(15)
    } else {
        After::Chain(16)
    }
}

fn wages(_choice: usize, s: &mut Session, _o: &mut dyn Outcomes) -> After {
    s.add_cash(500);
    After::End
}

fn head_office(_choice: usize, s: &mut Session, _o: &mut dyn Outcomes) -> After {
    s.bump_lock(5);
    After::End
}

fn symbols_warn(choice: usize, _s: &mut Session, _o: &mut dyn Outcomes) -> After {
    if choice == 1 {
        After::Chain(18)
    } else {
        After::End
    }
}

fn tomorrow(_choice: usize, _s: &mut Session, _o: &mut dyn Outcomes) -> After {
    After::Reset
}

macro_rules! catalog {
    ( $(
        $id:literal => $prompt:literal [ $( $opt:literal ),* ] $resolve:path
    ),* $(,)? ) => {
        {
            let mut map = HashMap::new();
            $(
                map.insert($id as EventId, EventSpec {
                    id: $id,
                    prompt: $prompt,
                    options: &[ $( $opt ),* ],
                    resolve: $resolve,
                });
            )*
            map
        }
    };
}

lazy_static! {
    static ref CATALOG: HashMap<EventId, EventSpec> = catalog! {
        1 => "Machine hums normally."
            ["Keep going (+$1)", "Push your card a little deeper (lock chance -3%)"]
            machine_hums,
        2 => "Camera above you moves."
            ["Walk away (reset)", "Just a few more tries (+??% Lock chance)"]
            camera_moves,
        3 => "You hear something inside the machine."
            ["Listen carefully", "Reach inside"]
            noise_inside,
        4 => "A $10 corner peeks out, suspiciously."
            ["Grab it (50% +$10, 50% loss)", "What’s meant for you will come (lock chance -10%)"]
            ten_peeking,
        5 => "A string of numbers flashes briefly."
            ["Try to input the numbers", "It was probably nothing..."]
            number_flash,
        6 => "You already said you had the money."
            ["Shake the machine (ATM fee -$1)", "Maybe they’ll understand (+$3)"]
            already_said,
        9 => "Symbols blink across the screen in patterns you don’t recognize."
            ["Wait for another blink", "It’s probably nothing..."]
            symbols_blink,
        10 => "You found a lucky penny"
            ["so shiny..."]
            lucky_penny,
        11 => "You start to understand the rhythm of the machine…"
            ["A big payout is all but guaranteed"]
            rhythm,
        12 => "Another dollar"
            ["so close"]
            another_dollar,
        14 => "Hello employee 0. Would you like to clock in?"
            ["Yes", "No"]
            clock_in,
        15 => "Here are your wages for the day"
            ["Accept"]
            wages,
        16 => "Head office will be notified"
            ["OK"]
            head_office,
        17 => "The symbols appear again… They appear to warn you to leave"
            ["Stay", "Leave"]
            symbols_warn,
        18 => "you’ll have to try again tomorrow"
            ["OK"]
            tomorrow,
    };
}

/// Look up an event. Panics on an id the catalog doesn't know, which would be a bug in a chain or a pool.
pub fn get(id: EventId) -> &'static EventSpec {
    CATALOG
        .get(&id)
        .unwrap_or_else(|| panic!("no event {} in the catalog", id))
}
