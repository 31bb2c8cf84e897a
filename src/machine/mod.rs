//! The machine: one `Game` implementation that owns the session, interprets input according to the current mode,
//! and drives withdraws, narrative events, the code sub-flow, and the win/loss sequences.

use rand::{rngs::SmallRng, SeedableRng};

use crate::{
    agents::{Alarm, Metronome},
    constants::{gameplay, pacing, script},
    events::{
        self,
        code::{CodeEntry, CodeKey},
        After, EventId,
    },
    game::{Game, Message, Replies, Response},
    io::{
        input::{Action, Key, MouseButton},
        output::Screen,
        XY,
    },
    outcome::{Outcomes, RngOutcomes},
    panel::{self, Zone, ZoneKind},
    session::Session,
    text,
    view::{AtmView, BodyView, LockView, OptionView},
};

mod typing;
pub use typing::Typewriter;

/// Which timed dwell just elapsed.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Dwell {
    /// The card-retained message; ends in a full reset.
    Loss,
    /// A code-entry result message; ends by resolving the parent event.
    Code,
}

/// The messages the machine passes around. All of them are timing: the metronome ticking a typewriter along, or an
/// alarm ending a dwell.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Msg {
    Tick,
    TypeTick,
    DwellOver(Dwell),
}

impl Message for Msg {
    fn tick() -> Self {
        Msg::Tick
    }
}

/// A narrative event in progress: its prompt typewriter and its options (usable once the prompt is done).
struct ActiveEvent {
    id: EventId,
    typing: Typewriter,
    options: Vec<OptionView>,
}

/// Exactly one of these is live at a time; input is interpreted by whichever it is.
enum Mode {
    /// The intro lines typing out (or fully revealed, waiting for the click into the ATM).
    IntroTyping(Typewriter),
    /// The ATM face, ready to withdraw.
    Idle,
    /// The win threshold is reached; only the proceed control does anything.
    WinPending,
    /// The win lines typing out (or revealed, waiting for the confirming click).
    WinTyping(Typewriter),
    /// A narrative event owns input.
    Event(ActiveEvent),
    /// The code-entry sub-flow owns the keyboard.
    CodeEntry(CodeEntry),
    /// A fixed-length message is on screen; everything is ignored until the alarm fires.
    Dwell(Dwell),
}

/// What a click means, given the mode it landed in.
enum Click {
    Ignore,
    Reveal,
    EnterIdle,
    WinReset,
    Resolve(usize),
    Proceed,
    PayFee,
    Withdraw,
}

pub struct Cashout<O: Outcomes = RngOutcomes<SmallRng>> {
    session: Session,
    outcomes: O,
    mode: Mode,
    /// Reentrancy guard: a withdraw resolution is in flight, so idle clicks are dropped.
    locked: bool,
    /// Deferred chain set by the code sub-flow, honored when the current event ends.
    pending: Option<EventId>,
    /// What the panel shows while a dwell runs.
    dwell_body: BodyView,
    /// Which event option the mouse is over, for the hint line.
    hover: Option<usize>,
    /// Hot zones from the last render, for mapping clicks to meanings.
    zones: Vec<Zone>,
}

impl Cashout {
    /// The real machine. Also returns the metronome that types the intro; hand it to [`Runner::spawn`].
    pub fn new() -> (Self, Metronome<Msg>) {
        Self::with(RngOutcomes(SmallRng::from_entropy()))
    }
}

impl<O: Outcomes> Cashout<O> {
    /// A machine over any source of chance. Tests script it.
    pub fn with(outcomes: O) -> (Self, Metronome<Msg>) {
        let typing = Typewriter::new(script::INTRO_LINES);
        let typist = Self::typist(&typing);
        let machine = Self {
            session: Session::default(),
            outcomes,
            mode: Mode::IntroTyping(typing),
            locked: false,
            pending: None,
            dwell_body: BodyView::Message {
                lines: Default::default(),
                danger: false,
            },
            hover: None,
            zones: vec![],
        };
        (machine, typist)
    }

    fn typist(typing: &Typewriter) -> Metronome<Msg> {
        Metronome::new(pacing::CHAR_DELAY, Msg::TypeTick, typing.cancel_handle())
    }

    fn zone_at(&self, pos: XY) -> Option<ZoneKind> {
        self.zones.iter().find(|z| z.hit(pos)).map(|z| z.kind)
    }

    fn enter_idle(&mut self) {
        self.locked = false;
        self.hover = None;
        self.mode = Mode::Idle;
    }

    fn start_intro(&mut self, replies: &mut Replies<Msg>) {
        self.locked = false;
        self.hover = None;
        self.zones.clear();
        let typing = Typewriter::new(script::INTRO_LINES);
        replies.spawn(Self::typist(&typing));
        self.mode = Mode::IntroTyping(typing);
    }

    fn start_win(&mut self, replies: &mut Replies<Msg>) {
        self.locked = true;
        self.zones.clear();
        let typing = Typewriter::new(script::WIN_LINES);
        replies.spawn(Self::typist(&typing));
        self.mode = Mode::WinTyping(typing);
    }

    fn start_event(&mut self, id: EventId, replies: &mut Replies<Msg>) {
        let spec = events::get(id);
        let typing = Typewriter::new(spec.prompt_lines());
        replies.spawn(Self::typist(&typing));
        let options = spec
            .option_views()
            .into_iter()
            .map(|(label, hint)| OptionView { label, hint })
            .collect();
        self.hover = None;
        self.mode = Mode::Event(ActiveEvent { id, typing, options });
    }

    /// The current event is over; honor any deferred chain before handing the ATM back.
    fn end_event(&mut self, replies: &mut Replies<Msg>) {
        match self.pending.take() {
            Some(id) => self.start_event(id, replies),
            None => self.enter_idle(),
        }
    }

    fn show_loss(&mut self, replies: &mut Replies<Msg>) {
        self.pending = None;
        self.hover = None;
        self.dwell_body = BodyView::Message {
            lines: script::LOSS_LINES.map(String::from),
            danger: true,
        };
        self.mode = Mode::Dwell(Dwell::Loss);
        replies.spawn(Alarm::new(pacing::LOSS_DWELL, Msg::DwellOver(Dwell::Loss)));
    }

    fn resolve_event(&mut self, choice: usize, replies: &mut Replies<Msg>) -> Response {
        let id = match &self.mode {
            Mode::Event(ev) => ev.id,
            _ => return Response::Nothing,
        };
        let after = events::get(id).resolve(choice, &mut self.session, &mut self.outcomes);
        self.apply_after(after, replies);
        Response::Redraw
    }

    fn apply_after(&mut self, after: After, replies: &mut Replies<Msg>) {
        match after {
            After::End => self.end_event(replies),
            After::Chain(id) => self.start_event(id, replies),
            After::Reset => {
                self.pending = None;
                self.session.reset();
                self.start_intro(replies);
            }
            After::Loss => self.show_loss(replies),
            After::EnterCode => self.mode = Mode::CodeEntry(CodeEntry::new()),
        }
    }

    /// One pull on the machine: maybe the card gets eaten, maybe cash comes out, maybe the win gate opens, maybe a
    /// narrative event fires.
    fn withdraw(&mut self, replies: &mut Replies<Msg>) -> Response {
        self.locked = true;

        if self.outcomes.roll_lock(self.session.lock_chance) {
            self.show_loss(replies);
            return Response::Redraw;
        }

        let amount = self.outcomes.dispense();
        self.session.record_withdraw(amount);

        if self.session.won() {
            self.session.withdraw_label = script::PROCEED_LABEL;
            self.mode = Mode::WinPending;
            self.locked = false;
            return Response::Redraw;
        }

        self.session.withdraws_since_event += 1;
        if self.session.withdraws_since_event % gameplay::WITHDRAWS_PER_EVENT == 0 {
            self.session.withdraws_since_event = 0;
            let tier = self.outcomes.rarity();
            let id = self.outcomes.pick_event(tier, &mut self.session.used_events);
            self.start_event(id, replies);
            return Response::Redraw;
        }

        self.locked = false;
        Response::Redraw
    }

    fn click(&mut self, pos: XY, replies: &mut Replies<Msg>) -> Response {
        let act = match &self.mode {
            Mode::IntroTyping(t) | Mode::WinTyping(t) if !t.armed() => Click::Ignore,
            Mode::IntroTyping(t) => {
                if !t.done() {
                    Click::Reveal
                } else {
                    Click::EnterIdle
                }
            }
            Mode::WinTyping(t) => {
                if !t.done() {
                    Click::Reveal
                } else {
                    Click::WinReset
                }
            }
            Mode::Dwell(_) | Mode::CodeEntry(_) => Click::Ignore,
            Mode::Event(ev) => {
                if !ev.typing.done() {
                    Click::Ignore
                } else if ev.options.is_empty() {
                    // an optionless event resolves on any click
                    Click::Resolve(0)
                } else {
                    match self.zone_at(pos) {
                        Some(ZoneKind::Option(i)) => Click::Resolve(i),
                        _ => Click::Ignore,
                    }
                }
            }
            Mode::WinPending => match self.zone_at(pos) {
                Some(ZoneKind::Withdraw) => Click::Proceed,
                _ => Click::Ignore,
            },
            Mode::Idle if self.locked => Click::Ignore,
            Mode::Idle => match self.zone_at(pos) {
                Some(ZoneKind::Fee) => Click::PayFee,
                _ => Click::Withdraw,
            },
        };

        match act {
            Click::Ignore => Response::Nothing,
            Click::Reveal => {
                if let Mode::IntroTyping(t) | Mode::WinTyping(t) = &mut self.mode {
                    t.reveal();
                }
                Response::Redraw
            }
            Click::EnterIdle => {
                self.enter_idle();
                Response::Redraw
            }
            Click::WinReset => {
                self.session.reset();
                self.start_intro(replies);
                Response::Redraw
            }
            Click::Resolve(i) => self.resolve_event(i, replies),
            Click::Proceed => {
                self.start_win(replies);
                Response::Redraw
            }
            Click::PayFee => {
                if !self.session.fee_available() {
                    return Response::Nothing;
                }
                self.locked = true;
                self.session.pay_fee();
                self.locked = false;
                Response::Redraw
            }
            Click::Withdraw => self.withdraw(replies),
        }
    }

    fn key(&mut self, key: Key, replies: &mut Replies<Msg>) -> Response {
        // keyboard selection of event options: digits pick by position, Enter takes the first
        let choice = match &self.mode {
            Mode::Event(ev) if ev.typing.done() && !ev.options.is_empty() => match key {
                Key::Char('1') | Key::Enter => Some(0),
                Key::Char('2') if ev.options.len() >= 2 => Some(1),
                _ => None,
            },
            _ => None,
        };
        if let Some(i) = choice {
            return self.resolve_event(i, replies);
        }

        if let Mode::CodeEntry(entry) = &mut self.mode {
            return match entry.keypress(key) {
                CodeKey::Ignored => Response::Nothing,
                CodeKey::Changed => Response::Redraw,
                CodeKey::Submitted => {
                    let (msg, chain) = entry.submit(&mut self.session);
                    if chain.is_some() {
                        self.pending = chain;
                    }
                    self.dwell_body = BodyView::Event {
                        lines: vec![msg.into()],
                        options: vec![],
                        hover: None,
                    };
                    self.mode = Mode::Dwell(Dwell::Code);
                    replies.spawn(Alarm::new(pacing::CODE_DWELL, Msg::DwellOver(Dwell::Code)));
                    Response::Redraw
                }
            };
        }

        Response::Nothing
    }

    fn hover_at(&mut self, pos: XY) -> Response {
        let over = match self.zone_at(pos) {
            Some(ZoneKind::Option(i)) => Some(i),
            _ => None,
        };
        if over != self.hover {
            self.hover = over;
            Response::Redraw
        } else {
            Response::Nothing
        }
    }

    fn type_tick(&mut self) -> Response {
        let changed = match &mut self.mode {
            Mode::IntroTyping(t) | Mode::WinTyping(t) => t.tick(),
            Mode::Event(ev) => ev.typing.tick(),
            // a metronome outliving its animation; it'll die on its own
            _ => false,
        };
        if changed {
            Response::Redraw
        } else {
            Response::Nothing
        }
    }

    fn dwell_over(&mut self, dwell: Dwell, replies: &mut Replies<Msg>) -> Response {
        match (dwell, &self.mode) {
            (Dwell::Loss, Mode::Dwell(Dwell::Loss)) => {
                self.session.reset();
                self.start_intro(replies);
                Response::Redraw
            }
            (Dwell::Code, Mode::Dwell(Dwell::Code)) => {
                self.end_event(replies);
                Response::Redraw
            }
            // an alarm from a mode we've already left
            _ => Response::Nothing,
        }
    }

    fn view(&self) -> AtmView {
        let body = match &self.mode {
            Mode::Idle => BodyView::Idle {
                label: self.session.withdraw_label.into(),
                proceed: false,
            },
            Mode::WinPending => BodyView::Idle {
                label: self.session.withdraw_label.into(),
                proceed: true,
            },
            Mode::Event(ev) => BodyView::Event {
                lines: ev.typing.revealed(),
                options: if ev.typing.done() {
                    ev.options.clone()
                } else {
                    vec![]
                },
                hover: self.hover,
            },
            Mode::CodeEntry(entry) => BodyView::Event {
                lines: vec![entry.slots()],
                options: vec![],
                hover: None,
            },
            Mode::Dwell(_) => self.dwell_body.clone(),
            Mode::IntroTyping(_) | Mode::WinTyping(_) => {
                unreachable!("typing modes render fullscreen, not on the panel")
            }
        };
        AtmView {
            lock: LockView::of(&self.session),
            fee_cents: self.session.atm_fee,
            fee_available: self.session.fee_available(),
            cash_cents: self.session.cash,
            body,
        }
    }
}

impl<O: Outcomes> Game for Cashout<O> {
    type Message = Msg;

    fn input(&mut self, input: Action, replies: &mut Replies<Msg>) -> Response {
        match input {
            Action::KeyPress { key: Key::Escape } => Response::Quit,
            Action::KeyPress { key } => self.key(key, replies),
            Action::MousePress {
                button: MouseButton::Left,
                pos,
            } => self.click(pos, replies),
            Action::MouseMove { pos, .. } => self.hover_at(pos),
            _ => Response::Nothing,
        }
    }

    fn message(&mut self, msg: &Msg, replies: &mut Replies<Msg>) -> Response {
        match msg {
            Msg::Tick => Response::Nothing,
            Msg::TypeTick => self.type_tick(),
            Msg::DwellOver(dwell) => self.dwell_over(*dwell, replies),
        }
    }

    fn render(&mut self, onto: &mut Screen) {
        match &self.mode {
            Mode::IntroTyping(t) | Mode::WinTyping(t) => {
                self.zones.clear();
                let revealed = t.revealed().join("\n");
                onto.textbox(text!("{}"(revealed))).pos(2, 1).render();
            }
            _ => {
                self.zones = panel::render(&self.view(), onto);
            }
        }
    }
}

/// Construct the machine and run it until the player quits.
#[cfg(feature = "__sys")]
pub fn run(mut _args: impl Iterator<Item = String>) {
    let (game, intro_typist) = Cashout::new();
    crate::game::Runner::new(game).spawn(intro_typist).run();
}

#[cfg(test)]
mod machine_test {
    use super::*;
    use crate::{events::Rarity, outcome::testing::Script};

    const CLICK_NOWHERE: Action = Action::MousePress {
        button: MouseButton::Left,
        pos: XY(0, 0),
    };

    fn scripted() -> Cashout<Script> {
        Cashout::with(Script::default()).0
    }

    fn replies() -> Replies<Msg> {
        Replies::default()
    }

    fn tick(m: &mut Cashout<Script>) -> Response {
        m.message(&Msg::TypeTick, &mut replies())
    }

    fn click(m: &mut Cashout<Script>, pos: XY) -> Response {
        m.input(
            Action::MousePress {
                button: MouseButton::Left,
                pos,
            },
            &mut replies(),
        )
    }

    fn press(m: &mut Cashout<Script>, key: Key) -> Response {
        m.input(Action::KeyPress { key }, &mut replies())
    }

    /// Render onto a fixed-size screen and return the center of the requested zone.
    fn zone_center(m: &mut Cashout<Script>, kind: ZoneKind) -> XY {
        let mut screen = Screen::new(XY(80, 24));
        m.render(&mut screen);
        let zone = m
            .zones
            .iter()
            .find(|z| z.kind == kind)
            .unwrap_or_else(|| panic!("no {:?} zone on screen", kind));
        XY(zone.x + zone.w / 2, zone.y)
    }

    fn finish_typing(m: &mut Cashout<Script>) {
        for _ in 0..10_000 {
            let done = match &m.mode {
                Mode::IntroTyping(t) | Mode::WinTyping(t) => t.done(),
                Mode::Event(ev) => ev.typing.done(),
                _ => true,
            };
            if done {
                return;
            }
            tick(m);
        }
        panic!("typing never finished");
    }

    /// Fast-forward a fresh machine through the intro to the idle ATM.
    fn at_idle(m: &mut Cashout<Script>) {
        finish_typing(m);
        click(m, XY(0, 0));
        assert!(matches!(m.mode, Mode::Idle));
    }

    #[test]
    fn intro_click_gating() {
        let mut m = scripted();
        // the click that opened the screen can't skip the typing: nothing is armed yet
        assert_eq!(click(&mut m, XY(0, 0)), Response::Nothing);
        assert!(matches!(m.mode, Mode::IntroTyping(_)));
        // one tick arms it; the next click skips to the full text
        tick(&mut m);
        assert_eq!(click(&mut m, XY(0, 0)), Response::Redraw);
        match &m.mode {
            Mode::IntroTyping(t) => {
                assert!(t.done());
                assert_eq!(t.revealed(), script::INTRO_LINES.to_vec());
            }
            _ => panic!("left intro too early"),
        }
        // and the click after that enters the ATM
        click(&mut m, XY(0, 0));
        assert!(matches!(m.mode, Mode::Idle));
    }

    #[test]
    fn withdraw_pays_and_escalates() {
        let mut m = scripted();
        at_idle(&mut m);
        m.outcomes.lock_rolls.push_back(false);
        m.outcomes.dispenses.push_back(300);
        assert_eq!(click(&mut m, XY(0, 0)), Response::Redraw);
        assert_eq!(m.session.cash, 300);
        assert_eq!(m.session.successful_withdraws, 1);
        assert_eq!(m.session.lock_chance, 1);
        assert_eq!(m.session.withdraws_since_event, 1);
        assert!(matches!(m.mode, Mode::Idle));
        assert!(!m.locked);
    }

    #[test]
    fn lock_trigger_shows_loss_then_resets() {
        let mut m = scripted();
        at_idle(&mut m);
        m.session.lock_chance = 40;
        m.session.cash = 700;
        m.outcomes.lock_rolls.push_back(true);
        click(&mut m, XY(0, 0));
        assert!(matches!(m.mode, Mode::Dwell(Dwell::Loss)));
        assert_eq!(
            m.dwell_body,
            BodyView::Message {
                lines: [
                    "CARD RETAINED".into(),
                    "".into(),
                    "TRANSACTION CANCELLED".into()
                ],
                danger: true,
            }
        );
        // input during the dwell is dropped
        assert_eq!(click(&mut m, XY(0, 0)), Response::Nothing);
        assert_eq!(press(&mut m, Key::Enter), Response::Nothing);

        let mut r = replies();
        m.message(&Msg::DwellOver(Dwell::Loss), &mut r);
        assert_eq!(m.session, Session::default());
        assert!(matches!(m.mode, Mode::IntroTyping(_)));
        // the reset spawned the intro typist
        assert_eq!(r.spawned(), 1);
    }

    #[test]
    fn win_gate_ignores_everything_but_proceed() {
        let mut m = scripted();
        at_idle(&mut m);
        m.session.cash = 1950;
        m.outcomes.lock_rolls.push_back(false);
        m.outcomes.dispenses.push_back(100);
        click(&mut m, XY(0, 0));
        assert!(matches!(m.mode, Mode::WinPending));
        assert_eq!(m.session.cash, 2050);
        assert_eq!(m.session.withdraw_label, "( PROCEED )");

        // a click that isn't on the proceed control changes nothing
        let before = m.session.clone();
        assert_eq!(click(&mut m, XY(0, 0)), Response::Nothing);
        assert_eq!(m.session, before);
        assert!(matches!(m.mode, Mode::WinPending));

        let proceed = zone_center(&mut m, ZoneKind::Withdraw);
        click(&mut m, proceed);
        assert!(matches!(m.mode, Mode::WinTyping(_)));

        // play the win lines out, confirm, and the run starts over
        finish_typing(&mut m);
        click(&mut m, XY(0, 0));
        assert_eq!(m.session, Session::default());
        assert!(matches!(m.mode, Mode::IntroTyping(_)));
    }

    #[test]
    fn fee_pays_only_when_covered() {
        let mut m = scripted();
        at_idle(&mut m);
        m.session.cash = 500;
        m.session.lock_chance = 30;
        let fee = zone_center(&mut m, ZoneKind::Fee);
        assert_eq!(click(&mut m, fee), Response::Redraw);
        assert_eq!(m.session.cash, 200);
        assert_eq!(m.session.lock_chance, 0);

        // 200 < 300: the fee click is now inert, and doesn't withdraw either
        let fee = zone_center(&mut m, ZoneKind::Fee);
        assert_eq!(click(&mut m, fee), Response::Nothing);
        assert_eq!(m.session.cash, 200);
    }

    #[test]
    fn locked_machine_drops_clicks() {
        let mut m = scripted();
        at_idle(&mut m);
        m.locked = true;
        assert_eq!(click(&mut m, XY(0, 0)), Response::Nothing);
        assert_eq!(m.session.cash, 0);
    }

    #[test]
    fn fifth_withdraw_fires_an_event() {
        let mut m = scripted();
        at_idle(&mut m);
        for _ in 0..5 {
            m.outcomes.lock_rolls.push_back(false);
            m.outcomes.dispenses.push_back(100);
        }
        m.outcomes.rarities.push_back(Rarity::Common);
        m.outcomes.picks.push_back(1);
        for _ in 0..4 {
            click(&mut m, XY(0, 0));
            assert!(matches!(m.mode, Mode::Idle));
        }
        click(&mut m, XY(0, 0));
        match &m.mode {
            Mode::Event(ev) => assert_eq!(ev.id, 1),
            _ => panic!("no event fired on the fifth withdraw"),
        }
        assert_eq!(m.session.withdraws_since_event, 0);
        assert!(m.session.used_events.tier(Rarity::Common).contains(&1));

        // clicks during the prompt typing are swallowed
        assert_eq!(click(&mut m, XY(0, 0)), Response::Nothing);

        // once typed, clicking option 0 pays the dollar and ends the event
        finish_typing(&mut m);
        let opt = zone_center(&mut m, ZoneKind::Option(0));
        click(&mut m, opt);
        assert_eq!(m.session.cash, 600);
        assert!(matches!(m.mode, Mode::Idle));
        assert!(!m.locked);
    }

    #[test]
    fn keyboard_selects_options() {
        let mut m = scripted();
        at_idle(&mut m);
        m.session.lock_chance = 10;
        m.start_event(1, &mut replies());
        // keys are ignored until the prompt finishes typing
        assert_eq!(press(&mut m, Key::Char('2')), Response::Nothing);
        finish_typing(&mut m);
        press(&mut m, Key::Char('2'));
        assert_eq!(m.session.lock_chance, 7);
        assert!(matches!(m.mode, Mode::Idle));

        m.start_event(1, &mut replies());
        finish_typing(&mut m);
        press(&mut m, Key::Enter);
        assert_eq!(m.session.cash, 100);
    }

    #[test]
    fn event_chains_stay_inside_the_event() {
        let mut m = scripted();
        at_idle(&mut m);
        m.start_event(3, &mut replies());
        finish_typing(&mut m);
        m.outcomes.coins.push_back(true);
        press(&mut m, Key::Char('1'));
        match &m.mode {
            Mode::Event(ev) => assert_eq!(ev.id, 12),
            _ => panic!("listening should have chained into event 12"),
        }
        finish_typing(&mut m);
        press(&mut m, Key::Enter);
        assert_eq!(m.session.cash, 100);
        assert!(matches!(m.mode, Mode::Idle));
    }

    #[test]
    fn walk_away_resets_to_intro() {
        let mut m = scripted();
        at_idle(&mut m);
        m.session.cash = 900;
        m.start_event(2, &mut replies());
        finish_typing(&mut m);
        press(&mut m, Key::Char('1'));
        assert_eq!(m.session, Session::default());
        assert!(matches!(m.mode, Mode::IntroTyping(_)));
    }

    #[test]
    fn code_0000_chains_into_the_interview() {
        let mut m = scripted();
        at_idle(&mut m);
        m.start_event(5, &mut replies());
        finish_typing(&mut m);
        press(&mut m, Key::Char('1'));
        assert!(matches!(m.mode, Mode::CodeEntry(_)));
        // clicks are swallowed while the code owns the keyboard
        assert_eq!(click(&mut m, XY(0, 0)), Response::Nothing);

        for _ in 0..3 {
            press(&mut m, Key::Char('0'));
        }
        assert!(matches!(m.mode, Mode::CodeEntry(_)));
        press(&mut m, Key::Char('0'));
        assert!(matches!(m.mode, Mode::Dwell(Dwell::Code)));
        assert_eq!(
            m.dwell_body,
            BodyView::Event {
                lines: vec!["Sign in successful…".into()],
                options: vec![],
                hover: None,
            }
        );
        assert_eq!(m.pending, Some(14));

        // the dwell resolves straight into event 14, never touching idle
        m.message(&Msg::DwellOver(Dwell::Code), &mut replies());
        match &m.mode {
            Mode::Event(ev) => assert_eq!(ev.id, 14),
            _ => panic!("deferred chain was dropped"),
        }
        assert_eq!(m.pending, None);
    }

    #[test]
    fn plain_code_returns_to_idle() {
        let mut m = scripted();
        at_idle(&mut m);
        m.start_event(5, &mut replies());
        finish_typing(&mut m);
        press(&mut m, Key::Char('1'));
        for _ in 0..4 {
            press(&mut m, Key::Char('5'));
        }
        assert!(matches!(m.mode, Mode::Dwell(Dwell::Code)));
        m.message(&Msg::DwellOver(Dwell::Code), &mut replies());
        assert!(matches!(m.mode, Mode::Idle));
    }

    #[test]
    fn stale_timing_messages_are_inert() {
        let mut m = scripted();
        at_idle(&mut m);
        assert_eq!(tick(&mut m), Response::Nothing);
        assert_eq!(
            m.message(&Msg::DwellOver(Dwell::Loss), &mut replies()),
            Response::Nothing
        );
        assert!(matches!(m.mode, Mode::Idle));
    }

    #[test]
    fn escape_quits() {
        let mut m = scripted();
        assert_eq!(press(&mut m, Key::Escape), Response::Quit);
    }

    #[test]
    fn hovering_an_option_redraws_once() {
        let mut m = scripted();
        at_idle(&mut m);
        m.start_event(1, &mut replies());
        finish_typing(&mut m);
        let opt = zone_center(&mut m, ZoneKind::Option(1));
        let hover = Action::MouseMove {
            button: None,
            pos: opt,
        };
        assert_eq!(m.input(hover.clone(), &mut replies()), Response::Redraw);
        assert_eq!(m.input(hover, &mut replies()), Response::Nothing);
        assert_eq!(m.hover, Some(1));
    }

    #[test]
    fn invariants_hold_over_a_long_random_run() {
        use rand::{rngs::SmallRng, SeedableRng};

        let (mut m, _typist) = Cashout::with(RngOutcomes(SmallRng::seed_from_u64(99)));
        let mut r = Replies::default();
        for _ in 0..2000 {
            enum Step {
                Typing(bool),
                Click,
                Keys,
                DwellOver(Dwell),
                Proceed,
            }
            let step = match &m.mode {
                Mode::IntroTyping(t) | Mode::WinTyping(t) => Step::Typing(t.done()),
                Mode::Idle => Step::Click,
                Mode::Event(ev) => {
                    if ev.typing.done() {
                        Step::Keys
                    } else {
                        Step::Typing(false)
                    }
                }
                Mode::CodeEntry(_) => Step::Keys,
                Mode::Dwell(d) => Step::DwellOver(*d),
                Mode::WinPending => Step::Proceed,
            };
            match step {
                Step::Typing(true) | Step::Click => {
                    m.input(CLICK_NOWHERE, &mut r);
                }
                Step::Typing(false) => {
                    m.message(&Msg::TypeTick, &mut r);
                }
                Step::Keys => {
                    // Enter resolves options; in code entry it's ignored, so pad with digits
                    m.input(Action::KeyPress { key: Key::Enter }, &mut r);
                    m.input(Action::KeyPress { key: Key::Char('0') }, &mut r);
                }
                Step::DwellOver(d) => {
                    m.message(&Msg::DwellOver(d), &mut r);
                }
                Step::Proceed => {
                    let pos = {
                        let mut screen = Screen::new(XY(80, 24));
                        m.render(&mut screen);
                        let z = m
                            .zones
                            .iter()
                            .find(|z| z.kind == ZoneKind::Withdraw)
                            .expect("win gate without a proceed zone");
                        XY(z.x, z.y)
                    };
                    m.input(
                        Action::MousePress {
                            button: MouseButton::Left,
                            pos,
                        },
                        &mut r,
                    );
                }
            }
            assert!(m.session.lock_chance <= 99);
            assert!(m.session.atm_fee <= 300);
        }
    }
}
