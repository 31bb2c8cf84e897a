//! The crossterm-based CLI backend: renders the screen as ANSI escape codes on stdout and pumps terminal events into
//! [`Action`]s from a reader thread.

use std::{
    io::{self, Write},
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc, Arc,
    },
    thread,
    time::Duration,
};

use crossterm::{
    cursor::{Hide, MoveDown, MoveTo, MoveToColumn, Show},
    event::{self as ct, DisableMouseCapture, EnableMouseCapture},
    execute,
    style::{
        Attribute, Color as CtColor, ResetColor, SetAttribute, SetAttributes, SetBackgroundColor,
        SetForegroundColor,
    },
    terminal::{
        self, Clear, ClearType, DisableLineWrap, EnableLineWrap, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};

use crate::io::{
    clifmt::{Cell, Color, Formatted},
    input::{Action, Key, MouseButton},
    output::Screen,
    XY,
};

use super::{IoSystem, NopIoRunner};

macro_rules! mods {
    ( $mods:ident, $action:ident ) => {
        if $mods.contains(ct::KeyModifiers::SHIFT) {
            try_send!($action {
                key: Key::LeftShift
            });
        }
        if $mods.contains(ct::KeyModifiers::CONTROL) {
            try_send!($action { key: Key::LeftCtrl });
        }
        if $mods.contains(ct::KeyModifiers::ALT) {
            try_send!($action { key: Key::LeftAlt });
        }
    };
}

fn io4ct_btn(ct: ct::MouseButton) -> MouseButton {
    match ct {
        ct::MouseButton::Left => MouseButton::Left,
        ct::MouseButton::Middle => MouseButton::Middle,
        ct::MouseButton::Right => MouseButton::Right,
    }
}

fn io4ct_key(code: ct::KeyCode) -> Option<Key> {
    let key = match code {
        ct::KeyCode::Char(c) => Key::Char(c),
        ct::KeyCode::F(c) => Key::F(c),
        ct::KeyCode::Backspace => Key::Backspace,
        ct::KeyCode::Enter => Key::Enter,
        ct::KeyCode::Left => Key::Left,
        ct::KeyCode::Right => Key::Right,
        ct::KeyCode::Up => Key::Up,
        ct::KeyCode::Down => Key::Down,
        ct::KeyCode::Home => Key::Home,
        ct::KeyCode::End => Key::End,
        ct::KeyCode::PageUp => Key::PageUp,
        ct::KeyCode::PageDown => Key::PageDown,
        ct::KeyCode::Tab => Key::Tab,
        ct::KeyCode::Delete => Key::Delete,
        ct::KeyCode::Insert => Key::Insert,
        ct::KeyCode::Esc => Key::Escape,
        _ => return None,
    };
    Some(key)
}

fn process_input(actions: mpsc::Sender<Action>, stop: Arc<AtomicBool>) {
    macro_rules! try_send {
        ( $type:ident $( ($nt:expr) )? $( { $($br:tt)* } )? ) => {
            match actions.send(Action::$type $(($nt))? $({$($br)*})? ) {
                Ok(_) => (),
                Err(_) => return,
            }
        }
    }
    while !stop.load(Ordering::Relaxed) {
        match ct::poll(Duration::from_millis(100)) {
            Ok(false) => continue,
            Ok(true) => (),
            Err(e) => {
                try_send!(Error(format!("polling: {}", e)));
                return;
            }
        }
        let ev = match ct::read() {
            Ok(ev) => ev,
            Err(e) => {
                try_send!(Error(format!("reading: {}", e)));
                return;
            }
        };
        match ev {
            ct::Event::Key(ct::KeyEvent {
                code,
                modifiers,
                kind,
                ..
            }) => {
                if kind == ct::KeyEventKind::Release {
                    continue;
                }
                mods!(modifiers, KeyPress);
                if code == ct::KeyCode::BackTab {
                    try_send!(KeyPress {
                        key: Key::LeftShift
                    });
                    try_send!(KeyPress { key: Key::Tab });
                    try_send!(KeyRelease { key: Key::Tab });
                    try_send!(KeyRelease {
                        key: Key::LeftShift
                    });
                } else if let Some(key) = io4ct_key(code) {
                    try_send!(KeyPress { key });
                    try_send!(KeyRelease { key });
                } else {
                    try_send!(Unknown(format!("key code {:?}", code)));
                }
                mods!(modifiers, KeyRelease);
            }
            ct::Event::Resize(..) => try_send!(Redraw),
            ct::Event::Mouse(ct::MouseEvent {
                row,
                column: col,
                kind,
                modifiers,
            }) => {
                mods!(modifiers, KeyPress);
                let pos = XY(col as usize, row as usize);
                match kind {
                    ct::MouseEventKind::Up(btn) => try_send!(MouseRelease {
                        button: io4ct_btn(btn),
                        pos
                    }),
                    ct::MouseEventKind::Down(btn) => try_send!(MousePress {
                        button: io4ct_btn(btn),
                        pos
                    }),
                    ct::MouseEventKind::Drag(btn) => try_send!(MouseMove {
                        button: Some(io4ct_btn(btn)),
                        pos
                    }),
                    ct::MouseEventKind::Moved => try_send!(MouseMove { button: None, pos }),
                    ct::MouseEventKind::ScrollUp => try_send!(MousePress {
                        button: MouseButton::ScrollUp,
                        pos
                    }),
                    ct::MouseEventKind::ScrollDown => try_send!(MousePress {
                        button: MouseButton::ScrollDown,
                        pos
                    }),
                }
                mods!(modifiers, KeyRelease);
            }
            other => try_send!(Unknown(format!("event {:?}", other))),
        };
    }
}

fn ct4io_color(c: Color) -> CtColor {
    match c {
        Color::BrightBlack => CtColor::DarkGrey,
        Color::Black => CtColor::Black,
        Color::BrightRed => CtColor::Red,
        Color::Red => CtColor::DarkRed,
        Color::BrightGreen => CtColor::Green,
        Color::Green => CtColor::DarkGreen,
        Color::BrightYellow => CtColor::Yellow,
        Color::Yellow => CtColor::DarkYellow,
        Color::BrightBlue => CtColor::Blue,
        Color::Blue => CtColor::DarkBlue,
        Color::BrightMagenta => CtColor::Magenta,
        Color::Magenta => CtColor::DarkMagenta,
        Color::BrightCyan => CtColor::Cyan,
        Color::Cyan => CtColor::DarkCyan,
        Color::BrightWhite => CtColor::White,
        Color::White => CtColor::Grey,
        Color::Default => CtColor::Reset,
    }
}

fn render_row(row: &[Cell]) -> io::Result<Vec<u8>> {
    let mut out = vec![];
    if row.is_empty() {
        return Ok(out);
    }

    let mut ch_b = [0u8; 4];

    let mut fmt = row[0].get_fmt().clone();
    let mut attrs = [
        Attribute::NormalIntensity,
        Attribute::NoUnderline,
        Attribute::NoReverse,
    ];
    if fmt.bold {
        attrs[0] = Attribute::Bold;
    }
    if fmt.underline {
        attrs[1] = Attribute::Underlined;
    }
    if fmt.invert {
        attrs[2] = Attribute::Reverse;
    }
    crossterm::queue!(
        &mut out,
        ResetColor,
        SetForegroundColor(ct4io_color(fmt.fg)),
        SetBackgroundColor(ct4io_color(fmt.bg)),
        SetAttribute(Attribute::Reset),
        SetAttributes(attrs.as_ref().into()),
    )?;
    out.extend_from_slice(row[0].ch.encode_utf8(&mut ch_b).as_bytes());

    for cell in &row[1..] {
        let cf = cell.get_fmt();
        if cf.fg != fmt.fg {
            crossterm::queue!(&mut out, SetForegroundColor(ct4io_color(cf.fg)))?;
        }
        if cf.bg != fmt.bg {
            crossterm::queue!(&mut out, SetBackgroundColor(ct4io_color(cf.bg)))?;
        }
        if cf.bold != fmt.bold {
            let attr = if cf.bold {
                Attribute::Bold
            } else {
                Attribute::NormalIntensity
            };
            crossterm::queue!(&mut out, SetAttribute(attr))?;
        }
        if cf.underline != fmt.underline {
            let attr = if cf.underline {
                Attribute::Underlined
            } else {
                Attribute::NoUnderline
            };
            crossterm::queue!(&mut out, SetAttribute(attr))?;
        }
        if cf.invert != fmt.invert {
            let attr = if cf.invert {
                Attribute::Reverse
            } else {
                Attribute::NoReverse
            };
            crossterm::queue!(&mut out, SetAttribute(attr))?;
        }
        fmt = cf.clone();
        out.extend_from_slice(cell.ch.encode_utf8(&mut ch_b).as_bytes());
    }
    crossterm::queue!(&mut out, MoveDown(1), MoveToColumn(0))?;

    Ok(out)
}

/// The [`IoSystem`] half of the crossterm backend. Doesn't need the main thread, so its runner is a
/// [`NopIoRunner`].
pub struct AnsiIo {
    queue: mpsc::Receiver<Action>,
    stop: Arc<AtomicBool>,
    runner: NopIoRunner,
}

impl AnsiIo {
    fn init_term() -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            io::stdout(),
            EnableMouseCapture,
            EnterAlternateScreen,
            DisableLineWrap,
            Hide,
            Clear(ClearType::All),
        )?;
        Ok(())
    }

    fn clean_term() -> io::Result<()> {
        execute!(
            io::stdout(),
            Clear(ClearType::All),
            Show,
            EnableLineWrap,
            LeaveAlternateScreen,
            DisableMouseCapture,
        )?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub fn get() -> io::Result<(Self, NopIoRunner)> {
        Self::init_term()?;
        std::panic::set_hook(Box::new(|i| {
            let _ = Self::clean_term();
            println!("{}", i);
        }));
        let (queue_s, queue_r) = mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = stop.clone();
        thread::spawn(move || process_input(queue_s, thread_stop));
        let runner = NopIoRunner::new();
        let io = Self {
            queue: queue_r,
            stop,
            runner: runner.clone(),
        };
        Ok((io, runner))
    }
}

impl IoSystem for AnsiIo {
    fn draw(&mut self, screen: &Screen) -> io::Result<()> {
        let mut out = vec![];
        crossterm::queue!(&mut out, MoveTo(0, 0))?;
        for row in screen.rows() {
            out.extend(render_row(row)?);
        }
        let mut stdout = io::stdout().lock();
        stdout.write_all(&out)?;
        stdout.flush()
    }

    fn size(&self) -> XY {
        let (x, y) = terminal::size().unwrap_or((80, 24));
        XY(x as usize, y as usize)
    }

    fn input(&mut self) -> io::Result<Action> {
        self.queue
            .recv()
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "input thread died"))
    }

    fn poll_input(&mut self) -> io::Result<Option<Action>> {
        match self.queue.try_recv() {
            Ok(action) => Ok(Some(action)),
            Err(mpsc::TryRecvError::Empty) => Ok(None),
            Err(mpsc::TryRecvError::Disconnected) => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "input thread died",
            )),
        }
    }

    fn input_until(&mut self, time: Duration) -> io::Result<Option<Action>> {
        match self.queue.recv_timeout(time) {
            Ok(action) => Ok(Some(action)),
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(None),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "input thread died",
            )),
        }
    }

    fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        let _ = Self::clean_term();
        self.runner.stop();
    }
}
