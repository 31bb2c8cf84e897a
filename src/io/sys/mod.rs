//! This module provides IO adapters for each of the various backends supported. Each one is controlled by a feature
//! named similarly and exports a struct implementing `IoSystem`. The actual input and output APIs are in the `input`
//! and `output` modules.

#[cfg(feature = "__sys")]
use std::collections::HashMap;
use std::{
    io,
    sync::{Arc, Barrier},
    time::{Duration, Instant},
};

use super::{input::Action, output::Screen, XY};

#[cfg(feature = "sys_cli")]
pub mod ansi_cli;

#[cfg(feature = "sys_nop")]
pub mod nop;

/// An input/output system.
///
/// The output is called a "display" to distinguish it from the [`Screen`].
///
/// This object is meant to be associated with an [`IoRunner`], which will run on the main thread while this is called
/// from within the game thread.
pub trait IoSystem: Send {
    /// Actually render a [`Screen`] to the display.
    fn draw(&mut self, screen: &Screen) -> io::Result<()>;
    /// Get the size of the display, in characters.
    fn size(&self) -> XY;

    /// Wait for the next user input.
    fn input(&mut self) -> io::Result<Action>;
    /// If the next user input is available, return it.
    fn poll_input(&mut self) -> io::Result<Option<Action>>;
    /// Wait for the next user input, up to a timeout.
    fn input_until(&mut self, time: Duration) -> io::Result<Option<Action>> {
        let end = Instant::now() + time;
        while Instant::now() < end {
            if let Some(input) = self.poll_input()? {
                return Ok(Some(input));
            }
        }
        Ok(None)
    }

    /// Tells the associated [`IoRunner`] to stop and return control of the main thread, and tell the [`IoSystem`] to
    /// dispose of any resources it's handling.
    ///
    /// This will always be the last method called on this object (unless you count `Drop::drop`) so feel free to
    /// panic in the others if they're called after this one, especially `draw`.
    fn stop(&mut self);
}

impl IoSystem for Box<dyn IoSystem> {
    fn draw(&mut self, screen: &Screen) -> io::Result<()> {
        (**self).draw(screen)
    }
    fn size(&self) -> XY {
        (**self).size()
    }
    fn input(&mut self) -> io::Result<Action> {
        (**self).input()
    }
    fn poll_input(&mut self) -> io::Result<Option<Action>> {
        (**self).poll_input()
    }
    fn input_until(&mut self, time: Duration) -> io::Result<Option<Action>> {
        (**self).input_until(time)
    }
    fn stop(&mut self) {
        (**self).stop()
    }
}

/// The other half of an [`IoSystem`].
///
/// This type exists so that things which need to run on the main thread specifically, can.
pub trait IoRunner {
    /// Run until the paired [`IoSystem`] tells you to stop.
    fn run(&mut self);
}

impl IoRunner for Box<dyn IoRunner> {
    fn run(&mut self) {
        (**self).run()
    }
}

/// An implementation of [`IoRunner`] for backends which don't actually require anything in particular be done on the
/// main thread.
///
/// The intended use of this is creating one, returning its clone, and telling your copy to stop when the [`IoSystem`]
/// method is called.
#[derive(Clone)]
pub struct NopIoRunner(Arc<Barrier>);

impl NopIoRunner {
    /// Create a [`NopIoRunner`].
    pub fn new() -> Self {
        Self(Arc::new(Barrier::new(2)))
    }

    /// Tell the [`NopIoRunner`] to stop.
    pub fn stop(&mut self) {
        self.0.wait();
    }
}

impl IoRunner for NopIoRunner {
    fn run(&mut self) {
        self.0.wait();
    }
}

/// Based on the IO system features enabled, attempt to initialize an IO system; in order:
///
/// - crossterm CLI (`sys_cli`)
/// - headless nop (`sys_nop`)
///
/// The Err type is a map from the name of the backend to the error that it hit.
#[cfg(feature = "__sys")]
pub fn load() -> Result<(Box<dyn IoSystem>, Box<dyn IoRunner>), HashMap<&'static str, io::Error>> {
    #[allow(unused_mut)]
    let mut errors = HashMap::new();
    macro_rules! try_init {
        ( $name:ident: $( $init:tt )* ) => {
            let res = {
                $($init)*
            };
            match res {
                Ok((iosys, run)) => return Ok((Box::new(iosys), Box::new(run))),
                Err(e) => errors.insert(stringify!($name), e),
            };
        }
    }
    #[cfg(feature = "sys_cli")]
    {
        // Try to initialize the CLI renderer
        try_init! { ansi_cli: ansi_cli::AnsiIo::get() }
    }
    #[cfg(feature = "sys_nop")]
    {
        try_init! { nop: nop::NopSystem::new() }
    }
    Err(errors)
}
