//! A backend that ignores output and never produces input. Useful for benchmarking the engine and for running the
//! game loop headless in CI.

use std::{io, thread, time::Duration};

use crate::io::{input::Action, output::Screen, XY};

use super::{IoSystem, NopIoRunner};

pub struct NopSystem(NopIoRunner);

impl NopSystem {
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> io::Result<(Self, NopIoRunner)> {
        let run = NopIoRunner::new();
        Ok((Self(run.clone()), run))
    }
}

impl IoSystem for NopSystem {
    fn draw(&mut self, _screen: &Screen) -> io::Result<()> {
        Ok(())
    }
    fn size(&self) -> XY {
        XY(80, 24)
    }
    fn input(&mut self) -> io::Result<Action> {
        loop {
            thread::sleep(Duration::from_secs(u64::MAX));
        }
    }
    fn poll_input(&mut self) -> io::Result<Option<Action>> {
        Ok(None)
    }
    fn input_until(&mut self, time: Duration) -> io::Result<Option<Action>> {
        thread::sleep(time);
        Ok(None)
    }
    fn stop(&mut self) {
        self.0.stop()
    }
}
