//! Fuzz target: `AtBridge` frame handling
//!
//! Plays arbitrary bytes as modem output and runs poll cycles against
//! them, verifying:
//! - No panics under any byte sequence
//! - Every cycle terminates (each wait is bounded by the fake clock)
//! - The bridge is back in `Idle` after every poll
//!
//! cargo fuzz run fuzz_at_bridge

#![no_main]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use homenode::app::ports::TimePort;
use homenode::app::response::Response;
use homenode::config::BridgeConfig;
use homenode::transport::at_bridge::{AtBridge, BridgeState};
use homenode::transport::{ByteChannel, RequestBridge};
use libfuzzer_sys::fuzz_target;

type Ticks = Rc<Cell<u64>>;

struct Clock(Ticks);

impl TimePort for Clock {
    fn uptime_ms(&self) -> u64 {
        self.0.get() / 1_000_000
    }
}

struct Delay(Ticks);

impl DelayNs for Delay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.set(self.0.get() + u64::from(ns));
    }
}

/// Hands out the fuzz input in chunks whose sizes come from the input.
struct Replay {
    inbound: Rc<RefCell<VecDeque<u8>>>,
    chunk: usize,
}

impl ByteChannel for Replay {
    type Error = ();

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ()> {
        let mut q = self.inbound.borrow_mut();
        let n = buf.len().min(self.chunk).min(q.len());
        for (slot, b) in buf.iter_mut().zip(q.drain(..n)) {
            *slot = b;
        }
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), ()> {
        Ok(())
    }

    fn available(&self) -> bool {
        !self.inbound.borrow().is_empty()
    }
}

fuzz_target!(|data: &[u8]| {
    let Some((&chunk, rest)) = data.split_first() else {
        return;
    };
    let inbound = Rc::new(RefCell::new(rest.iter().copied().collect::<VecDeque<u8>>()));
    let ticks: Ticks = Rc::new(Cell::new(0));
    let channel = Replay {
        inbound: inbound.clone(),
        chunk: usize::from(chunk).max(1),
    };
    let mut bridge = AtBridge::new(
        channel,
        Clock(ticks.clone()),
        Delay(ticks.clone()),
        BridgeConfig::default(),
    );
    let mut handler = |_raw: &str| Response::ok_text("TEMP:0.00".into());

    // Each successful poll consumes at least one byte, so this bounds the loop.
    for _ in 0..=rest.len() {
        let _ = bridge.poll(&mut handler);
        assert_eq!(bridge.state(), BridgeState::Idle);
        if inbound.borrow().is_empty() {
            break;
        }
    }
});
