//! Main control loop.
//!
//! [`Controller`] owns the [`Dispatcher`], the hardware adapter, the event
//! sink and whichever [`RequestBridge`] is in use.  Each [`tick`] serves at
//! most one request and then lets the dispatcher re-sample the sensors.
//! Everything runs on the calling thread; there is no other owner of the
//! device state.
//!
//! [`tick`]: Controller::tick

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::app::dispatcher::Dispatcher;
use crate::app::ports::{ActuatorPort, EventSink, SensorPort, TimePort};
use crate::app::response::Response;
use crate::config::SystemConfig;
use crate::transport::{Exchange, RequestBridge, RequestHandler};

/// Borrows the dispatcher and its ports for the duration of one request.
struct DispatchHandler<'a, H, S> {
    dispatcher: &'a mut Dispatcher,
    hw: &'a mut H,
    sink: &'a mut S,
}

impl<H, S> RequestHandler for DispatchHandler<'_, H, S>
where
    H: SensorPort + ActuatorPort,
    S: EventSink,
{
    fn handle(&mut self, raw: &str) -> Response {
        self.dispatcher.handle_request(raw, &mut *self.hw, &mut *self.sink)
    }
}

pub struct Controller<B, H, S, T> {
    bridge: B,
    dispatcher: Dispatcher,
    hw: H,
    sink: S,
    clock: T,
    served: u32,
    transport_errors: u32,
}

impl<B, H, S, T> Controller<B, H, S, T>
where
    B: RequestBridge,
    H: SensorPort + ActuatorPort,
    S: EventSink,
    T: TimePort,
{
    pub fn new(config: &SystemConfig, bridge: B, hw: H, sink: S, clock: T) -> Self {
        Self {
            bridge,
            dispatcher: Dispatcher::new(config),
            hw,
            sink,
            clock,
            served: 0,
            transport_errors: 0,
        }
    }

    /// Park the outputs and take the first sensor reading.
    pub fn start(&mut self) {
        let now = self.clock.uptime_ms();
        self.dispatcher.start(now, &mut self.hw, &mut self.sink);
    }

    /// One loop iteration.  Transport errors are logged and dropped; the
    /// next tick starts from a clean bridge.
    pub fn tick(&mut self) -> Option<Exchange> {
        let mut handler = DispatchHandler {
            dispatcher: &mut self.dispatcher,
            hw: &mut self.hw,
            sink: &mut self.sink,
        };
        let exchange = match self.bridge.poll(&mut handler) {
            Ok(Some(x)) => {
                self.served = self.served.wrapping_add(1);
                info!(
                    "served link={:?} status={} req={}B resp={}B",
                    x.connection_id, x.status, x.request_bytes, x.response_bytes
                );
                Some(x)
            }
            Ok(None) => None,
            Err(e) => {
                self.transport_errors = self.transport_errors.wrapping_add(1);
                warn!("transport: {e} (errors so far: {})", self.transport_errors);
                None
            }
        };

        let now = self.clock.uptime_ms();
        self.dispatcher.poll(now, &mut self.hw, &mut self.sink);
        exchange
    }

    /// Run forever, pausing `interval_ms` between iterations.
    pub fn run(&mut self, delay: &mut impl DelayNs, interval_ms: u32) -> ! {
        self.start();
        loop {
            self.tick();
            delay.delay_ms(interval_ms);
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn hw(&self) -> &H {
        &self.hw
    }

    pub fn hw_mut(&mut self) -> &mut H {
        &mut self.hw
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn served(&self) -> u32 {
        self.served
    }

    pub fn transport_errors(&self) -> u32 {
        self.transport_errors
    }
}
