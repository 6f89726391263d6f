use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::geometry::Point;
use crate::round::{Phase, RoundEffect, RoundEvent, RoundMachine};
use crate::scoring::RoundOutcome;

/// Source of player input (clicks, hint requests, quit)
pub trait RoundEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<RoundEvent, RecvTimeoutError>;
}

/// Events pushed through an mpsc channel, by tests or by a reader thread
pub struct ChannelEventSource {
    rx: Receiver<RoundEvent>,
}

impl ChannelEventSource {
    pub fn new(rx: Receiver<RoundEvent>) -> Self {
        Self { rx }
    }

    pub fn channel() -> (Sender<RoundEvent>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, Self { rx })
    }

    /// Parse commands from `reader` on a background thread, one per line
    pub fn from_reader<R: BufRead + Send + 'static>(reader: R) -> Self {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            for line in reader.lines() {
                let Ok(line) = line else { break };
                match parse_command(&line) {
                    Some(event) => {
                        if tx.send(event).is_err() {
                            break;
                        }
                    }
                    None => log::debug!("unrecognised input: {:?}", line),
                }
            }
        });

        Self { rx }
    }
}

impl RoundEventSource for ChannelEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<RoundEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// `x y` (or `x,y`) clicks, `h` for a hint, `q` to leave the round
pub fn parse_command(line: &str) -> Option<RoundEvent> {
    let line = line.trim();
    match line {
        "h" | "hint" => return Some(RoundEvent::HintRequest),
        "q" | "quit" => return Some(RoundEvent::Teardown),
        _ => {}
    }

    let mut parts = line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty());
    let x: f64 = parts.next()?.parse().ok()?;
    let y: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || !x.is_finite() || !y.is_finite() {
        return None;
    }
    Some(RoundEvent::Click(Point::new(x, y)))
}

/// How long to wait between ticks for the machine's current phase
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self, machine: &RoundMachine) -> Option<Duration>;
}

/// Real-time pacing: 100ms countdown ticks, faster animation ticks
#[derive(Clone, Copy, Debug, Default)]
pub struct RoundTicker;

impl Ticker for RoundTicker {
    fn interval(&self, machine: &RoundMachine) -> Option<Duration> {
        machine.tick_interval()
    }
}

/// Same interval for every running phase; for tests and fast replays
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self, machine: &RoundMachine) -> Option<Duration> {
        machine.tick_interval().map(|_| self.interval)
    }
}

/// Shared flag; once set the runner delivers `Teardown` and nothing else
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Merges input and ticks into the single FIFO stream the machine consumes
pub struct Runner<E: RoundEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
    cancel: CancelToken,
    deadline: Option<Instant>,
    phase: Option<Phase>,
}

impl<E: RoundEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self::with_cancel(event_source, ticker, CancelToken::new())
    }

    pub fn with_cancel(event_source: E, ticker: T, cancel: CancelToken) -> Self {
        Self {
            event_source,
            ticker,
            cancel,
            deadline: None,
            phase: None,
        }
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Next event for `machine`: input if it arrives before the next tick is
    /// due, otherwise `Tick`. `None` when no timer is running.
    pub fn step(&mut self, machine: &RoundMachine) -> Option<RoundEvent> {
        if self.cancel.is_cancelled() {
            return (!machine.is_torn_down()).then_some(RoundEvent::Teardown);
        }

        let interval = self.ticker.interval(machine)?;
        let now = Instant::now();
        if self.phase != Some(machine.phase()) || self.deadline.is_none() {
            self.phase = Some(machine.phase());
            self.deadline = Some(now + interval);
        }
        let deadline = self.deadline.unwrap_or(now);
        let timeout = deadline.saturating_duration_since(now);

        match self.event_source.recv_timeout(timeout) {
            Ok(ev) => Some(ev),
            Err(RecvTimeoutError::Timeout) => {
                self.deadline = Some(deadline + interval);
                Some(RoundEvent::Tick)
            }
            Err(RecvTimeoutError::Disconnected) => {
                thread::sleep(timeout);
                self.deadline = Some(deadline + interval);
                Some(RoundEvent::Tick)
            }
        }
    }
}

/// Play `machine` until the round ends or is torn down, handing every effect
/// to `sink`. Returns the evaluated outcome, if the round got that far.
pub fn drive<E, T, F>(
    machine: &mut RoundMachine,
    runner: &mut Runner<E, T>,
    mut sink: F,
) -> Option<RoundOutcome>
where
    E: RoundEventSource,
    T: Ticker,
    F: FnMut(&RoundEffect),
{
    while let Some(event) = runner.step(machine) {
        for effect in machine.handle(event) {
            sink(&effect);
        }
    }
    machine.outcome().cloned()
}
