//! Command input channel.
//!
//! A reader thread feeds whole lines into a queue guarded by a parking_lot
//! mutex; the search polls [`InputProbe::input_ready`] without blocking and
//! the command loop blocks on [`CommandSource::read_command`]. EOF counts as
//! "ready" so a pondering search winds down instead of spinning forever.

use std::collections::VecDeque;
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use parking_lot::{Condvar, Mutex};

pub use crate::search::InputProbe;

/// Commands arrive as whole lines of at most this many bytes; longer lines
/// are truncated.
pub const MAX_COMMAND_BYTES: usize = 128;

/// Blocking line source paired with the non-blocking readiness probe.
pub trait CommandSource: InputProbe {
    /// Next command line, blocking until one arrives. `None` on end of
    /// input.
    fn read_command(&mut self) -> Option<String>;
}

struct Shared {
    lines: Mutex<VecDeque<String>>,
    ready: Condvar,
    closed: AtomicBool,
}

/// Stdin behind a reader thread.
pub struct StdinChannel {
    shared: Arc<Shared>,
}

impl StdinChannel {
    /// Spawn the reader thread and hand back the channel.
    #[must_use]
    pub fn spawn() -> Self {
        let shared = Arc::new(Shared {
            lines: Mutex::new(VecDeque::new()),
            ready: Condvar::new(),
            closed: AtomicBool::new(false),
        });

        let writer_side = Arc::clone(&shared);
        thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(mut line) = line else { break };
                if line.len() > MAX_COMMAND_BYTES {
                    let mut cut = MAX_COMMAND_BYTES;
                    while !line.is_char_boundary(cut) {
                        cut -= 1;
                    }
                    line.truncate(cut);
                }
                let mut lines = writer_side.lines.lock();
                lines.push_back(line);
                writer_side.ready.notify_one();
            }
            writer_side.closed.store(true, Ordering::Release);
            writer_side.ready.notify_one();
        });

        StdinChannel { shared }
    }
}

impl InputProbe for StdinChannel {
    fn input_ready(&mut self) -> bool {
        !self.shared.lines.lock().is_empty() || self.shared.closed.load(Ordering::Acquire)
    }
}

impl CommandSource for StdinChannel {
    fn read_command(&mut self) -> Option<String> {
        let mut lines = self.shared.lines.lock();
        loop {
            if let Some(line) = lines.pop_front() {
                return Some(line);
            }
            if self.shared.closed.load(Ordering::Acquire) {
                return None;
            }
            self.shared.ready.wait(&mut lines);
        }
    }
}

/// Scripted command source for tests: lines are served in order, and each
/// can be armed to show up as "ready" only after the probe has been polled a
/// number of times (which is how the ponder-interrupt scenarios are driven).
pub struct ScriptedInput {
    queue: VecDeque<String>,
    polls_until_ready: u64,
    polls_seen: u64,
}

impl ScriptedInput {
    #[must_use]
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScriptedInput {
            queue: lines.into_iter().map(Into::into).collect(),
            polls_until_ready: 0,
            polls_seen: 0,
        }
    }

    /// Make the next queued line invisible to the probe for `polls` polls.
    pub fn delay_next_by_polls(&mut self, polls: u64) {
        self.polls_until_ready = polls;
        self.polls_seen = 0;
    }
}

impl InputProbe for ScriptedInput {
    fn input_ready(&mut self) -> bool {
        if self.queue.is_empty() {
            // Exhausted input reads as EOF, which is always "ready".
            return true;
        }
        self.polls_seen += 1;
        self.polls_seen > self.polls_until_ready
    }
}

impl CommandSource for ScriptedInput {
    fn read_command(&mut self) -> Option<String> {
        self.polls_until_ready = 0;
        self.polls_seen = 0;
        self.queue.pop_front()
    }
}
