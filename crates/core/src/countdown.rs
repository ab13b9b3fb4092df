use crate::model::DEFAULT_TIME_LIMIT_SECS;

/// Identifies one armed countdown; ticks from an older generation are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TimerGeneration(u64);

impl TimerGeneration {
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }

    fn bump(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// One second elapsed; `remaining` seconds left.
    Running { remaining: u32 },
    /// Reached zero. Returned once per armed countdown.
    Expired,
    /// Tick belongs to a countdown that was restarted or stopped since.
    Stale,
    /// Countdown is not armed.
    Stopped,
}

/// Whole-second countdown driven by an external one-second tick source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    remaining: u32,
    generation: TimerGeneration,
    running: bool,
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Countdown {
    #[must_use]
    pub fn new() -> Self {
        Self {
            remaining: DEFAULT_TIME_LIMIT_SECS,
            generation: TimerGeneration::default(),
            running: false,
        }
    }

    /// Unarmed countdown whose generations continue after `last`.
    ///
    /// Ticks issued for `last` or any earlier generation stay stale.
    #[must_use]
    pub fn continuing_from(last: TimerGeneration) -> Self {
        Self {
            generation: last,
            ..Self::new()
        }
    }

    /// Arm the countdown for `secs` seconds (`0` means the default limit).
    ///
    /// Invalidates any tick issued for the previous generation.
    pub fn restart(&mut self, secs: u32) -> TimerGeneration {
        self.generation = self.generation.bump();
        self.remaining = if secs == 0 { DEFAULT_TIME_LIMIT_SECS } else { secs };
        self.running = true;
        self.generation
    }

    pub fn stop(&mut self) {
        if self.running {
            self.generation = self.generation.bump();
        }
        self.running = false;
    }

    pub fn tick(&mut self, generation: TimerGeneration) -> Tick {
        if generation != self.generation {
            return Tick::Stale;
        }
        if !self.running {
            return Tick::Stopped;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.running = false;
            return Tick::Expired;
        }
        Tick::Running {
            remaining: self.remaining,
        }
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    #[must_use]
    pub fn generation(&self) -> TimerGeneration {
        self.generation
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }
}
