/// monotonic and wall-clock time source, injected so tests can drive the
/// engine deterministically instead of racing real time (§6).
pub trait Clock {
    /// monotonic milliseconds; not comparable across process restarts.
    fn mono(&self) -> crate::MonoMs;
    /// Unix-epoch wall-clock milliseconds.
    fn wall(&self) -> crate::WallMs;
}

/// production clock backed by the OS.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn mono(&self) -> crate::MonoMs {
        use std::time::Instant;
        static START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();
        let start = *START.get_or_init(Instant::now);
        start.elapsed().as_millis() as crate::MonoMs
    }
    fn wall(&self) -> crate::WallMs {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before unix epoch")
            .as_millis() as crate::WallMs
    }
}

/// deterministic clock for tests: `mono`/`wall` are whatever was last set,
/// advanced explicitly by the test rather than by wall-clock passage.
#[derive(Debug, Clone, Copy, Default)]
pub struct FakeClock {
    mono: crate::MonoMs,
    wall: crate::WallMs,
}

impl FakeClock {
    pub fn new(mono: crate::MonoMs, wall: crate::WallMs) -> Self {
        Self { mono, wall }
    }
    pub fn set_mono(&mut self, mono: crate::MonoMs) {
        self.mono = mono;
    }
    pub fn set_wall(&mut self, wall: crate::WallMs) {
        self.wall = wall;
    }
    pub fn advance(&mut self, delta: crate::TimeMs) {
        self.mono += delta;
        self.wall += delta;
    }
}

impl Clock for FakeClock {
    fn mono(&self) -> crate::MonoMs {
        self.mono
    }
    fn wall(&self) -> crate::WallMs {
        self.wall
    }
}
