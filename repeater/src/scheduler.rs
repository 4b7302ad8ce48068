use alloc::vec::Vec;

/// Millisecond time source used to enforce frame budgets.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Wall clock backed by [`std::time::Instant`].
#[cfg(feature = "std")]
#[derive(Clone, Copy, Debug)]
pub struct StdClock {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl StdClock {
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Clock for StdClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

#[derive(Clone, Debug)]
struct PendingWork<W> {
    priority: u32,
    seq: u64,
    work: W,
}

/// Runs queued work a frame at a time under a time budget.
///
/// Priority `0` is the most urgent; equal priorities run in registration order. Work registered
/// while a frame is running waits for the next frame.
///
/// Adapters drive it as:
/// 1. `begin_frame(now)` on each rendering tick,
/// 2. `next_work(clock)` until it returns `None`,
/// 3. check `has_pending_work()` to decide whether another frame must be scheduled.
#[derive(Clone, Debug)]
pub struct BuildTreeScheduler<W> {
    pending: Vec<PendingWork<W>>,
    next_seq: u64,
    frame_seq: u64,
    frame_start_ms: u64,
    budget_ms: u64,
}

impl<W> BuildTreeScheduler<W> {
    pub const DEFAULT_BUDGET_MS: u64 = 40;

    pub fn new(budget_ms: u64) -> Self {
        Self {
            pending: Vec::new(),
            next_seq: 0,
            frame_seq: 0,
            frame_start_ms: 0,
            budget_ms,
        }
    }

    pub fn budget_ms(&self) -> u64 {
        self.budget_ms
    }

    pub fn set_budget_ms(&mut self, budget_ms: u64) {
        self.budget_ms = budget_ms;
    }

    pub fn register_work(&mut self, priority: u32, work: W) {
        rtrace!(priority, pending = self.pending.len(), "BuildTreeScheduler::register_work");
        self.pending.push(PendingWork {
            priority,
            seq: self.next_seq,
            work,
        });
        self.next_seq += 1;
    }

    pub fn has_pending_work(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Snapshots the frame start time and the set of work eligible in this frame.
    pub fn begin_frame(&mut self, now_ms: u64) {
        self.frame_start_ms = now_ms;
        self.frame_seq = self.next_seq;
    }

    pub fn should_yield(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.frame_start_ms) > self.budget_ms
    }

    /// Pops the most urgent work registered before the frame began, unless the budget is spent.
    pub fn next_work(&mut self, now_ms: u64) -> Option<W> {
        if self.should_yield(now_ms) {
            if self.pending.iter().any(|w| w.seq < self.frame_seq) {
                rdebug!(
                    elapsed_ms = now_ms.saturating_sub(self.frame_start_ms),
                    pending = self.pending.len(),
                    "BuildTreeScheduler: budget reached, yielding"
                );
            }
            return None;
        }
        let frame_seq = self.frame_seq;
        let pos = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, w)| w.seq < frame_seq)
            .min_by_key(|(_, w)| (w.priority, w.seq))
            .map(|(i, _)| i)?;
        Some(self.pending.remove(pos).work)
    }

    /// Drops queued work matching `pred`.
    pub fn cancel(&mut self, mut pred: impl FnMut(&W) -> bool) {
        self.pending.retain(|w| !pred(&w.work));
    }

    /// Runs one frame, handing each work item to `run`.
    ///
    /// `run` receives the scheduler so it can register follow-up work or check the budget.
    pub fn run_frame(&mut self, clock: &dyn Clock, mut run: impl FnMut(W, &mut Self)) -> usize {
        self.begin_frame(clock.now_ms());
        let mut ran = 0;
        while let Some(work) = self.next_work(clock.now_ms()) {
            run(work, self);
            ran += 1;
        }
        ran
    }
}

impl<W> Default for BuildTreeScheduler<W> {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BUDGET_MS)
    }
}
