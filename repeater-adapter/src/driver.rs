use item_repeater::{Clock, ItemsRepeater, ItemsSource, Size};

/// What a single [`FrameDriver::tick`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrameReport {
    pub measure_passes: usize,
    pub arrange_passes: usize,
    /// Scheduled work items run during the rendering tick.
    pub work_items: usize,
    /// `false` when layout was still invalid after the pass limit.
    pub layout_settled: bool,
    /// Whether the host should schedule another frame even without new input.
    pub needs_another_frame: bool,
}

/// Drives an [`ItemsRepeater`] one frame at a time.
///
/// Each tick pulls the viewport, runs measure and arrange until both are valid (bounded, since a
/// scroll owner honoring a viewport shift invalidates measure again), settles layout and then
/// runs the rendering tick.
#[derive(Clone, Copy, Debug)]
pub struct FrameDriver {
    available: Size,
    max_layout_passes: usize,
    frames: u64,
}

impl FrameDriver {
    pub const DEFAULT_MAX_LAYOUT_PASSES: usize = 8;

    pub fn new(available: Size) -> Self {
        Self {
            available,
            max_layout_passes: Self::DEFAULT_MAX_LAYOUT_PASSES,
            frames: 0,
        }
    }

    pub fn with_max_layout_passes(mut self, passes: usize) -> Self {
        self.max_layout_passes = passes.max(1);
        self
    }

    pub fn available_size(&self) -> Size {
        self.available
    }

    /// Space offered to the repeater; takes effect on the next measure.
    pub fn set_available_size(&mut self, available: Size) {
        self.available = available;
    }

    /// Number of completed ticks.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn tick<S: ItemsSource>(
        &mut self,
        repeater: &mut ItemsRepeater<S>,
        clock: &dyn Clock,
    ) -> FrameReport {
        let mut report = FrameReport::default();
        repeater.sync_viewport();

        for _ in 0..self.max_layout_passes {
            if repeater.is_measure_valid() && repeater.is_arrange_valid() {
                break;
            }
            if !repeater.is_measure_valid() {
                repeater.measure(self.available);
                report.measure_passes += 1;
            }
            repeater.arrange(repeater.desired_size());
            report.arrange_passes += 1;
            // The owner may have moved the viewport to honor a shift.
            repeater.sync_viewport();
        }

        report.layout_settled = repeater.is_measure_valid() && repeater.is_arrange_valid();
        if !report.layout_settled {
            awarn!(
                passes = self.max_layout_passes,
                frame = self.frames,
                "layout did not settle within the pass limit"
            );
        }
        repeater.on_layout_updated();
        report.work_items = repeater.on_rendering(clock);
        report.needs_another_frame = !repeater.is_measure_valid() || repeater.needs_rendering();

        self.frames += 1;
        report
    }
}
