use crate::RepeaterError;

/// Configuration for [`crate::ItemsRepeater`].
///
/// Cache lengths are multiples of the visible extent kept realized around the viewport, split
/// evenly between both sides (a length of `2.0` keeps one viewport before and one after).
///
/// With `feature = "serde"`, this type implements `Serialize`/`Deserialize`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RepeaterOptions {
    pub horizontal_cache_length: f64,
    pub vertical_cache_length: f64,
    /// Pixels added to the cache buffer on each side per arrange pass.
    pub cache_buffer_inflation: f64,
    /// Viewport drift below this many pixels is not treated as a pending shift.
    pub viewport_shift_tolerance: f64,
    /// Time budget for incremental work in a single frame.
    pub scheduler_budget_ms: u64,
}

impl Default for RepeaterOptions {
    fn default() -> Self {
        Self {
            horizontal_cache_length: 2.0,
            vertical_cache_length: 2.0,
            cache_buffer_inflation: 40.0,
            viewport_shift_tolerance: 1.0,
            scheduler_budget_ms: 40,
        }
    }
}

impl RepeaterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_horizontal_cache_length(mut self, value: f64) -> Result<Self, RepeaterError> {
        validate_cache_length(value)?;
        self.horizontal_cache_length = value;
        Ok(self)
    }

    pub fn with_vertical_cache_length(mut self, value: f64) -> Result<Self, RepeaterError> {
        validate_cache_length(value)?;
        self.vertical_cache_length = value;
        Ok(self)
    }

    pub fn with_cache_buffer_inflation(mut self, pixels: f64) -> Result<Self, RepeaterError> {
        validate_cache_buffer_inflation(pixels)?;
        self.cache_buffer_inflation = pixels;
        Ok(self)
    }

    pub fn with_viewport_shift_tolerance(mut self, pixels: f64) -> Result<Self, RepeaterError> {
        validate_viewport_shift_tolerance(pixels)?;
        self.viewport_shift_tolerance = pixels;
        Ok(self)
    }

    pub fn with_scheduler_budget_ms(mut self, budget_ms: u64) -> Self {
        self.scheduler_budget_ms = budget_ms;
        self
    }

    /// Checks values that may have been set directly or deserialized.
    pub fn validate(&self) -> Result<(), RepeaterError> {
        validate_cache_length(self.horizontal_cache_length)?;
        validate_cache_length(self.vertical_cache_length)?;
        validate_cache_buffer_inflation(self.cache_buffer_inflation)?;
        validate_viewport_shift_tolerance(self.viewport_shift_tolerance)
    }
}

pub(crate) fn validate_cache_length(value: f64) -> Result<(), RepeaterError> {
    if value < 0.0 || !value.is_finite() {
        return Err(RepeaterError::InvalidCacheLength(value));
    }
    Ok(())
}

/// The buffer must grow on every build step, or building never ends.
fn validate_cache_buffer_inflation(value: f64) -> Result<(), RepeaterError> {
    if value <= 0.0 || !value.is_finite() {
        return Err(RepeaterError::InvalidCacheBufferInflation(value));
    }
    Ok(())
}

fn validate_viewport_shift_tolerance(value: f64) -> Result<(), RepeaterError> {
    if value < 0.0 || !value.is_finite() {
        return Err(RepeaterError::InvalidViewportShiftTolerance(value));
    }
    Ok(())
}
