//! Shot scheduling: per-family (first, stride) cursors against the
//! global fiducial counter, and the per-shot element count for vlen
//! payloads. Pure state machines with no I/O.

/// Per-family shot cursor. A family participates on exactly the
/// fiducials `first, first + stride, first + 2*stride, ...`.
#[derive(Debug, Clone, Copy)]
pub struct ShotCursor {
    next: i64,
    stride: i64,
}

impl ShotCursor {
    pub fn new(shot_first: i64, shot_stride: i64) -> Self {
        Self {
            next: shot_first,
            stride: shot_stride,
        }
    }

    /// True when the family writes on this fiducial.
    pub fn participates(&self, fiducial: i64) -> bool {
        fiducial == self.next
    }

    /// Move to the next participating fiducial. A stride of zero (or
    /// less) still advances by one so the cursor cannot stall.
    pub fn advance(&mut self) {
        self.next += self.stride.max(1);
    }
}

/// Per-shot element count for vlen payloads: a bounded sawtooth over
/// `[min_per_shot, max_per_shot)`. The k-th participating shot writes
/// the current count, then the counter evolves.
#[derive(Debug, Clone, Copy)]
pub struct VlenCounter {
    count: usize,
    min: usize,
    max: usize,
}

impl VlenCounter {
    pub fn new(min_per_shot: usize, max_per_shot: usize) -> Self {
        debug_assert!(min_per_shot < max_per_shot);
        Self {
            count: min_per_shot,
            min: min_per_shot,
            max: max_per_shot,
        }
    }

    pub fn current(&self) -> usize {
        self.count
    }

    /// Evolve after a participating shot: wrap at max, then clamp up to
    /// min. The wrap happens first, which is what keeps the range
    /// half-open at max.
    pub fn advance(&mut self) {
        self.count = ((self.count + 1) % self.max).max(self.min);
    }
}
