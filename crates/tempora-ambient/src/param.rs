//! Gain automation
//!
//! A gain parameter follows one automation segment at a time. Scheduling a
//! new segment first reads the value the parameter has at the scheduling
//! instant and starts from there, so changing direction mid-ramp never
//! jumps.

/// Active automation segment
#[derive(Clone, Copy, Debug, PartialEq)]
enum Segment {
    /// Constant value
    Hold { value: f32 },
    /// Multiplicative ramp from `from` at `start` to `to` at `end`
    Exponential {
        from: f32,
        to: f32,
        start: f64,
        end: f64,
    },
    /// First-order approach toward `target` with time constant `tau`
    Target {
        from: f32,
        target: f32,
        start: f64,
        tau: f64,
    },
}

/// Time-automated gain multiplier
#[derive(Clone, Debug)]
pub struct GainParam {
    segment: Segment,
    /// Smallest value an exponential ramp may start from or reach
    floor: f32,
}

impl GainParam {
    pub fn new(initial: f32, floor: f32) -> Self {
        GainParam {
            segment: Segment::Hold { value: initial },
            floor: floor.max(f32::MIN_POSITIVE),
        }
    }

    /// Value at time `t` (seconds on the audio clock)
    pub fn value_at(&self, t: f64) -> f32 {
        match self.segment {
            Segment::Hold { value } => value,
            Segment::Exponential {
                from,
                to,
                start,
                end,
            } => {
                if t <= start {
                    from
                } else if t >= end {
                    to
                } else {
                    let progress = (t - start) / (end - start);
                    from * (to / from).powf(progress as f32)
                }
            }
            Segment::Target {
                from,
                target,
                start,
                tau,
            } => {
                if t <= start {
                    from
                } else {
                    let decay = (-(t - start) / tau).exp() as f32;
                    target + (from - target) * decay
                }
            }
        }
    }

    /// Jump to `value` immediately
    pub fn set_value(&mut self, value: f32) {
        self.segment = Segment::Hold { value };
    }

    /// Ramp multiplicatively from the current value to `target`, arriving at `end`
    ///
    /// Both endpoints are clamped to the floor since an exponential curve
    /// cannot touch zero.
    pub fn exponential_ramp_to(&mut self, target: f32, now: f64, end: f64) {
        let from = self.value_at(now).max(self.floor);
        let to = target.max(self.floor);
        if end <= now {
            self.segment = Segment::Hold { value: to };
            return;
        }
        self.segment = Segment::Exponential {
            from,
            to,
            start: now,
            end,
        };
    }

    /// Approach `target` exponentially with time constant `tau` seconds
    pub fn set_target(&mut self, target: f32, now: f64, tau: f64) {
        let from = self.value_at(now);
        if tau <= 0.0 {
            self.segment = Segment::Hold { value: target };
            return;
        }
        self.segment = Segment::Target {
            from,
            target,
            start: now,
            tau,
        };
    }

    /// Value the automation is heading toward
    pub fn final_value(&self) -> f32 {
        match self.segment {
            Segment::Hold { value } => value,
            Segment::Exponential { to, .. } => to,
            Segment::Target { target, .. } => target,
        }
    }

    pub fn floor(&self) -> f32 {
        self.floor
    }
}
