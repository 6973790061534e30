//! Snapshot scheduling
//!
//! With an output interval every integer multiple of the interval that lies
//! strictly after the start of the run is recorded exactly once; the start
//! instant itself is not. Steps that would jump over the next multiple are
//! shortened to land on it, and the caller snaps its clock to the returned
//! landing instant so recorded times are the multiples themselves rather
//! than an accumulated sum of step sizes.

#[derive(Debug, Clone, PartialEq)]
pub enum OutputSchedule {
    /// Record every iteration
    Every,
    /// Record at `next * period`, `(next + 1) * period`, ...
    Interval {
        period: f64,
        next: i64,
        tolerance: f64,
    },
}

impl OutputSchedule {
    /// `output_time == 0` records every step. Otherwise the first due instant
    /// is the first multiple of `output_time` strictly after `start_time`
    pub fn new(output_time: f64, start_time: f64, tolerance: f64) -> Self {
        if output_time == 0.0 {
            return OutputSchedule::Every;
        }
        let mut schedule = OutputSchedule::Interval {
            period: output_time,
            next: (start_time / output_time).floor() as i64 + 1,
            tolerance,
        };
        // start just below a multiple, e.g. 0.3 / 0.1 = 2.9999999999999996
        if schedule.is_due(start_time) {
            schedule.advance();
        }
        schedule
    }

    /// Next output instant, `None` when recording every step
    pub fn target(&self) -> Option<f64> {
        match self {
            OutputSchedule::Every => None,
            OutputSchedule::Interval { period, next, .. } => Some(*next as f64 * period),
        }
    }

    fn hits(&self, time: f64, target: f64) -> bool {
        match self {
            OutputSchedule::Every => true,
            OutputSchedule::Interval { tolerance, .. } => {
                (time - target).abs() <= tolerance * target.abs().max(1.0)
            }
        }
    }

    pub fn is_due(&self, time: f64) -> bool {
        match self.target() {
            None => true,
            Some(target) => self.hits(time, target),
        }
    }

    /// Move on to the following output instant
    pub fn advance(&mut self) {
        if let OutputSchedule::Interval { next, .. } = self {
            *next += 1;
        }
    }

    /// Shorten `step` so that `time + step` does not pass the next output
    /// instant. Returns the step to take and, when shortened, the instant
    /// the clock should be set to afterwards
    pub fn clamp(&self, time: f64, step: f64) -> (f64, Option<f64>) {
        match self.target() {
            Some(target) if time + step > target || self.hits(time + step, target) => {
                (target - time, Some(target))
            }
            _ => (step, None),
        }
    }
}
