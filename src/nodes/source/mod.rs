mod noise;
mod oscillator;

pub use noise::*;
pub use oscillator::*;

/// Start/stop window of a scheduled source, in context seconds.
///
/// A source is silent until it is started and silent again once its stop
/// time has passed. Neither time can be moved once the source has stopped.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Schedule {
    start: Option<f64>,
    stop: Option<f64>,
}

impl Schedule {
    pub fn start(&mut self, at: f64) {
        if self.start.is_none() {
            self.start = Some(at);
        }
    }

    pub fn stop(&mut self, at: f64) {
        if self.stop.is_none() {
            self.stop = Some(at);
        }
    }

    #[inline]
    pub fn is_active(&self, t: f64) -> bool {
        self.start.is_some_and(|s| t >= s) && self.stop.map_or(true, |e| t < e)
    }
}
