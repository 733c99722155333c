use bevy_platform::time::Instant;

/// Records the time between its creation and its drop in the gauge `{name}::time_ms`
pub struct TimerGauge {
    pub name: &'static str,
    start: Instant,
}

impl TimerGauge {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            start: Instant::now(),
        }
    }
}

impl Drop for TimerGauge {
    fn drop(&mut self) {
        metrics::gauge!(format!("{}::time_ms", self.name))
            .set(self.start.elapsed().as_secs_f64() * 1e3);
    }
}
