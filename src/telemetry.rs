// Synthetic performance monitor data, smoothed per frame
use std::ops::Range;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveTime};
use rand::Rng;

// Fraction of the remaining distance covered each frame
pub const SMOOTHING_FACTOR: f64 = 0.08;
// How often fresh targets are drawn
pub const PERF_UPDATE_INTERVAL: Duration = Duration::from_millis(1000);
// Distance below which a value counts as settled on its target
pub const CONVERGED_WITHIN: f64 = 0.5;

pub const VRAM_TOTAL_MB: u32 = 12288;
pub const RAM_TOTAL_MB: u32 = 32768;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    GpuTemp,
    GpuLoad,
    VramUsed,
    CpuLoad,
    CpuTemp,
    RamUsed,
}

impl MetricKind {
    pub const ALL: [MetricKind; 6] = [
        MetricKind::GpuTemp,
        MetricKind::GpuLoad,
        MetricKind::VramUsed,
        MetricKind::CpuLoad,
        MetricKind::CpuTemp,
        MetricKind::RamUsed,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MetricKind::GpuTemp => "GPU Temperature",
            MetricKind::GpuLoad => "GPU Load",
            MetricKind::VramUsed => "VRAM Usage",
            MetricKind::CpuLoad => "CPU Load",
            MetricKind::CpuTemp => "CPU Temperature",
            MetricKind::RamUsed => "RAM Usage",
        }
    }

    // Targets are drawn uniformly from these integer ranges
    pub fn sample_range(self) -> Range<u32> {
        match self {
            MetricKind::GpuTemp => 35..70,
            MetricKind::GpuLoad => 0..70,
            MetricKind::VramUsed => 800..4800,
            MetricKind::CpuLoad => 5..55,
            MetricKind::CpuTemp => 38..68,
            MetricKind::RamUsed => 5000..17000,
        }
    }

    // Full scale of the bar
    pub fn max(self) -> u32 {
        match self {
            MetricKind::VramUsed => VRAM_TOTAL_MB,
            MetricKind::RamUsed => RAM_TOTAL_MB,
            _ => 100,
        }
    }

    fn initial(self) -> f64 {
        match self {
            MetricKind::GpuTemp => 40.0,
            MetricKind::GpuLoad => 10.0,
            MetricKind::VramUsed => 1400.0,
            MetricKind::CpuLoad => 15.0,
            MetricKind::CpuTemp => 45.0,
            MetricKind::RamUsed => 8200.0,
        }
    }

    pub fn label(self, value: i64) -> String {
        match self {
            MetricKind::GpuTemp | MetricKind::CpuTemp => format!("{value}°C"),
            MetricKind::GpuLoad | MetricKind::CpuLoad => format!("{value}%"),
            MetricKind::VramUsed | MetricKind::RamUsed => {
                format!("{value} / {} MB", self.max())
            }
        }
    }
}

// One channel with its displayed value chasing a target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metric {
    pub kind: MetricKind,
    pub current: f64,
    pub target: f64,
}

impl Metric {
    fn new(kind: MetricKind) -> Self {
        let value = kind.initial();
        Self {
            kind,
            current: value,
            target: value,
        }
    }

    // current += (target - current) * factor
    fn advance(&mut self, factor: f64) {
        self.current += (self.target - self.current) * factor;
    }

    pub fn is_converged(&self) -> bool {
        (self.current - self.target).abs() < CONVERGED_WITHIN
    }
}

// What the monitor page draws for one metric
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub kind: MetricKind,
    pub value: i64,
    pub label: String,
    // 0..=100, share of the metric's full scale
    pub percent: f64,
    // Within CONVERGED_WITHIN of the current target
    pub settled: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub readings: Vec<Reading>,
    pub status: String,
}

/// Generates smoothly moving sensor values.
///
/// `tick` is pure with respect to time: it only looks at the `now` it is
/// given, so the frame loop that calls it can be swapped for a fake clock.
pub struct Telemetry<R> {
    metrics: [Metric; 6],
    rng: R,
    running: bool,
    last_resample: Option<Instant>,
    resampled_at: Option<NaiveTime>,
}

impl<R: Rng> Telemetry<R> {
    pub fn new(rng: R) -> Self {
        Self {
            metrics: MetricKind::ALL.map(Metric::new),
            rng,
            running: false,
            last_resample: None,
            resampled_at: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    #[cfg(test)]
    fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    #[cfg(test)]
    fn metric(&self, kind: MetricKind) -> &Metric {
        &self.metrics[Self::slot(kind)]
    }

    // Returns false when already running
    pub fn start(&mut self, now: Instant) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        self.last_resample = Some(now);
        self.resample();
        true
    }

    // Halts generation, keeping the last values. Returns false when already stopped.
    pub fn stop(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.running = false;
        true
    }

    /// Advances one frame and returns what to draw.
    ///
    /// Does nothing while stopped. At most one resample happens per frame,
    /// however many intervals have passed since the last one.
    pub fn tick(&mut self, now: Instant) -> Option<Snapshot> {
        if !self.running {
            return None;
        }

        for metric in self.metrics.iter_mut() {
            metric.advance(SMOOTHING_FACTOR);
        }

        let due = self
            .last_resample
            .map_or(true, |last| now.saturating_duration_since(last) > PERF_UPDATE_INTERVAL);
        if due {
            self.last_resample = Some(now);
            self.resample();
        }

        Some(self.snapshot())
    }

    pub fn snapshot(&self) -> Snapshot {
        let readings = self
            .metrics
            .iter()
            .map(|metric| {
                let value = metric.current.round() as i64;
                Reading {
                    kind: metric.kind,
                    value,
                    label: metric.kind.label(value),
                    percent: (value as f64 / metric.kind.max() as f64 * 100.0).clamp(0.0, 100.0),
                    settled: metric.is_converged(),
                }
            })
            .collect();
        Snapshot {
            readings,
            status: self.status_line(),
        }
    }

    pub fn status_line(&self) -> String {
        let stamp = self
            .resampled_at
            .map(|at| at.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "--:--:--".to_string());
        format!(
            "Live data • Updated at {stamp} • Refresh: {}ms • Smoothed per frame",
            PERF_UPDATE_INTERVAL.as_millis()
        )
    }

    fn resample(&mut self) {
        for metric in self.metrics.iter_mut() {
            metric.target = self.rng.random_range(metric.kind.sample_range()) as f64;
        }
        self.resampled_at = Some(Local::now().time());
    }

    #[cfg(test)]
    fn slot(kind: MetricKind) -> usize {
        match kind {
            MetricKind::GpuTemp => 0,
            MetricKind::GpuLoad => 1,
            MetricKind::VramUsed => 2,
            MetricKind::CpuLoad => 3,
            MetricKind::CpuTemp => 4,
            MetricKind::RamUsed => 5,
        }
    }
}
