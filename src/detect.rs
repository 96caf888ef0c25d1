// Simulated hardware and repository probes that answer after a short delay
use std::time::{Duration, Instant};

use rand::Rng;

pub(crate) const SECURE_BOOT_DELAY: Duration = Duration::from_millis(600);
pub(crate) const LATEST_VERSION_DELAY: Duration = Duration::from_millis(800);
// A sample above this counts as Secure Boot enabled
const SECURE_BOOT_THRESHOLD: f64 = 0.6;

// A value that becomes available once, at a fixed time after creation
#[derive(Debug, Clone)]
pub struct DelayedProbe<T> {
    due: Instant,
    value: Option<T>,
}

impl<T: Clone> DelayedProbe<T> {
    pub fn new(started: Instant, delay: Duration) -> Self {
        Self {
            due: started + delay,
            value: None,
        }
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    // Runs `sample` the first time `now` reaches the due time; returns the fresh value
    pub fn poll(&mut self, now: Instant, sample: impl FnOnce() -> T) -> Option<T> {
        if self.value.is_some() || now < self.due {
            return None;
        }
        let value = sample();
        self.value = Some(value.clone());
        Some(value)
    }
}

// Secure Boot state is unknown to the simulation; roll it
pub fn sample_secure_boot<R: Rng>(rng: &mut R, forced: Option<bool>) -> bool {
    forced.unwrap_or_else(|| rng.random::<f64>() > SECURE_BOOT_THRESHOLD)
}

pub fn secure_boot_label(enabled: bool) -> &'static str {
    if enabled {
        "Secure Boot ON"
    } else {
        "Secure Boot OFF"
    }
}

// Text shown on the express confirmation page
pub fn secure_boot_confirm_text(enabled: bool) -> &'static str {
    if enabled {
        "ON — MOK signing may be required"
    } else {
        "OFF — No restrictions"
    }
}

// Title and explanation for the home page banner
pub fn secure_boot_banner(enabled: bool) -> (&'static str, &'static str) {
    if enabled {
        (
            "Secure Boot is Enabled",
            "Third-party kernel modules (including NVIDIA proprietary drivers) may fail to load \
             unless they are signed with a Machine Owner Key (MOK). You may need to enroll a key \
             after installation, or disable Secure Boot in BIOS to use unsigned drivers.",
        )
    } else {
        (
            "Secure Boot is Disabled",
            "Third-party kernel modules (NVIDIA drivers) can load freely without MOK signing. \
             No additional steps are required for driver installation.",
        )
    }
}
