/////////
/// Session owner: one install runner, one telemetry generator, the probes
////////
use std::fs::File;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::{config, EnvOverrides, VersionEntry};
use crate::detect::{sample_secure_boot, DelayedProbe, LATEST_VERSION_DELAY, SECURE_BOOT_DELAY};
use crate::drivers::{InstallOptions, KernelVariant};
use crate::installer::{InstallError, InstallRunner, RunState};
use crate::logging::handle_event;
use crate::model::{App, InstallerEvent};
use crate::telemetry::{Snapshot, Telemetry};

// Poll interval while the monitor animates
pub(crate) const FRAME_INTERVAL: Duration = Duration::from_millis(16);
// Poll interval everywhere else
pub(crate) const IDLE_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Install,
    ExpressConfirm,
    Expert,
    RemoveConfirm,
    Progress,
    Monitor,
}

// Choices on the expert page
#[derive(Debug, Clone, Default)]
pub struct ExpertForm {
    pub cursor: usize,
    pub selected_version: Option<String>,
    pub open_kernel: bool,
    pub deep_clean: bool,
}

pub struct Coordinator {
    page: Page,
    runner: InstallRunner<StdRng>,
    telemetry: Telemetry<StdRng>,
    rx: Receiver<InstallerEvent>,
    app: App,
    snapshot: Option<Snapshot>,
    probe_rng: StdRng,
    forced_secure_boot: Option<bool>,
    secure_boot: DelayedProbe<bool>,
    latest: DelayedProbe<String>,
    expert: ExpertForm,
    express_variant: KernelVariant,
    notice: Option<String>,
}

impl Coordinator {
    pub fn new(overrides: &EnvOverrides, log_file: Option<File>, now: Instant) -> Self {
        let mut seeds = match overrides.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            page: Page::Install,
            runner: InstallRunner::new(tx, StdRng::from_rng(&mut seeds)),
            telemetry: Telemetry::new(StdRng::from_rng(&mut seeds)),
            rx,
            app: App::new(log_file),
            snapshot: None,
            probe_rng: StdRng::from_rng(&mut seeds),
            forced_secure_boot: overrides.secure_boot,
            secure_boot: DelayedProbe::new(now, SECURE_BOOT_DELAY),
            latest: DelayedProbe::new(now, LATEST_VERSION_DELAY),
            expert: ExpertForm::default(),
            express_variant: KernelVariant::Proprietary,
            notice: None,
        }
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn app_mut(&mut self) -> &mut App {
        &mut self.app
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn expert(&self) -> &ExpertForm {
        &self.expert
    }

    pub fn express_variant(&self) -> KernelVariant {
        self.express_variant
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }

    pub fn catalog(&self) -> &'static [VersionEntry] {
        &config().versions
    }

    // None until the simulated detection answers
    pub fn secure_boot(&self) -> Option<bool> {
        self.secure_boot.value().copied()
    }

    pub fn latest_version(&self) -> Option<&str> {
        self.latest.value().map(String::as_str)
    }

    pub fn run_state(&self) -> RunState {
        self.runner.state()
    }

    // How long the loop may wait for input before the next update is needed
    pub fn poll_interval(&self, now: Instant) -> Duration {
        let base = if self.page == Page::Monitor {
            FRAME_INTERVAL
        } else {
            IDLE_INTERVAL
        };
        match self.runner.next_wake() {
            Some(wake) => base.min(wake.saturating_duration_since(now)),
            None => base,
        }
    }

    // Version and 1-based step position of the active run
    pub fn run_position(&self) -> Option<(&str, usize, usize)> {
        if !self.runner.is_running() {
            return None;
        }
        self.runner.session().map(|session| {
            (
                session.options().version.as_str(),
                (session.index() + 1).min(session.steps().len()),
                session.steps().len(),
            )
        })
    }

    // Switches the visible page; the monitor generates data only while shown
    pub fn show_page(&mut self, page: Page, now: Instant) {
        self.page = page;
        self.notice = None;
        if page == Page::Monitor {
            self.telemetry.start(now);
            self.snapshot = Some(self.telemetry.snapshot());
        } else {
            self.telemetry.stop();
        }
    }

    /// Hands options to the runner.
    ///
    /// A second trigger while a run is active is ignored. A missing version is
    /// reported through the notice line.
    pub fn trigger_install(&mut self, options: InstallOptions, now: Instant) {
        let secure_boot = self.secure_boot().unwrap_or(false);
        match self
            .runner
            .trigger(options, secure_boot, &config().host, now)
        {
            Ok(()) => self.show_page(Page::Progress, now),
            Err(InstallError::AlreadyRunning) => {}
            Err(err @ InstallError::MissingSelection) => self.notice = Some(err.to_string()),
        }
        self.drain_events();
    }

    // Latest version, chosen kernel variant, no deep clean
    pub fn express_install(&mut self, now: Instant) {
        let version = self.latest_version().unwrap_or_default().to_string();
        let options = InstallOptions::new(version, self.express_variant, false);
        self.trigger_install(options, now);
    }

    pub fn custom_install(&mut self, now: Instant) {
        let options = InstallOptions::new(
            self.expert.selected_version.clone().unwrap_or_default(),
            KernelVariant::from_open_flag(self.expert.open_kernel),
            self.expert.deep_clean,
        );
        self.trigger_install(options, now);
    }

    // Removing everything is destructive, so it goes through a yes/no page first
    pub fn request_remove_all(&mut self, now: Instant) {
        self.show_page(Page::RemoveConfirm, now);
    }

    // Answered yes; a rejected start leaves the user on the expert page
    pub fn confirm_remove_all(&mut self, now: Instant) {
        if self.page != Page::RemoveConfirm {
            return;
        }
        self.show_page(Page::Expert, now);
        self.remove_all(now);
    }

    // Purge and reinstall the proprietary stack for the selected version
    fn remove_all(&mut self, now: Instant) {
        let options = InstallOptions::new(
            self.expert.selected_version.clone().unwrap_or_default(),
            KernelVariant::Proprietary,
            true,
        );
        self.trigger_install(options, now);
    }

    pub fn toggle_express_variant(&mut self) {
        self.express_variant = KernelVariant::from_open_flag(!self.express_variant.is_open());
    }

    pub fn toggle_open_kernel(&mut self) {
        self.expert.open_kernel = !self.expert.open_kernel;
    }

    pub fn toggle_deep_clean(&mut self) {
        self.expert.deep_clean = !self.expert.deep_clean;
    }

    pub fn move_cursor(&mut self, down: bool) {
        let last = self.catalog().len().saturating_sub(1);
        self.expert.cursor = if down {
            (self.expert.cursor + 1).min(last)
        } else {
            self.expert.cursor.saturating_sub(1)
        };
    }

    pub fn select_cursor(&mut self) {
        if let Some(entry) = self.catalog().get(self.expert.cursor) {
            self.expert.selected_version = Some(entry.version.clone());
        }
    }

    /// One pass of the cooperative loop: resolve due probes, advance the run,
    /// forward its events and, on the monitor page, animate one frame.
    pub fn update(&mut self, now: Instant) {
        let forced = self.forced_secure_boot;
        let probe_rng = &mut self.probe_rng;
        self.secure_boot
            .poll(now, || sample_secure_boot(probe_rng, forced));

        if let Some(version) = self.latest.poll(now, latest_catalog_version) {
            if self.expert.selected_version.is_none() && !version.is_empty() {
                self.expert.cursor = self
                    .catalog()
                    .iter()
                    .position(|entry| entry.version == version)
                    .unwrap_or(0);
                self.expert.selected_version = Some(version);
            }
        }

        self.runner.poll(now);
        self.drain_events();

        if self.telemetry.is_running() {
            if let Some(snapshot) = self.telemetry.tick(now) {
                self.snapshot = Some(snapshot);
            }
        }
    }

    fn drain_events(&mut self) {
        while let Ok(evt) = self.rx.try_recv() {
            handle_event(&mut self.app, evt);
        }
    }
}

fn latest_catalog_version() -> String {
    config()
        .latest()
        .map(|entry| entry.version.clone())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StepStatus;

    fn coordinator(secure_boot: Option<bool>) -> (Coordinator, Instant) {
        let overrides = EnvOverrides {
            seed: Some(77),
            log_path: None,
            secure_boot,
        };
        let now = Instant::now();
        (Coordinator::new(&overrides, None, now), now)
    }

    fn run_until_done(coord: &mut Coordinator, mut now: Instant) -> Instant {
        for _ in 0..200 {
            if coord.run_state() != RunState::Running {
                break;
            }
            now += Duration::from_millis(100);
            coord.update(now);
        }
        now
    }

    #[test]
    fn probes_resolve_on_schedule() {
        let (mut coord, base) = coordinator(Some(true));
        coord.update(base + Duration::from_millis(500));
        assert_eq!(coord.secure_boot(), None);
        assert_eq!(coord.latest_version(), None);

        coord.update(base + Duration::from_millis(650));
        assert_eq!(coord.secure_boot(), Some(true));
        assert_eq!(coord.latest_version(), None);

        coord.update(base + Duration::from_millis(850));
        assert_eq!(coord.latest_version(), Some("560.35.03"));
        assert_eq!(coord.expert().selected_version.as_deref(), Some("560.35.03"));
        assert_eq!(coord.expert().cursor, 0);
    }

    #[test]
    fn express_before_latest_version_is_rejected() {
        let (mut coord, base) = coordinator(None);
        coord.show_page(Page::ExpressConfirm, base);
        coord.express_install(base);
        assert_eq!(coord.page(), Page::ExpressConfirm);
        assert_eq!(coord.run_state(), RunState::Idle);
        assert_eq!(coord.notice(), Some("no driver version selected"));
    }

    #[test]
    fn express_install_runs_to_completion() {
        let (mut coord, base) = coordinator(Some(false));
        let now = base + Duration::from_secs(1);
        coord.update(now);
        coord.toggle_express_variant();
        coord.express_install(now);
        assert_eq!(coord.page(), Page::Progress);
        assert_eq!(coord.app().title, "Installing NVIDIA Open Kernel Driver");
        assert!(coord
            .app()
            .logs
            .iter()
            .any(|line| line.ends_with("Secure Boot: OFF")));

        run_until_done(&mut coord, now);
        let app = coord.app();
        assert!(app.done);
        assert_eq!(app.progress, 100);
        assert_eq!(app.steps.len(), 7);
        assert!(app.steps.iter().all(|step| step.status == StepStatus::Done));
        assert_eq!(coord.run_state(), RunState::Completed);
    }

    #[test]
    fn second_trigger_during_run_is_ignored() {
        let (mut coord, base) = coordinator(Some(false));
        let now = base + Duration::from_secs(1);
        coord.update(now);
        coord.express_install(now);
        coord.update(now + Duration::from_millis(1300));
        let title = coord.app().title.clone();
        let logs = coord.app().logs.len();

        coord.toggle_deep_clean();
        coord.remove_all(now + Duration::from_millis(1400));
        assert_eq!(coord.app().title, title);
        assert_eq!(coord.app().logs.len(), logs);
        assert_eq!(coord.notice(), None);
    }

    #[test]
    fn poll_interval_shrinks_before_a_due_step() {
        let (mut coord, base) = coordinator(Some(false));
        let now = base + Duration::from_secs(1);
        coord.update(now);
        coord.express_install(now);
        assert_eq!(coord.run_position(), Some(("560.35.03", 1, 7)));
        // First step is due START_DELAY after the trigger
        let almost = now + Duration::from_millis(1150);
        assert_eq!(coord.poll_interval(almost), Duration::from_millis(50));
    }

    #[test]
    fn run_continues_while_away_from_progress_page() {
        let (mut coord, base) = coordinator(Some(false));
        let now = base + Duration::from_secs(1);
        coord.update(now);
        coord.custom_install(now);
        coord.show_page(Page::Install, now);
        run_until_done(&mut coord, now);
        assert!(coord.app().done);
        assert_eq!(coord.page(), Page::Install);
    }

    #[test]
    fn remove_all_waits_for_confirmation() {
        let (mut coord, base) = coordinator(Some(false));
        let now = base + Duration::from_secs(1);
        coord.update(now);
        coord.show_page(Page::Expert, now);

        coord.request_remove_all(now);
        assert_eq!(coord.page(), Page::RemoveConfirm);
        assert_eq!(coord.run_state(), RunState::Idle);
        assert!(coord.app().steps.is_empty());

        // Backing out returns to the expert page with nothing started
        coord.show_page(Page::Expert, now);
        assert_eq!(coord.run_state(), RunState::Idle);

        coord.request_remove_all(now);
        coord.confirm_remove_all(now);
        assert_eq!(coord.page(), Page::Progress);
        assert_eq!(coord.run_state(), RunState::Running);
        assert_eq!(coord.app().steps.len(), 9);
    }

    #[test]
    fn confirm_without_request_does_nothing() {
        let (mut coord, base) = coordinator(Some(false));
        let now = base + Duration::from_secs(1);
        coord.update(now);
        coord.show_page(Page::Expert, now);
        coord.confirm_remove_all(now);
        assert_eq!(coord.page(), Page::Expert);
        assert_eq!(coord.run_state(), RunState::Idle);
    }

    #[test]
    fn confirmed_remove_all_without_version_stays_on_expert() {
        let (mut coord, base) = coordinator(Some(false));
        coord.show_page(Page::Expert, base);
        coord.request_remove_all(base);
        coord.confirm_remove_all(base);
        assert_eq!(coord.page(), Page::Expert);
        assert_eq!(coord.run_state(), RunState::Idle);
        assert_eq!(coord.notice(), Some("no driver version selected"));
    }

    #[test]
    fn remove_all_plans_deep_clean() {
        let (mut coord, base) = coordinator(Some(true));
        let now = base + Duration::from_secs(1);
        coord.update(now);
        coord.move_cursor(true);
        coord.move_cursor(true);
        coord.select_cursor();
        coord.request_remove_all(now);
        coord.confirm_remove_all(now);
        assert_eq!(coord.app().steps.len(), 9);
        assert!(coord
            .app()
            .logs
            .iter()
            .any(|line| line.ends_with("Version: 550.120")));
        assert!(coord
            .app()
            .logs
            .iter()
            .any(|line| line.ends_with("Secure Boot: ON")));
    }

    #[test]
    fn monitor_runs_only_while_visible() {
        let (mut coord, base) = coordinator(None);
        coord.show_page(Page::Monitor, base);
        assert_eq!(coord.poll_interval(base), FRAME_INTERVAL);
        for frame in 1..10 {
            coord.update(base + FRAME_INTERVAL * frame);
        }
        let shown = coord.snapshot().cloned().expect("snapshot");

        coord.show_page(Page::Install, base + Duration::from_secs(1));
        assert_eq!(coord.poll_interval(base), IDLE_INTERVAL);
        coord.update(base + Duration::from_secs(2));
        assert_eq!(coord.snapshot(), Some(&shown));
    }

    #[test]
    fn cursor_stays_in_catalog() {
        let (mut coord, _) = coordinator(None);
        coord.move_cursor(false);
        assert_eq!(coord.expert().cursor, 0);
        for _ in 0..10 {
            coord.move_cursor(true);
        }
        assert_eq!(coord.expert().cursor, coord.catalog().len() - 1);
        coord.select_cursor();
        assert_eq!(
            coord.expert().selected_version.as_deref(),
            Some("535.183.01")
        );
    }
}
