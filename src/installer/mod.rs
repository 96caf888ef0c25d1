/////////
/// Simulated installation run
////////
mod plan;

use std::ops::Range;
use std::time::{Duration, Instant};

use rand::Rng;
use thiserror::Error;

use crate::config::HostConfig;
use crate::drivers::InstallOptions;
use crate::model::{InstallerEvent, LogLine, StepStatus};

pub use plan::{build_log_preamble, build_plan, completion_summary, run_title, StepDescriptor};

// Pause between logging the preamble and activating the first step
pub(crate) const START_DELAY: Duration = Duration::from_millis(1200);
// Simulated duration of one step, in milliseconds, drawn uniformly
pub(crate) const STEP_DELAY_MS: Range<u64> = 600..1600;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstallError {
    #[error("an installation is already running")]
    AlreadyRunning,
    #[error("no driver version selected")]
    MissingSelection,
}

// Externally visible state of the runner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    // Preamble logged, waiting for the start delay
    Starting,
    // `index` is active until `resume_at`
    Working,
    Finished,
}

// One in-progress (or just finished) simulated install
#[derive(Debug)]
pub struct RunSession {
    options: InstallOptions,
    steps: Vec<StepDescriptor>,
    states: Vec<StepStatus>,
    index: usize,
    phase: Phase,
    resume_at: Instant,
}

impl RunSession {
    pub fn options(&self) -> &InstallOptions {
        &self.options
    }

    pub fn steps(&self) -> &[StepDescriptor] {
        &self.steps
    }

    #[cfg(test)]
    pub fn states(&self) -> &[StepStatus] {
        &self.states
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

/// Sequences the planned steps one at a time.
///
/// The runner never sleeps; the caller drives it with `poll(now)` from its own
/// loop, so every suspension is just a stored deadline. Events go out over the
/// channel in the order the state changes happen.
pub struct InstallRunner<R> {
    tx: crossbeam_channel::Sender<InstallerEvent>,
    rng: R,
    session: Option<RunSession>,
}

impl<R: Rng> InstallRunner<R> {
    pub fn new(tx: crossbeam_channel::Sender<InstallerEvent>, rng: R) -> Self {
        Self {
            tx,
            rng,
            session: None,
        }
    }

    pub fn state(&self) -> RunState {
        match self.session.as_ref().map(|session| session.phase) {
            None => RunState::Idle,
            Some(Phase::Finished) => RunState::Completed,
            Some(_) => RunState::Running,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == RunState::Running
    }

    pub fn session(&self) -> Option<&RunSession> {
        self.session.as_ref()
    }

    // When the next transition is due, if a run is in progress
    pub fn next_wake(&self) -> Option<Instant> {
        self.session
            .as_ref()
            .filter(|session| session.phase != Phase::Finished)
            .map(|session| session.resume_at)
    }

    /// Starts a new run, replacing any finished session.
    ///
    /// Rejected without touching the current session if a run is already in
    /// progress or no version was selected.
    pub fn trigger(
        &mut self,
        options: InstallOptions,
        secure_boot: bool,
        host: &HostConfig,
        now: Instant,
    ) -> Result<(), InstallError> {
        if self.is_running() {
            return Err(InstallError::AlreadyRunning);
        }
        if options.version.trim().is_empty() {
            return Err(InstallError::MissingSelection);
        }

        let steps = build_plan(&options);
        send_event(
            &self.tx,
            InstallerEvent::Started {
                title: run_title(&options),
                steps: steps.clone(),
            },
        );
        for line in build_log_preamble(&options, secure_boot, host, &steps) {
            send_log(&self.tx, line);
        }
        send_event(&self.tx, InstallerEvent::Progress(0));

        self.session = Some(RunSession {
            states: vec![StepStatus::Pending; steps.len()],
            steps,
            options,
            index: 0,
            phase: Phase::Starting,
            resume_at: now + START_DELAY,
        });
        Ok(())
    }

    /// Applies every transition that is due at `now`.
    ///
    /// A freshly activated step is always scheduled after `now`, so one call
    /// completes at most one step before returning.
    pub fn poll(&mut self, now: Instant) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        while session.phase != Phase::Finished && now >= session.resume_at {
            match session.phase {
                Phase::Starting => {
                    session.phase = Phase::Working;
                    begin_step(&self.tx, &mut self.rng, session, now);
                }
                Phase::Working => {
                    complete_step(&self.tx, session);
                    session.index += 1;
                    if session.index < session.steps.len() {
                        begin_step(&self.tx, &mut self.rng, session, now);
                    } else {
                        finish_run(&self.tx, session);
                    }
                }
                Phase::Finished => {}
            }
        }
    }
}

fn begin_step<R: Rng>(
    tx: &crossbeam_channel::Sender<InstallerEvent>,
    rng: &mut R,
    session: &mut RunSession,
    now: Instant,
) {
    let index = session.index;
    let total = session.steps.len();
    session.states[index] = StepStatus::Running;
    send_event(
        tx,
        InstallerEvent::Step {
            index,
            status: StepStatus::Running,
        },
    );
    send_event(tx, InstallerEvent::Progress(percent(index as f64 + 0.5, total)));
    send_log(tx, format!("→ {}...", session.steps[index].text));

    let delay = rng.random_range(STEP_DELAY_MS);
    session.resume_at = now + Duration::from_millis(delay);
}

fn complete_step(tx: &crossbeam_channel::Sender<InstallerEvent>, session: &mut RunSession) {
    let index = session.index;
    let total = session.steps.len();
    session.states[index] = StepStatus::Done;
    send_event(
        tx,
        InstallerEvent::Step {
            index,
            status: StepStatus::Done,
        },
    );
    send_log(tx, format!("  ✓ {} — done", session.steps[index].text));
    send_event(tx, InstallerEvent::Progress(percent(index as f64 + 1.0, total)));
}

fn finish_run(tx: &crossbeam_channel::Sender<InstallerEvent>, session: &mut RunSession) {
    for line in completion_summary(&session.options) {
        send_log(tx, line);
    }
    send_event(tx, InstallerEvent::Progress(100));
    send_event(tx, InstallerEvent::Done);
    session.phase = Phase::Finished;
}

// Rounded share of `done` out of `total`, in percent
fn percent(done: f64, total: usize) -> u8 {
    ((done / total as f64) * 100.0).round().clamp(0.0, 100.0) as u8
}

fn send_log(tx: &crossbeam_channel::Sender<InstallerEvent>, text: String) {
    send_event(tx, InstallerEvent::Log(LogLine::now(text)));
}

fn send_event(tx: &crossbeam_channel::Sender<InstallerEvent>, evt: InstallerEvent) {
    let _ = tx.try_send(evt);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::config;
    use crate::drivers::KernelVariant;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn runner(seed: u64) -> (InstallRunner<StdRng>, crossbeam_channel::Receiver<InstallerEvent>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (InstallRunner::new(tx, StdRng::seed_from_u64(seed)), rx)
    }

    // Drives a run to completion with a fake clock, returning every event
    fn run_to_end(seed: u64, options: InstallOptions) -> Vec<InstallerEvent> {
        let (mut runner, rx) = runner(seed);
        let base = Instant::now();
        runner
            .trigger(options, false, &config().host, base)
            .expect("trigger");
        let mut now = base;
        for _ in 0..100 {
            if !runner.is_running() {
                break;
            }
            now += Duration::from_millis(250);
            runner.poll(now);
        }
        assert_eq!(runner.state(), RunState::Completed);
        rx.try_iter().collect()
    }

    fn log_texts(events: &[InstallerEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|evt| match evt {
                InstallerEvent::Log(line) => Some(line.text.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn percent_rounds_like_the_progress_bar() {
        assert_eq!(percent(0.5, 7), 7);
        assert_eq!(percent(1.0, 7), 14);
        assert_eq!(percent(6.5, 7), 93);
        assert_eq!(percent(7.0, 7), 100);
        assert_eq!(percent(0.5, 9), 6);
    }

    #[test]
    fn step_states_are_monotonic_with_one_active() {
        let options = InstallOptions::new("560.35.03", KernelVariant::Open, true);
        let events = run_to_end(7, options);

        let total = match &events[0] {
            InstallerEvent::Started { steps, .. } => steps.len(),
            other => panic!("unexpected first event {other:?}"),
        };
        assert_eq!(total, 9);

        let mut states = vec![StepStatus::Pending; total];
        for evt in &events {
            if let InstallerEvent::Step { index, status } = evt {
                match status {
                    StepStatus::Running => {
                        assert_eq!(states[*index], StepStatus::Pending);
                        assert!(states[..*index].iter().all(|s| *s == StepStatus::Done));
                    }
                    StepStatus::Done => assert_eq!(states[*index], StepStatus::Running),
                    StepStatus::Pending => panic!("steps never go back to pending"),
                }
                states[*index] = *status;
                let active = states
                    .iter()
                    .filter(|s| **s == StepStatus::Running)
                    .count();
                assert!(active <= 1);
            }
        }
        assert!(states.iter().all(|s| *s == StepStatus::Done));
    }

    #[test]
    fn progress_never_decreases_and_ends_at_100() {
        let options = InstallOptions::new("560.35.03", KernelVariant::Proprietary, false);
        let events = run_to_end(11, options);
        let progress: Vec<u8> = events
            .iter()
            .filter_map(|evt| match evt {
                InstallerEvent::Progress(value) => Some(*value),
                _ => None,
            })
            .collect();
        assert!(progress.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(progress.last(), Some(&100));
        assert_eq!(events.last(), Some(&InstallerEvent::Done));
    }

    #[test]
    fn log_text_does_not_depend_on_timing() {
        let options = InstallOptions::new("555.58.02", KernelVariant::Open, true);
        let first = log_texts(&run_to_end(1, options.clone()));
        let second = log_texts(&run_to_end(99, options));
        assert_eq!(first, second);
        assert!(first.contains(&"→ Verifying installation...".to_string()));
        assert!(first.contains(&"  ✓ Verifying installation — done".to_string()));
        assert!(first.contains(&"[Deep Clean] Purged old DKMS modules".to_string()));
        assert_eq!(
            first.last().map(String::as_str),
            Some("Reboot the system for changes to take effect.")
        );
    }

    #[test]
    fn first_step_waits_for_start_delay() {
        let (mut runner, rx) = runner(3);
        let base = Instant::now();
        let options = InstallOptions::new("560.35.03", KernelVariant::Proprietary, false);
        runner.trigger(options, false, &config().host, base).unwrap();
        let _ = rx.try_iter().count();

        runner.poll(base + Duration::from_millis(1199));
        assert!(rx.try_iter().next().is_none());
        assert_eq!(runner.session().unwrap().states()[0], StepStatus::Pending);

        runner.poll(base + START_DELAY);
        assert_eq!(runner.session().unwrap().states()[0], StepStatus::Running);
        let wake = runner.next_wake().unwrap();
        let delay = wake - (base + START_DELAY);
        assert!(delay >= Duration::from_millis(600) && delay < Duration::from_millis(1600));
    }

    #[test]
    fn step_completes_only_after_its_delay() {
        let (mut runner, _rx) = runner(5);
        let base = Instant::now();
        let options = InstallOptions::new("560.35.03", KernelVariant::Proprietary, false);
        runner.trigger(options, false, &config().host, base).unwrap();
        runner.poll(base + START_DELAY);
        let wake = runner.next_wake().unwrap();

        runner.poll(wake - Duration::from_millis(1));
        assert_eq!(runner.session().unwrap().index(), 0);

        runner.poll(wake);
        let session = runner.session().unwrap();
        assert_eq!(session.index(), 1);
        assert_eq!(session.states()[0], StepStatus::Done);
        assert_eq!(session.states()[1], StepStatus::Running);
    }

    #[test]
    fn trigger_while_running_is_rejected() {
        let (mut runner, _rx) = runner(9);
        let base = Instant::now();
        let options = InstallOptions::new("560.35.03", KernelVariant::Proprietary, false);
        runner
            .trigger(options.clone(), false, &config().host, base)
            .unwrap();
        runner.poll(base + START_DELAY);
        runner.poll(runner.next_wake().unwrap());
        let index = runner.session().unwrap().index();
        assert_eq!(index, 1);

        let other = InstallOptions::new("550.120", KernelVariant::Open, true);
        let err = runner
            .trigger(other, true, &config().host, base + Duration::from_secs(3))
            .unwrap_err();
        assert_eq!(err, InstallError::AlreadyRunning);
        let session = runner.session().unwrap();
        assert_eq!(session.index(), index);
        assert_eq!(session.options(), &options);
    }

    #[test]
    fn missing_version_is_rejected() {
        let (mut runner, rx) = runner(2);
        let options = InstallOptions::new("", KernelVariant::Open, false);
        let err = runner
            .trigger(options, false, &config().host, Instant::now())
            .unwrap_err();
        assert_eq!(err, InstallError::MissingSelection);
        assert_eq!(runner.state(), RunState::Idle);
        assert!(rx.try_iter().next().is_none());
    }

    #[test]
    fn completed_run_can_be_replaced() {
        let (mut runner, rx) = runner(4);
        let base = Instant::now();
        let options = InstallOptions::new("560.35.03", KernelVariant::Open, false);
        runner.trigger(options, false, &config().host, base).unwrap();
        let mut now = base;
        while runner.is_running() {
            now += Duration::from_secs(2);
            runner.poll(now);
        }
        let _ = rx.try_iter().count();

        let next = InstallOptions::new("550.120", KernelVariant::Proprietary, true);
        runner.trigger(next, true, &config().host, now).unwrap();
        assert_eq!(runner.state(), RunState::Running);
        assert_eq!(runner.session().unwrap().steps().len(), 9);
        match rx.try_recv() {
            Ok(InstallerEvent::Started { title, .. }) => {
                assert_eq!(title, "Installing NVIDIA Proprietary Driver")
            }
            other => panic!("expected Started, got {other:?}"),
        }
    }

    #[test]
    fn poll_without_session_is_a_no_op() {
        let (mut runner, rx) = runner(0);
        runner.poll(Instant::now());
        assert_eq!(runner.state(), RunState::Idle);
        assert!(rx.try_iter().next().is_none());
    }
}
