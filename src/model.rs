use std::collections::VecDeque;
use std::fmt;
use std::fs::File;

use chrono::{Local, NaiveTime};

use crate::installer::StepDescriptor;

// State of a single planned step. Transitions only Pending -> Running -> Done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Pending, // Not yet started
    Running, // The one step currently being worked on
    Done,    // Completed
}

// A timestamped line of install output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub stamp: NaiveTime,
    pub text: String,
}

impl LogLine {
    pub fn now(text: impl Into<String>) -> Self {
        Self {
            stamp: Local::now().time(),
            text: text.into(),
        }
    }
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.stamp.format("%H:%M:%S"), self.text)
    }
}

// Events sent from the run loop to the UI
#[derive(Debug, Clone, PartialEq)]
pub enum InstallerEvent {
    // A new run began; clears the previous run's steps and log
    Started {
        title: String,
        steps: Vec<StepDescriptor>,
    },
    // A log line to append to the panel
    Log(LogLine),
    // Overall progress in percent, never decreasing within a run
    Progress(u8),
    // A step changed state
    Step { index: usize, status: StepStatus },
    // The run finished; done/reboot actions become available
    Done,
}

// Single step as shown on the progress screen
pub struct Step {
    pub name: String,
    pub tag: &'static str,
    pub status: StepStatus,
}

// Progress screen state, fed only by InstallerEvents
pub struct App {
    pub title: String,
    pub steps: Vec<Step>,
    // Overall progress in percent
    pub progress: u8,
    pub logs: VecDeque<String>,
    pub spinner_idx: usize,
    pub done: bool,
    // An optional handle to the log file for writing logs to disk
    pub log_file: Option<File>,
}

impl App {
    pub fn new(log_file: Option<File>) -> Self {
        Self {
            title: String::new(),
            steps: Vec::new(),
            progress: 0,
            logs: VecDeque::new(),
            spinner_idx: 0,
            done: false,
            log_file,
        }
    }
}
