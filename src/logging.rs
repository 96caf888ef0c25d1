use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::Write;

use crate::model::{App, InstallerEvent, Step, StepStatus};

pub(crate) const LOG_CAPACITY: usize = 200;

// Opens (and truncates) the log file; logging to disk is best effort
pub(crate) fn open_log_file(path: &str) -> Option<File> {
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .ok()
}

pub(crate) fn handle_event(app: &mut App, evt: InstallerEvent) {
    match evt {
        InstallerEvent::Started { title, steps } => {
            app.logs.clear();
            app.progress = 0;
            app.done = false;
            app.steps = steps
                .iter()
                .map(|step| Step {
                    name: step.text.to_string(),
                    tag: step.category.tag(),
                    status: StepStatus::Pending,
                })
                .collect();
            append_log_file(&mut app.log_file, &format!("START: {}", title));
            app.title = title;
        }
        InstallerEvent::Log(line) => {
            let line = line.to_string();
            append_log_file(&mut app.log_file, &line);
            push_log(&mut app.logs, line);
        }
        InstallerEvent::Progress(value) => app.progress = value,
        InstallerEvent::Step { index, status } => {
            if let Some(step) = app.steps.get_mut(index) {
                step.status = status;
                let status_label = match step.status {
                    StepStatus::Pending => "PENDING",
                    StepStatus::Running => "RUNNING",
                    StepStatus::Done => "OK",
                };
                let line = format!("STEP {}: {}", step.name, status_label);
                append_log_file(&mut app.log_file, &line);
            }
        }
        InstallerEvent::Done => {
            app.done = true;
            append_log_file(&mut app.log_file, "DONE: ok");
        }
    }
}

// New log line
pub(crate) fn push_log(logs: &mut VecDeque<String>, line: String) {
    if logs.len() >= LOG_CAPACITY {
        logs.pop_front();
    }
    logs.push_back(line);
}

pub(crate) fn append_log_file(log_file: &mut Option<File>, line: &str) {
    if let Some(file) = log_file.as_mut() {
        let _ = writeln!(file, "{}", line);
        let _ = file.flush();
    }
}
