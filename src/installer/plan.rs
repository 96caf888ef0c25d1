// Turning install options into an ordered list of steps and the log text around them
use crate::config::HostConfig;
use crate::drivers::{on_off, yes_no, InstallOptions, KernelVariant};

// What kind of work a step simulates; the UI draws a badge per category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepCategory {
    Backup,
    Clean,
    Remove,
    Blacklist,
    Headers,
    Repository,
    OpenModule,
    ProprietaryDriver,
    Initramfs,
    Verify,
}

impl StepCategory {
    pub fn tag(self) -> &'static str {
        match self {
            StepCategory::Backup => "backup",
            StepCategory::Clean => "clean",
            StepCategory::Remove => "remove",
            StepCategory::Blacklist => "block",
            StepCategory::Headers => "kernel",
            StepCategory::Repository => "repo",
            StepCategory::OpenModule => "open",
            StepCategory::ProprietaryDriver => "driver",
            StepCategory::Initramfs => "initrd",
            StepCategory::Verify => "verify",
        }
    }
}

// A planned unit of simulated work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDescriptor {
    pub index: usize,
    pub text: &'static str,
    pub category: StepCategory,
}

/// Builds the ordered step list for a run.
///
/// Pure function of the options: 7 steps normally, 9 with deep clean. The
/// deep-clean pair always sits between the backup and the nouveau blacklist,
/// and exactly one driver step is planned.
pub fn build_plan(options: &InstallOptions) -> Vec<StepDescriptor> {
    let mut steps: Vec<(&'static str, StepCategory)> = Vec::with_capacity(9);
    steps.push(("Backing up Xorg configuration", StepCategory::Backup));

    if options.deep_clean {
        steps.push(("Deep cleaning previous driver configs", StepCategory::Clean));
        steps.push(("Removing old NVIDIA packages", StepCategory::Remove));
    }

    steps.push(("Blacklisting nouveau driver", StepCategory::Blacklist));
    steps.push((
        "Installing kernel headers (kernel-devel)",
        StepCategory::Headers,
    ));
    steps.push(("Enabling RPM Fusion repository", StepCategory::Repository));

    match options.variant {
        KernelVariant::Open => steps.push((
            "Installing NVIDIA Open Kernel Module (nvidia-open)",
            StepCategory::OpenModule,
        )),
        KernelVariant::Proprietary => steps.push((
            "Installing NVIDIA Proprietary driver (akmod-nvidia)",
            StepCategory::ProprietaryDriver,
        )),
    }

    steps.push((
        "Regenerating initramfs (dracut --force)",
        StepCategory::Initramfs,
    ));
    steps.push(("Verifying installation", StepCategory::Verify));

    steps
        .into_iter()
        .enumerate()
        .map(|(index, (text, category))| StepDescriptor {
            index,
            text,
            category,
        })
        .collect()
}

// Header printed before the first step runs, followed by the step outline
pub fn build_log_preamble(
    options: &InstallOptions,
    secure_boot: bool,
    host: &HostConfig,
    steps: &[StepDescriptor],
) -> Vec<String> {
    let mut lines = vec![
        format!(
            "--- OPERATION STARTING: NVIDIA {} ---",
            options.variant.kernel_type_label()
        ),
        format!("Version: {}", options.version),
        format!("Package Manager: {}", host.package_manager),
        format!("Kernel: {}", host.kernel),
        format!("GPU: {}", host.gpu),
        format!("Open Kernel: {}", yes_no(options.open_kernel())),
        format!("Deep Clean: {}", yes_no(options.deep_clean)),
        format!("Secure Boot: {}", on_off(secure_boot)),
        String::new(),
        "Waiting for authorization (Root/Admin)...".to_string(),
        "Please enter your password in the dialog.".to_string(),
        String::new(),
    ];
    lines.extend(
        steps
            .iter()
            .map(|step| format!("Step {}: {}...", step.index + 1, step.text)),
    );
    lines
}

// Lines appended after the last step completes
pub fn completion_summary(options: &InstallOptions) -> Vec<String> {
    let mut lines = vec![String::new()];
    if options.deep_clean {
        lines.push("[Deep Clean] Removed: /etc/X11/xorg.conf.d/nvidia*".to_string());
        lines.push("[Deep Clean] Removed: /etc/modprobe.d/nvidia*".to_string());
        lines.push("[Deep Clean] Purged old DKMS modules".to_string());
    }
    match options.variant {
        KernelVariant::Open => {
            lines.push("[Open Kernel] nvidia-open module loaded successfully".to_string());
            lines.push("[Open Kernel] Module verification: PASS".to_string());
        }
        KernelVariant::Proprietary => {
            lines.push("[Proprietary] akmod-nvidia built successfully".to_string());
            lines.push("[Proprietary] Module verification: PASS".to_string());
        }
    }
    lines.push(String::new());
    lines.push(format!(
        "SUCCESS: NVIDIA {} Installation completed.",
        options.variant.short_label()
    ));
    lines.push("Reboot the system for changes to take effect.".to_string());
    lines
}

pub fn run_title(options: &InstallOptions) -> String {
    format!("Installing NVIDIA {} Driver", options.variant.short_label())
}
