// Driver choices that shape a simulated install

// Kernel module flavour for NVIDIA GPUs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KernelVariant {
    Open,        // Open kernel module (nvidia-open)
    Proprietary, // Closed-source akmod-nvidia
}

impl KernelVariant {
    pub fn is_open(self) -> bool {
        matches!(self, KernelVariant::Open)
    }

    pub fn from_open_flag(open: bool) -> Self {
        if open {
            KernelVariant::Open
        } else {
            KernelVariant::Proprietary
        }
    }

    // Short name used in titles and the final success line
    pub fn short_label(self) -> &'static str {
        match self {
            KernelVariant::Open => "Open Kernel",
            KernelVariant::Proprietary => "Proprietary",
        }
    }

    // Name used in the operation header of the log
    pub fn kernel_type_label(self) -> &'static str {
        match self {
            KernelVariant::Open => "Open Kernel Module",
            KernelVariant::Proprietary => "Proprietary (Closed Source)",
        }
    }

    // Only the closed driver comes with a license to accept
    pub fn eula_notice(self) -> Option<&'static str> {
        match self {
            KernelVariant::Open => None,
            KernelVariant::Proprietary => {
                Some("By installing the NVIDIA Proprietary driver, you agree to the NVIDIA EULA.")
            }
        }
    }
}

// Everything a run needs from the user. Frozen once the run starts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstallOptions {
    pub version: String,
    pub variant: KernelVariant,
    pub deep_clean: bool,
}

impl InstallOptions {
    pub fn new(version: impl Into<String>, variant: KernelVariant, deep_clean: bool) -> Self {
        Self {
            version: version.into(),
            variant,
            deep_clean,
        }
    }

    pub fn open_kernel(&self) -> bool {
        self.variant.is_open()
    }
}

pub fn yes_no(value: bool) -> &'static str {
    if value {
        "YES"
    } else {
        "NO"
    }
}

pub fn on_off(value: bool) -> &'static str {
    if value {
        "ON"
    } else {
        "OFF"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eula_is_shown_for_proprietary_only() {
        assert_eq!(
            KernelVariant::Proprietary.eula_notice(),
            Some("By installing the NVIDIA Proprietary driver, you agree to the NVIDIA EULA.")
        );
        assert_eq!(KernelVariant::Open.eula_notice(), None);
        assert!(KernelVariant::from_open_flag(false).eula_notice().is_some());
    }

    #[test]
    fn options_expose_the_open_flag() {
        let options = InstallOptions::new("550.120", KernelVariant::Open, true);
        assert!(options.open_kernel());
        assert_eq!(yes_no(options.deep_clean), "YES");
        assert_eq!(on_off(false), "OFF");
    }
}
