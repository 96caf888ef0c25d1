pub const SPINNER_LEN: usize = 4;
pub(crate) const SPINNER: [&str; SPINNER_LEN] = ["|", "/", "-", "\\"];
pub(crate) const BANNER_ART: [&str; 5] = [
    r" ___      _                  _",
    r"|   \ _ _(_)_ _____ _ _   __(_)_ __",
    r"| |) | '_| \ V / -_) '_| (_-< | '  \",
    r"|___/|_| |_|\_/\___|_|   /__/_|_|_|_|",
    "",
];

// UI submodules
mod colors;
mod common;
mod confirm;
mod expert;
mod home;
mod installer;
mod monitor;

pub use common::draw_ui;
