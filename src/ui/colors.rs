use ratatui::style::Color;

pub(crate) const PURE_WHITE: Color = Color::Rgb(255, 255, 255);
pub(crate) const AMBER: Color = Color::Rgb(245, 158, 11);
pub(crate) const EMERALD: Color = Color::Rgb(16, 185, 129);
