use ratatui::style::Color;

pub const BLUE: Color = Color::Rgb(0x89, 0xB4, 0xFA);
pub const GRAY_DIM: Color = Color::DarkGray;
pub const RED: Color = Color::Rgb(0xF3, 0x8B, 0xA8);

// Heatmap shades, no activity first.
pub const HEAT_BASELINE: Color = Color::Rgb(0x2D, 0x33, 0x3B);
pub const HEAT_STEPS: [Color; 5] = [
    Color::Rgb(0x0E, 0x44, 0x29),
    Color::Rgb(0x00, 0x6D, 0x32),
    Color::Rgb(0x26, 0xA6, 0x41),
    Color::Rgb(0x39, 0xD3, 0x53),
    Color::Rgb(0x9B, 0xE9, 0xA8),
];
