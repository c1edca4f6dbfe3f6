//! Color palette shared by every pane and the connector layer

use ratatui::style::Color;

pub struct Theme {
    pub fg: Color,
    pub primary: Color,   // Blue
    pub secondary: Color, // Orange
    pub comment: Color,   // Grey
    pub success: Color,   // Green
    pub error: Color,     // Red
    pub string: Color,
    pub number: Color,
    pub border_normal: Color,
    pub border_active: Color, // Frame of the executing function
    pub current_line_bg: Color,
    pub function: Color,
    pub type_name: Color,    // Heap box labels
    pub return_value: Color, // "Return value" slot
    pub pointer: Color,      // Anchor glyphs and connectors
}

pub const DEFAULT_THEME: Theme = Theme {
    fg: Color::Rgb(205, 214, 244),
    primary: Color::Rgb(137, 180, 250),
    secondary: Color::Rgb(250, 179, 135),
    comment: Color::Rgb(108, 112, 134),
    success: Color::Rgb(166, 227, 161),
    error: Color::Rgb(243, 139, 168),
    string: Color::Rgb(250, 179, 135),
    number: Color::Rgb(250, 179, 135),
    border_normal: Color::Rgb(108, 112, 134),
    border_active: Color::Rgb(249, 226, 175), // Yellow, same as function names
    current_line_bg: Color::Rgb(50, 50, 70),
    function: Color::Rgb(249, 226, 175),
    type_name: Color::Rgb(148, 226, 213),
    return_value: Color::Rgb(245, 194, 231),
    pointer: Color::Rgb(137, 180, 250),
};
