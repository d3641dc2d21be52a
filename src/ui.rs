// src/ui.rs
use iced::widget::{button, container};
use iced::{Background, Color, Theme};
use once_cell::sync::Lazy;

#[derive(Debug, Clone, Copy)]
pub struct Styles {
    pub bg: Color,
    pub fg: Color,
    pub sidebar_bg: Color,
    pub accent: Color,
    pub accent_hover: Color,
    pub accent_fg: Color,
    pub header_bg: Color,
    pub header_fg: Color,
    pub grid: Color,
    pub success_bg: Color,
    pub error_bg: Color,
    pub warning_bg: Color,
    pub banner_fg: Color,
}

pub static DARK_THEME: Lazy<Styles> = Lazy::new(|| Styles {
    bg: Color::from_rgb(0.0, 0.0, 0.0),
    fg: Color::from_rgb(1.0, 1.0, 1.0),
    sidebar_bg: Color::from_rgb(0.11, 0.11, 0.11),
    accent: Color::from_rgb(0.0078, 0.325, 0.6118), // #02539c
    accent_hover: Color::from_rgb(0.0, 0.26, 0.5),
    accent_fg: Color::from_rgb(1.0, 1.0, 1.0),
    header_bg: Color::from_rgb(0.2, 0.2, 0.2),
    header_fg: Color::from_rgb(1.0, 1.0, 1.0),
    grid: Color::from_rgb(0.25, 0.25, 0.25),
    success_bg: Color::from_rgb(0.09, 0.32, 0.16),
    error_bg: Color::from_rgb(0.45, 0.1, 0.1),
    warning_bg: Color::from_rgb(0.45, 0.35, 0.05),
    banner_fg: Color::from_rgb(1.0, 1.0, 1.0),
});

pub static LIGHT_THEME: Lazy<Styles> = Lazy::new(|| Styles {
    bg: Color::from_rgb(1.0, 1.0, 1.0),
    fg: Color::from_rgb(0.0, 0.0, 0.0),
    sidebar_bg: Color::from_rgb(0.94, 0.95, 0.96),
    accent: Color::from_rgb(0.0078, 0.325, 0.6118), // #02539c
    accent_hover: Color::from_rgb(0.0, 0.26, 0.5),
    accent_fg: Color::from_rgb(1.0, 1.0, 1.0),
    header_bg: Color::from_rgb(0.8784, 0.8784, 0.8784), // #e0e0e0
    header_fg: Color::from_rgb(0.0, 0.0, 0.0),
    grid: Color::from_rgb(0.85, 0.85, 0.85),
    success_bg: Color::from_rgb(0.84, 0.94, 0.86),
    error_bg: Color::from_rgb(0.98, 0.85, 0.85),
    warning_bg: Color::from_rgb(1.0, 0.95, 0.8),
    banner_fg: Color::from_rgb(0.0, 0.0, 0.0),
});

pub fn styles(dark: bool) -> Styles {
    if dark {
        *DARK_THEME
    } else {
        *LIGHT_THEME
    }
}

/// Solid background panel.
pub struct Panel {
    pub bg: Color,
    pub fg: Color,
    pub border: Option<Color>,
}

impl Panel {
    pub fn new(bg: Color, fg: Color) -> Self {
        Panel { bg, fg, border: None }
    }

    pub fn bordered(bg: Color, fg: Color, border: Color) -> Self {
        Panel {
            bg,
            fg,
            border: Some(border),
        }
    }

    pub fn into_style(self) -> iced::theme::Container {
        iced::theme::Container::Custom(Box::new(self))
    }
}

impl container::StyleSheet for Panel {
    type Style = Theme;

    fn appearance(&self, _style: &Self::Style) -> container::Appearance {
        container::Appearance {
            background: Some(Background::Color(self.bg)),
            text_color: Some(self.fg),
            border_width: if self.border.is_some() { 1.0 } else { 0.0 },
            border_color: self.border.unwrap_or(Color::TRANSPARENT),
            ..Default::default()
        }
    }
}

pub struct AccentButton {
    pub bg: Color,
    pub fg: Color,
    pub hover_bg: Color,
}

impl AccentButton {
    pub fn from_styles(styles: &Styles) -> Self {
        AccentButton {
            bg: styles.accent,
            fg: styles.accent_fg,
            hover_bg: styles.accent_hover,
        }
    }

    pub fn into_style(self) -> iced::theme::Button {
        iced::theme::Button::Custom(Box::new(self))
    }
}

impl button::StyleSheet for AccentButton {
    type Style = Theme;

    fn active(&self, _style: &Self::Style) -> button::Appearance {
        button::Appearance {
            background: Some(Background::Color(self.bg)),
            border_radius: 4.0.into(),
            text_color: self.fg,
            ..Default::default()
        }
    }

    fn hovered(&self, style: &Self::Style) -> button::Appearance {
        button::Appearance {
            background: Some(Background::Color(self.hover_bg)),
            ..self.active(style)
        }
    }

    fn disabled(&self, style: &Self::Style) -> button::Appearance {
        let active = self.active(style);
        button::Appearance {
            background: Some(Background::Color(Color { a: 0.5, ..self.bg })),
            text_color: Color { a: 0.6, ..self.fg },
            ..active
        }
    }
}
