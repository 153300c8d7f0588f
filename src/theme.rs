use ratatui::style::{Color, Modifier, Style};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ThemeMode {
    Light,
    Dark,
}

#[derive(Clone, Debug)]
pub struct Theme {
    #[allow(dead_code)]
    pub mode: ThemeMode,
    pub bg: Color,
    pub fg: Color,
    pub accent: Color,
    pub secondary: Color,
    pub frame: Color,
    pub selected: Color,
    pub success: Color,
    pub error: Color,
    pub muted: Color,
}

impl Theme {
    pub fn slate_dark() -> Self {
        Self {
            mode: ThemeMode::Dark,
            bg: Color::Rgb(22, 24, 28),
            fg: Color::White,
            accent: Color::Rgb(80, 170, 255),
            secondary: Color::Rgb(140, 200, 170),
            frame: Color::Rgb(90, 90, 100),
            selected: Color::Rgb(255, 150, 40),
            success: Color::Green,
            error: Color::Red,
            muted: Color::DarkGray,
        }
    }

    pub fn slate_light() -> Self {
        Self {
            mode: ThemeMode::Light,
            bg: Color::Rgb(246, 246, 248),
            fg: Color::Rgb(22, 24, 28),
            accent: Color::Rgb(30, 110, 210),
            secondary: Color::Rgb(40, 130, 100),
            frame: Color::Rgb(200, 200, 210),
            selected: Color::Rgb(210, 110, 20),
            success: Color::Rgb(0, 140, 0),
            error: Color::Rgb(190, 0, 0),
            muted: Color::Rgb(120, 120, 130),
        }
    }

    pub fn from_mode(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Dark => Self::slate_dark(),
            ThemeMode::Light => Self::slate_light(),
        }
    }

    /// Config value -> palette; anything unrecognized falls back to dark.
    pub fn from_name(name: Option<&str>) -> Self {
        match name {
            Some(n) if n.eq_ignore_ascii_case("light") => Self::from_mode(ThemeMode::Light),
            _ => Self::from_mode(ThemeMode::Dark),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::slate_dark()
    }
}

// Style helpers that use the theme
impl Theme {
    pub fn border_focused(&self) -> Style {
        Style::default().fg(self.selected)
    }

    pub fn border_unfocused(&self) -> Style {
        Style::default().fg(self.frame)
    }

    pub fn text_active(&self) -> Style {
        Style::default().fg(self.accent)
    }

    pub fn text_active_bold(&self) -> Style {
        Style::default()
            .fg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    pub fn text_editing_bold(&self) -> Style {
        Style::default()
            .fg(self.selected)
            .add_modifier(Modifier::BOLD)
    }

    pub fn text_muted(&self) -> Style {
        Style::default().fg(self.muted)
    }

    pub fn text_error(&self) -> Style {
        Style::default().fg(self.error)
    }

    pub fn list_cursor_style(&self) -> Style {
        Style::default()
            .fg(self.bg)
            .bg(self.selected)
            .add_modifier(Modifier::BOLD)
    }

    pub fn base_style(&self) -> Style {
        Style::default().bg(self.bg).fg(self.fg)
    }

    pub fn toast_color(&self, level: crate::ui::ToastLevel) -> Color {
        match level {
            crate::ui::ToastLevel::Success => self.success,
            crate::ui::ToastLevel::Error => self.error,
            crate::ui::ToastLevel::Info => self.accent,
        }
    }
}

// Widget-level helpers that fall back to the default palette.
pub fn border_focused() -> Style {
    Theme::default().border_focused()
}

pub fn border_unfocused() -> Style {
    Theme::default().border_unfocused()
}

pub fn text_active() -> Style {
    Theme::default().text_active()
}

pub fn text_active_bold() -> Style {
    Theme::default().text_active_bold()
}

pub fn text_editing_bold() -> Style {
    Theme::default().text_editing_bold()
}

pub fn text_muted() -> Style {
    Theme::default().text_muted()
}

pub fn text_error() -> Style {
    Theme::default().text_error()
}

pub fn list_cursor_style() -> Style {
    Theme::default().list_cursor_style()
}
