use serde::{Deserialize, Serialize};

/// Semantic color tokens resolved by each renderer's palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThemeToken {
    Background,
    Surface,
    Border,

    // Hero text box
    CopyBoxFill,
    CopyTitle,
    CopyBody,
    ButtonFill,
    ButtonText,

    // Slide controls
    ArrowFill,
    ArrowIcon,
    DotActive,
    DotInactive,
    SlidePlaceholder,

    // Ticker
    TickerBackground,
    TickerBorder,
    TickerText,

    // Link row
    LinkBarBackground,
    LinkBarText,
    LinkFill,
    LinkText,
}
