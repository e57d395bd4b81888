pub mod announcement;
pub mod snapshot;
pub mod theme;
pub mod types;

pub use announcement::AnnouncementItem;
pub use snapshot::{HeroAction, HeroSnapshot, SlideView, TickerView};
pub use theme::ThemeToken;
pub use types::{CallToAction, HeroCopy, ScrollMetrics};
