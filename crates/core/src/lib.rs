pub mod announcements;
pub mod banner;
pub mod config;
pub mod diagnostics;
pub mod endpoint;
#[cfg(feature = "native")]
pub mod native;
pub mod preload;
pub mod rotator;
pub mod schedule;
pub mod ticker;

pub use announcements::{AnnouncementSource, FetchError, FetchRequest};
pub use banner::{HeroBanner, HeroServices};
pub use config::{ConfigError, HeroConfig};
pub use diagnostics::{Diagnostic, Diagnostics, LogDiagnostics, MemoryDiagnostics};
pub use endpoint::{EndpointResolver, StaticEndpoint};
pub use preload::{AssetError, ImageLoader};
pub use schedule::{Cadence, FrameClock, Scheduler, TaskHandle};
