//! The three setup tabs and the application that assembles them.

pub mod boot;
pub mod info;
pub mod setup;
pub mod time;

pub use boot::{BootManager, BootView};
pub use info::{FirmwareSummary, InfoProvider, Logo};
pub use setup::SetupApp;
pub use time::{Clock, DateTime, TimeView};
