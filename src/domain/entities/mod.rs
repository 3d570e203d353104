pub mod link;
pub mod session;
pub mod user;

pub use link::{Attribution, LinkAnalytics, LinkStatus, NewLink, ShortLink};
pub use session::{NewSession, Session};
pub use user::{NewUser, User};
