pub mod auth;
pub mod friends;
pub mod profiles;
pub mod servers;
pub mod users;

pub use auth::AuthService;
pub use servers::{ChannelService, ServerService};
pub use users::UserService;
