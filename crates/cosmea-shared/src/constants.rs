/// Application name
pub const APP_NAME: &str = "Cosmea";

/// Collection holding one user document per account
pub const USERS_COLLECTION: &str = "users";

/// Collection holding display profiles, keyed by the same id as `users`
pub const PROFILES_COLLECTION: &str = "profiles";

/// Collection holding server (guild) documents
pub const SERVERS_COLLECTION: &str = "servers";

/// Prefix of the per-server channel collections (`channels/{serverId}`)
pub const CHANNELS_COLLECTION: &str = "channels";

/// Document field names used by partial updates and equality queries
pub const FIELD_USERNAME: &str = "username";
pub const FIELD_EMAIL: &str = "email";
pub const FIELD_FRIENDS: &str = "friends";
pub const FIELD_PENDING_FRIENDS: &str = "pendingFriends";
pub const FIELD_FCM_TOKEN: &str = "fcmToken";
pub const FIELD_AVATAR: &str = "avatar";
pub const FIELD_CHANNELS: &str = "channels";

/// Collection path of the channels that belong to `server_id`.
pub fn channels_collection(server_id: &str) -> String {
    format!("{CHANNELS_COLLECTION}/{server_id}")
}
