//! Aggregated state for the server, channel and profile screens.
//!
//! View models never surface errors: failed fetches are logged and leave
//! empty or absent values in their observables.

use std::collections::HashMap;

use cosmea_shared::{ChannelId, ServerId, UserId};
use cosmea_store::{ChannelData, ProfileData, ServerData};
use futures::future::join_all;
use tracing::info;

use crate::error::OrAbsent;
use crate::services::{ChannelService, ServerService, UserService};
use crate::session::Session;
use crate::state::Observable;

/// Channels per server, in the order of the server's `channels` list.
/// `None` marks an id whose document could not be read.
pub type ChannelsByServer = HashMap<ServerId, Vec<Option<ChannelData>>>;

pub struct ServersViewModel {
    server_service: ServerService,
    channel_service: ChannelService,
    servers: Observable<Vec<ServerData>>,
    channels_by_server: Observable<ChannelsByServer>,
}

impl ServersViewModel {
    pub fn new(server_service: ServerService, channel_service: ChannelService) -> Self {
        Self {
            server_service,
            channel_service,
            servers: Observable::default(),
            channels_by_server: Observable::default(),
        }
    }

    pub fn servers(&self) -> &Observable<Vec<ServerData>> {
        &self.servers
    }

    pub fn channels_by_server(&self) -> &Observable<ChannelsByServer> {
        &self.channels_by_server
    }

    /// Fetch every server, then the channels of the first one only.
    ///
    /// Each observable is written once.  Other servers' channels stay
    /// absent until [`ServersViewModel::load_channels`] is called for them.
    /// Calling this again replaces both snapshots.
    pub async fn load_all(&self) {
        let servers = self
            .server_service
            .get_all_servers()
            .await
            .or_absent("load servers")
            .unwrap_or_default();
        self.servers.set(servers.clone());

        let mut channels = ChannelsByServer::new();
        if let Some(first) = servers.first() {
            let fetched = self.fetch_channels(&first.id, &first.channels).await;
            channels.insert(first.id.clone(), fetched);
        }

        info!(
            servers = servers.len(),
            loaded_channel_sets = channels.len(),
            "Loaded servers"
        );
        self.channels_by_server.set(channels);
    }

    /// Fetch the channels of `server_id` and add them to the mapping.
    pub async fn load_channels(&self, server_id: &ServerId) {
        let Some(server) = self
            .server_service
            .get_server(server_id)
            .await
            .or_absent("load server for channels")
        else {
            return;
        };

        let fetched = self.fetch_channels(&server.id, &server.channels).await;
        self.channels_by_server.update(|map| {
            map.insert(server.id.clone(), fetched);
        });
    }

    async fn fetch_channels(&self, server_id: &ServerId, ids: &[ChannelId]) -> Vec<Option<ChannelData>> {
        let reads = ids
            .iter()
            .map(|channel_id| self.channel_service.get_channel(server_id, channel_id));

        join_all(reads)
            .await
            .into_iter()
            .map(|result| result.or_absent("load channel"))
            .collect()
    }
}

/// Single-channel state for the channel screen.
pub struct ChannelViewModel {
    channel_service: ChannelService,
    channel: Observable<Option<ChannelData>>,
}

impl ChannelViewModel {
    pub fn new(channel_service: ChannelService) -> Self {
        Self {
            channel_service,
            channel: Observable::default(),
        }
    }

    pub fn channel(&self) -> &Observable<Option<ChannelData>> {
        &self.channel
    }

    pub async fn fetch_channel_data(&self, server_id: &ServerId, channel_id: &ChannelId) {
        let channel = self
            .channel_service
            .get_channel(server_id, channel_id)
            .await
            .or_absent("fetch channel");
        self.channel.set(channel);
    }
}

/// Profile of the signed-in user.
pub struct ProfileViewModel {
    users: UserService,
    profile: Observable<Option<ProfileData>>,
}

impl ProfileViewModel {
    pub fn new(users: UserService) -> Self {
        Self {
            users,
            profile: Observable::default(),
        }
    }

    pub fn profile(&self) -> &Observable<Option<ProfileData>> {
        &self.profile
    }

    /// Load the profile of the session's current user; clears the state
    /// when nobody is signed in.
    pub async fn load(&self, session: &Session) {
        match session.current_user_id() {
            Some(id) => self.load_for(id).await,
            None => self.profile.set(None),
        }
    }

    pub async fn load_for(&self, id: &UserId) {
        let profile = self.users.get_profile(id).await.or_absent("load profile");
        self.profile.set(profile);
    }
}
