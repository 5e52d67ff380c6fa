//! Server and channel reads and writes.

use std::sync::Arc;

use cosmea_shared::constants::{channels_collection, FIELD_CHANNELS, SERVERS_COLLECTION};
use cosmea_shared::{ChannelId, ServerId};
use cosmea_store::models::{from_document, to_document};
use cosmea_store::{ChannelData, DocumentRef, DocumentStore, ServerData};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{AtDocument, DataError, Result};

#[derive(Clone)]
pub struct ServerService {
    store: Arc<dyn DocumentStore>,
}

impl ServerService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn server_ref(id: &ServerId) -> DocumentRef {
        DocumentRef::new(SERVERS_COLLECTION, id.as_str())
    }

    /// Every server, ordered by id.
    pub async fn get_all_servers(&self) -> Result<Vec<ServerData>> {
        let servers = self
            .store
            .list(SERVERS_COLLECTION)
            .await?
            .into_iter()
            .map(|s| s.decode::<ServerData>().map_err(DataError::from))
            .collect::<Result<Vec<_>>>()?;

        debug!(count = servers.len(), "Fetched servers");
        Ok(servers)
    }

    pub async fn get_server(&self, id: &ServerId) -> Result<ServerData> {
        let doc = Self::server_ref(id);
        let data = self.store.get(&doc).await.at(&doc)?;
        Ok(from_document(data)?)
    }

    pub async fn create_server(&self, server: &ServerData) -> Result<()> {
        let doc = Self::server_ref(&server.id);
        self.store.set(&doc, to_document(server)?).await.at(&doc)?;

        info!(server_id = %server.id, name = %server.name, "Created server");
        Ok(())
    }
}

/// Channels live in `channels/{serverId}`, one document per channel.
#[derive(Clone)]
pub struct ChannelService {
    store: Arc<dyn DocumentStore>,
}

impl ChannelService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn channel_ref(server_id: &ServerId, channel_id: &ChannelId) -> DocumentRef {
        DocumentRef::new(channels_collection(server_id.as_str()), channel_id.as_str())
    }

    pub async fn get_channel(&self, server_id: &ServerId, channel_id: &ChannelId) -> Result<ChannelData> {
        let doc = Self::channel_ref(server_id, channel_id);
        let data = self.store.get(&doc).await.at(&doc)?;
        debug!(server_id = %server_id, channel_id = %channel_id, "Fetched channel");
        Ok(from_document(data)?)
    }

    /// Every channel document stored under `server_id`, ordered by id.
    pub async fn list_channels(&self, server_id: &ServerId) -> Result<Vec<ChannelData>> {
        self.store
            .list(&channels_collection(server_id.as_str()))
            .await?
            .into_iter()
            .map(|s| s.decode::<ChannelData>().map_err(DataError::from))
            .collect()
    }

    /// Write the channel and register its id on the parent server.
    pub async fn create_channel(&self, server_id: &ServerId, channel: &ChannelData) -> Result<()> {
        let server_doc = ServerService::server_ref(server_id);
        self.store.get(&server_doc).await.at(&server_doc)?;

        let doc = Self::channel_ref(server_id, &channel.id);
        self.store.set(&doc, to_document(channel)?).await.at(&doc)?;
        self.store
            .array_union(&server_doc, FIELD_CHANNELS, vec![Value::from(channel.id.as_str())])
            .await
            .at(&server_doc)?;

        info!(server_id = %server_id, channel_id = %channel.id, name = %channel.name, "Created channel");
        Ok(())
    }
}
