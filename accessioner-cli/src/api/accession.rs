//! `AccessionClient` backed by the ArchivesSpace API
//!
//! Repository ids, the event authorizer and top container lists are looked
//! up lazily and cached for the lifetime of the accessioner (one run).

use std::collections::HashMap;

use async_trait::async_trait;
use log::{debug, info, warn};
use serde_json::{Value, json};

use super::client::ArchivesSpaceClient;
use super::error::ApiError;
use super::models::{
    apply_update, first_ancestor, linked_top_containers, new_archival_object, new_event,
    repository_map, response_uri,
};
use crate::accession::{AccessionClient, AccessionFailure, AccessionOutcome, AccessionRow, SheetAction};

/// (top container URI, indicator)
type ContainerList = Vec<(String, String)>;

/// Applies accessioning rows through an authenticated ArchivesSpace session
pub struct ArchivesSpaceAccessioner {
    client: ArchivesSpaceClient,
    username: String,
    event_authorizer: Option<String>,
    repositories: Option<HashMap<String, String>>,
    agent_uri: Option<String>,
    containers: HashMap<String, ContainerList>,
}

impl ArchivesSpaceAccessioner {
    /// Wrap a client that has already logged in as `username`
    pub fn new(client: ArchivesSpaceClient, username: &str, event_authorizer: Option<String>) -> Self {
        Self {
            client,
            username: username.to_string(),
            event_authorizer: event_authorizer.filter(|a| !a.trim().is_empty()),
            repositories: None,
            agent_uri: None,
            containers: HashMap::new(),
        }
    }

    async fn repository_id(&mut self, code: &str) -> Result<String, ApiError> {
        if self.repositories.is_none() {
            let list = self.client.get_json("/repositories").await?;
            let map = repository_map(&list);
            debug!("Loaded {} repositories", map.len());
            self.repositories = Some(map);
        }

        self.repositories
            .as_ref()
            .and_then(|repos| repos.get(code))
            .cloned()
            .ok_or_else(|| ApiError::not_found("repository", code))
    }

    /// Agent recorded as authorizer on events
    ///
    /// A configured authorizer other than the logged-in user must match
    /// exactly one person agent; otherwise the current user's agent is used.
    async fn agent_uri(&mut self) -> Result<String, ApiError> {
        if let Some(uri) = &self.agent_uri {
            return Ok(uri.clone());
        }

        let uri = match self.event_authorizer.clone() {
            Some(name) if name != self.username => self.search_agent(&name).await?,
            _ => {
                let user = self.client.get_json("/users/current-user").await?;
                user.pointer("/agent_record/ref")
                    .and_then(|r| r.as_str())
                    .map(|r| r.to_string())
                    .ok_or_else(|| ApiError::not_found("agent for current user", self.username.clone()))?
            }
        };

        info!("Event authorizer agent: {}", uri);
        self.agent_uri = Some(uri.clone());
        Ok(uri)
    }

    async fn search_agent(&self, name: &str) -> Result<String, ApiError> {
        let path = format!(
            "/search?page=1&type%5B%5D=agent_person&q=title:{}",
            urlencoding::encode(name)
        );
        let results = self.client.get_json(&path).await?;
        let hits = results.get("total_hits").and_then(|h| h.as_u64()).unwrap_or(0);

        match hits {
            1 => results
                .pointer("/results/0/uri")
                .and_then(|u| u.as_str())
                .map(|u| u.to_string())
                .ok_or_else(|| ApiError::not_found("agent", name)),
            0 => Err(ApiError::not_found("agent", name)),
            n => Err(ApiError::not_found(
                "unique agent",
                format!("{} ({} matches)", name, n),
            )),
        }
    }

    /// Resolve a container indicator to a top container URI
    async fn top_container_uri(
        &mut self,
        repo_id: &str,
        record_id: &str,
        indicator: &str,
    ) -> Result<String, ApiError> {
        let key = format!("{}/{}", repo_id, record_id);
        if !self.containers.contains_key(&key) {
            let list = self.load_containers(repo_id, record_id).await?;
            self.containers.insert(key.clone(), list);
        }

        self.containers
            .get(&key)
            .and_then(|list| list.iter().find(|(_, ind)| ind == indicator))
            .map(|(uri, _)| uri.clone())
            .ok_or_else(|| ApiError::not_found("top container", indicator))
    }

    /// Containers linked to the record, falling back to its first ancestor
    async fn load_containers(&self, repo_id: &str, record_id: &str) -> Result<ContainerList, ApiError> {
        let record = self
            .client
            .get_json(&format!("/repositories/{}/archival_objects/{}", repo_id, record_id))
            .await?;

        let mut uris = linked_top_containers(&record);
        if uris.is_empty() {
            if let Some(parent_ref) = first_ancestor(&record) {
                debug!("No containers on {}, checking ancestor {}", record_id, parent_ref);
                let parent = self.client.get_json(parent_ref).await?;
                uris = linked_top_containers(&parent);
            }
        }

        if uris.is_empty() {
            return Err(ApiError::not_found(
                "top container link",
                format!("archival object {} or its parent", record_id),
            ));
        }

        let mut list = Vec::with_capacity(uris.len());
        for uri in uris {
            let container = self.client.get_json(&uri).await?;
            let indicator = match container.get("indicator") {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => continue,
            };
            list.push((uri, indicator));
        }
        Ok(list)
    }

    /// Post the row's events against a saved object, collecting (slot, URI)
    /// as each one succeeds
    async fn post_events(
        &mut self,
        repo_id: &str,
        row: &AccessionRow,
        object_uri: &str,
        event_uris: &mut Vec<(usize, String)>,
    ) -> Result<(), ApiError> {
        if row.events.is_empty() {
            return Ok(());
        }

        let agent = self.agent_uri().await?;
        let events_path = format!("/repositories/{}/events", repo_id);
        for event in &row.events {
            let body = new_event(event, &agent, object_uri);
            let response = self.client.post_json(&events_path, &body).await?;
            let event_uri = response_uri(&response)
                .ok_or_else(|| ApiError::decode(&events_path, "response has no uri"))?;
            event_uris.push((event.slot, event_uri.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl AccessionClient for ArchivesSpaceAccessioner {
    async fn accession(
        &mut self,
        action: SheetAction,
        row: &AccessionRow,
    ) -> Result<AccessionOutcome, AccessionFailure> {
        let repo_id = self.repository_id(&row.repository_code).await?;
        let record_id = row.parent.archival_object_id.clone();

        let top_container = match &row.top_container {
            Some(indicator) => Some(self.top_container_uri(&repo_id, &record_id, indicator).await?),
            None => None,
        };

        let (path, mut record, previous) = match action {
            SheetAction::Update => {
                let path = format!("/repositories/{}/archival_objects/{}", repo_id, record_id);
                let previous = self.client.get_json(&path).await?;
                let Value::Object(mut fields) = previous.clone() else {
                    return Err(ApiError::decode(&path, "archival object is not a JSON object").into());
                };
                apply_update(&mut fields, row, top_container.as_deref());
                (path, Value::Object(fields), Some(previous))
            }
            SheetAction::Create => {
                let resource_id = row
                    .parent
                    .resource_id
                    .as_deref()
                    .ok_or_else(|| ApiError::not_found("resource id", record_id.clone()))?;
                let record = new_archival_object(row, &repo_id, resource_id, top_container.as_deref());
                (format!("/repositories/{}/archival_objects", repo_id), record, None)
            }
        };

        let response = self.client.post_json(&path, &record).await?;
        let uri = response_uri(&response)
            .map(|u| u.to_string())
            .ok_or_else(|| ApiError::decode(&path, "response has no uri"))?;
        if let Some(fields) = record.as_object_mut() {
            fields.insert("uri".to_string(), json!(uri));
        }
        debug!("Row {}: {} {}", row.index, action, uri);

        // From here on the object exists; a failure must still report it
        let mut event_uris = Vec::new();
        let posted = self.post_events(&repo_id, row, &uri, &mut event_uris).await;
        let outcome = AccessionOutcome {
            uri,
            event_uris,
            record,
            previous,
        };
        match posted {
            Ok(()) => Ok(outcome),
            Err(error) => {
                warn!("Row {}: {} saved, events incomplete: {}", row.index, outcome.uri, error);
                Err(AccessionFailure {
                    error,
                    partial: Some(outcome),
                })
            }
        }
    }
}
