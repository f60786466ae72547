// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Role management against the Elasticsearch security API.

use crate::errors::{wrap_error, ApiError};
use crate::models::role::{
    ApplicationPrivilege, EsRole, KibanaPrivileges, RolePayload, StoredRole, ALL_RESOURCE,
};
use crate::services::elasticsearch::{EsClient, EsError};
use async_trait::async_trait;
use std::sync::Arc;

/// The calls the role routes make against the security API.
#[async_trait]
pub trait SecurityApi: Send + Sync {
    /// Fetch a role, `None` when it does not exist.
    async fn get_role(&self, name: &str) -> Result<Option<StoredRole>, EsError>;

    /// Create or replace a role.
    async fn put_role(&self, name: &str, role: &EsRole) -> Result<(), EsError>;
}

#[async_trait]
impl SecurityApi for EsClient {
    async fn get_role(&self, name: &str) -> Result<Option<StoredRole>, EsError> {
        let Some(mut body) = self.get(&["_security", "role", name], &[404]).await? else {
            return Ok(None);
        };

        match body.get_mut(name).map(serde_json::Value::take) {
            Some(role) => serde_json::from_value(role)
                .map(Some)
                .map_err(|e| EsError::Decode(format!("role {name}: {e}"))),
            None => Ok(None),
        }
    }

    async fn put_role(&self, name: &str, role: &EsRole) -> Result<(), EsError> {
        let body = serde_json::to_value(role).map_err(|e| EsError::Decode(e.to_string()))?;
        self.put(&["_security", "role", name], &body).await?;
        Ok(())
    }
}

/// Turn the Kibana section of a role payload into application privilege entries.
pub fn transform_kibana_privileges(
    application: &str,
    kibana: &KibanaPrivileges,
) -> Vec<ApplicationPrivilege> {
    let mut entries = Vec::new();

    if let Some(global) = kibana.global.as_ref().filter(|g| !g.is_empty()) {
        entries.push(ApplicationPrivilege {
            application: application.to_string(),
            privileges: global.clone(),
            resources: vec![ALL_RESOURCE.to_string()],
        });
    }

    if let Some(spaces) = &kibana.space {
        for (space_id, privileges) in spaces.iter() {
            entries.push(ApplicationPrivilege {
                application: application.to_string(),
                privileges: privileges.to_vec(),
                resources: vec![format!("space:{space_id}")],
            });
        }
    }

    entries
}

/// Build the role document to store.
///
/// Entries of `existing_applications` that belong to another application are
/// kept as they are, in their original order, followed by the entries derived
/// from the payload's Kibana section.
pub fn transform_role_to_es(
    application: &str,
    payload: &RolePayload,
    existing_applications: Vec<ApplicationPrivilege>,
) -> EsRole {
    let mut applications: Vec<ApplicationPrivilege> = existing_applications
        .into_iter()
        .filter(|entry| entry.application != application)
        .collect();

    if let Some(kibana) = &payload.kibana {
        applications.extend(transform_kibana_privileges(application, kibana));
    }

    let elasticsearch = payload.elasticsearch.clone().unwrap_or_default();

    EsRole {
        metadata: payload.metadata.clone(),
        cluster: elasticsearch.cluster.unwrap_or_default(),
        indices: elasticsearch.indices.unwrap_or_default(),
        run_as: elasticsearch.run_as.unwrap_or_default(),
        applications,
    }
}

/// Check every Kibana privilege named by the payload against `known`.
pub fn validate_kibana_privileges(payload: &RolePayload, known: &[&str]) -> Result<(), ApiError> {
    let Some(kibana) = &payload.kibana else {
        return Ok(());
    };

    let check = |path: String, privileges: &[String]| -> Result<(), ApiError> {
        match privileges
            .iter()
            .enumerate()
            .find(|(_, p)| !known.contains(&p.as_str()))
        {
            Some((position, _)) => Err(ApiError::BadRequest(format!(
                "kibana.{path}[{position}] must be one of [{}]",
                known.join(", ")
            ))),
            None => Ok(()),
        }
    };

    if let Some(global) = &kibana.global {
        check("global".to_string(), global)?;
    }
    if let Some(spaces) = &kibana.space {
        for (space_id, privileges) in spaces.iter() {
            check(format!("space.{space_id}"), privileges)?;
        }
    }
    Ok(())
}

/// Stores roles for one security application.
pub struct RoleService {
    api: Arc<dyn SecurityApi>,
    application: String,
}

impl RoleService {
    pub fn new(api: Arc<dyn SecurityApi>, application: String) -> Self {
        Self { api, application }
    }

    /// Read the stored role, merge the payload into it and write it back.
    pub async fn put_role(&self, name: &str, payload: &RolePayload) -> Result<(), ApiError> {
        let existing = self
            .api
            .get_role(name)
            .await
            .map_err(wrap_error)?
            .map(|role| role.applications)
            .unwrap_or_default();

        let body = transform_role_to_es(&self.application, payload, existing);

        self.api.put_role(name, &body).await.map_err(wrap_error)?;

        tracing::info!(role = name, application = %self.application, "role saved");
        Ok(())
    }
}
