// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Resource marker granting an application privilege on every resource.
pub const ALL_RESOURCE: &str = "*";

/// Privileges a role may be granted on this server.
pub const KIBANA_PRIVILEGES: [&str; 2] = ["all", "read"];

/// Longest role name, in UTF-16 code units.
pub const MAX_ROLE_NAME_LENGTH: usize = 1024;

/// Path parameters of the role routes.
#[derive(Debug, Deserialize, Validate)]
pub struct RoleParams {
    #[validate(custom(function = "validate_role_name"))]
    pub name: String,
}

/// Names must hold 1 to 1024 UTF-16 code units and must not be a dot segment,
/// which cannot be addressed in a URL path.
fn validate_role_name(name: &str) -> Result<(), ValidationError> {
    let length = name.encode_utf16().count();
    if length == 0 || length > MAX_ROLE_NAME_LENGTH {
        return Err(ValidationError::new("length").with_message(
            format!("name length must be between 1 and {MAX_ROLE_NAME_LENGTH} characters").into(),
        ));
    }
    if name == "." || name == ".." {
        return Err(ValidationError::new("reserved")
            .with_message(format!("name must not be '{name}'").into()));
    }
    Ok(())
}

/// Accepts a missing field but refuses an explicit `null`.
fn non_null<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Body of `PUT /api/security/role/{name}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct RolePayload {
    #[serde(
        default,
        deserialize_with = "non_null",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Map<String, Value>>,
    #[serde(
        default,
        deserialize_with = "non_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub elasticsearch: Option<ElasticsearchPrivileges>,
    #[serde(
        default,
        deserialize_with = "non_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub kibana: Option<KibanaPrivileges>,
}

/// Cluster and index level permissions of a role.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ElasticsearchPrivileges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indices: Option<Vec<IndexPrivilege>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_as: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct IndexPrivilege {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub names: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_security: Option<FieldSecurity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privileges: Option<Vec<String>>,
    /// Document level security query, may be empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct FieldSecurity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grant: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub except: Option<Vec<String>>,
}

/// Kibana privileges of a role, granted globally or per space.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct KibanaPrivileges {
    #[serde(
        default,
        deserialize_with = "non_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub global: Option<Vec<String>>,
    #[serde(
        default,
        deserialize_with = "non_null",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<Object>)]
    pub space: Option<SpacePrivileges>,
}

/// Per-space privileges, kept in the order the spaces appear in the request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpacePrivileges(pub Vec<(String, Vec<String>)>);

impl SpacePrivileges {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0
            .iter()
            .map(|(space, privileges)| (space.as_str(), privileges.as_slice()))
    }
}

impl Serialize for SpacePrivileges {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (space, privileges) in &self.0 {
            map.serialize_entry(space, privileges)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SpacePrivileges {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = SpacePrivileges;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of space ids to privilege lists")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries: Vec<(String, Vec<String>)> =
                    Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((space, privileges)) = access.next_entry::<String, Vec<String>>()? {
                    // A repeated key overrides the earlier value but keeps its position
                    match entries.iter_mut().find(|(existing, _)| *existing == space) {
                        Some(entry) => entry.1 = privileges,
                        None => entries.push((space, privileges)),
                    }
                }
                Ok(SpacePrivileges(entries))
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

/// One application privilege entry as stored by the Elasticsearch security API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationPrivilege {
    pub application: String,
    pub privileges: Vec<String>,
    pub resources: Vec<String>,
}

/// Role document sent to the Elasticsearch security API.
///
/// Empty sections are left out of the serialized document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EsRole {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cluster: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub indices: Vec<IndexPrivilege>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub run_as: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub applications: Vec<ApplicationPrivilege>,
}

/// The part of a stored role this server reads back before an update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoredRole {
    #[serde(default)]
    pub applications: Vec<ApplicationPrivilege>,
}
