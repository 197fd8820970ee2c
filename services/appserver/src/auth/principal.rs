//! Caller identity.
//!
//! # Purpose
//! Maps the bearer token on a request to a principal and its role names.
//! Requests without a token, or with a token nobody owns, are anonymous and
//! carry no roles, which the engine treats as `["guest"]`.
use anyhow::{Context, Result};
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

pub const ANONYMOUS_SUBJECT: &str = "anonymous";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub subject: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Principal {
    pub fn anonymous() -> Self {
        Self {
            subject: ANONYMOUS_SUBJECT.to_string(),
            display_name: None,
            roles: Vec::new(),
        }
    }

    pub fn new<I, S>(subject: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            subject: subject.into(),
            display_name: None,
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.subject == ANONYMOUS_SUBJECT
    }
}

/// Resolves a bearer token into a principal. Never fails: unknown tokens
/// yield [`Principal::anonymous`].
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, token: Option<&str>) -> Principal;
}

pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(axum::http::header::AUTHORIZATION)?;
    let value = value.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

#[derive(Debug, Deserialize)]
struct PrincipalEntry {
    token: String,
    subject: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    roles: Vec<String>,
}

/// Token → principal table loaded from a YAML list:
///
/// ```yaml
/// - token: s3cr3t
///   subject: alice
///   roles: [admin]
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticTokenResolver {
    principals: HashMap<String, Principal>,
}

impl StaticTokenResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_principal(mut self, token: impl Into<String>, principal: Principal) -> Self {
        self.principals.insert(token.into(), principal);
        self
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let entries: Vec<PrincipalEntry> =
            serde_yaml::from_str(content).with_context(|| "parse principals yaml")?;
        let mut resolver = Self::new();
        for entry in entries {
            if entry.token.trim().is_empty() {
                anyhow::bail!("principal {:?} has an empty token", entry.subject);
            }
            resolver.principals.insert(
                entry.token,
                Principal {
                    subject: entry.subject,
                    display_name: entry.display_name,
                    roles: entry.roles,
                },
            );
        }
        Ok(resolver)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read principals file: {}", path.display()))?;
        let resolver = Self::from_yaml_str(&content)
            .with_context(|| format!("load principals file: {}", path.display()))?;
        tracing::info!(principals = resolver.len(), "principals loaded");
        Ok(resolver)
    }

    pub fn len(&self) -> usize {
        self.principals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.principals.is_empty()
    }
}

impl IdentityResolver for StaticTokenResolver {
    fn resolve(&self, token: Option<&str>) -> Principal {
        token
            .and_then(|token| self.principals.get(token))
            .cloned()
            .unwrap_or_else(Principal::anonymous)
    }
}
