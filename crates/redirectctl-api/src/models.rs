// Graph application wire models
//
// `Application` is written back with a full-object PATCH, so every field
// Graph returns must survive the round trip. Known fields are typed; the
// rest land in `#[serde(flatten)]` maps and are re-serialized untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Derived view of `redirectUris` that Graph also returns under `web`.
const REDIRECT_URI_SETTINGS: &str = "redirectUriSettings";

/// `GET /v1.0/applications` response envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct ApplicationList {
    #[serde(rename = "@odata.count", default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub value: Vec<Application>,
}

/// A Graph application registration, as far as this crate touches it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    /// Client ID. Stable and user-facing; used for lookup.
    pub app_id: String,
    #[serde(default)]
    pub display_name: String,
    /// Object ID. Server-assigned; used in mutation URLs.
    pub id: String,
    #[serde(default)]
    pub web: WebSettings,
    /// Entity version, when Graph includes one. Sent back as `If-Match`,
    /// never in the body.
    #[serde(rename = "@odata.etag", default, skip_serializing)]
    pub etag: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `web` block of an application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebSettings {
    #[serde(default)]
    pub implicit_grant_settings: ImplicitGrantSettings,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `web.implicitGrantSettings`. Opaque to reconciliation; preserved as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImplicitGrantSettings {
    #[serde(default)]
    pub enable_access_token_issuance: bool,
    #[serde(default)]
    pub enable_id_token_issuance: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Application {
    pub fn redirect_uris(&self) -> &[String] {
        &self.web.redirect_uris
    }

    /// Copy of this application carrying `uris` as its redirect list.
    ///
    /// When the list actually changes, the derived `redirectUriSettings`
    /// array is dropped from the body: it mirrors the old list and Graph
    /// rebuilds it from `redirectUris`.
    pub fn with_redirect_uris(&self, uris: Vec<String>) -> Self {
        let mut next = self.clone();
        if next.web.redirect_uris != uris {
            next.web.extra.remove(REDIRECT_URI_SETTINGS);
            next.web.redirect_uris = uris;
        }
        next
    }
}

// ── Caller-facing record ─────────────────────────────────────────────

/// The application as reported back to callers: identity, the settings
/// block, and the redirect list. No passthrough fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRecord {
    pub app_id: String,
    pub display_name: String,
    pub id: String,
    pub web: WebRecord,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebRecord {
    pub implicit_grant_settings: ImplicitGrantRecord,
    pub redirect_uris: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImplicitGrantRecord {
    pub enable_access_token_issuance: bool,
    pub enable_id_token_issuance: bool,
}

impl From<&Application> for ApplicationRecord {
    fn from(app: &Application) -> Self {
        Self {
            app_id: app.app_id.clone(),
            display_name: app.display_name.clone(),
            id: app.id.clone(),
            web: WebRecord {
                implicit_grant_settings: ImplicitGrantRecord {
                    enable_access_token_issuance: app
                        .web
                        .implicit_grant_settings
                        .enable_access_token_issuance,
                    enable_id_token_issuance: app.web.implicit_grant_settings.enable_id_token_issuance,
                },
                redirect_uris: app.web.redirect_uris.clone(),
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample() -> Value {
        json!({
            "@odata.etag": "W/\"abc\"",
            "id": "obj-1",
            "appId": "app-1",
            "displayName": "Portal",
            "signInAudience": "AzureADMyOrg",
            "web": {
                "homePageUrl": "https://portal.example.com",
                "implicitGrantSettings": {
                    "enableAccessTokenIssuance": false,
                    "enableIdTokenIssuance": true
                },
                "redirectUris": ["https://a/cb"],
                "redirectUriSettings": [{ "uri": "https://a/cb", "index": null }]
            }
        })
    }

    #[test]
    fn unknown_fields_survive_serialization() {
        let app: Application = serde_json::from_value(sample()).unwrap();
        assert_eq!(app.etag.as_deref(), Some("W/\"abc\""));

        let out = serde_json::to_value(&app).unwrap();
        assert_eq!(out["signInAudience"], "AzureADMyOrg");
        assert_eq!(out["web"]["homePageUrl"], "https://portal.example.com");
        assert_eq!(out["web"]["implicitGrantSettings"]["enableIdTokenIssuance"], true);
        assert!(out.get("@odata.etag").is_none());
    }

    #[test]
    fn changed_list_drops_derived_settings() {
        let app: Application = serde_json::from_value(sample()).unwrap();

        let same = app.with_redirect_uris(vec!["https://a/cb".into()]);
        assert!(same.web.extra.contains_key("redirectUriSettings"));

        let changed = app.with_redirect_uris(vec!["https://a/cb".into(), "https://b/cb".into()]);
        assert!(!changed.web.extra.contains_key("redirectUriSettings"));
        assert_eq!(changed.web.extra["homePageUrl"], "https://portal.example.com");
    }

    #[test]
    fn record_projects_caller_shape() {
        let app: Application = serde_json::from_value(sample()).unwrap();
        let record = ApplicationRecord::from(&app);
        let out = serde_json::to_value(&record).unwrap();
        assert_eq!(
            out,
            json!({
                "appId": "app-1",
                "displayName": "Portal",
                "id": "obj-1",
                "web": {
                    "implicitGrantSettings": {
                        "enableAccessTokenIssuance": false,
                        "enableIdTokenIssuance": true
                    },
                    "redirectUris": ["https://a/cb"]
                }
            })
        );
    }
}
