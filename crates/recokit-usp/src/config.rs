//! Session configuration resolved from site properties
//!
//! Translation of the opaque named-property strings into a typed session
//! configuration. Resolution is pure: it reads a snapshot of the property
//! store, has no side effects beyond logging, and caches nothing across
//! sessions.

use recokit_stt::NamedProperties;
use tracing::warn;

use crate::transport::{AuthKind, EndpointKind, RecoMode};

/// Property keys consumed by the resolver. Key lookup is case-sensitive;
/// endpoint and reco-mode *values* are interpreted case-insensitively.
pub mod keys {
    pub const ENDPOINT: &str = "SPEECH-Endpoint";
    pub const SUBSCRIPTION_KEY: &str = "SPEECH-SubscriptionKey";
    pub const AUTH_TOKEN: &str = "SPEECH-AuthToken";
    pub const RPS_TOKEN: &str = "SPEECH-RpsToken";
    pub const RECO_MODE: &str = "SPEECH-RecoMode";
    pub const RECO_LANGUAGE: &str = "SPEECH-RecoLanguage";
    /// Lowercase spelling, consulted for endpoint selection.
    pub const CUSTOM_MODEL_ID_SELECT: &str = "CUSTOMSPEECH-modelId";
    /// Mixed-case spelling, consulted when applying the model id.
    /// TODO: reconcile with CUSTOM_MODEL_ID_SELECT once it is known whether
    /// the two spellings are really distinct properties.
    pub const CUSTOM_MODEL_ID_APPLY: &str = "CUSTOMSPEECH-ModelId";
}

/// Which service entry point to open, and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointConfig {
    BingSpeech,
    Cris,
    Cortana,
    CustomUrl(String),
}

impl EndpointConfig {
    /// The well-known endpoint kind, or `None` for a caller-supplied URL.
    pub fn kind(&self) -> Option<EndpointKind> {
        match self {
            EndpointConfig::BingSpeech => Some(EndpointKind::BingSpeech),
            EndpointConfig::Cris => Some(EndpointKind::Cris),
            EndpointConfig::Cortana => Some(EndpointKind::Cortana),
            EndpointConfig::CustomUrl(_) => None,
        }
    }
}

/// Authentication scheme plus its secret, first non-empty property wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthConfig {
    None,
    SubscriptionKey(String),
    AuthToken(String),
    RpsToken(String),
}

impl AuthConfig {
    /// Split into the transport's (kind, data) shape; `None` when no auth
    /// was configured.
    pub fn as_parts(&self) -> Option<(AuthKind, &str)> {
        match self {
            AuthConfig::None => None,
            AuthConfig::SubscriptionKey(key) => Some((AuthKind::SubscriptionKey, key)),
            AuthConfig::AuthToken(token) => Some((AuthKind::AuthToken, token)),
            AuthConfig::RpsToken(token) => Some((AuthKind::RpsToken, token)),
        }
    }
}

/// Typed session configuration, derived freshly on each `init`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub endpoint: EndpointConfig,
    /// Ignored by the transport when the endpoint is a custom URL.
    pub reco_mode: RecoMode,
    pub auth: AuthConfig,
    pub language: Option<String>,
    pub model_id: Option<String>,
}

impl SessionConfig {
    pub fn from_properties(properties: &dyn NamedProperties) -> Self {
        let endpoint_value = properties.string_value(keys::ENDPOINT);
        let select_model_id = properties.string_value(keys::CUSTOM_MODEL_ID_SELECT);
        let apply_model_id = properties.string_value(keys::CUSTOM_MODEL_ID_APPLY);

        // Two spellings of the model-id key exist; selection reads one and
        // application reads the other. Flag any disagreement.
        if select_model_id != apply_model_id {
            warn!(
                select = %select_model_id,
                apply = %apply_model_id,
                "model-id property spellings disagree ({} vs {})",
                keys::CUSTOM_MODEL_ID_SELECT,
                keys::CUSTOM_MODEL_ID_APPLY,
            );
        }

        let endpoint = if !select_model_id.is_empty() {
            EndpointConfig::Cris
        } else if endpoint_value.eq_ignore_ascii_case("CORTANA") {
            EndpointConfig::Cortana
        } else if !endpoint_value.is_empty() {
            EndpointConfig::CustomUrl(endpoint_value)
        } else {
            EndpointConfig::BingSpeech
        };

        Self {
            endpoint,
            reco_mode: resolve_reco_mode(&properties.string_value(keys::RECO_MODE)),
            auth: resolve_auth(properties),
            language: non_empty(properties.string_value(keys::RECO_LANGUAGE)),
            model_id: non_empty(apply_model_id),
        }
    }
}

fn resolve_reco_mode(value: &str) -> RecoMode {
    if value.is_empty() || value.eq_ignore_ascii_case("INTERACTIVE") {
        RecoMode::Interactive
    } else if value.eq_ignore_ascii_case("CONVERSATION") {
        RecoMode::Conversation
    } else if value.eq_ignore_ascii_case("DICTATION") {
        RecoMode::Dictation
    } else {
        RecoMode::Unknown
    }
}

fn resolve_auth(properties: &dyn NamedProperties) -> AuthConfig {
    let subscription_key = properties.string_value(keys::SUBSCRIPTION_KEY);
    let auth_token = properties.string_value(keys::AUTH_TOKEN);
    let rps_token = properties.string_value(keys::RPS_TOKEN);

    if !subscription_key.is_empty() {
        AuthConfig::SubscriptionKey(subscription_key)
    } else if !auth_token.is_empty() {
        AuthConfig::AuthToken(auth_token)
    } else if !rps_token.is_empty() {
        AuthConfig::RpsToken(rps_token)
    } else {
        AuthConfig::None
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapProperties(HashMap<&'static str, &'static str>);

    impl MapProperties {
        fn new(entries: &[(&'static str, &'static str)]) -> Self {
            Self(entries.iter().copied().collect())
        }
    }

    impl NamedProperties for MapProperties {
        fn string_value(&self, key: &str) -> String {
            self.0.get(key).copied().unwrap_or("").to_string()
        }
    }

    #[test]
    fn custom_endpoint_wins_over_defaults() {
        let props = MapProperties::new(&[
            (keys::ENDPOINT, "wss://example/stt"),
            (keys::SUBSCRIPTION_KEY, "abc"),
        ]);
        let config = SessionConfig::from_properties(&props);

        assert_eq!(
            config.endpoint,
            EndpointConfig::CustomUrl("wss://example/stt".into())
        );
        assert_eq!(config.auth, AuthConfig::SubscriptionKey("abc".into()));
    }

    #[test]
    fn model_id_selects_cris_over_cortana() {
        let props = MapProperties::new(&[
            (keys::CUSTOM_MODEL_ID_SELECT, "m1"),
            (keys::ENDPOINT, "CORTANA"),
        ]);
        let config = SessionConfig::from_properties(&props);
        assert_eq!(config.endpoint, EndpointConfig::Cris);
    }

    #[test]
    fn cortana_endpoint_matches_case_insensitively() {
        let props = MapProperties::new(&[(keys::ENDPOINT, "cortana")]);
        let config = SessionConfig::from_properties(&props);
        assert_eq!(config.endpoint, EndpointConfig::Cortana);
    }

    #[test]
    fn auth_precedence_prefers_subscription_key() {
        let props = MapProperties::new(&[
            (keys::SUBSCRIPTION_KEY, "key"),
            (keys::AUTH_TOKEN, "token"),
            (keys::RPS_TOKEN, "rps"),
        ]);
        let config = SessionConfig::from_properties(&props);
        assert_eq!(config.auth, AuthConfig::SubscriptionKey("key".into()));
    }

    #[test]
    fn auth_token_beats_rps_token() {
        let props =
            MapProperties::new(&[(keys::AUTH_TOKEN, "token"), (keys::RPS_TOKEN, "rps")]);
        let config = SessionConfig::from_properties(&props);
        assert_eq!(config.auth, AuthConfig::AuthToken("token".into()));
    }

    #[test]
    fn empty_snapshot_resolves_to_defaults() {
        let props = MapProperties::new(&[]);
        let config = SessionConfig::from_properties(&props);

        assert_eq!(config.endpoint, EndpointConfig::BingSpeech);
        assert_eq!(config.reco_mode, RecoMode::Interactive);
        assert_eq!(config.auth, AuthConfig::None);
        assert_eq!(config.language, None);
        assert_eq!(config.model_id, None);
    }

    #[test]
    fn reco_mode_values_parse_case_insensitively() {
        for (value, expected) in [
            ("interactive", RecoMode::Interactive),
            ("Conversation", RecoMode::Conversation),
            ("DICTATION", RecoMode::Dictation),
            ("free-form", RecoMode::Unknown),
        ] {
            let props = MapProperties::new(&[(keys::RECO_MODE, value)]);
            let config = SessionConfig::from_properties(&props);
            assert_eq!(config.reco_mode, expected, "value {value:?}");
        }
    }

    #[test]
    fn model_id_spellings_are_read_independently() {
        // Only the lowercase spelling set: CRIS is selected but there is no
        // model id to apply.
        let props = MapProperties::new(&[(keys::CUSTOM_MODEL_ID_SELECT, "m1")]);
        let config = SessionConfig::from_properties(&props);
        assert_eq!(config.endpoint, EndpointConfig::Cris);
        assert_eq!(config.model_id, None);

        // Only the mixed-case spelling set: model id applies but endpoint
        // selection never saw it.
        let props = MapProperties::new(&[(keys::CUSTOM_MODEL_ID_APPLY, "m2")]);
        let config = SessionConfig::from_properties(&props);
        assert_eq!(config.endpoint, EndpointConfig::BingSpeech);
        assert_eq!(config.model_id, Some("m2".into()));
    }

    #[test]
    fn resolution_is_pure_over_a_snapshot() {
        let props = MapProperties::new(&[
            (keys::ENDPOINT, "CORTANA"),
            (keys::AUTH_TOKEN, "t"),
            (keys::RECO_LANGUAGE, "en-US"),
            (keys::RECO_MODE, "dictation"),
        ]);
        let first = SessionConfig::from_properties(&props);
        let second = SessionConfig::from_properties(&props);
        assert_eq!(first, second);
    }

    #[test]
    fn language_is_unset_when_empty() {
        let props = MapProperties::new(&[(keys::RECO_LANGUAGE, "")]);
        let config = SessionConfig::from_properties(&props);
        assert_eq!(config.language, None);
    }
}
