use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use ghostwriter_llm::{GroundingPolicy, LlmSettings};
use ghostwriter_utils::env::{
    ConfigurationError, ProcessEnv, VarSource, env_string, env_string_or, env_u16,
};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5328;
pub const DEFAULT_CONTEXT_DIR: &str = "context";
pub const DEFAULT_CONTEXT_EXTENSION: &str = "txt";

/// Everything read from the environment at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_address: SocketAddr,
    pub context_dir: PathBuf,
    pub context_extension: String,
    pub grounding: GroundingPolicy,
    pub llm: LlmSettings,
}

impl AppConfig {
    pub fn from_source(source: &impl VarSource) -> Result<Self, ConfigurationError> {
        let host = env_string_or(source, "HOST", DEFAULT_HOST);
        let port = env_u16(source, "PORT", DEFAULT_PORT)?;
        let ip = host
            .parse::<IpAddr>()
            .map_err(|_| ConfigurationError::Invalid {
                key: "HOST".to_owned(),
                value: host.clone(),
                expected: "an IP address",
            })?;
        let bind_address = SocketAddr::new(ip, port);

        let grounding = match env_string(source, "GROUNDING_POLICY") {
            Some(raw) => {
                GroundingPolicy::parse(&raw).ok_or_else(|| ConfigurationError::Invalid {
                    key: "GROUNDING_POLICY".to_owned(),
                    value: raw,
                    expected: "`strict` or `lenient`",
                })?
            }
            None => GroundingPolicy::default(),
        };

        Ok(Self {
            bind_address,
            context_dir: PathBuf::from(env_string_or(
                source,
                "CONTEXT_DIR",
                DEFAULT_CONTEXT_DIR,
            )),
            context_extension: env_string_or(
                source,
                "CONTEXT_EXTENSION",
                DEFAULT_CONTEXT_EXTENSION,
            ),
            grounding,
            llm: LlmSettings::from_source(source)?,
        })
    }

    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_source(&ProcessEnv)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;

    use ghostwriter_llm::GroundingPolicy;
    use ghostwriter_utils::ConfigurationError;

    use super::AppConfig;

    fn vars(pairs: &[(&'static str, &'static str)]) -> HashMap<&'static str, &'static str> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn defaults_match_the_original_deployment() {
        let config = AppConfig::from_source(&vars(&[("OPENAI_API_KEY", "sk-abc")])).unwrap();

        assert_eq!(config.bind_address.to_string(), "127.0.0.1:5328");
        assert_eq!(config.context_dir, PathBuf::from("context"));
        assert_eq!(config.context_extension, "txt");
        assert_eq!(config.grounding, GroundingPolicy::Strict);
        assert_eq!(config.llm.model, "gpt-4o-mini");
    }

    #[test]
    fn overrides_are_applied() {
        let config = AppConfig::from_source(&vars(&[
            ("OPENAI_API_KEY", "sk-abc"),
            ("HOST", "0.0.0.0"),
            ("PORT", "8080"),
            ("CONTEXT_DIR", "/srv/notes"),
            ("CONTEXT_EXTENSION", "md"),
            ("GROUNDING_POLICY", "lenient"),
        ]))
        .unwrap();

        assert_eq!(config.bind_address.to_string(), "0.0.0.0:8080");
        assert_eq!(config.context_dir, PathBuf::from("/srv/notes"));
        assert_eq!(config.context_extension, "md");
        assert_eq!(config.grounding, GroundingPolicy::Lenient);
    }

    #[test]
    fn ipv6_hosts_are_accepted() {
        let config = AppConfig::from_source(&vars(&[("OPENAI_API_KEY", "sk-abc"), ("HOST", "::1")]))
            .unwrap();
        assert_eq!(config.bind_address.to_string(), "[::1]:5328");
    }

    #[test]
    fn missing_credential_is_fatal() {
        let err = AppConfig::from_source(&vars(&[])).unwrap_err();
        assert!(matches!(err, ConfigurationError::Missing { .. }));
    }

    #[test]
    fn invalid_values_are_fatal() {
        for (key, value) in [
            ("GROUNDING_POLICY", "vibes"),
            ("HOST", "not-an-ip"),
            ("PORT", "eighty"),
        ] {
            let result = AppConfig::from_source(&vars(&[("OPENAI_API_KEY", "sk-abc"), (key, value)]));
            assert!(
                matches!(result, Err(ConfigurationError::Invalid { .. })),
                "{key}={value}"
            );
        }
    }
}
