use k8s_openapi::api::core::v1 as core;

/// Reference to a key in an existing kubernetes `Secret`
///
/// Only the reference is ever generated; secret values never pass through here.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SecretKeyRef {
    /// Name of the Secret object
    pub name: String,
    /// Key within the Secret
    pub key: String,
}

/// Environment variable to inject into a container
///
/// Either a plain `value` or a `secretKeyRef`:
///
/// ```yaml
/// env:
/// - name: WORLD_NAME
///   value: Dedicated
/// - name: MYSQL_ROOT_PASSWORD
///   secretKeyRef:
///     name: homeautomation
///     key: MYSQL_ROOT_PASSWORD
/// ```
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct EnvVar {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key_ref: Option<SecretKeyRef>,
}

impl EnvVar {
    pub fn plain(name: &str, value: impl ToString) -> Self {
        EnvVar {
            name: name.into(),
            value: Some(value.to_string()),
            secret_key_ref: None,
        }
    }

    pub fn secret(name: &str, secret: &str, key: &str) -> Self {
        EnvVar {
            name: name.into(),
            value: None,
            secret_key_ref: Some(SecretKeyRef {
                name: secret.into(),
                key: key.into(),
            }),
        }
    }

    pub fn to_kube(&self) -> core::EnvVar {
        let value_from = self.secret_key_ref.as_ref().map(|r| core::EnvVarSource {
            secret_key_ref: Some(core::SecretKeySelector {
                name: Some(r.name.clone()),
                key: r.key.clone(),
                optional: None,
            }),
            ..Default::default()
        });
        core::EnvVar {
            name: self.name.clone(),
            // a secret reference takes precedence over a stray value
            value: if value_from.is_some() { None } else { self.value.clone() },
            value_from,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::EnvVar;

    #[test]
    fn secret_reference_only() {
        let ev = EnvVar::secret("DATABASE_PASS", "teslamate", "DATABASE_PASSWORD").to_kube();
        assert_eq!(ev.name, "DATABASE_PASS");
        assert!(ev.value.is_none());
        let sel = ev.value_from.unwrap().secret_key_ref.unwrap();
        assert_eq!(sel.name.as_deref(), Some("teslamate"));
        assert_eq!(sel.key, "DATABASE_PASSWORD");
    }

    #[test]
    fn plain_value() {
        let ev = EnvVar::plain("PUID", 1000).to_kube();
        assert_eq!(ev.value.as_deref(), Some("1000"));
        assert!(ev.value_from.is_none());
    }

    #[test]
    fn parse_yaml() {
        let env: Vec<EnvVar> = serde_yaml::from_str(concat!(
            "- name: VALHEIM_PLUS\n",
            "  value: \"true\"\n",
            "- name: PASS\n",
            "  secretKeyRef: {name: media, key: PASS}\n",
        ))
        .unwrap();
        assert_eq!(env[0], EnvVar::plain("VALHEIM_PLUS", "true"));
        assert_eq!(env[1], EnvVar::secret("PASS", "media", "PASS"));
    }
}
