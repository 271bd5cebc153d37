/// Host environment shared by every workload in a synthesis run
///
/// Loaded once by the caller and threaded into each `WorkloadSpec`.
/// Nothing here is validated; an empty domain simply yields odd host names.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Environment {
    /// Services are exposed at `<name>.<parentDomainName>`
    #[serde(rename = "parentDomainName")]
    pub parent_domain: String,
    /// Shared storage tree, mounted 1:1 into containers
    pub host_storage_path: String,
    /// Parent of every per-application config directory
    pub host_config_path: String,
    /// Numeric user id containers should run file operations as
    #[serde(rename = "userID")]
    pub user_id: u32,
    /// Numeric group id containers should run file operations as
    #[serde(rename = "groupID")]
    pub group_id: u32,
    /// Timezone, e.g. Australia/Brisbane
    #[serde(rename = "TZ")]
    pub timezone: String,
}
