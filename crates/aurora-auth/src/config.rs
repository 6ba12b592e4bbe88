//! Access-control configuration.
//!
//! Read once at startup; every field is a process-lifetime constant.

/// Configuration for the tenancy and access-control services.
#[derive(Debug, Clone)]
pub struct AccessConfig {
    /// Email granted an unconditional permission bypass
    /// (case-insensitive match). `None` disables the bypass.
    pub superadmin_email: Option<String>,
    /// Primary domain of the fallback "demo" workspace used when
    /// neither an explicit selection nor a domain mapping resolves.
    pub fallback_workspace_domain: String,
    /// Base URL for invite links when the inviting workspace has no
    /// domain of its own (e.g., `https://crm.example.com`).
    pub base_url: Option<String>,
    /// Path appended to the chosen base when building invite links.
    pub invite_accept_path: String,
    /// Default invite validity in days when the caller supplies none.
    pub invite_default_days: u32,
    /// Inclusive bounds on the caller-supplied validity window.
    pub invite_min_days: u32,
    pub invite_max_days: u32,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            superadmin_email: None,
            fallback_workspace_domain: "aurora.demo".into(),
            base_url: None,
            invite_accept_path: "/accept-invite".into(),
            invite_default_days: 7,
            invite_min_days: 1,
            invite_max_days: 30,
        }
    }
}

impl AccessConfig {
    /// Build a config from the process environment
    /// (`SUPERADMIN_EMAIL`, `DEMO_WORKSPACE_DOMAIN`, `BASE_URL`),
    /// falling back to defaults for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            superadmin_email: std::env::var("SUPERADMIN_EMAIL").ok(),
            fallback_workspace_domain: std::env::var("DEMO_WORKSPACE_DOMAIN")
                .unwrap_or(defaults.fallback_workspace_domain),
            base_url: std::env::var("BASE_URL").ok(),
            ..defaults
        }
    }
}
