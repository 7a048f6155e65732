use std::fmt;

pub const DEFAULT_API_HOST: &str = "api.apple-cloudkit.com";

/// Deployment segment encoded into every request path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target of the requests built by one request manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestConfig {
    version: String,
    container_id: String,
    database: String,
    environment: Environment,
    api_host: String,
}

impl RequestConfig {
    pub fn new(
        version: impl Into<String>,
        container_id: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            version: version.into(),
            container_id: container_id.into(),
            database: database.into(),
            environment: Environment::default(),
            api_host: DEFAULT_API_HOST.to_string(),
        }
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_api_host(mut self, api_host: impl Into<String>) -> Self {
        self.api_host = api_host.into();
        self
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn api_host(&self) -> &str {
        &self.api_host
    }

    /// `/database/<version>/<container>/<environment>/<database>/<operation>`
    pub fn full_path(&self, operation_path: &str) -> String {
        [
            "/database",
            self.version.as_str(),
            self.container_id.as_str(),
            self.environment.as_str(),
            self.database.as_str(),
            operation_path.trim_start_matches('/'),
        ]
        .join("/")
    }

    pub fn url(&self, operation_path: &str) -> String {
        format!("https://{}{}", self.api_host, self.full_path(operation_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_config_keeps_its_values() {
        let config = RequestConfig::new("3", "com.test.go", "public");
        assert_eq!(config.version(), "3");
        assert_eq!(config.container_id(), "com.test.go");
        assert_eq!(config.database(), "public");
        assert_eq!(config.environment(), Environment::Development);
        assert_eq!(config.api_host(), DEFAULT_API_HOST);
    }

    #[test]
    fn full_path_layout() {
        let config = RequestConfig::new("1", "iCloud.com.elbedev.shelve.dev", "public");
        assert_eq!(
            config.full_path("records/modify"),
            "/database/1/iCloud.com.elbedev.shelve.dev/development/public/records/modify"
        );
    }

    #[test]
    fn leading_slash_is_not_doubled() {
        let config = RequestConfig::new("1", "container", "private");
        assert_eq!(
            config.full_path("/users/caller"),
            "/database/1/container/development/private/users/caller"
        );
    }

    #[test]
    fn production_url() {
        let config = RequestConfig::new("1", "container", "public")
            .with_environment(Environment::Production)
            .with_api_host("example.test");
        assert_eq!(
            config.url("records/query"),
            "https://example.test/database/1/container/production/public/records/query"
        );
    }
}
