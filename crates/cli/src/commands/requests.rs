use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Subcommand, ValueEnum};
use serde_json::json;
use sputnik::http::{self, Method};
use sputnik::request::DEFAULT_API_HOST;
use sputnik::{Environment, IdentityManager, RequestConfig, RequestManager, SignedRequest};
use tracing::info;

use crate::payload;

#[derive(Debug, Subcommand)]
pub enum RequestsCommand {
    /// Send a signed POST request
    Post(RequestArgs),
    /// Send a signed GET request
    Get(RequestArgs),
}

#[derive(Debug, clap::Args)]
pub struct RequestArgs {
    /// Operation subpath, e.g. records/modify, records/query or users/caller
    #[clap(short, long)]
    operation: String,
    /// Inline JSON body
    #[clap(short, long, conflicts_with = "json_file_path")]
    payload: Option<String>,
    /// File holding the JSON body
    #[clap(short, long)]
    json_file_path: Option<PathBuf>,
    /// Container identifier, e.g. iCloud.com.example.app
    #[clap(short, long, env = "SPUTNIK_CONTAINER_ID")]
    container: String,
    #[clap(long, default_value = "public")]
    database: String,
    #[clap(long, default_value = "1")]
    api_version: String,
    #[clap(long, value_enum, default_value_t = EnvironmentArg::Development)]
    environment: EnvironmentArg,
    #[clap(long, default_value = DEFAULT_API_HOST)]
    api_host: String,
    /// Print the signed request instead of sending it
    #[clap(long)]
    dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EnvironmentArg {
    Development,
    Production,
}

impl From<EnvironmentArg> for Environment {
    fn from(value: EnvironmentArg) -> Self {
        match value {
            EnvironmentArg::Development => Environment::Development,
            EnvironmentArg::Production => Environment::Production,
        }
    }
}

pub async fn run(command: RequestsCommand, identity: &mut IdentityManager) -> Result<()> {
    let (method, args) = match command {
        RequestsCommand::Post(args) => (Method::POST, args),
        RequestsCommand::Get(args) => (Method::GET, args),
    };

    let body = payload::load(args.payload.as_deref(), args.json_file_path.as_deref())?;
    let config = RequestConfig::new(args.api_version, args.container, args.database)
        .with_environment(args.environment.into())
        .with_api_host(args.api_host);

    let request = RequestManager::new(config, identity)
        .build_request(&args.operation, method, &body)
        .context("failed to sign request")?;
    info!(method = %request.method, url = %request.uri, "signed request");

    if args.dry_run {
        println!("{}", serde_json::to_string_pretty(&describe(&request))?);
        return Ok(());
    }

    let request: http::Request<Vec<u8>> = request.try_into()?;
    let request = reqwest::Request::try_from(request).context("failed to build HTTP request")?;
    let response = reqwest::Client::new()
        .execute(request)
        .await
        .context("failed to send request")?;

    let status = response.status();
    let text = response.text().await.context("failed to read response body")?;
    println!("status: {status}");
    if !text.is_empty() {
        println!("{}", payload::pretty(&text));
    }

    if !status.is_success() {
        bail!("request failed with status {status}");
    }
    Ok(())
}

fn describe(request: &SignedRequest) -> serde_json::Value {
    let headers: serde_json::Map<String, serde_json::Value> = request
        .headers
        .iter()
        .map(|(name, value)| (name.to_string(), json!(value)))
        .collect();

    json!({
        "method": request.method.as_str(),
        "url": request.uri.to_string(),
        "headers": headers,
        "body": String::from_utf8_lossy(&request.body),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use sputnik::request::{KEY_ID_HEADER, SIGNATURE_HEADER};
    use sputnik::{KeyManager, KeyStoreConfig, SputnikError};

    #[derive(Debug, Parser)]
    struct Cli {
        #[clap(subcommand)]
        command: RequestsCommand,
    }

    fn parse(args: &[&str]) -> RequestArgs {
        let args = std::iter::once("requests").chain(args.iter().copied());
        match Cli::try_parse_from(args).unwrap().command {
            RequestsCommand::Post(args) | RequestsCommand::Get(args) => args,
        }
    }

    #[test]
    fn defaults() {
        let args = parse(&["post", "-o", "records/modify", "-c", "iCloud.com.example"]);
        assert_eq!(args.database, "public");
        assert_eq!(args.api_version, "1");
        assert_eq!(args.environment, EnvironmentArg::Development);
        assert_eq!(args.api_host, DEFAULT_API_HOST);
        assert!(!args.dry_run);
    }

    #[test]
    fn production_environment() {
        let args = parse(&[
            "get",
            "--operation",
            "users/caller",
            "--container",
            "iCloud.com.example",
            "--environment",
            "production",
        ]);
        assert_eq!(Environment::from(args.environment), Environment::Production);
    }

    #[test]
    fn payload_and_file_conflict() {
        let result = Cli::try_parse_from([
            "requests",
            "post",
            "-o",
            "records/modify",
            "-c",
            "iCloud.com.example",
            "-p",
            "{}",
            "-j",
            "body.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn describe_lists_signed_headers() {
        let dir = tempfile::tempdir().unwrap();
        let mut identity = IdentityManager::open(KeyStoreConfig::new(dir.path()));
        identity.create_signing_identity(false).unwrap();
        identity.store_key_id("abc").unwrap();

        let config = RequestConfig::new("1", "iCloud.com.example", "public");
        let request = RequestManager::new(config, &mut identity)
            .post_request("records/modify", "{}")
            .unwrap();

        let described = describe(&request);
        assert_eq!(described["method"], "POST");
        assert_eq!(
            described["url"],
            "https://api.apple-cloudkit.com/database/1/iCloud.com.example/development/public/records/modify"
        );
        assert_eq!(described["headers"][KEY_ID_HEADER], "abc");
        assert!(described["headers"][SIGNATURE_HEADER].is_string());
        assert_eq!(described["body"], "{}");
    }

    #[tokio::test]
    async fn dry_run_does_not_send() {
        let dir = tempfile::tempdir().unwrap();
        let mut identity = IdentityManager::open(KeyStoreConfig::new(dir.path()));
        identity.create_signing_identity(false).unwrap();
        identity.store_key_id("abc").unwrap();

        let args = parse(&[
            "post",
            "-o",
            "records/query",
            "-c",
            "iCloud.com.example",
            "-p",
            r#"{"query":{"recordType":"Shelve"}}"#,
            "--api-host",
            "unreachable.invalid",
            "--dry-run",
        ]);
        run(RequestsCommand::Post(args), &mut identity).await.unwrap();
    }

    #[tokio::test]
    async fn missing_identity_fails_before_sending() {
        let dir = tempfile::tempdir().unwrap();
        let mut identity = IdentityManager::open(KeyStoreConfig::new(dir.path()))
            .with_key_id_override(Some("abc".to_string()));

        let args = parse(&["get", "-o", "users/caller", "-c", "iCloud.com.example"]);
        let err = run(RequestsCommand::Get(args), &mut identity).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SputnikError>(),
            Some(SputnikError::Signing(_))
        ));
    }
}
