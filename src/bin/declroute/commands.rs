use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use declroute::validator::validate;
use declroute::{ApiServer, HttpRequest, ModelFile, RouteTable, ServerConfig};
use http::Method;
use serde_json::Value;
use tracing::error;

use crate::catalog;

/// Inspect the route table and validators of the bundled controller catalog.
#[derive(Parser)]
#[command(name = "declroute", version)]
#[command(about = "Declarative controller routing and body validation", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the composed route table
    Routes {
        /// Server configuration file (YAML); environment variables still apply
        #[arg(short, long, env = "DECLROUTE_CONFIG")]
        config: Option<PathBuf>,

        /// Print the table as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Validate a JSON body against a model
    Validate {
        /// Model name: a catalog model or one declared in --models
        #[arg(short, long)]
        model: String,

        /// JSON payload
        #[arg(short, long)]
        body: String,

        /// Model definition file (YAML or JSON)
        #[arg(long)]
        models: Option<PathBuf>,
    },
    /// Dispatch one request through the catalog server
    Request {
        /// HTTP method
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,

        /// Request target, optionally with a query string
        #[arg(short, long)]
        path: String,

        /// Request header as NAME:VALUE (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// JSON body; sets content-type to application/json unless a header does
        #[arg(short, long)]
        body: Option<String>,

        /// Server configuration file (YAML)
        #[arg(short, long, env = "DECLROUTE_CONFIG")]
        config: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Routes { config, json } => {
            let server = registered_server(config)?;
            print_routes(&server.routes(), json)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Validate {
            model,
            body,
            models,
        } => {
            let mut registry = catalog::registry().context("catalog rules are invalid")?;
            let file = models.map(ModelFile::load).transpose()?;
            if let Some(file) = &file {
                file.register(&mut registry)
                    .context("failed to register model definitions")?;
            }

            let schema = catalog::model_ref(&model, file.as_ref())
                .ok_or_else(|| anyhow!("unknown model {model}"))?
                .into_schema();
            let payload: Value = serde_json::from_str(&body).context("--body is not valid JSON")?;

            let report = validate(&payload, &schema, &registry)?;
            match report.to_message() {
                None => {
                    println!("{model}: valid");
                    Ok(ExitCode::SUCCESS)
                }
                Some(message) => {
                    println!("{message}");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Commands::Request {
            method,
            path,
            headers,
            body,
            config,
        } => {
            let server = registered_server(config)?;
            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                .with_context(|| format!("invalid method {method}"))?;

            let mut parsed: Vec<(&str, &str)> = headers
                .iter()
                .map(|h| {
                    h.split_once(':')
                        .map(|(k, v)| (k.trim(), v.trim()))
                        .ok_or_else(|| anyhow!("header {h} is not NAME:VALUE"))
                })
                .collect::<Result<_>>()?;
            let has_content_type = parsed
                .iter()
                .any(|(k, _)| k.eq_ignore_ascii_case("content-type"));
            if body.is_some() && !has_content_type {
                parsed.push(("content-type", "application/json"));
            }

            let raw = body.unwrap_or_default();
            let response = match HttpRequest::parse(method, &path, &parsed, raw.as_bytes()) {
                Ok(request) => server.handle(request),
                Err(err) => {
                    println!("{} {}", err.status, err.message);
                    return Ok(ExitCode::FAILURE);
                }
            };

            println!("{}", response.status);
            for (name, value) in &response.headers {
                println!("{name}: {value}");
            }
            if let Some(body) = &response.body {
                println!();
                println!("{}", serde_json::to_string_pretty(body)?);
            }
            Ok(if response.status < 400 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

fn registered_server(config: Option<PathBuf>) -> Result<ApiServer> {
    let config = match config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::from_env(),
    };
    let registry = catalog::registry().context("catalog rules are invalid")?;
    let mut server = catalog::server(config, registry);
    if let Err(err) = server.register_controllers() {
        error!(error = %err, "controller registration failed");
        return Err(err.into());
    }
    Ok(server)
}

fn print_routes(table: &RouteTable, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(table)?);
        return Ok(());
    }
    for route in table {
        let mut flags = Vec::new();
        if route.authenticate {
            flags.push("auth".to_string());
        }
        if let Some(model) = &route.body_model {
            flags.push(format!("body={model}"));
        }
        if let Some(content_type) = route.content_type {
            flags.push(format!("content-type={}", content_type.media_type().unwrap_or("*")));
        }
        println!(
            "{:<7} {:<40} {}.{} {}",
            route.verb.as_str(),
            route.route,
            route.controller,
            route.member,
            flags.join(" ")
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_request_command() {
        let cli = Cli::try_parse_from([
            "declroute",
            "request",
            "-X",
            "post",
            "--path",
            "/test/post_json_echo",
            "-H",
            "x-trace: 1",
            "--body",
            r#"{"a":1}"#,
        ])
        .unwrap();
        match cli.command {
            Commands::Request {
                method,
                path,
                headers,
                body,
                ..
            } => {
                assert_eq!(method, "post");
                assert_eq!(path, "/test/post_json_echo");
                assert_eq!(headers, vec!["x-trace: 1".to_string()]);
                assert_eq!(body.as_deref(), Some(r#"{"a":1}"#));
            }
            _ => panic!("expected request command"),
        }
    }

    #[test]
    fn test_catalog_routes_register() {
        let server = registered_server(None).unwrap();
        let routes: Vec<(String, String)> = server
            .routes()
            .into_iter()
            .map(|r| (r.verb.to_string(), r.route))
            .collect();
        assert!(routes.contains(&("GET".to_string(), "/products/:id?".to_string())));
        assert!(routes.contains(&("GET".to_string(), "/testroute".to_string())));
        assert!(routes.contains(&("GET".to_string(), "/test/OverrideRoute".to_string())));
        assert!(!routes.iter().any(|(_, r)| r.contains("should_not_register")));
    }
}
