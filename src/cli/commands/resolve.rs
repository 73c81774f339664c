use anyhow::Context;
use clap::Args;
use serde_json::json;

use crate::auth::Principal;
use crate::cli::{utils, OutputFormat};
use crate::config::{AppConfig, TenantUrlMode};
use crate::tenant::{RequestFacts, RoutingDecision, TenantResolver, TenantSlug};

#[derive(Args, Debug)]
pub struct ResolveArgs {
    #[arg(long, help = "Host header, e.g. acme.localhost:3000")]
    pub host: Option<String>,

    #[arg(long, default_value = "/", help = "Request path")]
    pub path: String,

    #[arg(long, help = "Query string, without the leading '?'")]
    pub query: Option<String>,

    #[arg(long, help = "Account slug bound to the session")]
    pub account: Option<String>,

    #[arg(long, default_value = "cli-user", help = "Session subject")]
    pub subject: String,

    #[arg(long, conflicts_with = "account", help = "Resolve without a session")]
    pub anonymous: bool,

    #[arg(long, help = "Override TENANT_URL_MODE (path, local, subdomain)")]
    pub url_mode: Option<TenantUrlMode>,
}

pub fn handle(args: ResolveArgs, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let mut config = config.clone();
    if let Some(mode) = args.url_mode {
        config.tenancy.url_mode = mode;
    }
    let resolver = TenantResolver::from_config(&config);

    let principal = if args.anonymous {
        None
    } else {
        let tenant = args
            .account
            .as_deref()
            .map(TenantSlug::parse)
            .transpose()
            .context("Invalid --account")?;
        Some(Principal::new(args.subject.clone(), tenant))
    };

    let facts = RequestFacts {
        host: args.host.as_deref(),
        path: &args.path,
        query: args.query.as_deref(),
    };
    let resolution = resolver.resolve(&facts, principal.as_ref());
    let host_kind = resolver.host_kind(args.host.as_deref());

    let (action, target) = match &resolution.decision {
        RoutingDecision::PassThrough => ("pass_through", None),
        RoutingDecision::Rewrite { path } => ("rewrite", Some(path.clone())),
        RoutingDecision::Redirect { location } => ("redirect", Some(location.clone())),
    };

    utils::output_details(
        &output_format,
        &json!({
            "host": args.host,
            "host_kind": host_kind,
            "path": args.path,
            "query": args.query,
            "principal": principal,
            "rule": resolution.rule,
            "reason": resolution.reason,
            "action": action,
            "target": target,
            "tenant": resolution.tenant,
        }),
    )
}
