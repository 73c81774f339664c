use anyhow::Context;
use clap::Args;
use serde_json::json;

use crate::auth::{issue_session_token, session_cookie_header};
use crate::cli::{utils, OutputFormat};
use crate::config::{AppConfig, MAX_JWT_EXPIRY_HOURS};
use crate::tenant::TenantSlug;

#[derive(Args, Debug)]
pub struct TokenArgs {
    #[arg(long, help = "Session subject (user id)")]
    pub subject: String,

    #[arg(long, help = "Account slug the user belongs to")]
    pub account: Option<String>,

    #[arg(long, help = "User e-mail")]
    pub email: Option<String>,

    #[arg(long, help = "Lifetime in hours (defaults to SECURITY_JWT_EXPIRY_HOURS)")]
    pub hours: Option<u64>,
}

pub fn handle(args: TokenArgs, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let tenant = args
        .account
        .as_deref()
        .map(TenantSlug::parse)
        .transpose()
        .context("Invalid --account")?;

    let mut security = config.security.clone();
    if let Some(hours) = args.hours {
        security.jwt_expiry_hours = hours;
    }
    let max_age = cookie_max_age(security.jwt_expiry_hours)?;

    let token = issue_session_token(&security, &args.subject, args.email.as_deref(), tenant.as_ref())?;

    match output_format {
        OutputFormat::Text => println!("{}", token),
        OutputFormat::Json => {
            let cookie = session_cookie_header(
                &security.session_cookie,
                &token,
                max_age,
                security.require_https,
            );
            utils::output_success(
                &output_format,
                "Session token issued",
                Some(json!({
                    "token": token,
                    "cookie": cookie,
                    "subject": args.subject,
                    "account": tenant,
                    "expires_in_hours": security.jwt_expiry_hours,
                })),
            )?;
        }
    }

    Ok(())
}

/// Cookie `Max-Age` in seconds for a lifetime given in hours.
fn cookie_max_age(hours: u64) -> anyhow::Result<u64> {
    if hours == 0 || hours > MAX_JWT_EXPIRY_HOURS {
        anyhow::bail!("Token lifetime must be between 1 and {} hours, got {}", MAX_JWT_EXPIRY_HOURS, hours);
    }
    hours
        .checked_mul(3600)
        .with_context(|| format!("Lifetime of {} hours is out of range", hours))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_max_age() {
        assert_eq!(cookie_max_age(1).unwrap(), 3600);
        assert_eq!(cookie_max_age(MAX_JWT_EXPIRY_HOURS).unwrap(), MAX_JWT_EXPIRY_HOURS * 3600);
    }

    #[test]
    fn test_cookie_max_age_rejects_out_of_range_lifetimes() {
        for hours in [0, MAX_JWT_EXPIRY_HOURS + 1, 3_000_000_000_000, u64::MAX] {
            assert!(cookie_max_age(hours).is_err(), "{} hours", hours);
        }
    }
}
