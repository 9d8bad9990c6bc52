use crate::core::models::AccountSnapshot;
use crate::core::settings::Settings;
use crate::remote::{AccountClient, HttpAccountClient};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Serialize)]
struct StatusOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    account: Option<AccountSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(with = "chrono::serde::ts_seconds")]
    fetched_at: DateTime<Utc>,
}

pub async fn run(json: bool, uid: Option<String>) -> Result<()> {
    let settings = Settings::load();

    let uid = uid.unwrap_or_else(|| settings.account.uid.clone());
    let uid = uid.trim();
    if uid.is_empty() {
        anyhow::bail!("No user UID configured. Pass --uid or run `points-poller config set --uid <UID>`.");
    }

    let client = HttpAccountClient::new(&settings.engine.base_url)?;
    let output = match client.fetch_account(uid).await {
        Ok(account) => StatusOutput {
            account: Some(account),
            error: None,
            fetched_at: Utc::now(),
        },
        Err(e) => StatusOutput {
            account: None,
            error: Some(e.friendly_message()),
            fetched_at: Utc::now(),
        },
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if let Some(error) = &output.error {
        println!("Error: {}", error);
    } else if let Some(account) = &output.account {
        print_account_card(account);
    }

    Ok(())
}

pub fn print_account_card(account: &AccountSnapshot) {
    print_field("UID", display_or_na(&account.uid));
    print_field("E-mail", display_or_na(&account.email));
    print_field("Points", &account.points.to_string());
    print_field("Total games", &account.total_games.to_string());
    print_field(
        "Invite code",
        display_or_na(account.invite_code.as_deref().unwrap_or_default()),
    );
    print_field("Referrals", &account.total_referrals.to_string());
}

fn display_or_na(value: &str) -> &str {
    if value.is_empty() {
        "N/A"
    } else {
        value
    }
}

fn print_field(label: &str, value: &str) {
    println!("  {:<13} {}", format!("{}:", label), value);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_or_na() {
        assert_eq!(display_or_na(""), "N/A");
        assert_eq!(display_or_na("u1"), "u1");
    }

    #[test]
    fn test_status_json_omits_missing_parts() {
        let output = StatusOutput {
            account: None,
            error: Some("HTTP 404: Not Found".to_string()),
            fetched_at: Utc::now(),
        };
        let value = serde_json::to_value(&output).unwrap();
        assert!(value.get("account").is_none());
        assert_eq!(value["error"], "HTTP 404: Not Found");
        assert!(value["fetched_at"].is_i64());
    }
}
