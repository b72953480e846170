//! Outbound chat notifications
//!
//! Messages are pre-formatted HTML (Telegram `parse_mode=HTML`). Delivery is
//! best effort: callers log failures and move on.

use async_trait::async_trait;
use serde::Serialize;

use crate::{
    config::NotificationsConfig,
    error::{AppError, AppResult},
    models::RepairRequest,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &str) -> AppResult<()>;
}

/// Telegram Bot API notifier
#[derive(Clone)]
pub struct TelegramNotifier {
    client: reqwest::Client,
    endpoint: String,
    chat_id: String,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

impl TelegramNotifier {
    pub fn new(api_base: &str, bot_token: &str, chat_id: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/bot{}/sendMessage", api_base.trim_end_matches('/'), bot_token),
            chat_id: chat_id.to_string(),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, message: &str) -> AppResult<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&SendMessage {
                chat_id: &self.chat_id,
                text: message,
                parse_mode: "HTML",
            })
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Telegram request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Internal(format!(
                "Telegram returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Writes notifications to the log instead of sending them
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: &str) -> AppResult<()> {
        tracing::info!(target: "notifications", "{}", message);
        Ok(())
    }
}

/// Pick the notifier described by the configuration
pub fn from_config(config: &NotificationsConfig) -> std::sync::Arc<dyn Notifier> {
    match (
        config.enabled,
        config.telegram_bot_token.as_deref(),
        config.telegram_chat_id.as_deref(),
    ) {
        (true, Some(token), Some(chat_id)) if !token.is_empty() && !chat_id.is_empty() => {
            tracing::info!("Telegram notifications enabled");
            std::sync::Arc::new(TelegramNotifier::new(&config.api_base, token, chat_id))
        }
        (true, _, _) => {
            tracing::warn!("Notifications enabled but Telegram credentials missing, logging only");
            std::sync::Arc::new(LogNotifier)
        }
        _ => std::sync::Arc::new(LogNotifier),
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Alert for a freshly created request
pub fn new_request_alert(request: &RepairRequest) -> String {
    format!(
        "<b>New repair request</b>\nID: {}\nEquipment: {}\nClinic: {}\nIssue: {}",
        escape_html(&request.id),
        escape_html(&request.equipment_name),
        escape_html(&request.clinic_id),
        escape_html(&request.issue_description),
    )
}

/// Alert for a status transition
pub fn status_changed_alert(request: &RepairRequest) -> String {
    format!(
        "<b>Status updated</b>\nID: {}\nNew status: <b>{}</b>\nApprover: {}",
        escape_html(&request.id),
        request.status,
        escape_html(request.approver_username.as_deref().unwrap_or("N/A")),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RepairStatus;
    use chrono::Utc;

    fn request() -> RepairRequest {
        RepairRequest {
            id: "REQ-42".to_string(),
            create_date: Utc::now(),
            requester_username: "cn_a".to_string(),
            clinic_id: "CN_A".to_string(),
            equipment_id: "EQ1".to_string(),
            equipment_name: "Chair <K3>".to_string(),
            issue_description: "Motor & pump".to_string(),
            images_before: vec![],
            status: RepairStatus::InProgress,
            approver_username: None,
            estimated_cost: None,
            repair_cost: None,
            warranty_months: None,
            completion_date: None,
            technician_notes: None,
            images_after: vec![],
        }
    }

    #[test]
    fn test_new_request_alert_escapes_user_text() {
        let message = new_request_alert(&request());
        assert!(message.contains("Chair &lt;K3&gt;"));
        assert!(message.contains("Motor &amp; pump"));
        assert!(message.starts_with("<b>New repair request</b>"));
    }

    #[test]
    fn test_status_alert_without_approver() {
        let message = status_changed_alert(&request());
        assert!(message.contains("<b>In_Progress</b>"));
        assert!(message.ends_with("Approver: N/A"));
    }

    #[test]
    fn test_missing_credentials_fall_back_to_log() {
        let config = NotificationsConfig {
            enabled: true,
            ..NotificationsConfig::default()
        };
        // must not panic and must not need a network
        let _ = from_config(&config);
    }
}
