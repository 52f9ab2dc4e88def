pub mod config;
pub mod doctor;
pub mod migrate;
pub mod related;
pub mod search;
pub mod seed;

use foodie_core::errors::{ApplicationError, InterfaceError};
use foodie_core::config::{AppConfig, LoadOptions};
use foodie_db::{connect_with_config, DbPool};
use serde::Serialize;
use serde_json::Value;
use tokio::runtime::Runtime;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::success_with_data(command, message, None)
    }

    pub fn success_with_data(
        command: &str,
        message: impl Into<String>,
        data: Option<Value>,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// (error_class, message, exit_code) carried out of a command's async block.
pub(crate) type CommandFailure = (&'static str, String, u8);

pub(crate) fn load_config(command: &str) -> Result<AppConfig, CommandResult> {
    AppConfig::load(LoadOptions::default()).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            2,
        )
    })
}

pub(crate) fn build_runtime(command: &str) -> Result<Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime_init",
            format!("failed to initialize async runtime: {error}"),
            3,
        )
    })
}

pub(crate) async fn open_pool(config: &AppConfig) -> Result<DbPool, CommandFailure> {
    connect_with_config(&config.database)
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))
}

/// Maps a library failure onto the interface error class, user message and
/// exit code reported by every catalog command.
pub(crate) fn application_failure(error: impl Into<ApplicationError>) -> CommandFailure {
    let interface = InterfaceError::from(error.into());
    let exit_code = match interface {
        InterfaceError::BadRequest(_) | InterfaceError::NotFound(_) => 7,
        InterfaceError::ServiceUnavailable(_) => 4,
    };
    let message = format!("{} ({})", interface.user_message(), interface.detail());
    (interface.error_class(), message, exit_code)
}

#[cfg(test)]
mod tests {
    use foodie_core::catalog::CatalogError;
    use foodie_core::errors::ApplicationError;
    use serde_json::{json, Value};

    use super::{application_failure, CommandResult};

    #[test]
    fn success_payload_omits_absent_data() {
        let result = CommandResult::success("migrate", "applied pending migrations");
        let payload: Value = serde_json::from_str(&result.output).expect("json");

        assert_eq!(result.exit_code, 0);
        assert_eq!(payload["status"], "ok");
        assert!(payload["error_class"].is_null());
        assert!(payload.get("data").is_none());
    }

    #[test]
    fn success_payload_carries_data() {
        let result =
            CommandResult::success_with_data("search", "1 product", Some(json!({"count": 1})));
        let payload: Value = serde_json::from_str(&result.output).expect("json");

        assert_eq!(payload["data"]["count"], 1);
    }

    #[test]
    fn application_errors_map_to_interface_class_and_exit_code() {
        let (class, message, exit_code) =
            application_failure(CatalogError::InvalidQuery("min > max".into()));
        assert_eq!((class, exit_code), ("bad_request", 7));
        assert!(message.starts_with("The request could not be processed."));
        assert!(message.ends_with("(min > max)"));

        let (class, _, exit_code) = application_failure(ApplicationError::NotFound("x".into()));
        assert_eq!((class, exit_code), ("not_found", 7));

        let (class, message, exit_code) =
            application_failure(CatalogError::Unavailable("database is locked".into()));
        assert_eq!((class, exit_code), ("service_unavailable", 4));
        assert!(message.contains("database is locked"));
    }
}
