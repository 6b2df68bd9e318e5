use crate::models::EmergencyContact;
use crate::utils::AppError;
use std::env;

/// Runtime configuration, loaded once from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: String,
    pub database_url: String,
    pub environment: String,
    pub jwt: JwtSettings,
    pub gemini: GeminiSettings,
    pub calcom: CalComSettings,
    pub safety: SafetySettings,
    pub twilio: Option<TwilioSettings>,
    pub mood_history_days: i64,
}

#[derive(Debug, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub expiry_hours: i64,
}

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: Option<String>,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct CalComSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub use_mock: bool,
}

#[derive(Debug, Clone)]
pub struct SafetySettings {
    pub dataset_path: Option<String>,
    pub toxicity_threshold: f32,
    pub default_contacts: Vec<EmergencyContact>,
}

#[derive(Debug, Clone)]
pub struct TwilioSettings {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| AppError::Config("DATABASE_URL must be set".to_string()))?;

        let environment = var_or("APP_ENV", "production");
        let use_mock = env::var("USE_MOCK_CAL_DATA")
            .map(|v| v == "true")
            .unwrap_or(false)
            || environment == "development";

        let twilio = match (
            env::var("TWILIO_ACCOUNT_SID"),
            env::var("TWILIO_AUTH_TOKEN"),
            env::var("TWILIO_FROM_NUMBER"),
        ) {
            (Ok(account_sid), Ok(auth_token), Ok(from_number)) => Some(TwilioSettings {
                account_sid,
                auth_token,
                from_number,
            }),
            _ => None,
        };

        let default_contacts = match env::var("DEFAULT_EMERGENCY_CONTACTS") {
            Ok(raw) => parse_contact_list(&raw)?,
            Err(_) => placeholder_contacts(),
        };

        Ok(Self {
            host: var_or("HOST", "0.0.0.0"),
            port: var_or("PORT", "5001"),
            database_url,
            environment,
            jwt: JwtSettings {
                secret: var_or("JWT_SECRET", "default-secret-change-me"),
                issuer: var_or("JWT_ISSUER", "mindbridge-service"),
                audience: var_or("JWT_AUDIENCE", "mindbridge-app"),
                expiry_hours: parse_var("JWT_EXPIRY_HOURS", 24)?,
            },
            gemini: GeminiSettings {
                api_key: env::var("GOOGLE_API_KEY").ok().filter(|k| !k.is_empty()),
                model: var_or("GEMINI_MODEL", "gemini-2.0-flash"),
            },
            calcom: CalComSettings {
                api_key: env::var("CAL_COM_API_KEY").ok().filter(|k| !k.is_empty()),
                base_url: var_or("CAL_COM_BASE_URL", "https://api.cal.com/v1"),
                use_mock,
            },
            safety: SafetySettings {
                dataset_path: env::var("SUICIDE_DATASET_PATH").ok(),
                toxicity_threshold: parse_var("TOXICITY_THRESHOLD", 0.8)?,
                default_contacts,
            },
            twilio,
            mood_history_days: parse_var("MOOD_HISTORY_DAYS", 30)?,
        })
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: "5001".to_string(),
            database_url: "mongodb://localhost:27017/mindbridge_test".to_string(),
            environment: "development".to_string(),
            jwt: JwtSettings {
                secret: "test-secret".to_string(),
                issuer: "mindbridge-service".to_string(),
                audience: "mindbridge-app".to_string(),
                expiry_hours: 1,
            },
            gemini: GeminiSettings {
                api_key: None,
                model: "gemini-2.0-flash".to_string(),
            },
            calcom: CalComSettings {
                api_key: None,
                base_url: "https://api.cal.com/v1".to_string(),
                use_mock: true,
            },
            safety: SafetySettings {
                dataset_path: None,
                toxicity_threshold: 0.8,
                default_contacts: placeholder_contacts(),
            },
            twilio: None,
            mood_history_days: 30,
        }
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T: std::str::FromStr>(key: &str, default: T) -> Result<T, AppError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} has an invalid value: {}", key, raw))),
        Err(_) => Ok(default),
    }
}

/// Parses `Name:+123,Other:+456` into contacts.
pub fn parse_contact_list(raw: &str) -> Result<Vec<EmergencyContact>, AppError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (name, phone) = entry.split_once(':').ok_or_else(|| {
                AppError::Config(format!("Invalid emergency contact entry: {}", entry))
            })?;
            Ok(EmergencyContact {
                name: name.trim().to_string(),
                phone: phone.trim().to_string(),
                relationship: None,
            })
        })
        .collect()
}

fn placeholder_contacts() -> Vec<EmergencyContact> {
    vec![
        EmergencyContact {
            name: "Contact 1".to_string(),
            phone: "+1234567890".to_string(),
            relationship: None,
        },
        EmergencyContact {
            name: "Contact 2".to_string(),
            phone: "+0987654321".to_string(),
            relationship: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_contact_list() {
        let contacts = parse_contact_list("Mom:+15550001, Crisis Line : +1988").unwrap();
        assert_eq!(contacts.len(), 2);
        assert_eq!(contacts[0].name, "Mom");
        assert_eq!(contacts[1].name, "Crisis Line");
        assert_eq!(contacts[1].phone, "+1988");
    }

    #[test]
    fn test_parse_contact_list_rejects_missing_phone() {
        assert!(parse_contact_list("Mom").is_err());
    }

    #[test]
    fn test_empty_contact_list() {
        assert!(parse_contact_list(" , ").unwrap().is_empty());
    }
}
