//! Request-body validation for the game endpoints.

use crate::api::models::{FieldError, GameRequest, SearchRequest};
use crate::database_ops::games::{GameFields, GameFilter, Platform, MAX_NAME_CHARS};

/// A create/update body that passed validation. Optional columns stay `None`
/// when the client omitted them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidGame {
    pub name: String,
    pub platform: Platform,
    pub store_id: String,
    pub publisher_id: Option<String>,
    pub bundle_id: Option<String>,
    pub app_version: Option<String>,
    pub is_published: Option<bool>,
}

impl ValidGame {
    /// Columns for a new row; omitted optionals take their defaults.
    pub fn into_fields(self) -> GameFields {
        GameFields {
            publisher_id: self.publisher_id.unwrap_or_default(),
            name: self.name,
            platform: self.platform,
            store_id: self.store_id,
            bundle_id: self.bundle_id.unwrap_or_default(),
            app_version: self.app_version.unwrap_or_default(),
            is_published: self.is_published.unwrap_or(true),
            rank: None,
        }
    }

    /// Columns for an update; omitted optionals and the rank keep their stored values.
    pub fn merge_into(self, existing: &GameFields) -> GameFields {
        GameFields {
            publisher_id: self
                .publisher_id
                .unwrap_or_else(|| existing.publisher_id.clone()),
            name: self.name,
            platform: self.platform,
            store_id: self.store_id,
            bundle_id: self.bundle_id.unwrap_or_else(|| existing.bundle_id.clone()),
            app_version: self
                .app_version
                .unwrap_or_else(|| existing.app_version.clone()),
            is_published: self.is_published.unwrap_or(existing.is_published),
            rank: existing.rank,
        }
    }
}

fn trimmed(v: &Option<String>) -> Option<String> {
    v.as_deref().map(|s| s.trim().to_string())
}

pub fn validate_game(req: &GameRequest) -> Result<ValidGame, Vec<FieldError>> {
    let mut errors = Vec::new();

    let name = trimmed(&req.name).unwrap_or_default();
    if name.is_empty() {
        errors.push(FieldError::new("name", "Name is required"));
    } else if name.chars().count() > MAX_NAME_CHARS {
        errors.push(FieldError::new(
            "name",
            "Name must be less than 255 characters",
        ));
    }

    let platform = req.platform.as_deref().and_then(|p| p.parse::<Platform>().ok());
    if platform.is_none() {
        errors.push(FieldError::new(
            "platform",
            "Platform must be either ios or android",
        ));
    }

    let store_id = trimmed(&req.store_id).unwrap_or_default();
    if store_id.is_empty() {
        errors.push(FieldError::new("storeId", "StoreId is required"));
    }

    match platform {
        Some(platform) if errors.is_empty() => Ok(ValidGame {
            name,
            platform,
            store_id,
            publisher_id: trimmed(&req.publisher_id),
            bundle_id: trimmed(&req.bundle_id),
            app_version: trimmed(&req.app_version),
            is_published: req.is_published,
        }),
        _ => Err(errors),
    }
}

/// Search criteria. Blank values and `platform: "all"` mean "no constraint".
pub fn validate_search(req: &SearchRequest) -> Result<GameFilter, Vec<FieldError>> {
    let name = trimmed(&req.name).filter(|n| !n.is_empty());
    let platform = match req.platform.as_deref().map(str::trim) {
        None | Some("") | Some("all") => None,
        Some(p) => match p.parse::<Platform>() {
            Ok(p) => Some(p),
            Err(_) => {
                return Err(vec![FieldError::new(
                    "platform",
                    "Platform must be either ios, android, all",
                )])
            }
        },
    };
    Ok(GameFilter { name, platform })
}
