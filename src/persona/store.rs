//! Profile persistence as plain JSON files

use super::PersonaProfile;
use crate::error::{AppError, AppResult};
use std::path::Path;

/// Load a profile from `path`
///
/// Returns `Ok(None)` when the file does not exist.
pub fn load_profile(path: &Path) -> AppResult<Option<PersonaProfile>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let profile = serde_json::from_str(&content).map_err(|e| {
        AppError::Validation(format!(
            "Profile file {} is not a valid persona profile: {}",
            path.display(),
            e
        ))
    })?;

    Ok(Some(profile))
}

/// Write `profile` to `path` as pretty-printed JSON
pub fn save_profile(path: &Path, profile: &PersonaProfile) -> AppResult<()> {
    let json = serde_json::to_string_pretty(profile)
        .map_err(|e| AppError::Internal(format!("Failed to serialize profile: {}", e)))?;
    std::fs::write(path, json)?;
    tracing::debug!(path = %path.display(), "Saved persona profile");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_profile(&dir.path().join("absent.json")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");
        let profile = PersonaProfile {
            persona_description: "Night-shift sysadmin".to_string(),
            preferred_language: "de".to_string(),
            ..PersonaProfile::default()
        };

        save_profile(&path, &profile).unwrap();
        assert_eq!(load_profile(&path).unwrap(), Some(profile));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");
        std::fs::write(&path, r#"{"tone_preferences":"terse"}"#).unwrap();

        let profile = load_profile(&path).unwrap().unwrap();
        assert_eq!(profile.tone_preferences, "terse");
        assert_eq!(profile.response_style, "");
    }

    #[test]
    fn test_invalid_file_is_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(load_profile(&path), Err(AppError::Validation(_))));
    }
}
