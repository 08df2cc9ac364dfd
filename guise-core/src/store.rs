//! Profile persistence.

use std::collections::HashMap;
use std::path::PathBuf;

use guise_types::{AppearanceProfile, ProfileId};

use crate::error::{SaveError, StoreError};

pub trait ProfileStore {
    fn load(&self, id: &ProfileId) -> Result<AppearanceProfile, StoreError>;
    /// Persist the profile. Unsaved profiles get a fresh id; saved ones keep
    /// theirs.
    fn save(&mut self, profile: &AppearanceProfile) -> Result<ProfileId, StoreError>;
}

/// Reject profiles that cannot be saved, before any store is touched.
pub fn validate_for_save(profile: &AppearanceProfile) -> Result<(), SaveError> {
    if profile.label.trim().is_empty() {
        return Err(SaveError::validation("profile needs a label"));
    }
    Ok(())
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    profiles: HashMap<ProfileId, AppearanceProfile>,
    next_id: u64,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    fn fresh_id(&mut self) -> ProfileId {
        loop {
            self.next_id += 1;
            let id = ProfileId::new(format!("profile-{}", self.next_id));
            if !self.profiles.contains_key(&id) {
                return id;
            }
        }
    }
}

impl ProfileStore for MemoryProfileStore {
    fn load(&self, id: &ProfileId) -> Result<AppearanceProfile, StoreError> {
        self.profiles
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    fn save(&mut self, profile: &AppearanceProfile) -> Result<ProfileId, StoreError> {
        let id = match &profile.id {
            Some(id) => id.clone(),
            None => self.fresh_id(),
        };
        let mut stored = profile.clone();
        stored.id = Some(id.clone());
        self.profiles.insert(id.clone(), stored);
        log::debug!(target: "store", "saved profile {}", id);
        Ok(id)
    }
}

/// One JSON file per profile under a directory.
pub struct DirProfileStore {
    root: PathBuf,
}

impl DirProfileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `guise/profiles` under the platform data directory.
    pub fn default_location() -> Option<Self> {
        dirs::data_dir().map(|d| Self::new(d.join("guise").join("profiles")))
    }

    fn path_for(&self, id: &ProfileId) -> PathBuf {
        self.root.join(format!("{}.json", id.as_str()))
    }

    fn fresh_id(&self) -> ProfileId {
        let mut n = 1u64;
        loop {
            let id = ProfileId::new(format!("profile-{}", n));
            if !self.path_for(&id).exists() {
                return id;
            }
            n += 1;
        }
    }
}

impl ProfileStore for DirProfileStore {
    fn load(&self, id: &ProfileId) -> Result<AppearanceProfile, StoreError> {
        let path = self.path_for(id);
        if !path.exists() {
            return Err(StoreError::NotFound(id.clone()));
        }
        let contents = std::fs::read_to_string(&path)
            .map_err(|e| StoreError::Backend(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&contents)
            .map_err(|e| StoreError::Backend(format!("{}: {}", path.display(), e)))
    }

    fn save(&mut self, profile: &AppearanceProfile) -> Result<ProfileId, StoreError> {
        std::fs::create_dir_all(&self.root)
            .map_err(|e| StoreError::Backend(format!("{}: {}", self.root.display(), e)))?;
        let id = match &profile.id {
            Some(id) => id.clone(),
            None => self.fresh_id(),
        };
        let mut stored = profile.clone();
        stored.id = Some(id.clone());
        let json = serde_json::to_string_pretty(&stored)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let path = self.path_for(&id);
        std::fs::write(&path, json)
            .map_err(|e| StoreError::Backend(format!("{}: {}", path.display(), e)))?;
        log::debug!(target: "store", "wrote {}", path.display());
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guise_types::LayerKind;

    #[test]
    fn blank_label_fails_validation() {
        let err = validate_for_save(&AppearanceProfile::new("  ")).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "profile needs a label");
        assert!(validate_for_save(&AppearanceProfile::new("Wolf")).is_ok());
    }

    #[test]
    fn memory_store_assigns_then_keeps_ids() {
        let mut store = MemoryProfileStore::new();
        let mut profile = AppearanceProfile::new("Wolf");
        let id = store.save(&profile).unwrap();
        assert_eq!(id.as_str(), "profile-1");
        profile.id = Some(id.clone());
        profile.label = "Dire wolf".into();
        assert_eq!(store.save(&profile).unwrap(), id);
        assert_eq!(store.len(), 1);
        assert_eq!(store.load(&id).unwrap().label, "Dire wolf");
    }

    #[test]
    fn memory_store_missing_profile() {
        let store = MemoryProfileStore::new();
        let err = store.load(&ProfileId::new("nope")).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn dir_store_round_trips_layers() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DirProfileStore::new(dir.path());
        let mut profile = AppearanceProfile::new("Wolf");
        let layer = profile.effects.add(LayerKind::Audio);
        let id = store.save(&profile).unwrap();
        assert!(dir.path().join("profile-1.json").exists());

        let loaded = store.load(&id).unwrap();
        assert_eq!(loaded.id.as_ref(), Some(&id));
        assert!(loaded.effects.get(layer).unwrap().is_audio());
        assert_eq!(store.save(&AppearanceProfile::new("Bat")).unwrap().as_str(), "profile-2");
    }
}
