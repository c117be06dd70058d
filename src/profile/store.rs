//! Trainee profiles (`profiles.json`) and their photos.

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::model::{IdealStats, ProfileAnalytics, Stat, StatSnapshot};
use crate::storage;

/// One trainee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub ideal_stats: IdealStats,
    /// File name inside the photos directory.
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub analytics: ProfileAnalytics,
}

/// Profile list on disk plus the directory photos are copied into.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    path: PathBuf,
    photos_dir: PathBuf,
}

impl ProfileStore {
    pub fn new(path: PathBuf, photos_dir: PathBuf) -> Self {
        Self { path, photos_dir }
    }

    /// Store at the default data-directory locations.
    pub fn open_default() -> Self {
        Self::new(
            crate::paths::get_profiles_file(),
            crate::paths::get_photos_dir(),
        )
    }

    /// All profiles in file order. A missing file is an empty list.
    pub fn load(&self) -> Result<Vec<Profile>> {
        Ok(storage::read_json(&self.path)?.unwrap_or_default())
    }

    pub fn save(&self, profiles: &[Profile]) -> Result<()> {
        storage::write_json(&self.path, &profiles)
    }

    pub fn get(&self, index: usize) -> Result<Profile> {
        let profiles = self.load()?;
        profiles
            .into_iter()
            .nth(index)
            .ok_or_else(|| anyhow!("no profile at index {}", index))
    }

    /// Absolute path of a profile's photo, if it has one.
    pub fn photo_path(&self, profile: &Profile) -> Option<PathBuf> {
        profile.photo.as_ref().map(|p| self.photos_dir.join(p))
    }

    /// Append a profile, copying `photo` to `<photos_dir>/<name><ext>`.
    /// Returns the new profile's index.
    pub fn add(&self, name: &str, ideal_stats: IdealStats, photo: Option<&Path>) -> Result<usize> {
        let name = name.trim();
        validate_name(name)?;

        let mut profiles = self.load()?;
        if profiles.iter().any(|p| p.name.eq_ignore_ascii_case(name)) {
            bail!("a profile named '{}' already exists", name);
        }

        let photo = photo.map(|src| self.import_photo(name, src)).transpose()?;
        profiles.push(Profile {
            name: name.to_string(),
            ideal_stats,
            photo,
            analytics: ProfileAnalytics::default(),
        });
        self.save(&profiles)?;

        crate::log(&format!("Added profile '{}'", name));
        Ok(profiles.len() - 1)
    }

    /// Load, modify one profile, and save.
    pub fn update<F>(&self, index: usize, f: F) -> Result<()>
    where
        F: FnOnce(&mut Profile),
    {
        let mut profiles = self.load()?;
        let count = profiles.len();
        let profile = profiles
            .get_mut(index)
            .ok_or_else(|| anyhow!("no profile at index {} ({} profiles)", index, count))?;
        f(profile);
        self.save(&profiles)
    }

    pub fn record_action_gain(
        &self,
        index: usize,
        action: Stat,
        before: &StatSnapshot,
        after: &StatSnapshot,
    ) -> Result<()> {
        self.update(index, |p| {
            p.analytics.action_stats.record(action, before, after);
        })?;
        crate::log(&format!("Learned gains for {}", action));
        Ok(())
    }

    pub fn record_loss_reason(&self, index: usize, stat: Stat) -> Result<()> {
        self.update(index, |p| p.analytics.loss_reasons.record(stat))?;
        crate::log(&format!("Recorded race loss reason: {}", stat));
        Ok(())
    }

    pub fn clear_analytics(&self, index: usize) -> Result<()> {
        self.update(index, |p| p.analytics.clear())
    }

    fn import_photo(&self, name: &str, src: &Path) -> Result<String> {
        if !src.is_file() {
            bail!("photo not found: {}", src.display());
        }
        let ext = src
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let file_name = format!("{}{}", name, ext);

        fs::create_dir_all(&self.photos_dir).with_context(|| {
            format!("Failed to create photo directory: {}", self.photos_dir.display())
        })?;
        let dest = self.photos_dir.join(&file_name);
        fs::copy(src, &dest)
            .with_context(|| format!("Failed to copy photo to {}", dest.display()))?;
        Ok(file_name)
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("profile name must not be empty");
    }
    if name.chars().any(|c| matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|')) {
        bail!("profile name '{}' contains characters not allowed in file names", name);
    }
    Ok(())
}
