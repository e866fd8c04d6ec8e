// store.rs — Persistence gateway for week documents and goal templates.
//
// `WeekStore` is the seam between the engine and whatever holds the data.
// `JsonWeekStore` keeps one JSON file per (user, year):
//
//   <root>/<user_id>/<year>.json      WeekDocument
//   <root>/<user_id>/templates.json   Vec<GoalTemplate>
//   <root>/milestones.json            Vec<Milestone> (read-only here)
//
// A save is read-modify-write of the whole year document with no version
// check, so the later of two concurrent writers wins.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use ww_calendar::WeekId;

use crate::document::WeekDocument;
use crate::error::GoalError;
use crate::instance::GoalInstance;
use crate::template::{GoalTemplate, Milestone};

/// Reads and writes week documents and templates for a user.
pub trait WeekStore {
    /// The user's document for `year`; an empty document if none is stored.
    fn week_document(&self, user_id: &str, year: i32) -> Result<WeekDocument, GoalError>;

    /// Replace the goal list of one week inside the `(user_id, year)` document.
    fn save_week(
        &self,
        user_id: &str,
        year: i32,
        week: WeekId,
        goals: &[GoalInstance],
    ) -> Result<(), GoalError>;

    /// Every template the user has authored.
    fn templates(&self, user_id: &str) -> Result<Vec<GoalTemplate>, GoalError>;

    /// Create or replace a template (matched by id).
    fn save_template(&self, user_id: &str, template: &GoalTemplate) -> Result<(), GoalError>;

    /// Years for which the user has a stored document, ascending.
    fn document_years(&self, user_id: &str) -> Result<Vec<i32>, GoalError>;
}

/// Read-only access to the milestone aggregate.
pub trait MilestoneSource {
    fn milestone(&self, milestone_id: &str) -> Result<Option<Milestone>, GoalError>;
}

/// A milestone source that knows no milestones.
pub struct NoMilestones;

impl MilestoneSource for NoMilestones {
    fn milestone(&self, _milestone_id: &str) -> Result<Option<Milestone>, GoalError> {
        Ok(None)
    }
}

/// File-backed store: one JSON document per user and year.
pub struct JsonWeekStore {
    root: PathBuf,
}

impl JsonWeekStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, GoalError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|source| GoalError::IoError {
            path: root.display().to_string(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn user_dir(&self, user_id: &str) -> Result<PathBuf, GoalError> {
        if user_id.is_empty()
            || user_id.contains(['/', '\\'])
            || user_id.starts_with('.')
        {
            return Err(GoalError::InvalidRequest(format!(
                "user id {:?} cannot be used as a directory name",
                user_id
            )));
        }
        Ok(self.root.join(user_id))
    }

    fn document_file(&self, user_id: &str, year: i32) -> Result<PathBuf, GoalError> {
        Ok(self.user_dir(user_id)?.join(format!("{}.json", year)))
    }

    fn templates_file(&self, user_id: &str) -> Result<PathBuf, GoalError> {
        Ok(self.user_dir(user_id)?.join("templates.json"))
    }

    fn write_json<T: serde::Serialize>(&self, path: &Path, value: &T) -> Result<(), GoalError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| GoalError::IoError {
                path: parent.display().to_string(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(value)?;
        fs::write(path, json).map_err(|source| GoalError::IoError {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Read and parse a JSON file, or `None` if it does not exist.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, GoalError> {
    if !path.exists() {
        return Ok(None);
    }
    let json = fs::read_to_string(path).map_err(|source| GoalError::IoError {
        path: path.display().to_string(),
        source,
    })?;
    Ok(Some(serde_json::from_str(&json)?))
}

impl WeekStore for JsonWeekStore {
    fn week_document(&self, user_id: &str, year: i32) -> Result<WeekDocument, GoalError> {
        let path = self.document_file(user_id, year)?;
        Ok(read_json(&path)?.unwrap_or_else(|| WeekDocument::empty(user_id, year)))
    }

    fn save_week(
        &self,
        user_id: &str,
        year: i32,
        week: WeekId,
        goals: &[GoalInstance],
    ) -> Result<(), GoalError> {
        if week.year() != year {
            return Err(GoalError::InvalidRequest(format!(
                "week {} does not belong to the {} document",
                week, year
            )));
        }
        let mut doc = self.week_document(user_id, year)?;
        doc.set_goals(week, goals.to_vec());
        let path = self.document_file(user_id, year)?;
        self.write_json(&path, &doc)?;
        tracing::debug!("saved week {} for {} ({} goal(s))", week, user_id, goals.len());
        Ok(())
    }

    fn templates(&self, user_id: &str) -> Result<Vec<GoalTemplate>, GoalError> {
        let path = self.templates_file(user_id)?;
        let mut templates: Vec<GoalTemplate> = read_json(&path)?.unwrap_or_default();
        templates.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(templates)
    }

    fn save_template(&self, user_id: &str, template: &GoalTemplate) -> Result<(), GoalError> {
        let mut templates = self.templates(user_id)?;
        match templates.iter_mut().find(|t| t.id == template.id) {
            Some(existing) => *existing = template.clone(),
            None => templates.push(template.clone()),
        }
        let path = self.templates_file(user_id)?;
        self.write_json(&path, &templates)
    }

    fn document_years(&self, user_id: &str) -> Result<Vec<i32>, GoalError> {
        let dir = self.user_dir(user_id)?;
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&dir).map_err(|source| GoalError::IoError {
            path: dir.display().to_string(),
            source,
        })?;

        let mut years = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| GoalError::IoError {
                path: dir.display().to_string(),
                source,
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(year) = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .and_then(|s| s.parse::<i32>().ok())
                {
                    years.push(year);
                }
            }
        }
        years.sort_unstable();
        Ok(years)
    }
}

impl MilestoneSource for JsonWeekStore {
    fn milestone(&self, milestone_id: &str) -> Result<Option<Milestone>, GoalError> {
        let path = self.root.join("milestones.json");
        let milestones: Vec<Milestone> = read_json(&path)?.unwrap_or_default();
        Ok(milestones.into_iter().find(|m| m.id == milestone_id))
    }
}
