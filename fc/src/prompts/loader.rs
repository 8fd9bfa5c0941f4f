//! Prompt Loader
//!
//! Loads prompt templates from files or falls back to embedded defaults.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

use super::embedded;
use crate::domain::{FitnessLevel, TrainingType};

/// Values available to prompt templates
#[derive(Debug, Clone, Default, Serialize)]
pub struct PromptContext {
    /// `strength`, `cardio` or `flexibility`
    pub training_type: Option<String>,
    /// Free-text goal the plan should focus on
    pub goal: Option<String>,
    /// `beginner`, `intermediate` or `advanced`
    pub fitness_level: Option<String>,
}

impl PromptContext {
    /// Context for a weekly schedule
    pub fn schedule(training_type: TrainingType) -> Self {
        Self {
            training_type: Some(training_type.as_str().to_string()),
            ..Self::default()
        }
    }

    /// Context for a workout plan
    pub fn workout(goal: &str, level: FitnessLevel) -> Self {
        Self {
            goal: Some(goal.to_string()),
            fitness_level: Some(level.as_str().to_string()),
            ..Self::default()
        }
    }
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// User override directory (e.g., `.fitcoach/prompts/`)
    user_dir: Option<PathBuf>,
    /// Project default directory (e.g., `prompts/`)
    repo_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a loader rooted at `root`
    ///
    /// Looks for `.fitcoach/prompts/` and `prompts/` under `root`; missing
    /// directories are skipped.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let user_dir = root.join(".fitcoach/prompts");
        let repo_dir = root.join("prompts");
        debug!(?user_dir, ?repo_dir, "PromptLoader::new: called");

        Self {
            hbs: Self::engine(),
            user_dir: user_dir.is_dir().then_some(user_dir),
            repo_dir: repo_dir.is_dir().then_some(repo_dir),
        }
    }

    /// Create a loader that only uses embedded prompts
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self {
            hbs: Self::engine(),
            user_dir: None,
            repo_dir: None,
        }
    }

    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        // Prompts are plain text, not HTML
        hbs.register_escape_fn(handlebars::no_escape);
        hbs
    }

    /// Load a template by name
    ///
    /// Checks in order:
    /// 1. User override: `.fitcoach/prompts/{name}.pmt`
    /// 2. Project default: `prompts/{name}.pmt`
    /// 3. Embedded fallback
    fn load_template(&self, name: &str) -> Result<String> {
        debug!(%name, "PromptLoader::load_template: called");
        for dir in [&self.user_dir, &self.repo_dir].into_iter().flatten() {
            let path = dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "PromptLoader::load_template: found on disk");
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read prompt {}: {}", path.display(), e));
            }
        }

        if let Some(content) = embedded::get_embedded(name) {
            debug!(%name, "PromptLoader::load_template: using embedded");
            return Ok(content.to_string());
        }

        Err(eyre!("Prompt template not found: {}", name))
    }

    /// Render a template with the given context
    pub fn render(&self, template_name: &str, context: &PromptContext) -> Result<String> {
        debug!(%template_name, "PromptLoader::render: called");
        let template = self.load_template(template_name)?;
        self.hbs
            .render_template(&template, context)
            .map(|s| s.trim().to_string())
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))
    }
}
