//! Syllabus documents: loading, defaults and saving.
//!
//! Accepts either a bare JSON array of modules or an object with a
//! `modules` array plus optional program metadata.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::model::SyllabusModule;
use crate::util::write_json_atomic;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Syllabus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    #[serde(default)]
    pub modules: Vec<SyllabusModule>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SyllabusDocument {
    Modules(Vec<SyllabusModule>),
    Program(Syllabus),
}

impl Syllabus {
    pub fn from_modules(modules: Vec<SyllabusModule>) -> Self {
        Self {
            modules,
            ..Default::default()
        }
    }

    pub fn parse(json: &str) -> Result<Self> {
        let doc: SyllabusDocument = serde_json::from_str(json).context(
            "Syllabus must be a JSON array of modules or an object with a \"modules\" array",
        )?;
        Ok(match doc {
            SyllabusDocument::Modules(modules) => Self::from_modules(modules),
            SyllabusDocument::Program(syllabus) => syllabus,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read syllabus {}", path.display()))?;
        let syllabus =
            Self::parse(&content).with_context(|| format!("Invalid syllabus {}", path.display()))?;
        info!(
            "Loaded syllabus from {} ({} module(s))",
            path.display(),
            syllabus.modules.len()
        );
        Ok(syllabus)
    }

    /// Load `path`, falling back to the built-in syllabus when the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) if p.exists() => Self::load(p),
            Some(p) => {
                warn!(
                    "Syllabus file {} not found, using the default syllabus",
                    p.display()
                );
                Ok(Self::default_program())
            }
            None => {
                warn!("No syllabus given, using the default syllabus");
                Ok(Self::default_program())
            }
        }
    }

    /// A small software engineering program used when no syllabus is supplied.
    pub fn default_program() -> Self {
        let module = |title: &str, topics: &[&str]| {
            let mut m = SyllabusModule::new(title, topics.iter().copied());
            m.duration = Some("1 semester".to_string());
            m
        };
        Self {
            program_name: Some("Software Engineering".to_string()),
            duration: Some("4 years".to_string()),
            institution: None,
            modules: vec![
                module(
                    "Programming Fundamentals",
                    &["Python", "Java", "Data Structures", "Algorithms"],
                ),
                module("Web Development", &["HTML", "CSS", "JavaScript", "React"]),
                module("Database Systems", &["SQL", "MySQL", "Database Design"]),
                module(
                    "Software Engineering",
                    &["SDLC", "Agile", "Testing", "Version Control"],
                ),
            ],
        }
    }

    /// Same program metadata with a new module list.
    pub fn with_modules(&self, modules: Vec<SyllabusModule>) -> Self {
        Self {
            modules,
            ..self.clone()
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_json_atomic(path, self)?;
        info!("Syllabus saved to {}", path.display());
        Ok(())
    }
}
