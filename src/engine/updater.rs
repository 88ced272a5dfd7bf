//! Applies a gap report to a syllabus without removing anything from it.

use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use tracing::info;

use crate::model::{GapReport, SyllabusModule};

/// Titles actually changed by one application of a report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSummary {
    pub added_modules: Vec<String>,
    pub emphasized_modules: Vec<String>,
}

impl ChangeSummary {
    pub fn is_empty(&self) -> bool {
        self.added_modules.is_empty() && self.emphasized_modules.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyllabusUpdate {
    pub modules: Vec<SyllabusModule>,
    pub changes: ChangeSummary,
}

pub fn apply(report: &GapReport, modules: &[SyllabusModule]) -> Vec<SyllabusModule> {
    apply_with_changes(report, modules).modules
}

/// Raise emphasis on under-emphasized modules and append recommended ones.
///
/// Modules are raised by their position in `modules`, so two modules sharing
/// a title are treated separately. Existing modules keep their order and
/// content. A recommended module is
/// skipped when a module with the same title (ignoring case) is already
/// present, so applying the same report twice changes nothing further.
pub fn apply_with_changes(report: &GapReport, modules: &[SyllabusModule]) -> SyllabusUpdate {
    let mut changes = ChangeSummary::default();
    let to_emphasize: BTreeSet<usize> = report
        .under_emphasized
        .iter()
        .map(|u| u.module_index)
        .collect();

    let mut updated: Vec<SyllabusModule> = modules
        .iter()
        .enumerate()
        .map(|(index, module)| {
            let mut module = module.clone();
            if to_emphasize.contains(&index) {
                let raised = module.emphasis_level.raised();
                if raised != module.emphasis_level {
                    module.emphasis_level = raised;
                    changes.emphasized_modules.push(module.title.clone());
                }
            }
            module
        })
        .collect();

    let mut titles: HashSet<String> = updated.iter().map(|m| title_key(&m.title)).collect();
    for recommended in &report.recommended_modules {
        if titles.insert(title_key(&recommended.title)) {
            changes.added_modules.push(recommended.title.clone());
            updated.push(recommended.to_module());
        } else {
            info!(
                "Skipping recommended module {:?}: a module with that title already exists",
                recommended.title
            );
        }
    }

    if !changes.is_empty() {
        info!(
            "Syllabus update: {} module(s) added, {} emphasized",
            changes.added_modules.len(),
            changes.emphasized_modules.len()
        );
    }

    SyllabusUpdate {
        modules: updated,
        changes,
    }
}

fn title_key(title: &str) -> String {
    title.trim().to_lowercase()
}
