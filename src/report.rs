//! # Result Report
//!
//! A [`ResultReport`] collects the outcome of one `save` or `load` run: the
//! items that were processed successfully and diagnostic lines grouped by
//! category. Both collections are sorted sets, so the rendered report does not
//! depend on the order in which items finished and repeated lines appear once.
//!
//! The category labels used across the crate live in [`categories`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Category labels for additional info sections.
pub mod categories {
    pub const PROJECT_ALREADY_EXISTS: &str = "Project already exists:";
    pub const CANNOT_CLONE_PROJECT: &str = "Cannot clone project:";
    pub const CANNOT_CLONE_PROJECT_TIMEOUT: &str = "Cannot clone project (timeout):";
    pub const CANNOT_LOAD_PROJECT: &str = "Cannot load project:";
    pub const CANNOT_LOAD_PROJECTS: &str = "Cannot load projects:";
    pub const CANNOT_PARSE_PROJECT_FILE: &str = "Cannot parse project file:";
    pub const CANNOT_SAVE_PROJECT: &str = "Cannot save project:";
    pub const CANNOT_SAVE_PROJECTS: &str = "Cannot save projects:";
    pub const CANNOT_DETERMINE_PROJECT: &str = "Cannot be determined whether it is a project:";
    pub const CANNOT_RETRIEVE_ORIGIN: &str = "Cannot retrieve origin URL:";
}

const NO_OBJECTIVE: &str = "-";
const NO_RESULT: &str = "No result";
const NO_ADDITIONAL_INFO: &str = "-";

/// Accumulator for the outcome of one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultReport {
    objective: String,
    successful: bool,
    results: BTreeSet<String>,
    additional_info: BTreeMap<String, BTreeSet<String>>,
}

impl ResultReport {
    pub fn new(objective: impl Into<String>) -> Self {
        Self {
            objective: objective.into(),
            successful: false,
            results: BTreeSet::new(),
            additional_info: BTreeMap::new(),
        }
    }

    pub fn objective(&self) -> &str {
        &self.objective
    }

    pub fn set_objective(&mut self, objective: impl Into<String>) {
        self.objective = objective.into();
    }

    pub fn is_successful(&self) -> bool {
        self.successful
    }

    pub fn set_successful(&mut self, successful: bool) {
        self.successful = successful;
    }

    pub fn results(&self) -> &BTreeSet<String> {
        &self.results
    }

    pub fn additional_info(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.additional_info
    }

    /// Lines recorded under `category`, if any.
    pub fn info(&self, category: &str) -> Option<&BTreeSet<String>> {
        self.additional_info.get(category)
    }

    /// True when neither results nor additional info were recorded.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty() && self.additional_info.is_empty()
    }

    pub fn append_result(&mut self, line: impl Into<String>) {
        self.results.insert(line.into());
    }

    pub fn append_additional_info(&mut self, category: impl Into<String>, line: impl Into<String>) {
        self.additional_info
            .entry(category.into())
            .or_default()
            .insert(line.into());
    }

    /// Resets the report to its initial state.
    pub fn clear(&mut self) {
        self.objective = NO_OBJECTIVE.to_string();
        self.successful = false;
        self.results.clear();
        self.additional_info.clear();
    }

    /// The status tag shown on the first line.
    pub fn status(&self) -> &'static str {
        if self.successful {
            "done"
        } else {
            "fail"
        }
    }

    /// Renders the report as plain text.
    pub fn render(&self) -> String {
        let mut out = format!("[{}] {}\n\nResult:\n", self.status(), self.objective);

        if self.results.is_empty() {
            out.push_str(&format!("    {NO_RESULT}\n"));
        } else {
            for line in &self.results {
                out.push_str(&format!("    {line}\n"));
            }
        }

        out.push_str("\nAdditional info:\n");
        if self.additional_info.is_empty() {
            out.push_str(&format!("    {NO_ADDITIONAL_INFO}\n"));
        } else {
            let sections: Vec<String> = self
                .additional_info
                .iter()
                .map(|(category, lines)| {
                    let mut section = format!("  {category}\n");
                    for line in lines {
                        section.push_str(&format!("    {line}\n"));
                    }
                    section
                })
                .collect();
            out.push_str(&sections.join("\n"));
        }

        out.truncate(out.trim_end().len());
        out
    }
}

impl Default for ResultReport {
    fn default() -> Self {
        Self::new(NO_OBJECTIVE)
    }
}

impl fmt::Display for ResultReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
