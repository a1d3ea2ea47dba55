//! The symptom catalog.
//!
//! Definitions live in a directory, one symptom per `.yaml`, `.yml` or `.json` file. The whole
//! directory is loaded once at startup into an immutable [`SymptomCatalog`]. A file that does
//! not match the schema fails the load with the path of the offending field; authoring
//! mistakes that do not break parsing (dangling parents, unmatched trigger values, ...) are
//! logged as warnings and the symptom is still served.

use crate::constants::{DEFINITION_EXTENSIONS, MAX_DEFINITION_FILES};
use crate::definition::Symptom;
use crate::form::IntakeForm;
use crate::graph::QuestionGraph;
use crate::phrasing::Phrasing;
use crate::{IntakeError, IntakeResult};
use intake_types::SymptomId;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Definition file formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DefinitionFormat {
    Yaml,
    Json,
}

impl DefinitionFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_lowercase();
        if !DEFINITION_EXTENSIONS.contains(&extension.as_str()) {
            return None;
        }
        Some(if extension == "json" {
            DefinitionFormat::Json
        } else {
            DefinitionFormat::Yaml
        })
    }
}

/// List entry for an active symptom.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymptomSummary {
    pub id: SymptomId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub question_count: usize,
}

#[derive(Clone, Debug, Default)]
pub struct SymptomCatalog {
    symptoms: BTreeMap<SymptomId, Symptom>,
}

/// Parse one symptom definition.
///
/// # Errors
///
/// Returns [`IntakeError::DefinitionSchema`] naming `source_name` and the path of the field that
/// failed to parse (`<root>` when the document itself is malformed).
pub fn parse_definition(
    text: &str,
    source_name: &str,
    format: DefinitionFormat,
) -> IntakeResult<Symptom> {
    fn schema_error<E: std::fmt::Display>(
        source_name: &str,
        err: serde_path_to_error::Error<E>,
    ) -> IntakeError {
        let path = err.path().to_string();
        IntakeError::DefinitionSchema {
            source_name: source_name.to_string(),
            path: if path.is_empty() || path == "." {
                "<root>".into()
            } else {
                path
            },
            message: err.into_inner().to_string(),
        }
    }

    match format {
        DefinitionFormat::Yaml => {
            let deserializer = serde_yaml::Deserializer::from_str(text);
            serde_path_to_error::deserialize(deserializer).map_err(|e| schema_error(source_name, e))
        }
        DefinitionFormat::Json => {
            let mut deserializer = serde_json::Deserializer::from_str(text);
            serde_path_to_error::deserialize(&mut deserializer)
                .map_err(|e| schema_error(source_name, e))
        }
    }
}

/// Load one definition file.
pub fn load_definition_file(path: &Path) -> IntakeResult<Symptom> {
    let format = DefinitionFormat::from_path(path).ok_or_else(|| {
        IntakeError::InvalidInput(format!(
            "unsupported definition file extension: {}",
            path.display()
        ))
    })?;
    let text = fs::read_to_string(path).map_err(IntakeError::FileRead)?;
    parse_definition(&text, &path.display().to_string(), format)
}

impl SymptomCatalog {
    /// Build a catalog from already parsed symptoms.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::DuplicateSymptom`] if two symptoms share an id.
    pub fn from_symptoms(symptoms: impl IntoIterator<Item = Symptom>) -> IntakeResult<Self> {
        let mut catalog = Self::default();
        for symptom in symptoms {
            catalog.insert(symptom)?;
        }
        Ok(catalog)
    }

    fn insert(&mut self, symptom: Symptom) -> IntakeResult<()> {
        if self.symptoms.contains_key(&symptom.id) {
            return Err(IntakeError::DuplicateSymptom(symptom.id));
        }

        let active = symptom.active();
        for issue in QuestionGraph::new(active.questions).validate(&active.text_templates) {
            tracing::warn!("symptom {} ({}): {}", symptom.id, symptom.name, issue);
        }

        self.symptoms.insert(symptom.id, symptom);
        Ok(())
    }

    /// Load every definition file in `dir`, in file-name order.
    ///
    /// Hidden files and files with other extensions are ignored.
    ///
    /// # Errors
    ///
    /// Returns an `IntakeError` if:
    /// - the directory cannot be read or holds more than the allowed number of definitions,
    /// - any definition fails to parse,
    /// - two definitions share a symptom id.
    pub fn load_dir(dir: &Path) -> IntakeResult<Self> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir).map_err(IntakeError::FileRead)? {
            let entry = entry.map_err(IntakeError::FileRead)?;
            let path = entry.path();

            let hidden = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with('.'));
            if hidden || !path.is_file() || DefinitionFormat::from_path(&path).is_none() {
                continue;
            }

            paths.push(path);
            if paths.len() > MAX_DEFINITION_FILES {
                return Err(IntakeError::InvalidInput(format!(
                    "definitions directory holds more than {MAX_DEFINITION_FILES} files"
                )));
            }
        }
        paths.sort();

        let mut catalog = Self::default();
        for path in &paths {
            catalog.insert(load_definition_file(path)?)?;
        }

        tracing::info!(
            "loaded {} symptom definitions from {}",
            catalog.symptoms.len(),
            dir.display()
        );
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.symptoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symptoms.is_empty()
    }

    /// Active symptoms ordered by `(order, id)`.
    pub fn list_active(&self) -> Vec<SymptomSummary> {
        let mut active: Vec<&Symptom> = self.symptoms.values().filter(|s| s.is_active).collect();
        active.sort_by_key(|s| (s.order, s.id));

        active
            .into_iter()
            .map(|s| SymptomSummary {
                id: s.id,
                name: s.name.to_string(),
                description: s.description.clone(),
                question_count: s.questions.iter().filter(|q| q.is_active).count(),
            })
            .collect()
    }

    /// The stored definition, active or not.
    pub fn get(&self, id: SymptomId) -> Option<&Symptom> {
        self.symptoms.get(&id)
    }

    /// The active projection of an active symptom.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::UnknownSymptom`] if the symptom does not exist or is inactive.
    pub fn active(&self, id: SymptomId) -> IntakeResult<Symptom> {
        self.symptoms
            .get(&id)
            .filter(|s| s.is_active)
            .map(Symptom::active)
            .ok_or(IntakeError::UnknownSymptom(id))
    }

    /// Build the form for an active symptom.
    pub fn form(&self, id: SymptomId, phrasing: &Phrasing) -> IntakeResult<IntakeForm> {
        let symptom = self.active(id)?;
        Ok(IntakeForm::new(&symptom, phrasing.clone()))
    }
}
