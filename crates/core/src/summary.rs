//! Summary assembly.

use crate::constants::FRAGMENT_SEPARATOR;
use crate::phrasing::Phrasing;
use intake_types::{QuestionId, TemplateId};
use serde::Serialize;

/// A rendered template, ready for assembly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Fragment {
    pub template_id: TemplateId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_id: Option<QuestionId>,
    pub text: String,
    /// Whether the source question is a chief complaint.
    pub chief_complaint: bool,
}

/// Join fragments into the summary text.
///
/// Fragments must already be in template order. Chief-complaint fragments come first, behind
/// the phrasing's prefix; every other fragment follows in its own order. With no fragments the
/// result is empty.
pub fn assemble(fragments: &[Fragment], phrasing: &Phrasing) -> String {
    let (chief, other): (Vec<&Fragment>, Vec<&Fragment>) =
        fragments.iter().partition(|f| f.chief_complaint);

    let mut summary = String::new();

    if !chief.is_empty() {
        let prefix = phrasing.chief_complaint_prefix.trim();
        if !prefix.is_empty() {
            summary.push_str(prefix);
            summary.push_str(FRAGMENT_SEPARATOR);
        }
        summary.push_str(&join(&chief));
    }

    if !other.is_empty() {
        if !summary.is_empty() {
            summary.push_str(FRAGMENT_SEPARATOR);
        }
        summary.push_str(&join(&other));
    }

    summary
}

fn join(fragments: &[&Fragment]) -> String {
    fragments
        .iter()
        .map(|f| f.text.as_str())
        .collect::<Vec<_>>()
        .join(FRAGMENT_SEPARATOR)
}
