use crate::errors::AppError;
use crate::models::{Daily, Passage};
use askama::Template;
use axum::response::Html;

/// Renders a page; a template failure surfaces as a 500 notice.
pub fn render(page: &impl Template) -> Result<Html<String>, AppError> {
    Ok(Html(page.render()?))
}

/// A `Daily` flattened for the templates. Blank fields are already dropped,
/// so the markup never shows an empty reference line.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyView {
    pub date: String,
    pub area: String,
    pub cards: Vec<PassageCard>,
    pub summary: Vec<SummaryLine>,
    pub common_ground: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PassageCard {
    pub label: &'static str,
    pub reference: Option<String>,
    pub text: Option<String>,
    pub translation: Option<String>,
}

/// One line of the copyable summary. Every tradition gets a line, with empty
/// parentheses when the reference is missing.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryLine {
    pub label: &'static str,
    pub reference: String,
    pub text: String,
}

impl From<&Daily> for DailyView {
    fn from(daily: &Daily) -> Self {
        let passages = daily.passages();
        Self {
            date: daily.date.clone(),
            area: daily.area.clone(),
            cards: passages
                .into_iter()
                .map(|(label, passage)| PassageCard::new(label, passage))
                .collect(),
            summary: passages
                .into_iter()
                .map(|(label, passage)| SummaryLine {
                    label: copy_label(label),
                    reference: passage.and_then(|p| present(&p.reference)).unwrap_or_default(),
                    text: passage.and_then(|p| present(&p.text)).unwrap_or_default(),
                })
                .collect(),
            common_ground: present(&daily.summary).unwrap_or_default(),
        }
    }
}

impl PassageCard {
    fn new(label: &'static str, passage: Option<&Passage>) -> Self {
        Self {
            label,
            reference: passage.and_then(|p| present(&p.reference)),
            text: passage.and_then(|p| present(&p.text)),
            translation: passage.and_then(|p| present(&p.translation)),
        }
    }
}

fn copy_label(label: &'static str) -> &'static str {
    if label == "Qur'an" { "Quran" } else { label }
}

fn present(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
