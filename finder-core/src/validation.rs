//! Per-field validation errors shared by venue and session drafts.

use std::{collections::BTreeMap, fmt};

use geo::Point;

/// Validation messages keyed by field name.
///
/// Serialises as a JSON object mapping each offending field to the list of
/// problems found, which is the shape returned to API clients.
///
/// # Examples
///
/// ```
/// use finder_core::FieldErrors;
///
/// let mut errors = FieldErrors::default();
/// errors.push("title", "This field is required.");
/// assert!(!errors.is_empty());
/// assert_eq!(errors.messages("title"), ["This field is required."]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct FieldErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
    /// Record a message against `field`.
    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_owned())
            .or_default()
            .push(message.into());
    }

    /// Whether no messages were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Messages recorded for `field`, empty when the field is valid.
    #[must_use]
    pub fn messages(&self, field: &str) -> &[String] {
        self.fields.get(field).map_or(&[], Vec::as_slice)
    }

    /// Names of the fields that failed validation, in sorted order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Convert into `Ok(())` when empty, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    pub(crate) fn require_text(&mut self, field: &str, value: &str, max_chars: usize) {
        if value.trim().is_empty() {
            self.push(field, "This field may not be blank.");
        }
        self.limit_text(field, value, max_chars);
    }

    pub(crate) fn limit_text(&mut self, field: &str, value: &str, max_chars: usize) {
        if value.chars().count() > max_chars {
            self.push(
                field,
                format!("Ensure this field has no more than {max_chars} characters."),
            );
        }
    }

    pub(crate) fn check_point(&mut self, field: &str, point: Option<&Point<f64>>) {
        let Some(point) = point else {
            return;
        };
        let (lng, lat) = (point.x(), point.y());
        if !lng.is_finite() || !lat.is_finite() {
            self.push(field, "Coordinates must be finite numbers.");
        } else if !(-180.0..=180.0).contains(&lng) || !(-90.0..=90.0).contains(&lat) {
            self.push(field, "Coordinates must be a longitude/latitude pair in degrees.");
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid fields: ")?;
        let mut first = true;
        for (field, messages) in &self.fields {
            if !first {
                write!(f, "; ")?;
            }
            first = false;
            write!(f, "{field} ({})", messages.join(" "))?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}
