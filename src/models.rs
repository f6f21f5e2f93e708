use serde::{Deserialize, Serialize};

/// One quoted excerpt. Upstream does not guarantee any field, so all of them
/// are optional and the views decide what to hide.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Passage {
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
}

/// The day's bundle across the four traditions.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Daily {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub area: String,
    #[serde(default)]
    pub quran: Option<Passage>,
    #[serde(default)]
    pub torah: Option<Passage>,
    #[serde(default)]
    pub bible: Option<Passage>,
    #[serde(default)]
    pub human_design: Option<Passage>,
    #[serde(default)]
    pub summary: Option<String>,
}

impl Daily {
    /// Passages in display order, labelled by tradition.
    pub fn passages(&self) -> [(&'static str, Option<&Passage>); 4] {
        [
            ("Qur'an", self.quran.as_ref()),
            ("Torah", self.torah.as_ref()),
            ("Bible", self.bible.as_ref()),
            ("Human Design", self.human_design.as_ref()),
        ]
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VisitorCount {
    pub count: u64,
}

/// Subscriber details captured by the subscribe form and handed to checkout.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subscriber {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeForm {
    #[serde(flatten)]
    pub subscriber: Subscriber,
    #[serde(default)]
    pub terms: Option<String>,
}

impl SubscribeForm {
    pub fn agreed_to_terms(&self) -> bool {
        self.terms.as_deref().is_some_and(|value| !value.is_empty())
    }
}

/// Raw payment fields as typed by the visitor.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentForm {
    #[serde(default)]
    pub card_number: String,
    #[serde(default)]
    pub card_name: String,
    #[serde(default)]
    pub expiry_date: String,
    #[serde(default)]
    pub cvv: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailPreview {
    pub to: String,
    pub subject: String,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SubscribeEmailResponse {
    #[serde(default)]
    pub email: Option<EmailPreview>,
}

/// Coordinates arrive as text so a malformed value degrades instead of
/// failing extraction.
#[derive(Debug, Default, Deserialize)]
pub struct LocationQuery {
    pub lat: Option<String>,
    pub lon: Option<String>,
}

impl LocationQuery {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        let lat = self.lat.as_deref()?.trim().parse().ok()?;
        let lon = self.lon.as_deref()?.trim().parse().ok()?;
        Some((lat, lon))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LocationResponse {
    pub location: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daily_tolerates_missing_passages() {
        let daily: Daily = serde_json::from_str(
            r#"{"date":"2026-01-05","area":"patience","quran":{"ref":"2:153"}}"#,
        )
        .unwrap();
        assert_eq!(daily.area, "patience");
        let quran = daily.quran.as_ref().unwrap();
        assert_eq!(quran.reference.as_deref(), Some("2:153"));
        assert!(quran.text.is_none());
        assert!(daily.torah.is_none());
        assert!(daily.summary.is_none());
    }

    #[test]
    fn subscriber_uses_camel_case_on_the_wire() {
        let subscriber = Subscriber {
            full_name: "Jane Doe".into(),
            email: "jane@x.com".into(),
            ..Subscriber::default()
        };
        let value = serde_json::to_value(&subscriber).unwrap();
        assert_eq!(value["fullName"], "Jane Doe");
        assert_eq!(value["email"], "jane@x.com");
    }

    #[test]
    fn location_query_needs_both_numbers() {
        let query = LocationQuery {
            lat: Some("38.72".into()),
            lon: Some(" -9.14".into()),
        };
        assert_eq!(query.coordinates(), Some((38.72, -9.14)));
        let query = LocationQuery {
            lat: Some("north".into()),
            lon: Some("1".into()),
        };
        assert_eq!(query.coordinates(), None);
        assert_eq!(LocationQuery::default().coordinates(), None);
    }

    #[test]
    fn terms_checkbox_counts_only_when_present() {
        let mut form = SubscribeForm::default();
        assert!(!form.agreed_to_terms());
        form.terms = Some("on".into());
        assert!(form.agreed_to_terms());
    }
}
