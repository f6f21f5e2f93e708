//! One askama template per view. Markup lives under `templates/`; these
//! structs carry exactly what each template interpolates.

use crate::gateway::Receipt;
use crate::models::{Daily, PaymentForm, Subscriber};
use crate::ui::DailyView;
use askama::Template;

#[derive(Template)]
#[template(path = "landing.html")]
pub struct LandingPage;

#[derive(Template)]
#[template(path = "scriptures.html")]
pub struct ScripturesPage {
    pub entry: Option<DailyView>,
    pub visitors: String,
    pub user_date: String,
}

impl ScripturesPage {
    pub fn new(daily: Option<&Daily>, visitors: Option<u64>, user_date: String) -> Self {
        Self {
            entry: daily.map(DailyView::from),
            visitors: visitors.map_or_else(|| "...".to_string(), |count| count.to_string()),
            user_date,
        }
    }
}

/// Today and Post share one layout: date and topic badges, passages, summary.
#[derive(Template)]
#[template(path = "daily.html")]
pub struct DailyPage {
    pub entry: Option<DailyView>,
    pub missing: &'static str,
    pub back_link: bool,
}

impl DailyPage {
    pub fn today(daily: Option<&Daily>) -> Self {
        Self {
            entry: daily.map(DailyView::from),
            missing: "Not ready",
            back_link: false,
        }
    }

    pub fn post(daily: Option<&Daily>) -> Self {
        Self {
            entry: daily.map(DailyView::from),
            missing: "Not found",
            back_link: true,
        }
    }
}

pub struct FormField {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: &'static str,
    pub value: String,
    pub placeholder: &'static str,
    pub required: bool,
}

#[derive(Template)]
#[template(path = "subscribe.html")]
pub struct SubscribePage {
    pub fields: Vec<FormField>,
    pub terms_checked: bool,
    pub error: Option<String>,
}

impl SubscribePage {
    pub fn new(prefill: &Subscriber, terms_checked: bool, error: Option<&str>) -> Self {
        let field = |name, label, kind, value: &str, placeholder, required| FormField {
            name,
            label,
            kind,
            value: value.to_string(),
            placeholder,
            required,
        };
        Self {
            fields: vec![
                field("fullName", "Full Name", "text", &prefill.full_name, "John Doe", true),
                field("email", "Email Address", "email", &prefill.email, "john@example.com", true),
                field("phone", "Phone Number", "tel", &prefill.phone, "+1 (555) 000-0000", false),
                field("country", "Country", "text", &prefill.country, "United States", false),
                field("city", "City", "text", &prefill.city, "New York", false),
                field("address", "Address", "text", &prefill.address, "123 Main St", false),
            ],
            terms_checked,
            error: error.map(str::to_string),
        }
    }
}

#[derive(Template)]
#[template(path = "payment.html")]
pub struct PaymentPage<'a> {
    pub subscriber: &'a Subscriber,
    pub form: &'a PaymentForm,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "processing.html")]
pub struct ProcessingPage<'a> {
    pub subscriber: &'a Subscriber,
}

#[derive(Template)]
#[template(path = "success.html")]
pub struct SuccessPage<'a> {
    pub subscriber: &'a Subscriber,
    pub receipt: &'a Receipt,
}

#[derive(Template)]
#[template(path = "failed.html")]
pub struct FailedPage {
    pub reason: String,
}

#[derive(Template)]
#[template(path = "notice.html")]
pub struct NoticePage<'a> {
    pub title: &'a str,
    pub message: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Passage;

    fn jane() -> Subscriber {
        Subscriber {
            full_name: "Jane Doe".into(),
            email: "jane@x.com".into(),
            city: "Lisbon".into(),
            ..Subscriber::default()
        }
    }

    #[test]
    fn landing_links_into_the_funnel() {
        let page = LandingPage.render().unwrap();
        assert!(page.contains("Essence of Being"));
        assert!(page.contains(r#"href="/scriptures""#));
        assert!(page.contains(r#"href="/subscribe""#));
    }

    #[test]
    fn scriptures_without_content_shows_not_ready() {
        let page = ScripturesPage::new(None, None, "2026-01-05 09:00".into())
            .render()
            .unwrap();
        assert!(page.contains("Not ready"));
        assert!(page.contains("Visitor count: ..."));
        assert!(page.contains(r#"<span id="location">Loading...</span>"#));
    }

    #[test]
    fn scriptures_shows_topic_and_visitors() {
        let daily = Daily {
            date: "2026-01-05".into(),
            area: "patience".into(),
            quran: Some(Passage {
                reference: Some("2:153".into()),
                text: Some("Seek help through patience & prayer.".into()),
                translation: None,
            }),
            ..Daily::default()
        };
        let page = ScripturesPage::new(Some(&daily), Some(42), "2026-01-05 09:00".into())
            .render()
            .unwrap();
        assert!(page.contains("<strong>PATIENCE</strong>"));
        assert!(page.contains("<em>2:153</em>"));
        assert!(page.contains("patience &amp; prayer"));
        assert!(!page.contains("<em></em>"));
        assert!(page.contains("Visitor count: 42"));
        assert!(page.contains("Copyable Summary"));
        assert!(page.contains("Quran (2:153):"));
        assert!(page.contains("Torah ():"));
    }

    #[test]
    fn post_without_content_says_not_found() {
        let page = DailyPage::post(None).render().unwrap();
        assert!(page.contains("Not found"));
        assert!(page.contains("Back to Today"));
        assert!(!DailyPage::today(None).render().unwrap().contains("Back to Today"));
    }

    #[test]
    fn subscribe_prefills_and_escapes() {
        let mut prefill = jane();
        prefill.full_name = "Jane \"JD\" <b>Doe</b>".into();
        let page = SubscribePage::new(&prefill, false, Some("Please accept the Terms and Conditions before proceeding."))
            .render()
            .unwrap();
        assert!(page.contains("Jane &quot;JD&quot; &lt;b&gt;Doe"));
        assert!(!page.contains("<b>Doe"));
        assert!(page.contains(r#"value="Lisbon""#));
        assert!(page.contains(r#"role="alert""#));
        assert!(!page.contains(" checked"));
    }

    #[test]
    fn payment_views_name_the_subscriber() {
        let receipt = Receipt {
            payment_id: "ABC123".into(),
        };
        let form = PaymentForm::default();
        let page = PaymentPage {
            subscriber: &jane(),
            form: &form,
            error: None,
        }
        .render()
        .unwrap();
        assert!(page.contains("jane@x.com"));
        assert!(!page.contains(r#"role="alert""#));

        let processing = ProcessingPage { subscriber: &jane() }.render().unwrap();
        assert!(processing.contains(r#"http-equiv="refresh""#));

        let done = SuccessPage {
            subscriber: &jane(),
            receipt: &receipt,
        }
        .render()
        .unwrap();
        assert!(done.contains("Payment Successful!"));
        assert!(done.contains("<strong>jane@x.com</strong>"));
        assert!(done.contains("ABC123"));

        let failed = FailedPage {
            reason: "payment declined by issuer".into(),
        };
        assert!(failed.render().unwrap().contains("Try Again"));
    }

    #[test]
    fn notice_page_escapes_message() {
        let page = NoticePage {
            title: "Conflict",
            message: "<script>x</script>",
        }
        .render()
        .unwrap();
        assert!(page.contains("<title>Conflict</title>"));
        assert!(page.contains("&lt;script&gt;"));
    }
}
