use crate::checkout::{self, CheckoutError, CheckoutState};
use crate::config::HomeView;
use crate::errors::AppError;
use crate::format;
use crate::geo::UNKNOWN_LOCATION;
use crate::models::{LocationQuery, LocationResponse, PaymentForm, SubscribeForm, Subscriber};
use crate::pages::{
    DailyPage, FailedPage, LandingPage, PaymentPage, ProcessingPage, ScripturesPage, SubscribePage,
    SuccessPage,
};
use crate::session::Visit;
use crate::state::AppState;
use crate::ui::render;
use crate::upstream::UpstreamError;
use axum::{
    Form, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::{Local, NaiveDate};
use tower_sessions::Session;
use tracing::{info, warn};

const TERMS_REQUIRED: &str = "Please accept the Terms and Conditions before proceeding.";
const NAME_EMAIL_REQUIRED: &str = "Please fill in at least your name and email.";

pub async fn home(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    match state.config.home_view {
        HomeView::Landing => landing().await,
        HomeView::Today => today(State(state)).await,
    }
}

pub async fn landing() -> Result<Html<String>, AppError> {
    render(&LandingPage)
}

pub async fn scriptures(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let (daily, visitors) = tokio::join!(state.content.today(), state.content.visitors());
    let daily = daily
        .inspect_err(|err| warn!("today's content unavailable: {err}"))
        .ok();
    let visitors = visitors
        .inspect_err(|err| warn!("visitor count unavailable: {err}"))
        .ok();
    let user_date = Local::now().format("%Y-%m-%d %H:%M").to_string();

    render(&ScripturesPage::new(daily.as_ref(), visitors, user_date))
}

pub async fn today(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let daily = state
        .content
        .today()
        .await
        .inspect_err(|err| warn!("today's content unavailable: {err}"))
        .ok();
    render(&DailyPage::today(daily.as_ref()))
}

pub async fn post(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<(StatusCode, Html<String>), AppError> {
    if NaiveDate::parse_from_str(&date, "%Y-%m-%d").is_err() {
        return not_found_post();
    }

    match state.content.post(&date).await {
        Ok(daily) => Ok((StatusCode::OK, render(&DailyPage::post(Some(&daily)))?)),
        Err(UpstreamError::NotFound) => not_found_post(),
        Err(err) => {
            warn!(%date, "post unavailable: {err}");
            Ok((StatusCode::BAD_GATEWAY, render(&DailyPage::post(None))?))
        }
    }
}

fn not_found_post() -> Result<(StatusCode, Html<String>), AppError> {
    Ok((StatusCode::NOT_FOUND, render(&DailyPage::post(None))?))
}

pub async fn subscribe_page(session: Session) -> Result<Html<String>, AppError> {
    let prefill = Visit::load(&session).await?.handoff.unwrap_or_default();
    render(&SubscribePage::new(&prefill, false, None))
}

pub async fn subscribe(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SubscribeForm>,
) -> Result<Response, AppError> {
    let terms = form.agreed_to_terms();
    let subscriber = trimmed(form.subscriber);

    let problem = if !terms {
        Some(TERMS_REQUIRED)
    } else if subscriber.full_name.is_empty() || subscriber.email.is_empty() {
        Some(NAME_EMAIL_REQUIRED)
    } else {
        None
    };
    if let Some(message) = problem {
        let page = render(&SubscribePage::new(&subscriber, terms, Some(message)))?;
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
    }

    let mut visit = Visit::load(&session).await?;
    info!(email = %subscriber.email, "subscriber captured");
    checkout::restart(&mut visit, subscriber).map_err(|err| AppError::conflict(err.to_string()))?;
    visit.store(&session, state.config.session_idle).await?;

    let target = state.config.checkout_url.as_deref().unwrap_or("/payment");
    Ok(Redirect::to(target).into_response())
}

fn trimmed(subscriber: Subscriber) -> Subscriber {
    let clean = |value: String| value.trim().to_string();
    Subscriber {
        full_name: clean(subscriber.full_name),
        email: clean(subscriber.email),
        phone: clean(subscriber.phone),
        address: clean(subscriber.address),
        city: clean(subscriber.city),
        country: clean(subscriber.country),
    }
}

pub async fn payment_page(session: Session) -> Result<Response, AppError> {
    let visit = Visit::load(&session).await?;

    let page = match (visit.checkout, visit.handoff) {
        (CheckoutState::Form, None) => return Ok(Redirect::to("/subscribe").into_response()),
        (CheckoutState::Form, Some(subscriber)) => render(&PaymentPage {
            subscriber: &subscriber,
            form: &PaymentForm::default(),
            error: None,
        })?,
        (CheckoutState::Processing, handoff) => render(&ProcessingPage {
            subscriber: &handoff.unwrap_or_default(),
        })?,
        (CheckoutState::Success { subscriber, receipt }, _) => render(&SuccessPage {
            subscriber: &subscriber,
            receipt: &receipt,
        })?,
        (CheckoutState::Failed(reason), _) => render(&FailedPage {
            reason: reason.to_string(),
        })?,
    };
    Ok(page.into_response())
}

pub async fn pay(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<PaymentForm>,
) -> Result<Response, AppError> {
    match state.checkout.submit(session.clone(), &form).await {
        Ok(_attempt) => Ok(Redirect::to("/payment").into_response()),
        Err(CheckoutError::Invalid(err)) => {
            let subscriber = Visit::load(&session).await?.handoff.unwrap_or_default();
            let masked = PaymentForm {
                card_number: format::card_number(&form.card_number),
                card_name: form.card_name,
                expiry_date: format::expiry(&form.expiry_date),
                cvv: String::new(),
            };
            let page = render(&PaymentPage {
                subscriber: &subscriber,
                form: &masked,
                error: Some(err.to_string()),
            })?;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
        }
        Err(CheckoutError::NoSubscriber) => Ok(Redirect::to("/subscribe").into_response()),
        Err(err @ CheckoutError::NotAccepting(_)) => Err(AppError::conflict(err.to_string())),
        Err(CheckoutError::Session(err)) => Err(err.into()),
    }
}

pub async fn location(State(state): State<AppState>, Query(query): Query<LocationQuery>) -> Json<LocationResponse> {
    let location = match query.coordinates() {
        Some((lat, lon)) => state.geocoder.locate(lat, lon).await,
        None => UNKNOWN_LOCATION.to_string(),
    };
    Json(LocationResponse { location })
}

pub async fn healthz() -> StatusCode {
    StatusCode::OK
}
