//! Checkout flow: `Form -> Processing -> Success | Failed`.
//!
//! A terminal state is only left through a fresh subscribe submission, which
//! resets the session to `Form`.

use crate::format;
use crate::gateway::{CardDetails, DeclineReason, PaymentGateway, Receipt};
use crate::models::{PaymentForm, Subscriber};
use crate::session::Visit;
use crate::upstream::Notifier;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tower_sessions::Session;
use tower_sessions::session::{self, Id};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum CheckoutState {
    #[default]
    Form,
    Processing,
    Success {
        subscriber: Subscriber,
        receipt: Receipt,
    },
    Failed(DeclineReason),
}

impl CheckoutState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Form => "form",
            Self::Processing => "processing",
            Self::Success { .. } => "success",
            Self::Failed(_) => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please fill in all payment details")]
    MissingFields,
    #[error("Please enter a valid 16-digit card number")]
    CardNumber,
    #[error("Please enter expiry date in MM/YY format")]
    Expiry,
    #[error("Please enter a valid CVV")]
    Cvv,
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("no subscriber details to check out")]
    NoSubscriber,
    #[error("checkout is already {0}")]
    NotAccepting(&'static str),
    #[error("session store failed: {0}")]
    Session(#[from] session::Error),
}

/// Masks the raw fields, then checks them in the order the form reports them.
pub fn validate(form: &PaymentForm) -> Result<CardDetails, ValidationError> {
    let card = CardDetails {
        number: format::card_number(&form.card_number),
        holder: form.card_name.trim().to_string(),
        expiry: format::expiry(&form.expiry_date),
        cvv: format::cvv(&form.cvv),
    };

    if card.number.is_empty() || card.holder.is_empty() || card.expiry.is_empty() || card.cvv.is_empty() {
        return Err(ValidationError::MissingFields);
    }
    if format::card_digits(&card.number).len() != 16 {
        return Err(ValidationError::CardNumber);
    }
    if card.expiry.len() != 5 {
        return Err(ValidationError::Expiry);
    }
    if card.cvv.len() < 3 {
        return Err(ValidationError::Cvv);
    }
    Ok(card)
}

/// A valid subscribe submission: stores the hand-off and returns a settled
/// checkout to `Form`. Refused while an attempt is in flight, whose outcome
/// would otherwise clear the newer hand-off.
pub fn restart(visit: &mut Visit, subscriber: Subscriber) -> Result<(), CheckoutError> {
    if visit.checkout == CheckoutState::Processing {
        return Err(CheckoutError::NotAccepting(visit.checkout.name()));
    }
    visit.handoff = Some(subscriber);
    visit.checkout = CheckoutState::Form;
    Ok(())
}

/// `Form -> Processing`. On error the visit is left untouched.
pub fn begin(visit: &mut Visit, form: &PaymentForm) -> Result<(CardDetails, Subscriber), CheckoutError> {
    if visit.checkout != CheckoutState::Form {
        return Err(CheckoutError::NotAccepting(visit.checkout.name()));
    }
    let subscriber = visit.handoff.clone().ok_or(CheckoutError::NoSubscriber)?;
    let card = validate(form)?;
    visit.checkout = CheckoutState::Processing;
    Ok((card, subscriber))
}

/// Applies the gateway outcome. Returns the subscriber to notify when the
/// charge went through.
pub fn settle(
    visit: &mut Visit,
    subscriber: Subscriber,
    outcome: Result<Receipt, DeclineReason>,
) -> Option<Subscriber> {
    match outcome {
        Ok(receipt) => {
            visit.handoff = None;
            visit.checkout = CheckoutState::Success {
                subscriber: subscriber.clone(),
                receipt,
            };
            Some(subscriber)
        }
        Err(reason) => {
            visit.checkout = CheckoutState::Failed(reason);
            None
        }
    }
}

#[derive(Clone)]
pub struct Checkout {
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn Notifier>,
    idle: Duration,
    /// Sessions with an attempt between `begin` and `settle`. Each request
    /// reads its own copy of the session, so this is what keeps two
    /// concurrent submissions from both charging.
    in_flight: Arc<Mutex<HashSet<Id>>>,
}

impl Checkout {
    pub fn new(gateway: Arc<dyn PaymentGateway>, notifier: Arc<dyn Notifier>, idle: Duration) -> Self {
        Self {
            gateway,
            notifier,
            idle,
            in_flight: Arc::default(),
        }
    }

    /// Validates and moves the visit to `Processing`, then charges on a
    /// background task. The handle resolves once the outcome is saved and the
    /// notification attempt is over.
    pub async fn submit(&self, session: Session, form: &PaymentForm) -> Result<JoinHandle<()>, CheckoutError> {
        let mut visit = Visit::load(&session).await?;
        let (card, subscriber) = begin(&mut visit, form)?;
        let id = session.id().ok_or(CheckoutError::NoSubscriber)?;
        if !self.in_flight.lock().await.insert(id) {
            return Err(CheckoutError::NotAccepting(CheckoutState::Processing.name()));
        }
        if let Err(err) = visit.store(&session, self.idle).await {
            self.in_flight.lock().await.remove(&id);
            return Err(err.into());
        }

        info!(session = %id, card = card.last_four(), "payment processing");
        let this = self.clone();
        Ok(tokio::spawn(async move {
            this.attempt(id, session, card, subscriber).await;
        }))
    }

    async fn attempt(&self, id: Id, session: Session, card: CardDetails, subscriber: Subscriber) {
        let outcome = self.gateway.charge(&card).await;
        if let Err(reason) = &outcome {
            warn!(session = %id, "payment failed: {reason}");
        }

        let recorded = self.record(&session, subscriber, outcome).await;
        self.in_flight.lock().await.remove(&id);

        match recorded {
            Ok(Some(subscriber)) => {
                info!(session = %id, email = %subscriber.email, "payment succeeded");
                if let Err(err) = self.notifier.subscription_confirmed(&subscriber).await {
                    warn!(email = %subscriber.email, "subscription email failed: {err}");
                }
            }
            Ok(None) => {}
            Err(err) => error!(session = %id, "payment outcome not saved: {err}"),
        }
    }

    /// The request that started the attempt may be long gone, so the settled
    /// visit is saved to the store directly.
    async fn record(
        &self,
        session: &Session,
        subscriber: Subscriber,
        outcome: Result<Receipt, DeclineReason>,
    ) -> Result<Option<Subscriber>, session::Error> {
        let mut visit = Visit::load(session).await?;
        let approved = settle(&mut visit, subscriber, outcome);
        visit.store(session, self.idle).await?;
        session.save().await?;
        Ok(approved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::SimulatedGateway;
    use crate::upstream::UpstreamError;
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use std::sync::Mutex as StdMutex;
    use tower_sessions::{MemoryStore, SessionStore};

    const IDLE: Duration = Duration::from_secs(60);

    struct FixedGateway(Result<Receipt, DeclineReason>);

    #[async_trait]
    impl PaymentGateway for FixedGateway {
        async fn charge(&self, _card: &CardDetails) -> Result<Receipt, DeclineReason> {
            self.0.clone()
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: StdMutex<Vec<Subscriber>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn subscription_confirmed(&self, subscriber: &Subscriber) -> Result<(), UpstreamError> {
            self.sent.lock().unwrap().push(subscriber.clone());
            if self.fail {
                Err(UpstreamError::Status(StatusCode::BAD_GATEWAY))
            } else {
                Ok(())
            }
        }
    }

    fn jane() -> Subscriber {
        Subscriber {
            full_name: "Jane Doe".into(),
            email: "jane@x.com".into(),
            ..Subscriber::default()
        }
    }

    fn valid_form() -> PaymentForm {
        PaymentForm {
            card_number: "4242 4242 4242 4242".into(),
            card_name: "Jane Doe".into(),
            expiry_date: "12/29".into(),
            cvv: "123".into(),
        }
    }

    fn approved() -> Result<Receipt, DeclineReason> {
        Ok(Receipt {
            payment_id: "ABCDEFGHIJKLM".into(),
        })
    }

    fn checkout_with(outcome: Result<Receipt, DeclineReason>, notifier: Arc<RecordingNotifier>) -> Checkout {
        Checkout::new(Arc::new(FixedGateway(outcome)), notifier, IDLE)
    }

    /// A saved session holding `visit`, as a Subscribe POST would leave it.
    async fn saved_session(store: &MemoryStore, visit: Visit) -> Session {
        let session = Session::new(None, Arc::new(store.clone()), None);
        visit.store(&session, IDLE).await.unwrap();
        session.save().await.unwrap();
        session
    }

    fn with_jane() -> Visit {
        Visit {
            handoff: Some(jane()),
            ..Visit::default()
        }
    }

    /// What the next request for the same cookie would see.
    async fn reload(store: &MemoryStore, session: &Session) -> Visit {
        let fresh = Session::new(session.id(), Arc::new(store.clone()), None);
        Visit::load(&fresh).await.unwrap()
    }

    #[test]
    fn validation_reports_first_problem_in_order() {
        let mut form = valid_form();
        form.card_name = "  ".into();
        assert_eq!(validate(&form), Err(ValidationError::MissingFields));

        let mut form = valid_form();
        form.card_number = "4242 4242 4242".into();
        assert_eq!(validate(&form), Err(ValidationError::CardNumber));

        let mut form = valid_form();
        form.expiry_date = "129".into();
        assert_eq!(validate(&form), Err(ValidationError::Expiry));

        let mut form = valid_form();
        form.cvv = "12".into();
        assert_eq!(validate(&form), Err(ValidationError::Cvv));
    }

    #[test]
    fn validation_masks_raw_input() {
        let form = PaymentForm {
            card_number: "4242-4242-4242-4242".into(),
            card_name: " Jane Doe ".into(),
            expiry_date: "1229".into(),
            cvv: "1234".into(),
        };
        let card = validate(&form).unwrap();
        assert_eq!(card.number, "4242 4242 4242 4242");
        assert_eq!(card.holder, "Jane Doe");
        assert_eq!(card.expiry, "12/29");
        assert_eq!(card.cvv, "1234");
    }

    #[test]
    fn invalid_submit_stays_on_form() {
        let mut visit = with_jane();
        let mut form = valid_form();
        form.cvv = "1".into();

        let err = begin(&mut visit, &form).unwrap_err();
        assert!(matches!(err, CheckoutError::Invalid(ValidationError::Cvv)));
        assert_eq!(visit, with_jane());
    }

    #[test]
    fn begin_requires_subscriber_and_form_state() {
        let mut visit = Visit::default();
        assert!(matches!(begin(&mut visit, &valid_form()), Err(CheckoutError::NoSubscriber)));

        visit.handoff = Some(jane());
        visit.checkout = CheckoutState::Processing;
        assert!(matches!(
            begin(&mut visit, &valid_form()),
            Err(CheckoutError::NotAccepting("processing"))
        ));

        visit.checkout = CheckoutState::Failed(DeclineReason::Declined);
        assert!(begin(&mut visit, &valid_form()).is_err());
    }

    #[test]
    fn restart_resets_a_settled_checkout() {
        let mut visit = Visit {
            handoff: Some(jane()),
            checkout: CheckoutState::Failed(DeclineReason::Declined),
        };
        let mut john = jane();
        john.full_name = "John Roe".into();

        restart(&mut visit, john.clone()).unwrap();
        assert_eq!(visit.handoff, Some(john));
        assert_eq!(visit.checkout, CheckoutState::Form);
    }

    #[test]
    fn restart_is_refused_while_processing() {
        let mut visit = Visit {
            handoff: Some(jane()),
            checkout: CheckoutState::Processing,
        };
        let mut john = jane();
        john.email = "john@x.com".into();

        let err = restart(&mut visit, john).unwrap_err();
        assert!(matches!(err, CheckoutError::NotAccepting("processing")));
        assert_eq!(visit.handoff, Some(jane()));
        assert_eq!(visit.checkout, CheckoutState::Processing);
    }

    #[tokio::test]
    async fn forced_success_clears_handoff_and_notifies() {
        let store = MemoryStore::default();
        let notifier = Arc::new(RecordingNotifier::default());
        let checkout = checkout_with(approved(), notifier.clone());
        let session = saved_session(&store, with_jane()).await;

        let handle = checkout.submit(session.clone(), &valid_form()).await.unwrap();
        handle.await.unwrap();

        let visit = reload(&store, &session).await;
        assert!(visit.handoff.is_none());
        match visit.checkout {
            CheckoutState::Success { subscriber, receipt } => {
                assert_eq!(subscriber.email, "jane@x.com");
                assert_eq!(receipt.payment_id, "ABCDEFGHIJKLM");
            }
            other => panic!("expected success, got {other:?}"),
        }
        assert_eq!(notifier.sent.lock().unwrap().as_slice(), &[jane()]);
    }

    #[tokio::test]
    async fn forced_failure_keeps_handoff() {
        let store = MemoryStore::default();
        let notifier = Arc::new(RecordingNotifier::default());
        let checkout = checkout_with(Err(DeclineReason::Declined), notifier.clone());
        let session = saved_session(&store, with_jane()).await;

        checkout.submit(session.clone(), &valid_form()).await.unwrap().await.unwrap();

        let visit = reload(&store, &session).await;
        assert_eq!(visit.handoff, Some(jane()));
        assert_eq!(visit.checkout, CheckoutState::Failed(DeclineReason::Declined));
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn notification_failure_does_not_undo_success() {
        let store = MemoryStore::default();
        let notifier = Arc::new(RecordingNotifier {
            fail: true,
            ..RecordingNotifier::default()
        });
        let checkout = checkout_with(approved(), notifier.clone());
        let session = saved_session(&store, with_jane()).await;

        checkout.submit(session.clone(), &valid_form()).await.unwrap().await.unwrap();

        let visit = reload(&store, &session).await;
        assert_eq!(visit.checkout.name(), "success");
        assert!(visit.handoff.is_none());
        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn second_submit_is_rejected_while_processing() {
        let store = MemoryStore::default();
        let checkout = checkout_with(approved(), Arc::new(RecordingNotifier::default()));
        let session = saved_session(
            &store,
            Visit {
                handoff: Some(jane()),
                checkout: CheckoutState::Processing,
            },
        )
        .await;

        let err = checkout.submit(session, &valid_form()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::NotAccepting("processing")));
    }

    #[tokio::test]
    async fn concurrent_submits_charge_once() {
        let store = MemoryStore::default();
        let gateway = SimulatedGateway::new(Duration::from_millis(200), 1.0);
        let checkout = Checkout::new(Arc::new(gateway), Arc::new(RecordingNotifier::default()), IDLE);
        let saved = saved_session(&store, with_jane()).await;
        let first = Session::new(saved.id(), Arc::new(store.clone()), None);
        let second = Session::new(saved.id(), Arc::new(store.clone()), None);
        // Both requests read the session before either has written.
        Visit::load(&first).await.unwrap();
        Visit::load(&second).await.unwrap();

        let handle = checkout.submit(first, &valid_form()).await.unwrap();
        let err = checkout.submit(second, &valid_form()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::NotAccepting("processing")));
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn unknown_session_is_never_created() {
        let store = MemoryStore::default();
        let checkout = checkout_with(approved(), Arc::new(RecordingNotifier::default()));

        for _ in 0..50 {
            let id = Id::default();
            let session = Session::new(Some(id), Arc::new(store.clone()), None);
            let err = checkout.submit(session.clone(), &PaymentForm::default()).await.unwrap_err();
            assert!(matches!(err, CheckoutError::NoSubscriber));
            assert!(!session.is_modified());
            assert!(store.load(&id).await.unwrap().is_none());
        }
        assert!(checkout.in_flight.lock().await.is_empty());
    }
}
