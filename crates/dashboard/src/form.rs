//! Transfer form state machine.
//!
//! Models the send-Bitcoin form: field edits, blur validation, and
//! submission. Validation runs twice by design -- once on blur for
//! immediate feedback, and again inside [`TransferForm::submit`] so a
//! stale blur result can never let a bad value through.
//!
//! Outcomes reach the user through a [`Notifier`]; the form never
//! formats its own toasts beyond the fixed message strings. On success
//! the fields are cleared; on failure they are kept so the user can
//! correct and resubmit.

use wallet_core::{is_valid_bitcoin_address, to_satoshis, MIN_TRANSFER_SATS};

use crate::service::ChainService;

/// Validation message for a malformed address.
const MSG_INVALID_ADDRESS: &str = "Invalid Bitcoin address format";
/// Validation message for an amount below the transfer minimum.
const MSG_AMOUNT_TOO_SMALL: &str = "Amount must be at least 1500 satoshis (0.00001500 BTC)";
/// Validation message for an unparseable amount.
const MSG_INVALID_AMOUNT: &str = "Invalid amount";
/// Toast shown after a successful transfer.
const MSG_SUCCESS: &str = "Transfer completed successfully!";

/// Sink for user-facing notifications.
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

/// Where the form is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPhase {
    /// Accepting edits.
    Idle,
    /// Submission has started and validation is running.
    Validating,
    /// The transfer is in flight.
    Submitting,
}

/// The send-Bitcoin form.
#[derive(Debug)]
pub struct TransferForm {
    recipient: String,
    amount: String,
    recipient_error: Option<&'static str>,
    amount_error: Option<&'static str>,
    phase: FormPhase,
}

impl Default for TransferForm {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferForm {
    pub fn new() -> Self {
        Self {
            recipient: String::new(),
            amount: String::new(),
            recipient_error: None,
            amount_error: None,
            phase: FormPhase::Idle,
        }
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn recipient_error(&self) -> Option<&'static str> {
        self.recipient_error
    }

    pub fn amount_error(&self) -> Option<&'static str> {
        self.amount_error
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    /// Edit the recipient field. Typing clears the field's error.
    pub fn set_recipient(&mut self, value: &str) {
        self.recipient = value.to_owned();
        self.recipient_error = None;
    }

    /// Edit the amount field. Typing clears the field's error.
    pub fn set_amount(&mut self, value: &str) {
        self.amount = value.to_owned();
        self.amount_error = None;
    }

    /// Blur validation for the recipient field. An invalid value is
    /// flagged and surfaced through the notifier without blocking
    /// edits; an empty field stays unflagged until submit.
    pub fn blur_recipient(&mut self, notifier: &dyn Notifier) {
        self.recipient_error = if self.recipient.is_empty() {
            None
        } else {
            validate_recipient(&self.recipient).err()
        };
        if let Some(message) = self.recipient_error {
            notifier.error(message);
        }
    }

    /// Blur validation for the amount field. An invalid value is
    /// flagged and surfaced through the notifier without blocking
    /// edits; an empty field stays unflagged until submit.
    pub fn blur_amount(&mut self, notifier: &dyn Notifier) {
        self.amount_error = if self.amount.is_empty() {
            None
        } else {
            validate_amount(&self.amount).err()
        };
        if let Some(message) = self.amount_error {
            notifier.error(message);
        }
    }

    /// Validate and submit the transfer.
    ///
    /// Returns the transaction id on success. Validation failures and
    /// transfer errors go to the notifier; a submit while one is
    /// already in flight is ignored.
    pub async fn submit(
        &mut self,
        service: &dyn ChainService,
        notifier: &dyn Notifier,
    ) -> Option<String> {
        if self.phase == FormPhase::Submitting {
            return None;
        }

        self.phase = FormPhase::Validating;
        self.recipient_error = validate_recipient(&self.recipient).err();
        self.amount_error = validate_amount(&self.amount).err();

        let first_error = self.recipient_error.or(self.amount_error);
        if let Some(message) = first_error {
            self.phase = FormPhase::Idle;
            notifier.error(message);
            return None;
        }
        // Both fields validated just above.
        let amount_sats = match to_satoshis(&self.amount) {
            Ok(sats) => sats,
            Err(_) => {
                self.phase = FormPhase::Idle;
                notifier.error(MSG_INVALID_AMOUNT);
                return None;
            }
        };

        self.phase = FormPhase::Submitting;
        let result = service.send_transfer(&self.recipient, amount_sats).await;
        self.phase = FormPhase::Idle;

        match result {
            Ok(txid) => {
                tracing::info!(%txid, "transfer submitted");
                notifier.success(MSG_SUCCESS);
                self.recipient.clear();
                self.amount.clear();
                self.recipient_error = None;
                self.amount_error = None;
                Some(txid)
            }
            Err(err) => {
                tracing::error!(%err, "transfer failed");
                notifier.error(&err.to_string());
                None
            }
        }
    }
}

fn validate_recipient(recipient: &str) -> Result<(), &'static str> {
    if is_valid_bitcoin_address(recipient) {
        Ok(())
    } else {
        Err(MSG_INVALID_ADDRESS)
    }
}

fn validate_amount(amount: &str) -> Result<(), &'static str> {
    match to_satoshis(amount) {
        Ok(sats) if sats >= MIN_TRANSFER_SATS => Ok(()),
        Ok(_) => Err(MSG_AMOUNT_TOO_SMALL),
        Err(_) => Err(MSG_INVALID_AMOUNT),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
