use std::sync::Arc;

use shared::{
    domain::{Category, MenuItem},
    protocol::{ApiResponse, UNKNOWN_ERROR_MESSAGE},
};
use tokio::{task::JoinHandle, time::Instant};
use tracing::{debug, error, info, warn};

use super::{DialogState, FormError, FormMode, FormSettings, RejectionHandling};
use crate::{
    bridge::RequestBridge,
    collab::{Notification, NotificationLevel, Notifier, Refresher},
    payload::{Attachment, MultipartPayload, RequestBody},
};

pub const REQUIRED_FIELDS_MESSAGE: &str = "Please fill in all required fields.";
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong";
pub const SAVED_FALLBACK_MESSAGE: &str = "Menu saved";
pub const LEGACY_REJECTION_FALLBACK: &str = "Alhadullilah Behasil";
pub const STRICT_REJECTION_FALLBACK: &str = "Unexpected response";

const MENU_RESOURCE: &str = "menu";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MenuDraft {
    pub name: String,
    pub price: Option<f64>,
    pub description: String,
    pub category: Option<Category>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MenuField {
    Name(String),
    Price(Option<f64>),
    Description(String),
    Category(Option<Category>),
}

impl MenuDraft {
    pub fn apply(&mut self, field: MenuField) {
        match field {
            MenuField::Name(name) => self.name = name,
            MenuField::Price(price) => self.price = price,
            MenuField::Description(description) => self.description = description,
            MenuField::Category(category) => self.category = category,
        }
    }

    /// Validates the draft. A price of zero counts as missing, same as an
    /// absent one; so do NaN and infinities.
    pub fn validate(&self) -> Result<ValidMenu, Vec<&'static str>> {
        let name = self.name.trim();
        let description = self.description.trim();
        let price = self
            .price
            .filter(|price| *price != 0.0 && price.is_finite());

        let mut missing = Vec::new();
        if name.is_empty() {
            missing.push("name");
        }
        if price.is_none() {
            missing.push("price");
        }
        if self.category.is_none() {
            missing.push("category");
        }
        if description.is_empty() {
            missing.push("description");
        }

        match (price, self.category) {
            (Some(price), Some(category)) if missing.is_empty() => Ok(ValidMenu {
                name: name.to_string(),
                price,
                description: description.to_string(),
                category,
            }),
            _ => Err(missing),
        }
    }
}

impl From<&MenuItem> for MenuDraft {
    fn from(item: &MenuItem) -> Self {
        Self {
            name: item.name.clone(),
            price: Some(item.price),
            description: item.description.clone(),
            category: Some(item.category),
        }
    }
}

/// A draft that passed validation, with text fields trimmed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidMenu {
    pub name: String,
    pub price: f64,
    pub description: String,
    pub category: Category,
}

impl ValidMenu {
    pub fn into_payload(self, picture: Option<Attachment>) -> MultipartPayload {
        let payload = MultipartPayload::new()
            .text("name", self.name)
            .text("price", price_text(self.price))
            .text("category", self.category.as_str())
            .text("description", self.description);
        match picture {
            Some(picture) => payload.file("picture", picture),
            None => payload,
        }
    }
}

/// Formats a price as a browser form would submit it: positional notation
/// from `1e-6` up to `1e21`, exponent notation (`1e+21`, `5e-7`) outside.
fn price_text(price: f64) -> String {
    let magnitude = price.abs();
    if magnitude != 0.0 && (magnitude < 1e-6 || magnitude >= 1e21) {
        let text = format!("{price:e}");
        return match text.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{mantissa}e+{exponent}")
            }
            _ => text,
        };
    }
    price.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Validation failed; nothing was sent.
    Invalid { missing: Vec<&'static str> },
    Saved { message: String },
    /// The API said no. `closed` tells whether the dialog was dismissed anyway.
    Rejected { message: String, closed: bool },
}

pub struct MenuForm<B: ?Sized> {
    bridge: Arc<B>,
    notifier: Arc<dyn Notifier>,
    refresher: Arc<dyn Refresher>,
    settings: FormSettings,
    mode: FormMode,
    state: DialogState,
    draft: MenuDraft,
    picture: Option<Attachment>,
    pending_refresh: Option<JoinHandle<()>>,
}

impl<B: RequestBridge + ?Sized> MenuForm<B> {
    pub fn new(
        bridge: Arc<B>,
        notifier: Arc<dyn Notifier>,
        refresher: Arc<dyn Refresher>,
        settings: FormSettings,
    ) -> Self {
        Self {
            bridge,
            notifier,
            refresher,
            settings,
            mode: FormMode::Create,
            state: DialogState::Closed,
            draft: MenuDraft::default(),
            picture: None,
            pending_refresh: None,
        }
    }

    pub fn state(&self) -> DialogState {
        self.state
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn draft(&self) -> &MenuDraft {
        &self.draft
    }

    pub fn picture(&self) -> Option<&Attachment> {
        self.picture.as_ref()
    }

    /// Opens an empty creation dialog.
    pub fn open(&mut self) {
        self.mode = FormMode::Create;
        self.draft = MenuDraft::default();
        self.picture = None;
        self.state = DialogState::Open;
    }

    /// Opens the dialog pre-filled from an existing item; submit issues `PUT`.
    pub fn open_edit(&mut self, item: &MenuItem) {
        self.mode = FormMode::Edit(item.id);
        self.draft = MenuDraft::from(item);
        self.picture = None;
        self.state = DialogState::Open;
    }

    pub fn close(&mut self) {
        self.state = DialogState::Closed;
        self.draft = MenuDraft::default();
        self.picture = None;
    }

    pub fn update_field(&mut self, field: MenuField) {
        self.draft.apply(field);
    }

    pub fn set_picture(&mut self, picture: Option<Attachment>) {
        self.picture = picture;
    }

    pub async fn submit(&mut self) -> Result<SubmitOutcome, FormError> {
        if self.state != DialogState::Open {
            let err = FormError::NotOpen(self.state);
            error!(error = %err, "menu submit failed");
            self.notify(NotificationLevel::Error, GENERIC_FAILURE_MESSAGE);
            return Err(err);
        }

        debug!(draft = ?self.draft, picture = ?self.picture, "submitting menu draft");
        let menu = match self.draft.validate() {
            Ok(menu) => menu,
            Err(missing) => {
                error!(?missing, "missing required fields");
                self.notify(NotificationLevel::Error, REQUIRED_FIELDS_MESSAGE);
                return Ok(SubmitOutcome::Invalid { missing });
            }
        };

        if self.picture.is_none() {
            warn!("no picture selected, skipping file upload");
        }
        let payload = menu.into_payload(self.picture.clone());
        debug!(
            fields = ?payload.field_names().collect::<Vec<_>>(),
            "menu payload assembled"
        );

        let body = RequestBody::Multipart(payload);
        let token = self.settings.token.as_str();
        let envelope = {
            let _in_flight = InFlight::begin(&mut self.state);
            match self.mode {
                FormMode::Create => {
                    let url = self.settings.endpoint(&format!("{MENU_RESOURCE}/"));
                    self.bridge.post(&url, body, token).await
                }
                FormMode::Edit(id) => {
                    let url = self.settings.endpoint(&format!("{MENU_RESOURCE}/{id}"));
                    self.bridge.put(&url, body, token).await
                }
            }
        };
        debug!(?envelope, "menu api response");

        Ok(self.settle(envelope))
    }

    /// Awaits the refresh scheduled by the last submit, if any.
    pub async fn wait_for_refresh(&mut self) -> Result<(), FormError> {
        match self.pending_refresh.take() {
            Some(handle) => Ok(handle.await?),
            None => Ok(()),
        }
    }

    fn settle(&mut self, envelope: ApiResponse) -> SubmitOutcome {
        let reply = envelope.server_reply();
        if envelope.status && reply.status {
            let message = reply
                .message
                .unwrap_or_else(|| SAVED_FALLBACK_MESSAGE.to_string());
            info!(mode = ?self.mode, "menu saved");
            self.close();
            self.notify(NotificationLevel::Success, &message);
            self.schedule_refresh();
            return SubmitOutcome::Saved { message };
        }

        let server_message = reply.message.or(envelope.message);
        match self.settings.rejection_handling {
            RejectionHandling::Legacy => {
                // The bridge's own fallback never reaches the user here.
                let message = server_message
                    .filter(|message| message != UNKNOWN_ERROR_MESSAGE)
                    .unwrap_or_else(|| LEGACY_REJECTION_FALLBACK.to_string());
                self.close();
                self.notify(NotificationLevel::Success, &message);
                self.schedule_refresh();
                SubmitOutcome::Rejected {
                    message,
                    closed: true,
                }
            }
            RejectionHandling::Strict => {
                let message =
                    server_message.unwrap_or_else(|| STRICT_REJECTION_FALLBACK.to_string());
                self.state = DialogState::Open;
                self.notify(NotificationLevel::Warning, &message);
                SubmitOutcome::Rejected {
                    message,
                    closed: false,
                }
            }
        }
    }

    fn schedule_refresh(&mut self) {
        let refresher = Arc::clone(&self.refresher);
        let due = Instant::now() + self.settings.refresh_delay;
        self.pending_refresh = Some(tokio::spawn(async move {
            tokio::time::sleep_until(due).await;
            refresher.refresh().await;
        }));
    }

    fn notify(&self, level: NotificationLevel, message: &str) {
        self.notifier.notify(Notification::new(level, message));
    }
}

/// Marks the dialog `Submitting` for the life of a request and puts it back
/// to `Open` when dropped, including when the submit future is cancelled.
struct InFlight<'a> {
    state: &'a mut DialogState,
}

impl<'a> InFlight<'a> {
    fn begin(state: &'a mut DialogState) -> Self {
        *state = DialogState::Submitting;
        Self { state }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        *self.state = DialogState::Open;
    }
}

#[cfg(test)]
#[path = "../tests/menu_form_tests.rs"]
mod tests;
