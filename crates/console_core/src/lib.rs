//! Client side of the manager console: a request bridge that folds every
//! HTTP outcome into an [`ApiResponse`] envelope, plus the dialog controllers
//! that drive it.

pub mod bridge;
pub mod collab;
pub mod forms;
pub mod payload;
pub mod resources;

pub use bridge::{HttpBridge, RequestBridge};
pub use collab::{Navigator, Notification, NotificationLevel, Notifier, Refresher, TracingNotifier};
pub use forms::{
    menu::{MenuDraft, MenuField, MenuForm, SubmitOutcome},
    search::SearchBox,
    DialogState, FormError, FormMode, FormSettings, RejectionHandling,
};
pub use payload::{Attachment, AttachmentError, MultipartPayload, Part, RequestBody};
pub use resources::ManagerApi;
pub use shared::protocol::{ApiResponse, ServerReply};
