//! Terminal stand-ins for the notification, refresh and navigation layers.

use std::sync::Arc;

use async_trait::async_trait;
use console_core::{
    HttpBridge, ManagerApi, Navigator, Notification, NotificationLevel, Notifier, Refresher,
    TracingNotifier,
};
use shared::domain::{MenuItem, UserSummary};

pub struct StdoutNotifier;

impl Notifier for StdoutNotifier {
    fn notify(&self, notification: Notification) {
        let tag = match notification.level {
            NotificationLevel::Success => "ok",
            NotificationLevel::Warning => "warn",
            NotificationLevel::Error => "error",
        };
        println!("[{tag}] {}", notification.message);
        TracingNotifier.notify(notification);
    }
}

/// Re-reads the menu listing, standing in for a view reload.
pub struct MenuListRefresher {
    api: Arc<ManagerApi<HttpBridge>>,
}

impl MenuListRefresher {
    pub fn new(api: Arc<ManagerApi<HttpBridge>>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Refresher for MenuListRefresher {
    async fn refresh(&self) {
        let listing = self.api.list_menus(None).await;
        match listing.data {
            Some(menus) if listing.status => print_menus(&menus),
            _ => println!("[warn] refresh failed: {}", listing.message_or_fallback()),
        }
    }
}

pub struct StdoutNavigator;

impl Navigator for StdoutNavigator {
    fn push(&self, target: &str) {
        tracing::info!(%target, "navigate");
        println!("-> {target}");
    }
}

pub fn print_menus(menus: &[MenuItem]) {
    if menus.is_empty() {
        println!("(no menu items)");
        return;
    }
    for menu in menus {
        println!(
            "{:>5}  {:<6}  {:>10}  {}  {}",
            menu.id.0,
            menu.category,
            menu.price,
            menu.name,
            menu.picture.as_deref().unwrap_or("-")
        );
    }
}

pub fn print_users(users: &[UserSummary]) {
    if users.is_empty() {
        println!("(no users)");
        return;
    }
    for user in users {
        let role = format!("{:?}", user.role);
        println!("{:>5}  {role:<8}  {}  <{}>", user.id.0, user.name, user.email);
    }
}
