use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use console_core::{
    ApiResponse, Attachment, HttpBridge, ManagerApi, MenuField, MenuForm, RejectionHandling,
    SearchBox, SubmitOutcome,
};
use shared::domain::{Category, MenuId, UserId};
use tracing_subscriber::EnvFilter;

mod config;
mod console;

use config::{load_settings, normalize_base_url, Settings};
use console::{print_menus, print_users, MenuListRefresher, StdoutNavigator, StdoutNotifier};

const USER_ROUTE: &str = "/manager/user";

#[derive(Parser, Debug)]
#[command(name = "manager-console", about = "Menu and user management against the ordering API")]
struct Args {
    /// Overrides `base_api_url` from config.
    #[arg(long)]
    base_url: Option<String>,
    /// Bearer token; empty sends no Authorization header.
    #[arg(long)]
    token: Option<String>,
    /// Keep the dialog open when the API rejects a submission.
    #[arg(long)]
    strict_rejections: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(subcommand)]
    Menu(MenuCommand),
    #[command(subcommand)]
    User(UserCommand),
}

#[derive(Subcommand, Debug)]
enum MenuCommand {
    Create(MenuFields),
    Edit {
        #[arg(long)]
        id: i64,
        #[command(flatten)]
        fields: MenuFields,
    },
    List {
        #[arg(long)]
        search: Option<String>,
    },
    Delete {
        #[arg(long)]
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    List {
        #[arg(long)]
        search: Option<String>,
    },
    Search {
        #[arg(long)]
        keyword: String,
    },
    Delete {
        #[arg(long)]
        id: i64,
    },
}

#[derive(ClapArgs, Debug)]
struct MenuFields {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    price: Option<f64>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    category: Option<Category>,
    /// PNG, JPEG or PDF, at most 2 MiB.
    #[arg(long)]
    picture: Option<PathBuf>,
}

impl MenuFields {
    /// Applies only the flags that were given, leaving other draft fields as they are.
    async fn apply_to(self, form: &mut MenuForm<HttpBridge>) -> Result<()> {
        if let Some(name) = self.name {
            form.update_field(MenuField::Name(name));
        }
        if let Some(price) = self.price {
            form.update_field(MenuField::Price(Some(price)));
        }
        if let Some(description) = self.description {
            form.update_field(MenuField::Description(description));
        }
        if let Some(category) = self.category {
            form.update_field(MenuField::Category(Some(category)));
        }
        if let Some(path) = self.picture {
            let picture = Attachment::from_path(&path)
                .await
                .with_context(|| format!("failed to load picture {}", path.display()))?;
            form.set_picture(Some(picture));
        }
        Ok(())
    }
}

struct Console {
    settings: Settings,
    bridge: Arc<HttpBridge>,
    api: Arc<ManagerApi<HttpBridge>>,
}

impl Console {
    fn new(settings: Settings) -> Self {
        let bridge = Arc::new(HttpBridge::new(settings.base_api_url.clone()));
        let api = Arc::new(ManagerApi::new(
            bridge.clone(),
            settings.base_api_url.clone(),
            settings.token.clone(),
        ));
        Self {
            settings,
            bridge,
            api,
        }
    }

    fn menu_form(&self) -> MenuForm<HttpBridge> {
        MenuForm::new(
            self.bridge.clone(),
            Arc::new(StdoutNotifier),
            Arc::new(MenuListRefresher::new(self.api.clone())),
            self.settings.form_settings(),
        )
    }

    async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Menu(MenuCommand::Create(fields)) => {
                let mut form = self.menu_form();
                form.open();
                fields.apply_to(&mut form).await?;
                self.submit(form).await
            }
            Command::Menu(MenuCommand::Edit { id, fields }) => {
                let listing = self.api.list_menus(None).await;
                if !listing.status {
                    bail!("failed to load menu: {}", listing.message_or_fallback());
                }
                let item = listing
                    .data
                    .unwrap_or_default()
                    .into_iter()
                    .find(|item| item.id == MenuId(id))
                    .ok_or_else(|| anyhow!("menu item {id} not found"))?;
                let mut form = self.menu_form();
                form.open_edit(&item);
                fields.apply_to(&mut form).await?;
                self.submit(form).await
            }
            Command::Menu(MenuCommand::List { search }) => {
                let listing = self.api.list_menus(search.as_deref()).await;
                match listing.data {
                    Some(menus) if listing.status => {
                        print_menus(&menus);
                        Ok(())
                    }
                    _ => bail!("failed to list menu: {}", listing.message_or_fallback()),
                }
            }
            Command::Menu(MenuCommand::Delete { id }) => {
                report_deletion(self.api.delete_menu(MenuId(id)).await)
            }
            Command::User(UserCommand::List { search }) => self.list_users(search.as_deref()).await,
            Command::User(UserCommand::Search { keyword }) => {
                let mut search = SearchBox::new(USER_ROUTE, "", Arc::new(StdoutNavigator));
                search.set_keyword(keyword);
                search.submit();
                self.list_users(Some(search.keyword())).await
            }
            Command::User(UserCommand::Delete { id }) => {
                report_deletion(self.api.delete_user(UserId(id)).await)
            }
        }
    }

    async fn list_users(&self, search: Option<&str>) -> Result<()> {
        let listing = self.api.list_users(search).await;
        match listing.data {
            Some(users) if listing.status => {
                print_users(&users);
                Ok(())
            }
            _ => bail!("failed to list users: {}", listing.message_or_fallback()),
        }
    }

    async fn submit(&self, mut form: MenuForm<HttpBridge>) -> Result<()> {
        let outcome = form.submit().await.context("menu submission failed")?;
        form.wait_for_refresh().await?;
        match outcome {
            SubmitOutcome::Invalid { missing } => {
                bail!("missing required fields: {}", missing.join(", "))
            }
            SubmitOutcome::Rejected {
                message,
                closed: false,
            } => bail!("rejected: {message}"),
            SubmitOutcome::Saved { .. } | SubmitOutcome::Rejected { .. } => Ok(()),
        }
    }
}

fn report_deletion(result: ApiResponse) -> Result<()> {
    if !result.status {
        bail!("delete failed: {}", result.message_or_fallback());
    }
    println!("[ok] {}", result.message.as_deref().unwrap_or("deleted"));
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(base_url) = args.base_url {
        settings.base_api_url = normalize_base_url(&base_url);
    }
    if let Some(token) = args.token {
        settings.token = token;
    }
    if args.strict_rejections {
        settings.rejection_handling = RejectionHandling::Strict;
    }
    tracing::debug!(
        base_api_url = %settings.base_api_url,
        rejection_handling = %settings.rejection_handling,
        "console settings loaded"
    );

    Console::new(settings).run(args.command).await
}
