use std::{error::Error, io, path::PathBuf};

use clap::Parser;
use dialoguer::{console::Term, Confirm, Select};
use tokio::fs;
use tracing::warn;
use tracing_subscriber::{
    layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

use roster_admin::{
    api::user::Id,
    backend,
    dashboard::{self, table, Admission, Mode, Session},
    policy::Role,
    Config, Dashboard,
};

/// Terminal panel for managing application users.
#[derive(Parser)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();

    let config = fs::read_to_string(&args.config).await?;
    let config = toml::from_str::<Config>(&config)?;

    let session = Session::from(config.session.with_env_overrides());
    let mut dashboard = Dashboard::new(
        backend::Client::new(config.backend)?,
        config.roster,
        session,
    );

    match dashboard.mount().await {
        Admission::LoginRequired => {
            println!("Please log in to manage users.");
            return Ok(());
        }
        Admission::AccessDenied => {
            println!("{}", dashboard::ACCESS_DENIED);
            return Ok(());
        }
        Admission::Granted => {}
    }

    let term = Term::stderr();
    loop {
        if let Mode::Todos(handoff) = dashboard.mode() {
            println!(
                "\nTo-do items of {} ({}) are handled by the to-do view \
                 (acting as {}).",
                handoff.email,
                handoff.user_id,
                handoff.role.map_or("unknown", Role::as_str),
            );
            let back = Confirm::new()
                .with_prompt("Back to users?")
                .default(true)
                .interact_on(&term)?;
            if !back {
                return Ok(());
            }
            dashboard.back_to_users().await;
            continue;
        }

        print_roster(&dashboard);

        let choice = Select::new()
            .with_prompt("Action")
            .items(&Action::ALL.map(Action::label))
            .default(0)
            .interact_on(&term)?;
        match Action::ALL[choice] {
            Action::Refresh => dashboard.fetch_users().await,
            Action::ChangeRole => change_role(&mut dashboard, &term).await?,
            Action::Delete => delete_user(&mut dashboard, &term).await?,
            Action::ViewTodos => {
                if let Some((id, email)) =
                    pick_user(&dashboard, &term, |_| true)?
                {
                    dashboard.view_user_todos(&id, &email);
                }
            }
            Action::Quit => return Ok(()),
        }
    }
}

#[derive(Clone, Copy)]
enum Action {
    Refresh,
    ChangeRole,
    Delete,
    ViewTodos,
    Quit,
}

impl Action {
    const ALL: [Self; 5] = [
        Self::Refresh,
        Self::ChangeRole,
        Self::Delete,
        Self::ViewTodos,
        Self::Quit,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::Refresh => "Refresh",
            Self::ChangeRole => "Change role",
            Self::Delete => "Delete user",
            Self::ViewTodos => "View to-dos",
            Self::Quit => "Quit",
        }
    }
}

fn print_roster(dashboard: &Dashboard) {
    let state = dashboard.state();
    println!();
    if let Some(error) = &state.error {
        println!("error: {error}");
    }
    if let Some(message) = &state.message {
        println!("{message}");
    }
    if state.users.is_empty() {
        println!("No users found.");
    } else {
        println!("{}", table::render(&dashboard.rows()));
    }
}

/// Lets the operator pick one of the rows accepted by `filter`.
fn pick_user(
    dashboard: &Dashboard,
    term: &Term,
    filter: impl Fn(&dashboard::RowView<'_>) -> bool,
) -> Result<Option<(Id, String)>, dialoguer::Error> {
    let rows = dashboard
        .rows()
        .into_iter()
        .filter(|row| filter(row))
        .collect::<Vec<_>>();
    if rows.is_empty() {
        println!("No user is eligible for this action.");
        return Ok(None);
    }

    let labels = rows
        .iter()
        .map(|row| format!("{} <{}>", row.user.name, row.user.email))
        .collect::<Vec<_>>();
    let choice = Select::new()
        .with_prompt("User")
        .items(&labels)
        .default(0)
        .interact_on_opt(term)?;
    Ok(choice.map(|i| (rows[i].user.id.clone(), rows[i].user.email.clone())))
}

async fn change_role(
    dashboard: &mut Dashboard,
    term: &Term,
) -> Result<(), dialoguer::Error> {
    let Some((id, email)) =
        pick_user(dashboard, term, |row| !row.role_select_disabled)?
    else {
        return Ok(());
    };
    let roles = dashboard
        .rows()
        .iter()
        .find(|row| row.user.id == id)
        .map(|row| row.enabled_roles().collect::<Vec<_>>())
        .unwrap_or_default();
    if roles.is_empty() {
        println!("No role can be assigned to {email}.");
        return Ok(());
    }

    let choice = Select::new()
        .with_prompt("New role")
        .items(&roles)
        .default(0)
        .interact_on_opt(term)?;
    if let Some(i) = choice {
        dashboard.change_role(&id, &email, roles[i]).await;
    }
    Ok(())
}

async fn delete_user(
    dashboard: &mut Dashboard,
    term: &Term,
) -> Result<(), dialoguer::Error> {
    let Some((id, email)) =
        pick_user(dashboard, term, |row| !row.delete_disabled)?
    else {
        return Ok(());
    };
    dashboard
        .delete_user(&id, &email, |prompt| {
            Confirm::new()
                .with_prompt(prompt)
                .default(false)
                .interact_on(term)
                .unwrap_or_else(|e| {
                    warn!("treating unreadable confirmation as declined: {e}");
                    false
                })
        })
        .await;
    Ok(())
}
