// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! CTDB scheduled jobs and administration.
//!
//! `send-reminders` runs hourly from cron, `notify-diary` once a day.

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use ctdb::config::Config;
use ctdb::db::{self, accounts::NewGroup, accounts::NewUser, Db};
use ctdb::services::{self, diary_notifier, passwords, reminder_schedule};
use ctdb::time_utils;

#[derive(Parser, Debug)]
#[command(author, version, about = "CTDB jobs and administration", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Mail every reminder due this hour
    SendReminders {
        /// Local time to evaluate instead of now (`YYYY-MM-DDTHH:MM:SS`)
        #[arg(long)]
        at: Option<NaiveDateTime>,
    },
    /// Warn diary keepers about missing diaries
    NotifyDiary {
        /// Print the notices without sending mail
        #[arg(long)]
        test: bool,
    },
    /// Create a user with a profile
    CreateUser {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "CTDB_PASSWORD")]
        password: String,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
        #[arg(long)]
        superuser: bool,
        /// Username of the user's boss
        #[arg(long)]
        boss: Option<String>,
        #[arg(long)]
        keep_diary: bool,
        /// First date a diary is expected (defaults to today)
        #[arg(long)]
        diary_start: Option<NaiveDate>,
    },
    /// Create a group with its profile
    CreateGroup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        department: bool,
        #[arg(long)]
        displayed: bool,
        /// Name of the parent department
        #[arg(long)]
        parent: Option<String>,
        /// Names of groups this group supervises
        #[arg(long = "supervises")]
        supervises: Vec<String>,
    },
    /// Add a user to a group, optionally recording the roles played
    AddToGroup {
        #[arg(long)]
        username: String,
        #[arg(long)]
        group: String,
        #[arg(long = "role")]
        roles: Vec<String>,
    },
    /// Grant a permission codename (`app.action_model`) to a user or group
    Grant {
        codename: String,
        #[arg(long, conflicts_with = "group", required_unless_present = "group")]
        user: Option<String>,
        #[arg(long)]
        group: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ctdb=info,info")),
        )
        .init();

    let config = Config::from_env().context("loading configuration")?;
    let db = Db::open(&config.database_path).context("opening database")?;

    match args.command {
        Command::SendReminders { at } => {
            let now = at.unwrap_or_else(|| time_utils::now_local(config.time_zone).naive_local());
            let mailer = services::build_mailer(&config)?;
            let run = reminder_schedule::send_due_reminders(
                &db,
                mailer.as_ref(),
                &config.default_from_email,
                config.reminder_daily_hour,
                now,
            )
            .await?;
            tracing::info!(sent = run.sent.len(), failed = run.failed.len(), "Reminder run finished");
        }
        Command::NotifyDiary { test } => {
            let today = time_utils::today(config.time_zone);
            let notices = diary_notifier::collect_notices(&db, today).await?;
            if test {
                for notice in &notices {
                    println!(
                        "{}\tlevel {}\tcc {}\t{}",
                        notice.username,
                        notice.level,
                        notice.cc.join(","),
                        notice
                            .dates
                            .iter()
                            .map(|d| d.to_string())
                            .collect::<Vec<_>>()
                            .join(",")
                    );
                }
            } else {
                let mailer = services::build_mailer(&config)?;
                let sent =
                    diary_notifier::send_notices(mailer.as_ref(), &config.default_from_email, &notices)
                        .await;
                tracing::info!(notices = notices.len(), sent, "Diary notices sent");
            }
        }
        Command::CreateUser {
            username,
            email,
            password,
            first_name,
            last_name,
            superuser,
            boss,
            keep_diary,
            diary_start,
        } => {
            let password_hash = passwords::hash_password(&password, passwords::DEFAULT_ITERATIONS)?;
            let diary_starting_date =
                diary_start.unwrap_or_else(|| time_utils::today(config.time_zone));
            let id = db
                .call(move |conn| {
                    let boss_id = match boss {
                        Some(name) => Some(user_id(conn, &name)?),
                        None => None,
                    };
                    Ok(db::accounts::create_user(
                        conn,
                        &NewUser {
                            username,
                            email,
                            first_name,
                            last_name,
                            password_hash,
                            is_superuser: superuser,
                            boss_id,
                            keep_diary,
                            diary_starting_date,
                        },
                    )?)
                })
                .await?;
            println!("created user {id}");
        }
        Command::CreateGroup {
            name,
            department,
            displayed,
            parent,
            supervises,
        } => {
            let id = db
                .call(move |conn| {
                    let parent_department = match parent {
                        Some(parent) => Some(group_id(conn, &parent)?),
                        None => None,
                    };
                    let tx = conn.transaction()?;
                    let id = db::accounts::create_group(
                        &tx,
                        &NewGroup {
                            name,
                            is_department: department,
                            is_displayed: displayed,
                            parent_department,
                            managed_by: None,
                        },
                    )?;
                    for supervised in &supervises {
                        let supervised = group_id(&tx, supervised)?;
                        db::accounts::add_supervise_role(&tx, id, supervised)?;
                    }
                    tx.commit()?;
                    Ok(id)
                })
                .await?;
            println!("created group {id}");
        }
        Command::AddToGroup {
            username,
            group,
            roles,
        } => {
            db.call(move |conn| {
                let user = user_id(conn, &username)?;
                let group = group_id(conn, &group)?;
                db::accounts::add_user_to_group(conn, user, group)?;
                if !roles.is_empty() {
                    db::accounts::create_play(conn, user, group, &roles)?;
                }
                Ok(())
            })
            .await?;
            println!("added");
        }
        Command::Grant {
            codename,
            user,
            group,
        } => {
            if !codename.contains('.') {
                bail!("permission codenames look like app.action_model");
            }
            db.call(move |conn| {
                match (user, group) {
                    (Some(user), _) => {
                        let id = user_id(conn, &user)?;
                        db::accounts::grant_user_permission(conn, id, &codename)?;
                    }
                    (None, Some(group)) => {
                        let id = group_id(conn, &group)?;
                        db::accounts::grant_group_permission(conn, id, &codename)?;
                    }
                    (None, None) => {}
                }
                Ok(())
            })
            .await?;
            println!("granted");
        }
    }
    Ok(())
}

fn user_id(conn: &rusqlite::Connection, username: &str) -> ctdb::error::Result<i64> {
    db::accounts::find_user_by_username(conn, username)?
        .map(|u| u.id)
        .ok_or_else(|| ctdb::error::AppError::NotFound(format!("User {username} not found")))
}

fn group_id(conn: &rusqlite::Connection, name: &str) -> ctdb::error::Result<i64> {
    db::accounts::find_group_by_name(conn, name)?
        .map(|g| g.id)
        .ok_or_else(|| ctdb::error::AppError::NotFound(format!("Group {name} not found")))
}
