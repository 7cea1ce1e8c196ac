//! Line commands and the text rendering of a screen snapshot.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use profile_view::domain::state::{AuthMode, Banner, Tab, View};
use profile_view::model::{BookingRecord, SelectedFile};
use profile_view::{ProfileViewModel, ScreenSnapshot, SubmitOutcome};

/// One line typed into the shell.
#[derive(Parser, Debug)]
#[command(name = "profile-shell", no_binary_name = true)]
pub struct ReplLine {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Sign in with an existing account
    Login { email: String, password: String },
    /// Create an account and sign in
    Register {
        name: String,
        email: String,
        password: String,
        confirmation: String,
    },
    /// Switch between login and register
    Mode,
    /// Edit the profile form
    Set {
        #[arg(value_enum)]
        field: ProfileField,
        value: String,
    },
    /// Switch tabs (entering bookings loads them)
    Tab {
        #[arg(value_enum)]
        tab: TabArg,
    },
    /// Choose a new profile picture
    Pick { path: PathBuf },
    /// Drop the chosen picture
    CancelPick,
    /// Submit the profile form
    Save,
    /// Change the password
    Password {
        current: String,
        new: String,
        confirmation: String,
    },
    /// Hide the banner
    Dismiss,
    Logout,
    /// Print the screen
    Show,
    #[command(alias = "exit")]
    Quit,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    Name,
    Email,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabArg {
    General,
    Security,
    Bookings,
}

impl From<TabArg> for Tab {
    fn from(tab: TabArg) -> Self {
        match tab {
            TabArg::General => Tab::General,
            TabArg::Security => Tab::Security,
            TabArg::Bookings => Tab::Bookings,
        }
    }
}

/// Split a line shell-style and parse it. Blank lines yield `None`; the
/// error carries clap's rendered message (including `help` output).
pub fn parse(line: &str) -> Result<Option<Command>, String> {
    let words = shell_words::split(line).map_err(|e| format!("cannot parse line: {e}"))?;
    if words.is_empty() {
        return Ok(None);
    }
    ReplLine::try_parse_from(words)
        .map(|l| Some(l.command))
        .map_err(|e| e.to_string().trim_end().to_string())
}

/// Content type from the file extension; unknown extensions are not images.
pub fn guess_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("svg") => "image/svg+xml",
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

pub async fn read_selected_file(path: &Path) -> Result<SelectedFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    Ok(SelectedFile::new(file_name, guess_content_type(path), bytes))
}

/// Run one command. Returns false when the shell should exit.
pub async fn execute(vm: &ProfileViewModel, cmd: Command, out: &mut String) -> Result<bool> {
    match cmd {
        Command::Login { email, password } => {
            ensure_mode(vm, AuthMode::Login);
            vm.edit_auth(|f| {
                f.email = email;
                f.password = password;
            });
            report(vm.submit_auth().await, out);
        }
        Command::Register {
            name,
            email,
            password,
            confirmation,
        } => {
            ensure_mode(vm, AuthMode::Register);
            vm.edit_auth(|f| {
                f.name = name;
                f.email = email;
                f.password = password;
                f.password_confirmation = confirmation;
            });
            report(vm.submit_auth().await, out);
        }
        Command::Mode => vm.toggle_auth_mode(),
        Command::Set { field, value } => vm.edit_profile(|f| match field {
            ProfileField::Name => f.name = value,
            ProfileField::Email => f.email = value,
        }),
        Command::Tab { tab } => {
            if let Some(fetch) = vm.activate_tab(tab.into()) {
                out.push_str("loading bookings...\n");
                fetch.settled().await;
            }
        }
        Command::Pick { path } => {
            let file = read_selected_file(&path).await?;
            if let Err(e) = vm.select_file(file) {
                tracing::debug!(error = %e, "file not accepted");
            }
        }
        Command::CancelPick => vm.cancel_upload(),
        Command::Save => report(vm.submit_profile_update().await, out),
        Command::Password {
            current,
            new,
            confirmation,
        } => {
            vm.edit_password(|f| {
                f.current_password = current;
                f.password = new;
                f.password_confirmation = confirmation;
            });
            report(vm.submit_password_update().await, out);
        }
        Command::Dismiss => vm.dismiss_banner(),
        Command::Logout => vm.logout().await,
        Command::Show => {}
        Command::Quit => return Ok(false),
    }
    out.push_str(&render(&vm.snapshot()));
    Ok(true)
}

fn ensure_mode(vm: &ProfileViewModel, mode: AuthMode) {
    if vm.snapshot().view.auth_mode().is_some_and(|m| m != mode) {
        vm.toggle_auth_mode();
    }
}

fn report(outcome: SubmitOutcome, out: &mut String) {
    match outcome {
        SubmitOutcome::Busy => out.push_str("another request is still running\n"),
        SubmitOutcome::Ignored => out.push_str("not available on this screen\n"),
        SubmitOutcome::Succeeded | SubmitOutcome::Failed => {}
    }
}

pub fn render(snap: &ScreenSnapshot) -> String {
    let mut s = String::new();
    match &snap.banner {
        Some(Banner::Error(t)) => {
            let _ = writeln!(s, "[error] {t}");
        }
        Some(Banner::Success(t)) => {
            let _ = writeln!(s, "[ok] {t}");
        }
        None => {}
    }

    match snap.view {
        View::SignedOut { mode } => {
            let title = match mode {
                AuthMode::Login => "Sign in",
                AuthMode::Register => "Create account",
            };
            let _ = writeln!(s, "== {title} ==");
            if mode == AuthMode::Register {
                let _ = writeln!(s, "name:  {}", snap.auth_form.name);
            }
            let _ = writeln!(s, "email: {}", snap.auth_form.email);
        }
        View::SignedIn { tab } => {
            if let Some(session) = &snap.session {
                let _ = writeln!(s, "== {} <{}> ==", session.name, session.email);
            }
            if let Some(url) = &snap.avatar_url {
                let _ = writeln!(s, "avatar: {url}");
            }
            let tabs = [Tab::General, Tab::Security, Tab::Bookings]
                .iter()
                .map(|t| {
                    if *t == tab {
                        format!("[{}]", t.label())
                    } else {
                        t.label().to_string()
                    }
                })
                .collect::<Vec<_>>()
                .join(" | ");
            let _ = writeln!(s, "{tabs}");
            render_tab(&mut s, tab, snap);
        }
    }
    if snap.is_submitting {
        s.push_str("(submitting...)\n");
    }
    s
}

fn render_tab(s: &mut String, tab: Tab, snap: &ScreenSnapshot) {
    match tab {
        Tab::General => {
            let _ = writeln!(s, "name:  {}", snap.profile_form.name);
            let _ = writeln!(s, "email: {}", snap.profile_form.email);
            if let Some(p) = &snap.pending_upload {
                let _ = writeln!(s, "new picture: {} (unsaved)", p.file_name);
            }
        }
        Tab::Security => {
            let filled = |v: &str| if v.is_empty() { "" } else { "********" };
            let f = &snap.password_form;
            let _ = writeln!(s, "current password: {}", filled(&f.current_password));
            let _ = writeln!(s, "new password:     {}", filled(&f.password));
            let _ = writeln!(s, "confirm:          {}", filled(&f.password_confirmation));
        }
        Tab::Bookings => {
            if snap.bookings_loading {
                s.push_str("loading...\n");
            } else if snap.bookings.is_empty() {
                s.push_str("No bookings yet.\n");
            } else {
                for b in &snap.bookings {
                    s.push_str(&booking_row(b));
                    s.push('\n');
                }
            }
        }
    }
}

fn booking_row(b: &BookingRecord) -> String {
    format!(
        "{} {} {} {} {} {} ${}",
        b.id_label(),
        BookingRecord::or_missing(&b.category),
        b.subcategory.as_deref().unwrap_or(""),
        BookingRecord::or_missing(&b.date),
        BookingRecord::or_missing(&b.time),
        b.status.label(),
        b.price_label()
    )
}
