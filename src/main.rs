use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use legal_assist_lib::chat::SessionListView;
use legal_assist_lib::config::default_data_dir;
use legal_assist_lib::documents::{format_file_size, status_badge, DocumentView};
use legal_assist_lib::lawyers::{
    ConnectionResponse, ExperienceBucket, LawyerView, SearchParams, SortKey,
};
use legal_assist_lib::models::{AnalysisStatus, User, UserType};
use legal_assist_lib::profile::ProfileUpdate;
use legal_assist_lib::session::RegisterRequest;
use legal_assist_lib::{logging, AppState};
use std::path::PathBuf;

/// Legal Assist - document analysis, AI legal chat and lawyer network client.
#[derive(Parser, Debug)]
#[command(name = "legal-assist", version, about)]
struct Cli {
    /// Directory holding the local settings database.
    #[arg(long = "data-dir", global = true)]
    data_dir: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug", global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in, register or sign out.
    #[command(subcommand)]
    Auth(AuthCommand),
    /// View or edit your profile.
    #[command(subcommand)]
    Profile(ProfileCommand),
    /// Upload and manage legal documents.
    #[command(subcommand)]
    Docs(DocsCommand),
    /// Talk to the legal assistant.
    #[command(subcommand)]
    Chat(ChatCommand),
    /// Find lawyers and manage connection requests.
    #[command(subcommand)]
    Lawyers(LawyersCommand),
    /// Local settings.
    #[command(subcommand)]
    Settings(SettingsCommand),
    /// Open the desktop window.
    #[cfg(feature = "desktop")]
    Desktop,
}

#[derive(Subcommand, Debug)]
enum AuthCommand {
    Login {
        email: String,
        #[arg(long)]
        password: String,
    },
    Register(RegisterArgs),
    Logout,
    Whoami,
}

#[derive(Args, Debug)]
struct RegisterArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
    #[arg(long = "confirm-password")]
    confirm_password: String,
    #[arg(long)]
    phone: Option<String>,
    /// Register as a lawyer instead of a client.
    #[arg(long)]
    lawyer: bool,
    #[arg(long)]
    degree: Option<String>,
    #[arg(long)]
    college: Option<String>,
    #[arg(long)]
    qualifications: Option<String>,
}

#[derive(Subcommand, Debug)]
enum ProfileCommand {
    Show,
    Edit {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long = "social-media")]
        social_media: Option<String>,
        #[arg(long)]
        degree: Option<String>,
        #[arg(long)]
        college: Option<String>,
        #[arg(long)]
        qualifications: Option<String>,
    },
    Password {
        #[arg(long)]
        current: String,
        #[arg(long)]
        new: String,
        #[arg(long)]
        confirm: String,
    },
}

#[derive(Subcommand, Debug)]
enum DocsCommand {
    List {
        /// Case-insensitive match on title or summary.
        #[arg(short, long)]
        filter: Option<String>,
        #[arg(long, value_parser = parse_status)]
        status: Option<AnalysisStatus>,
    },
    Upload {
        path: PathBuf,
    },
    Show {
        id: i64,
    },
    Delete {
        id: i64,
    },
    Analyze {
        id: i64,
    },
    Download {
        id: i64,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum ChatCommand {
    Sessions,
    New {
        title: Option<String>,
    },
    /// Send a message; without --session a new session is started.
    Send {
        message: String,
        #[arg(short, long)]
        session: Option<i64>,
    },
    History {
        session: i64,
    },
    Delete {
        session: i64,
    },
    Export {
        session: i64,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    Categories,
    /// One-off question outside any session.
    Ask {
        question: String,
    },
}

#[derive(Subcommand, Debug)]
enum LawyersCommand {
    Search {
        #[arg(short, long)]
        query: Option<String>,
        #[arg(long)]
        specialization: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long, value_parser = parse_experience)]
        experience: Option<ExperienceBucket>,
        #[arg(long, value_parser = parse_sort)]
        sort: Option<SortKey>,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    Profile {
        id: i64,
    },
    Connect {
        id: i64,
        #[arg(long)]
        case: String,
        #[arg(long)]
        urgent: bool,
    },
    Connections,
    Respond {
        connection: i64,
        #[arg(long, conflicts_with = "decline")]
        accept: bool,
        #[arg(long)]
        decline: bool,
    },
    Stats,
    Featured,
    Specializations,
    Directory {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
}

#[derive(Subcommand, Debug)]
enum SettingsCommand {
    List,
    Get { key: String },
    Set { key: String, value: String },
    Delete { key: String },
}

fn parse_status(s: &str) -> Result<AnalysisStatus, String> {
    match s.to_lowercase().as_str() {
        "pending" => Ok(AnalysisStatus::Pending),
        "processing" => Ok(AnalysisStatus::Processing),
        "completed" => Ok(AnalysisStatus::Completed),
        "failed" => Ok(AnalysisStatus::Failed),
        other => Err(format!("unknown status '{other}'")),
    }
}

fn parse_experience(s: &str) -> Result<ExperienceBucket, String> {
    match s {
        "0-5" => Ok(ExperienceBucket::Junior),
        "5-10" => Ok(ExperienceBucket::Mid),
        "10+" => Ok(ExperienceBucket::Senior),
        other => Err(format!("expected 0-5, 5-10 or 10+, got '{other}'")),
    }
}

fn parse_sort(s: &str) -> Result<SortKey, String> {
    match s {
        "name" => Ok(SortKey::Name),
        "experience" => Ok(SortKey::Experience),
        "connections" => Ok(SortKey::Connections),
        other => Err(format!("unknown sort key '{other}'")),
    }
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.debug);

    #[cfg(feature = "desktop")]
    if matches!(cli.command, Command::Desktop) {
        legal_assist_lib::run();
        return;
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start async runtime");
            std::process::exit(1);
        }
    };
    if let Err(e) = runtime.block_on(execute(cli)) {
        tracing::debug!(error = ?e, "Command failed");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn execute(cli: Cli) -> anyhow::Result<()> {
    let data_dir = cli.data_dir.unwrap_or_else(default_data_dir);
    let state = AppState::open(&data_dir)
        .with_context(|| format!("opening data directory {}", data_dir.display()))?;
    tracing::debug!(api = %state.config.api_base_url, "Client ready");

    match cli.command {
        Command::Settings(cmd) => return settings(&state, cmd),
        Command::Auth(AuthCommand::Login { email, password }) => {
            let user = state.auth.login(&email, &password).await?;
            state.save_session()?;
            println!("Logged in as {} ({})", user.name, role(&user));
            return Ok(());
        }
        Command::Auth(AuthCommand::Register(args)) => {
            let request = RegisterRequest {
                name: args.name,
                email: args.email,
                password: args.password,
                confirm_password: args.confirm_password,
                phone_no: args.phone,
                user_type: if args.lawyer {
                    UserType::Lawyer
                } else {
                    UserType::Client
                },
                degree: args.degree,
                college: args.college,
                qualifications: args.qualifications,
            };
            let user = state.auth.register(&request).await?;
            state.save_session()?;
            println!("Registered and logged in as {} ({})", user.name, role(&user));
            return Ok(());
        }
        _ => {}
    }

    // Every remaining command acts on an existing login.
    if state.auth.verify().await?.is_none() {
        state.forget_session()?;
        bail!("Not logged in. Run `legal-assist auth login <email> --password <password>` first.");
    }

    match cli.command {
        Command::Auth(cmd) => auth(&state, cmd).await,
        Command::Profile(cmd) => profile(&state, cmd).await,
        Command::Docs(cmd) => docs(&state, cmd).await,
        Command::Chat(cmd) => chat(&state, cmd).await,
        Command::Lawyers(cmd) => lawyers(&state, cmd).await,
        Command::Settings(_) => Ok(()),
        #[cfg(feature = "desktop")]
        Command::Desktop => Ok(()),
    }
}

fn role(user: &User) -> &'static str {
    if user.is_lawyer() {
        "lawyer"
    } else {
        "client"
    }
}

fn settings(state: &AppState, cmd: SettingsCommand) -> anyhow::Result<()> {
    match cmd {
        SettingsCommand::List => {
            let mut entries: Vec<_> = state.db.list_settings()?.into_iter().collect();
            entries.sort();
            for (key, value) in entries {
                println!("{key} = {value}");
            }
        }
        SettingsCommand::Get { key } => match state.db.get_setting(&key)? {
            Some(value) => println!("{value}"),
            None => println!("{key} is not set"),
        },
        SettingsCommand::Set { key, value } => {
            state.db.set_setting(&key, &value)?;
            println!("{key} saved");
        }
        SettingsCommand::Delete { key } => {
            state.db.delete_setting(&key)?;
            println!("{key} removed");
        }
    }
    Ok(())
}

async fn auth(state: &AppState, cmd: AuthCommand) -> anyhow::Result<()> {
    match cmd {
        AuthCommand::Logout => {
            let result = state.auth.logout().await;
            state.forget_session()?;
            result?;
            println!("Logged out");
        }
        AuthCommand::Whoami => {
            let user = state.session().require_user()?;
            println!("{} <{}>", user.name, user.email.as_deref().unwrap_or("-"));
            println!("Account type: {}", role(&user));
        }
        AuthCommand::Login { .. } | AuthCommand::Register(_) => {}
    }
    Ok(())
}

async fn profile(state: &AppState, cmd: ProfileCommand) -> anyhow::Result<()> {
    match cmd {
        ProfileCommand::Show => {
            let overview = state.profile.overview().await?;
            let user = &overview.user;
            println!("{} ({})", user.name, role(user));
            println!("  Email: {}", user.email.as_deref().unwrap_or("-"));
            println!("  Phone: {}", user.phone_no.as_deref().unwrap_or("-"));
            if user.is_lawyer() {
                println!("  Degree: {}", user.degree.as_deref().unwrap_or("-"));
                println!("  College: {}", user.college.as_deref().unwrap_or("-"));
                println!(
                    "  Qualifications: {}",
                    user.qualifications.as_deref().unwrap_or("-")
                );
            }
            println!("\nRecent activity:");
            for item in &overview.recent_activity {
                let note = if item.mock { " (sample)" } else { "" };
                println!("  {} - {}{}", item.at, item.label, note);
            }
            println!("\nRecent documents:");
            if overview.recent_documents.is_empty() {
                println!("  none");
            }
            for doc in &overview.recent_documents {
                println!("  #{} {} [{}]", doc.id, doc.display_title(), doc.analysis_status.as_str());
            }
            println!("\nConnection requests:");
            if overview.connection_requests.is_empty() {
                println!("  none");
            }
            for c in &overview.connection_requests {
                let other = if user.is_lawyer() {
                    c.client_name.as_deref()
                } else {
                    c.lawyer_name.as_deref()
                };
                println!(
                    "  #{} {} [{}]",
                    c.id,
                    other.unwrap_or("-"),
                    c.connection_status.as_str()
                );
            }
        }
        ProfileCommand::Edit {
            name,
            phone,
            social_media,
            degree,
            college,
            qualifications,
        } => {
            let update = ProfileUpdate {
                name,
                phone_no: phone,
                social_media,
                degree,
                college,
                qualifications,
            };
            if update.is_empty() {
                bail!("Nothing to update");
            }
            let user = state.profile.update_profile(&update).await?;
            println!("Profile updated for {}", user.name);
        }
        ProfileCommand::Password {
            current,
            new,
            confirm,
        } => {
            state
                .profile
                .change_password(&current, &new, &confirm)
                .await?;
            println!("Password changed");
        }
    }
    Ok(())
}

async fn docs(state: &AppState, cmd: DocsCommand) -> anyhow::Result<()> {
    let manager = &state.documents;
    match cmd {
        DocsCommand::List { filter, status } => {
            // A failed load still renders its failure view below.
            let _ = manager.load_documents().await;
            match manager.render(filter.as_deref().unwrap_or(""), status) {
                DocumentView::Failed(err) => bail!("Could not load documents: {err}"),
                DocumentView::Empty { filtered: true } => println!("No documents match."),
                DocumentView::Empty { filtered: false } => {
                    println!("No documents yet. Upload one with `docs upload <path>`.")
                }
                DocumentView::Cards(cards) => {
                    for card in cards {
                        println!(
                            "#{:<5} {:<40} {:<10} {}",
                            card.id,
                            card.title,
                            card.badge.label,
                            card.size_label.as_deref().unwrap_or("")
                        );
                        if let Some(preview) = card.summary_preview {
                            println!("       {preview}");
                        }
                    }
                    let stats = manager.stats();
                    println!(
                        "\n{} total, {} completed, {} processing, {} pending, {} failed",
                        stats.total, stats.completed, stats.processing, stats.pending, stats.failed
                    );
                }
            }
        }
        DocsCommand::Upload { path } => {
            let doc = manager
                .upload_path(&path, |p| {
                    eprint!("\rUploading... {:>3}%", p.percent());
                })
                .await;
            eprintln!();
            let doc = doc?;
            println!(
                "Uploaded #{} {} [{}]",
                doc.id,
                doc.display_title(),
                status_badge(doc.analysis_status).label
            );
        }
        DocsCommand::Show { id } => {
            let doc = manager.get_document(id).await?;
            println!("#{} {}", doc.id, doc.display_title());
            println!("Status: {}", status_badge(doc.analysis_status).label);
            if let Some(size) = doc.file_size {
                println!("Size: {}", format_file_size(size));
            }
            if let Some(summary) = &doc.summary {
                println!("\nSummary:\n{summary}");
            }
            if !doc.key_points.is_empty() {
                println!("\nKey points:");
                for point in &doc.key_points {
                    println!("  - {point}");
                }
            }
            if let Some(analysis) = &doc.legal_analysis {
                println!("\nAnalysis:\n{analysis}");
            }
        }
        DocsCommand::Delete { id } => {
            manager.delete_document(id).await?;
            println!("Document #{id} deleted");
        }
        DocsCommand::Analyze { id } => {
            let doc = manager.reanalyze(id).await?;
            println!(
                "Document #{id} queued for analysis [{}]",
                status_badge(doc.analysis_status).label
            );
        }
        DocsCommand::Download { id, out } => {
            let dir = out.unwrap_or_else(|| state.config.export_dir.clone());
            let path = manager.download(id, &dir).await?;
            println!("Saved to {}", path.display());
        }
    }
    Ok(())
}

async fn chat(state: &AppState, cmd: ChatCommand) -> anyhow::Result<()> {
    let manager = &state.chat;
    match cmd {
        ChatCommand::Sessions => {
            let _ = manager.load_sessions().await;
            match manager.render_sessions() {
                SessionListView::Failed(err) => bail!("Could not load chat sessions: {err}"),
                SessionListView::Empty => println!("No conversations yet."),
                SessionListView::Sessions(items) => {
                    for s in items {
                        println!(
                            "#{:<5} {:<40} {:>3} messages  {}",
                            s.id,
                            s.title,
                            s.message_count,
                            s.updated_at.as_deref().unwrap_or("")
                        );
                    }
                }
            }
        }
        ChatCommand::New { title } => {
            let session = manager.create_session(title.as_deref()).await?;
            println!("Started session #{} {}", session.id, session.title);
        }
        ChatCommand::Send { message, session } => {
            if let Some(id) = session {
                manager.select_session(id).await?;
            }
            let reply = manager.send_message(&message).await;
            let reply = match reply {
                Ok(reply) => reply,
                Err(e) => {
                    // The server may still have stored an apology message.
                    if let Some(last) = manager.messages().last() {
                        if last.sender == "Legal Assistant" {
                            println!("{}", last.text);
                        }
                    }
                    return Err(e.into());
                }
            };
            println!("{}", reply.text);
            if !reply.sources.is_empty() {
                println!("\nSources: {}", reply.sources.join(", "));
            }
            if let Some(id) = manager.current_session() {
                println!("\n(session #{id})");
            }
        }
        ChatCommand::History { session } => {
            for msg in manager.select_session(session).await? {
                println!("[{}] {}:\n{}\n", msg.time, msg.sender, msg.text);
            }
        }
        ChatCommand::Delete { session } => {
            manager.delete_session(session).await?;
            println!("Session #{session} deleted");
        }
        ChatCommand::Export { session, out } => {
            let _ = manager.load_sessions().await;
            manager.select_session(session).await?;
            let dir = out.unwrap_or_else(|| state.config.export_dir.clone());
            let path = manager.export_transcript(&dir)?;
            println!("Transcript saved to {}", path.display());
        }
        ChatCommand::Categories => {
            for c in manager.legal_categories().await? {
                println!("{:<20} {}", c.name, c.description);
                if !c.examples.is_empty() {
                    println!("{:<20} e.g. {}", "", c.examples.join("; "));
                }
            }
        }
        ChatCommand::Ask { question } => {
            let answer = manager.quick_question(&question).await?;
            println!("{}", answer.response);
            if !answer.sources.is_empty() {
                println!("\nSources: {}", answer.sources.join(", "));
            }
        }
    }
    Ok(())
}

fn print_lawyer(lawyer: &User, tags: &[&str]) {
    println!(
        "#{:<5} {:<30} {}",
        lawyer.id,
        lawyer.name,
        lawyer.degree.as_deref().unwrap_or("")
    );
    if !tags.is_empty() {
        println!("       {}", tags.join(", "));
    }
}

async fn lawyers(state: &AppState, cmd: LawyersCommand) -> anyhow::Result<()> {
    let manager = &state.lawyers;
    match cmd {
        LawyersCommand::Search {
            query,
            specialization,
            location,
            experience,
            sort,
            page,
        } => {
            let params = SearchParams {
                query,
                specialization,
                location,
                experience,
                sort,
                page: Some(page),
                per_page: Some(state.config.page_size),
            };
            let _ = manager.search(params).await;
            match manager.render() {
                LawyerView::Failed(err) => bail!("Search failed: {err}"),
                LawyerView::Empty => println!("No lawyers match your search."),
                LawyerView::Results {
                    cards,
                    total,
                    window,
                } => {
                    for card in &cards {
                        print_lawyer(&card.lawyer, &card.specializations);
                    }
                    let pages: Vec<String> = window
                        .links
                        .iter()
                        .map(|l| {
                            if l.active {
                                format!("[{}]", l.page)
                            } else {
                                l.page.to_string()
                            }
                        })
                        .collect();
                    println!("\n{total} lawyers  pages: {}", pages.join(" "));
                }
            }
        }
        LawyersCommand::Profile { id } => {
            let profile = manager.lawyer_profile(id).await?;
            print_lawyer(&profile.lawyer, &profile.specializations);
            if let Some(college) = &profile.lawyer.college {
                println!("  College: {college}");
            }
            if let Some(q) = &profile.lawyer.qualifications {
                println!("  Qualifications: {q}");
            }
            match profile.connection_status {
                Some(status) => println!("  Connection: {}", status.as_str()),
                None if profile.can_connect => {
                    println!("  Not connected. Use `lawyers connect {id} --case <text>`.")
                }
                None => {}
            }
        }
        LawyersCommand::Connect { id, case, urgent } => {
            let connection = manager.connect(id, &case, urgent).await?;
            println!(
                "Connection request #{} sent [{}]",
                connection.id,
                connection.connection_status.as_str()
            );
        }
        LawyersCommand::Connections => {
            let connections = manager.load_connections().await?;
            if connections.is_empty() {
                println!("No connections yet.");
            }
            for c in connections {
                println!(
                    "#{:<5} {:<25} {:<9} {}{}",
                    c.id,
                    c.lawyer_name.as_deref().or(c.client_name.as_deref()).unwrap_or("-"),
                    c.connection_status.as_str(),
                    c.case_description.as_deref().unwrap_or(""),
                    if c.urgent { " (urgent)" } else { "" }
                );
            }
        }
        LawyersCommand::Respond {
            connection,
            accept,
            decline,
        } => {
            let response = match (accept, decline) {
                (true, false) => ConnectionResponse::Accepted,
                (false, true) => ConnectionResponse::Declined,
                _ => bail!("Pass exactly one of --accept or --decline"),
            };
            let c = manager.respond(connection, response).await?;
            println!("Connection #{} {}", c.id, c.connection_status.as_str());
        }
        LawyersCommand::Stats => {
            let stats = manager.stats().await?;
            println!("Total requests:       {}", stats.total_requests);
            println!("Pending requests:     {}", stats.pending_requests);
            println!("Accepted connections: {}", stats.accepted_connections);
            for c in &stats.recent_connections {
                println!(
                    "  #{} {} [{}]",
                    c.id,
                    c.client_name.as_deref().unwrap_or("-"),
                    c.connection_status.as_str()
                );
            }
        }
        LawyersCommand::Featured => {
            for lawyer in manager.featured().await? {
                print_lawyer(&lawyer, &[]);
                if let Some(n) = lawyer.connection_count {
                    println!("       {n} clients connected");
                }
            }
        }
        LawyersCommand::Specializations => {
            for s in manager.specializations().await? {
                println!("{:<24} {:<24} {}", s.id, s.name, s.description);
            }
        }
        LawyersCommand::Directory { page } => {
            let (lawyers, pagination) = manager
                .directory(page, Some(state.config.page_size))
                .await?;
            for lawyer in &lawyers {
                print_lawyer(lawyer, &[]);
            }
            println!(
                "\npage {} of {} ({} lawyers)",
                pagination.page, pagination.pages, pagination.total
            );
        }
    }
    Ok(())
}
