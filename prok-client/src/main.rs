use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use prok::api::{categorize_error, ApiClient, ApiError};
use prok::auth::AuthFlow;
use prok::compose::{
    submit_post, LoginForm, MediaFile, PostDraft, ProfileForm, ProfileImage, SignupForm,
    SubmitError,
};
use prok::config::{ConfigManager, UserPreferences};
use prok::feed::{Applied, FeedController, FilterState};
use prok::logging::{self, LogConfig};
use prok::server_config::ServerConfigManager;
use prok::session::{Session, SessionStore};
use prok_types::{Post, Profile, SortDirection, SortField, Visibility};

/// Prok - a command line client for the Prok professional network
#[derive(Parser)]
#[command(name = "prok")]
#[command(about = "Browse, filter and post to the Prok feed from the terminal")]
#[command(version)]
struct Cli {
    /// Server URL to connect to
    #[arg(long, short, env = "PROK_SERVER_URL")]
    server: Option<String>,

    /// Enable verbose logging
    #[arg(long, short)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and remember the session
    Login {
        username_or_email: String,
        #[arg(long, env = "PROK_PASSWORD")]
        password: String,
    },
    /// Create an account
    Signup {
        username: String,
        email: String,
        #[arg(long, env = "PROK_PASSWORD")]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List posts
    Feed {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long, value_parser = parse_visibility)]
        visibility: Option<Visibility>,
        /// Repeatable
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long, value_parser = parse_sort_field)]
        sort_by: Option<SortField>,
        #[arg(long, value_parser = parse_sort_direction)]
        sort_order: Option<SortDirection>,
        /// Only posts by this user id
        #[arg(long)]
        user: Option<i64>,
        /// How many pages to load
        #[arg(long, default_value_t = 1)]
        pages: u32,
        #[arg(long)]
        per_page: Option<u32>,
        /// Remember these filters for next time
        #[arg(long)]
        save: bool,
    },
    /// Publish a post
    Post {
        content: String,
        /// Repeatable
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long, value_parser = parse_visibility, default_value = "public")]
        visibility: Visibility,
        #[arg(long)]
        category: Option<String>,
        /// Image or video to attach
        #[arg(long)]
        media: Option<std::path::PathBuf>,
    },
    /// Like a post
    Like { post_id: i64 },
    /// List post categories
    Categories,
    /// List popular tags
    Tags,
    /// Show a profile (your own by default)
    Profile {
        #[arg(long)]
        user: Option<i64>,
    },
    /// Edit your profile; omitted fields are unchanged
    EditProfile {
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
        #[arg(long, default_value = "")]
        bio: String,
        #[arg(long, default_value = "")]
        location: String,
        #[arg(long, default_value = "")]
        company: String,
        #[arg(long, default_value = "")]
        job_title: String,
        #[arg(long, default_value = "")]
        website: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long, default_value = "")]
        experience_years: String,
        /// Comma separated
        #[arg(long, default_value = "")]
        skills: String,
    },
    /// Upload a new profile picture
    Avatar { path: std::path::PathBuf },
    /// Save the server URL for future runs
    SetServer { url: String },
}

fn parse_visibility(s: &str) -> Result<Visibility, String> {
    Visibility::parse(s).ok_or_else(|| format!("unknown visibility '{}'", s))
}

fn parse_sort_field(s: &str) -> Result<SortField, String> {
    SortField::parse(s).ok_or_else(|| format!("unknown sort field '{}'", s))
}

fn parse_sort_direction(s: &str) -> Result<SortDirection, String> {
    SortDirection::parse(s).ok_or_else(|| format!("unknown sort order '{}'", s))
}

// Load environment variables from .env file
// This allows PROK_SERVER_URL and other config to be set without command-line args
fn load_env() {
    let _ = dotenv::dotenv();
}

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    let cli = Cli::parse();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };
    logging::init_logging(&log_config)?;

    let config = ConfigManager::new()?;
    let server_config = ServerConfigManager::with_config(config.clone());
    let server_url = server_config.determine_server_url(cli.server)?;
    log::info!(
        "Using {} ({})",
        server_url,
        server_config.get_server_description(&server_url)
    );

    let session = Session::new();
    let api = ApiClient::with_session(server_url, session);
    let auth = AuthFlow::with_store(api, SessionStore::at(config.session_file()));

    let result = run(cli.command, &auth, &config, &server_config).await;

    // A 401 anywhere means the stored token is dead
    if auth.forget_if_invalidated()? {
        eprintln!("Your session has expired. Run `prok login` again.");
    }

    result
}

async fn run(
    command: Command,
    auth: &AuthFlow,
    config: &ConfigManager,
    server_config: &ServerConfigManager,
) -> Result<()> {
    let api = auth.api_client();

    match command {
        Command::Login {
            username_or_email,
            password,
        } => {
            let form = LoginForm {
                username_or_email,
                password,
            };
            let user = auth.login(&form).await.map_err(explain)?;
            println!("Logged in as {}", user.username);
        }
        Command::Signup {
            username,
            email,
            password,
        } => {
            let form = SignupForm {
                username,
                email,
                password,
            };
            let user = auth.signup(&form).await.map_err(explain)?;
            println!("Welcome, {}!", user.username);
        }
        Command::Logout => {
            let _ = auth.check_existing_session().await;
            auth.logout().await?;
            println!("Logged out");
        }
        Command::Whoami => match auth.check_existing_session().await? {
            Some(user) => println!("{} (id {})", user.username, user.id),
            None => println!("Not logged in"),
        },
        Command::Feed {
            search,
            category,
            visibility,
            tags,
            sort_by,
            sort_order,
            user,
            pages,
            per_page,
            save,
        } => {
            let me = require_login(auth).await?;
            let saved = config.load_preferences(me.id)?.unwrap_or_default();

            let explicit = search.is_some()
                || category.is_some()
                || visibility.is_some()
                || !tags.is_empty()
                || sort_by.is_some()
                || sort_order.is_some()
                || user.is_some();
            let filters = if explicit {
                FilterState {
                    search: search.unwrap_or_default(),
                    category,
                    visibility,
                    tags,
                    sort_by: sort_by.unwrap_or_default(),
                    sort_order: sort_order.unwrap_or_default(),
                    user_id: user,
                }
            } else {
                saved.filters.clone()
            };
            let per_page = per_page.unwrap_or(saved.per_page);

            if save {
                let prefs = UserPreferences {
                    filters: filters.clone(),
                    per_page,
                };
                config.save_preferences(me.id, &prefs)?;
            }

            show_feed(api, filters, per_page, pages).await?;
        }
        Command::Post {
            content,
            tags,
            visibility,
            category,
            media,
        } => {
            require_login(auth).await?;
            let media = media.map(MediaFile::open).transpose()?;
            let draft = PostDraft {
                content,
                rich_content: None,
                tags,
                visibility,
                category,
                media,
            };
            match submit_post(api, &draft).await {
                Ok(post) => println!("Posted #{}", post.id),
                Err(SubmitError::Invalid(errors)) => {
                    for (field, message) in errors.iter() {
                        eprintln!("{}: {}", field, message);
                    }
                    anyhow::bail!("Post was not submitted");
                }
                Err(SubmitError::Api(e)) => anyhow::bail!(categorize_error(&e)),
            }
        }
        Command::Like { post_id } => {
            require_login(auth).await?;
            let response = api.like_post(post_id).await.map_err(api_failure)?;
            println!("Post #{} now has {} likes", post_id, response.likes_count);
        }
        Command::Categories => {
            require_login(auth).await?;
            for category in api.get_categories().await.map_err(api_failure)? {
                println!("{}", category);
            }
        }
        Command::Tags => {
            require_login(auth).await?;
            for tag in api.get_popular_tags().await.map_err(api_failure)? {
                println!("#{}", tag);
            }
        }
        Command::Profile { user } => {
            require_login(auth).await?;
            let profile = match user {
                Some(id) => api.get_user_profile(id).await,
                None => api.get_profile().await,
            }
            .map_err(api_failure)?;
            print_profile(&profile);
        }
        Command::EditProfile {
            first_name,
            last_name,
            bio,
            location,
            company,
            job_title,
            website,
            phone,
            experience_years,
            skills,
        } => {
            require_login(auth).await?;
            let form = ProfileForm {
                first_name,
                last_name,
                bio,
                location,
                company,
                job_title,
                website,
                phone,
                experience_years,
                skills,
            };
            let request = form.to_request()?;
            let profile = api.update_profile(&request).await.map_err(api_failure)?;
            print_profile(&profile);
        }
        Command::Avatar { path } => {
            require_login(auth).await?;
            let image = ProfileImage::new(MediaFile::open(&path)?)?;
            let url = api
                .upload_profile_image(&image)
                .await
                .map_err(api_failure)?;
            println!("Profile image updated: {}", url);
        }
        Command::SetServer { url } => {
            server_config.save_server_url(url.clone())?;
            println!("Server set to {}", url);
        }
    }

    Ok(())
}

async fn require_login(auth: &AuthFlow) -> Result<prok_types::User> {
    auth.check_existing_session()
        .await?
        .context("Not logged in. Run `prok login` first.")
}

async fn show_feed(api: &ApiClient, filters: FilterState, per_page: u32, pages: u32) -> Result<()> {
    let mut feed = FeedController::new(FilterState::default(), per_page);

    let mut applied = feed.apply_filters(api, filters).await;
    for _ in 1..pages {
        if let Some(Applied::Failed) = applied {
            break;
        }
        match feed.load_more(api).await {
            Some(next) => applied = Some(next),
            None => break,
        }
    }

    if let Some(message) = feed.error() {
        anyhow::bail!("Failed to load posts: {}. Try again.", message);
    }

    if feed.posts().is_empty() {
        println!("No posts match these filters.");
        return Ok(());
    }

    for post in feed.posts() {
        print_post(post, feed.is_liked(post.id));
    }

    let shown = feed.posts().len();
    match feed.total() {
        Some(total) => println!("-- {} of {} posts", shown, total),
        None => println!("-- {} posts", shown),
    }
    if feed.has_more() {
        println!("-- more available (use --pages)");
    }

    if let Some(notice) = feed.take_notice() {
        eprintln!("{}", notice);
    }
    Ok(())
}

fn print_post(post: &Post, liked: bool) {
    let author = post
        .user
        .as_ref()
        .map(|u| u.display_name())
        .unwrap_or_else(|| format!("user {}", post.user_id));
    let when = post
        .created_at
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();

    println!("#{} {} {}", post.id, author, when);
    println!("  {}", post.content);
    if !post.tags.is_empty() {
        let tags: Vec<String> = post.tags.iter().map(|t| format!("#{}", t)).collect();
        println!("  {}", tags.join(" "));
    }
    if let Some(url) = &post.media_url {
        println!("  [media] {}", url);
    }
    println!(
        "  {} {} likes, {} comments",
        if liked { "♥" } else { "♡" },
        post.likes_count,
        post.comments_count
    );
}

fn print_profile(profile: &Profile) {
    let name = match (profile.first_name.as_deref(), profile.last_name.as_deref()) {
        (Some(first), Some(last)) => format!("{} {}", first, last),
        _ => profile.username.clone(),
    };
    println!("{} (@{})", name, profile.username);
    let lines = [
        ("Headline", &profile.headline),
        ("Job title", &profile.job_title),
        ("Company", &profile.company),
        ("Location", &profile.location),
        ("Website", &profile.website),
        ("Bio", &profile.bio),
    ];
    for (label, value) in lines {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            println!("  {}: {}", label, value);
        }
    }
    if !profile.skills.is_empty() {
        println!("  Skills: {}", profile.skills.join(", "));
    }
}

fn api_failure(error: ApiError) -> anyhow::Error {
    anyhow::anyhow!(categorize_error(&error))
}

/// Surface API errors inside an anyhow chain with their category.
fn explain(error: anyhow::Error) -> anyhow::Error {
    match error.downcast_ref::<ApiError>() {
        Some(api_error) => anyhow::anyhow!(categorize_error(api_error)),
        None => error,
    }
}
