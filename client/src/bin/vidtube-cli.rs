use clap::{Parser, Subcommand, ValueEnum};
use eyre::Context;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use vidtube_client::api::{MediaFile, Video};
use vidtube_client::config::{API_URL_ENV, ClientConfig};
use vidtube_client::format::{format_count, format_duration, format_time_ago};
use vidtube_client::pages::{
    ChannelController, Feedback, HomeController, LoginForm, Section, UploadController,
    VideoSort, WatchController,
};
use vidtube_client::routes::{self, RouteOutcome};
use vidtube_client::session::SessionStore;

/// Command-line front end for the vidtube API.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Base URL of the API, e.g. http://localhost:8000/api/v1
    #[arg(long, env = API_URL_ENV)]
    api_url: Option<String>,

    /// Email or username to sign in as before running the command.
    #[arg(long, env = "VIDTUBE_USER")]
    user: Option<String>,

    #[arg(long, env = "VIDTUBE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show who the session belongs to.
    Whoami,
    /// List the videos of a home page section.
    Videos {
        #[arg(long, value_enum, default_value_t = SectionArg::Home)]
        section: SectionArg,
    },
    /// Show a video with its comments.
    Watch { video_id: String },
    /// Like or unlike a video.
    Like { video_id: String },
    /// Comment on a video.
    Comment { video_id: String, text: String },
    /// Show a channel with its videos and posts.
    Channel {
        channel_id: String,
        #[arg(long, value_enum, default_value_t = SortArg::Latest)]
        sort: SortArg,
    },
    /// Upload a video file.
    Upload {
        file: PathBuf,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        thumbnail: Option<PathBuf>,
        /// Upload without publishing.
        #[arg(long)]
        private: bool,
    },
    /// Show what a path resolves to for the current session.
    Route { path: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SectionArg {
    Home,
    Trending,
    History,
    Liked,
    WatchLater,
    Music,
    Gaming,
    Sports,
}

impl From<SectionArg> for Section {
    fn from(arg: SectionArg) -> Self {
        match arg {
            SectionArg::Home => Section::Home,
            SectionArg::Trending => Section::Trending,
            SectionArg::History => Section::History,
            SectionArg::Liked => Section::Liked,
            SectionArg::WatchLater => Section::WatchLater,
            SectionArg::Music => Section::Music,
            SectionArg::Gaming => Section::Gaming,
            SectionArg::Sports => Section::Sports,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortArg {
    Latest,
    Popular,
    Oldest,
}

impl From<SortArg> for VideoSort {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Latest => VideoSort::Latest,
            SortArg::Popular => VideoSort::Popular,
            SortArg::Oldest => VideoSort::Oldest,
        }
    }
}

fn print_video(video: &Video, now: jiff::Timestamp) {
    let age = video
        .created_at
        .map(|t| format_time_ago(t, now))
        .unwrap_or_default();
    let owner = video
        .owner
        .as_ref()
        .and_then(|o| o.user())
        .map(|u| u.display_name.as_str())
        .unwrap_or("");
    println!(
        "{:<26} {:>6} {:>7} views  {:<12} {} {}",
        video.id,
        format_duration(video.duration),
        format_count(video.views),
        age,
        video.title,
        if owner.is_empty() {
            String::new()
        } else {
            format!("({owner})")
        },
    );
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.api_url {
        Some(url) => ClientConfig::new(url)?,
        None => ClientConfig::from_env()?,
    };
    let session = vidtube_client::connect(config)
        .await
        .context("connect to API")?;

    run_as(&session, cli.user, cli.password, cli.command).await
}

/// Signs in if a user was given, runs `command`, then signs out again whether or not the
/// command succeeded.
async fn run_as(
    session: &SessionStore,
    user: Option<String>,
    password: Option<String>,
    command: Command,
) -> eyre::Result<()> {
    let Some(identifier) = user else {
        return run(command, session).await;
    };

    let mut login = LoginForm::new(session.clone());
    login.identifier = identifier;
    login.password = password.unwrap_or_default();
    if login.submit().await.is_none() {
        let reason = login
            .api_error()
            .map(str::to_string)
            .unwrap_or_else(|| login.errors().to_string());
        eyre::bail!("sign in failed: {reason}");
    }

    let result = run(command, session).await;
    session.logout().await;
    result
}

async fn run(command: Command, session: &SessionStore) -> eyre::Result<()> {
    let api = session.api().clone();
    let now = jiff::Timestamp::now();

    match command {
        Command::Whoami => match session.current_user().await {
            Some(user) => println!("{} (@{}) <{}>", user.display_name, user.username, user.email),
            None => println!("not signed in"),
        },
        Command::Videos { section } => {
            let mut home = HomeController::new(api);
            home.load().await;
            home.select_section(section.into()).await;
            let section = home.section();
            eprintln!("==> {}: {}", section.title(), section.description());
            if let Some(error) = home.videos().error().or(home.shown().error()) {
                eyre::bail!("{error}");
            }
            if home.shown().is_empty() {
                println!("{}", home.empty_message());
            }
            for video in home.shown().items() {
                print_video(video, now);
            }
        }
        Command::Watch { video_id } => {
            let mut page = WatchController::new(api);
            page.load(&video_id).await;
            page.show_all_comments(true);
            if let Some(error) = page.error() {
                eyre::bail!("{error}");
            }
            if let Some(video) = page.video() {
                print_video(video, now);
                println!("{}", video.description);
            }
            let (like, subs) = (page.like(), page.subscription());
            println!(
                "{} likes{}  {} subscribers{}",
                format_count(like.count),
                if like.active { " (liked)" } else { "" },
                format_count(subs.count),
                if subs.active { " (subscribed)" } else { "" },
            );
            eprintln!("==> {} comments", page.comments().len());
            for comment in page.displayed_comments() {
                let author = comment
                    .owner
                    .as_ref()
                    .and_then(|o| o.user())
                    .map(|u| u.username.as_str())
                    .unwrap_or("?");
                println!("@{author}: {} [{} likes]", comment.content, comment.like_count);
            }
        }
        Command::Like { video_id } => {
            let mut page = WatchController::new(api);
            page.load(&video_id).await;
            page.toggle_like().await;
            if let Some(error) = page.error().or(page.action_error()) {
                eyre::bail!("{error}");
            }
            let like = page.like();
            println!(
                "{} ({} likes)",
                if like.active { "liked" } else { "unliked" },
                like.count
            );
        }
        Command::Comment { video_id, text } => {
            let mut page = WatchController::new(api);
            page.load(&video_id).await;
            if let Some(error) = page.error() {
                eyre::bail!("could not comment: {error}");
            }
            if !page.add_comment(&text).await {
                let reason = page.comments().error().unwrap_or("comment is empty");
                eyre::bail!("could not comment: {reason}");
            }
            println!("commented on {video_id}");
        }
        Command::Channel { channel_id, sort } => {
            let mut page = ChannelController::new(api);
            page.load(&channel_id).await;
            page.set_sort(sort.into());
            let Some(channel) = page.channel() else {
                eyre::bail!("{}", page.error().unwrap_or("channel not found"));
            };
            println!(
                "{} (@{})  {} subscribers",
                channel.owner.display_name,
                channel.owner.username,
                format_count(page.subscription().count)
            );
            for video in page.sorted_videos() {
                print_video(video, now);
            }
            eprintln!("==> {} posts", page.tweets().len());
            for tweet in page.tweets().items() {
                println!("{} [{} likes]", tweet.content, tweet.likes_count);
            }
        }
        Command::Upload {
            file,
            title,
            description,
            thumbnail,
            private,
        } => {
            let mut upload = UploadController::new(api);
            upload.title = title;
            upload.description = description;
            upload.is_public = !private;
            let video = MediaFile::from_path(&file).await?;
            upload.select_video(video)?;
            if let Some(path) = thumbnail {
                upload.select_thumbnail(MediaFile::from_path(&path).await?)?;
            }
            match (upload.submit().await, upload.feedback()) {
                (Some(id), _) => println!("uploaded: /watch/{id}"),
                (None, Some(Feedback::Error(reason))) => eyre::bail!("{reason}"),
                (None, _) => eyre::bail!("upload failed"),
            }
        }
        Command::Route { path } => {
            let outcome = routes::resolve(&path, session.is_authenticated().await);
            match outcome {
                RouteOutcome::Render(route) => println!("render {route}"),
                RouteOutcome::Redirect(route) => println!("redirect to {route}"),
                RouteOutcome::Blank => println!("blank"),
                RouteOutcome::NotFound => println!("not found"),
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use clap::CommandFactory;
    use http_body_util::{BodyExt, Full};
    use hyper::body::Incoming;
    use hyper::service::service_fn;
    use hyper::{Request, Response};
    use hyper_util::rt::TokioIo;
    use std::convert::Infallible;
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;
    use vidtube_client::api::ApiClient;

    const ADA: &str =
        r#"{"data":{"_id":"u1","userName":"ada","fullName":"Ada","email":"ada@example.com"}}"#;

    /// Serves `/user/*` with Ada and everything else with a 404, logging each request line.
    async fn user_only_api(log: Arc<Mutex<Vec<String>>>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((conn, _)) = listener.accept().await {
                let log = Arc::clone(&log);
                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<Incoming>| {
                        let log = Arc::clone(&log);
                        async move {
                            let path = req.uri().path().to_string();
                            log.lock().unwrap().push(format!("{} {path}", req.method()));
                            let _ = req.into_body().collect().await;
                            let (status, body) = if path.starts_with("/user/") {
                                (200_u16, ADA)
                            } else {
                                (404, r#"{"message":"Video not found"}"#)
                            };
                            let response = Response::builder()
                                .status(status)
                                .header("content-type", "application/json")
                                .body(Full::new(Bytes::from_static(body.as_bytes())))
                                .unwrap();
                            Ok::<_, Infallible>(response)
                        }
                    });
                    let _ = hyper::server::conn::http1::Builder::new()
                        .serve_connection(TokioIo::new(conn), service)
                        .await;
                });
            }
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn failed_command_still_signs_out() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let url = user_only_api(Arc::clone(&log)).await;
        let api = ApiClient::new(&ClientConfig::new(url).unwrap()).unwrap();
        let session = SessionStore::new(api);

        let result = run_as(
            &session,
            Some("ada".into()),
            Some("hunter22".into()),
            Command::Comment {
                video_id: "gone".into(),
                text: "first!".into(),
            },
        )
        .await;

        let err = result.unwrap_err().to_string();
        assert!(err.starts_with("could not comment: Failed to load video"), "{err}");
        assert!(!session.is_authenticated().await);
        let log = log.lock().unwrap();
        assert_eq!(log.first().map(String::as_str), Some("POST /user/login"));
        assert_eq!(log.last().map(String::as_str), Some("GET /user/logout"));
        assert!(!log.contains(&"POST /comment/gone".to_string()));
    }

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_upload() {
        let cli = Cli::try_parse_from([
            "vidtube-cli",
            "--api-url",
            "http://localhost:9000/api/v1",
            "upload",
            "clip.mp4",
            "--title",
            "Launch",
            "--private",
        ])
        .unwrap();
        assert_eq!(cli.api_url.as_deref(), Some("http://localhost:9000/api/v1"));
        match cli.command {
            Command::Upload { title, private, .. } => {
                assert_eq!(title, "Launch");
                assert!(private);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
