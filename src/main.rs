use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::error;

use rhythm_client::auth::{LoginForm, SignupForm};
use rhythm_client::catalog::{GenreFilter, NO_SONGS_FOR_GENRE};
use rhythm_client::config::Config;
use rhythm_client::logger;
use rhythm_client::routes::{Navigation, Route};
use rhythm_client::upload::UploadForm;
use rhythm_client::{AppState, ClientError};

#[derive(Parser)]
#[command(name = "rhythm", about = "Discover. Stream. Experience.")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Landing page and navigation.
    Home,
    Signup {
        name: String,
        email: String,
        password: String,
    },
    Login {
        email: String,
        password: String,
    },
    Logout,
    Whoami,
    /// List the song library, optionally restricted to one genre.
    Songs {
        #[arg(long, default_value = "all")]
        genre: GenreFilter,
    },
    /// Publish a new song with its cover art.
    Upload {
        #[arg(long)]
        title: String,
        #[arg(long)]
        genre: String,
        #[arg(long)]
        release_year: i32,
        #[arg(long)]
        cover: PathBuf,
        #[arg(long)]
        song: PathBuf,
        #[arg(long, default_value = "")]
        movie: String,
        #[arg(long, default_value = "")]
        album: String,
    },
    /// Play a song from the library.
    #[cfg(feature = "audio")]
    Play { id: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let multi = match logger::init(config.log_level) {
        Ok(multi) => multi,
        Err(e) => {
            eprintln!("Failed to install logger: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match AppState::from_config(&config) {
        Ok(mut app) => run(&mut app, cli.command.unwrap_or(Command::Home), &multi).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:?}", e);
            eprintln!("Error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

/// Applies the route guard; `false` means the user was sent to the login page instead.
fn enter(app: &AppState, route: Route) -> bool {
    match app.navigate(route) {
        Navigation::Render(_) => true,
        Navigation::Redirect(target) => {
            println!("Please log in first (redirected to {}).", target);
            false
        }
    }
}

async fn run(app: &mut AppState, command: Command, multi: &MultiProgress) -> Result<(), ClientError> {
    match command {
        Command::Home => {
            println!("MusicStream");
            println!("Discover millions of songs, playlists, and trending music at your fingertips.");
            for item in app.nav_items() {
                println!("  {}", item);
            }
        }
        Command::Signup { name, email, password } => {
            let message = app.signup(&SignupForm { name, email, password }).await?;
            println!("{}", message);
        }
        Command::Login { email, password } => {
            let message = app.login(&LoginForm { email, password }).await?;
            println!("{}", message);
        }
        Command::Logout => {
            println!("{}", app.logout()?);
        }
        Command::Whoami => match app.session.user() {
            Some(user) => println!("{} <{}>", user.name, user.email),
            None => println!("Not logged in."),
        },
        Command::Songs { genre } => {
            if !enter(app, Route::Songs) {
                return Ok(());
            }
            let mut view = app.open_catalog().await;
            if let Some(message) = view.error() {
                return Err(ClientError::Backend(message.to_string()));
            }

            let options: Vec<String> = view.genre_options().iter().map(|g| g.to_string()).collect();
            println!("Genres: {}", options.join(", "));
            view.select_genre(&app.catalog, genre);

            println!("Songs Library ({})", view.selected());
            if view.songs().is_empty() {
                println!("{}", NO_SONGS_FOR_GENRE);
            }
            for song in view.songs() {
                println!("[{}] {}", song.id, song.title);
                println!("    {}", song.origin_label());
                println!("    Genre: {}  Year: {}", song.genre, song.release_year);
            }
        }
        Command::Upload {
            title,
            genre,
            release_year,
            cover,
            song,
            movie,
            album,
        } => {
            if !enter(app, Route::SongUpload) {
                return Ok(());
            }
            let mut form = UploadForm {
                title,
                movie_name: movie,
                album_name: album,
                genre,
                release_year: Some(release_year),
                cover_image: Some(cover),
                song_file: Some(song),
            };

            let bar = multi.add(ProgressBar::new(100));
            bar.set_style(
                ProgressStyle::with_template("Uploading... [{bar:40}] {pos}%")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            let mut progress = app.uploads().progress().subscribe();
            let bar_updates = bar.clone();
            let watcher = tokio::spawn(async move {
                while progress.changed().await.is_ok() {
                    let percent = *progress.borrow_and_update();
                    bar_updates.set_position(percent as u64);
                }
            });

            let outcome = app.upload(&mut form).await;
            watcher.abort();
            bar.finish_and_clear();

            let outcome = outcome?;
            if !outcome.is_success() {
                return Err(ClientError::Backend(outcome.notice().to_string()));
            }
            println!("{}", outcome.notice());
        }
        #[cfg(feature = "audio")]
        Command::Play { id } => {
            if !enter(app, Route::Songs) {
                return Ok(());
            }
            playback::play(app, &id).await?;
        }
    }
    Ok(())
}

#[cfg(feature = "audio")]
mod playback {
    use std::time::Duration;

    use tokio::io::{AsyncBufReadExt, BufReader};

    use rhythm_client::audio::RodioElement;
    use rhythm_client::player::{PlaybackState, PlayerDock};
    use rhythm_client::{AppState, ClientError};

    const HELP: &str = "commands: p (play/pause), seek <0-100>, vol <0-1>, mute, q";

    pub async fn play(app: &mut AppState, id: &str) -> Result<(), ClientError> {
        let view = app.open_catalog().await;
        if let Some(message) = view.error() {
            return Err(ClientError::Backend(message.to_string()));
        }
        let song = app
            .catalog
            .find(id)
            .cloned()
            .ok_or_else(|| ClientError::Validation(format!("No song with id {}", id)))?;

        let bytes = app.fetch_audio(&song).await?;
        let mut dock = PlayerDock::new();
        let widget = dock.select(song, |_| RodioElement::open(bytes))?;
        println!("{} - {}", widget.song().title, widget.song().origin_label());
        println!("{}", HELP);
        widget.play()?;

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut ticker = tokio::time::interval(Duration::from_secs(1));
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    widget.poll();
                    if widget.state() == PlaybackState::Ended {
                        println!("Finished.");
                        break;
                    }
                }
                line = lines.next_line() => {
                    let line = line.map_err(|e| ClientError::Audio(e.to_string()))?;
                    let Some(line) = line else { break };
                    let mut parts = line.split_whitespace();
                    match (parts.next(), parts.next()) {
                        (Some("p"), _) => widget.toggle_play_pause()?,
                        (Some("seek"), Some(value)) => match value.parse() {
                            Ok(percent) => widget.seek(percent),
                            Err(_) => println!("{}", HELP),
                        },
                        (Some("vol"), Some(value)) => match value.parse() {
                            Ok(volume) => widget.set_volume(volume),
                            Err(_) => println!("{}", HELP),
                        },
                        (Some("mute"), _) => widget.toggle_mute(),
                        (Some("q"), _) => break,
                        _ => println!("{}", HELP),
                    }
                    println!(
                        "{:?} {} / {} ({}){}",
                        widget.state(),
                        widget.elapsed_label(),
                        widget.duration_label(),
                        widget.remaining_label(),
                        if widget.is_muted() { " [muted]" } else { "" }
                    );
                }
            }
        }
        dock.close();
        Ok(())
    }
}
