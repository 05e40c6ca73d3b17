mod commands;
mod config;
mod errors;
mod snapshot;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use simplelog::{ColorChoice, LevelFilter, TermLogger, TerminalMode};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::runtime::Handle;

use commands::{Command, LineRequest, HELP};
use config::Config;
use errors::HeadlessError;
use live_playback::{
    ControllerOptions, FileSettingsStore, PlaybackController, ReserveToggle, SettingsStore,
};
use snapshot::ChannelSnapshot;
use video_player::{FfprobePlayer, PlayerEventHub, TokioScheduler, VideoPlayer};

type Controller = PlaybackController<FfprobePlayer, FileSettingsStore>;

#[derive(Parser, Debug)]
#[command(name = "mytv-headless", version, about = "Live channel playback from the terminal")]
struct Args {
    /// Channel snapshot JSON, overrides the config
    #[arg(long)]
    channels: Option<PathBuf>,

    /// Config file, defaults to Conf.toml in the config dir
    #[arg(long)]
    config: Option<PathBuf>,

    /// Playback settings file, defaults to Playback.toml in the config dir
    #[arg(long)]
    settings: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,
}

fn print_status(controller: &Controller) {
    let channel = controller.current_channel();
    if channel.is_empty() {
        println!("nothing to play");
        return;
    }

    let (url, family) = match controller.current_line() {
        Some(line) if line.is_ipv6() => (line.url.as_str(), " IPv6"),
        Some(line) => (line.url.as_str(), ""),
        None => ("-", ""),
    };
    println!(
        "{} [line {}/{}{}] {}",
        channel.name,
        controller.current_line_idx() + 1,
        channel.line_list.len(),
        family,
        url
    );
    if let Some(programme) = controller.current_playback_programme() {
        println!("  timeshift {}", programme.playseek_query());
    }
    let metadata = controller.metadata();
    if let Some(video) = &metadata.video {
        println!("  video: {}", video.short_label());
    }
    if let Some(audio) = &metadata.audio {
        println!("  audio: {}", audio.short_label());
    }
    println!(
        "  info overlay: {}",
        if controller.is_info_overlay_visible() {
            "shown"
        } else {
            "hidden"
        }
    );
}

fn execute(controller: &mut Controller, command: Command) {
    match command {
        Command::Next => controller.change_current_channel_to_next(),
        Command::Prev => controller.change_current_channel_to_prev(),
        Command::Line(request) => {
            let channel = controller.current_channel().clone();
            let idx = match request {
                LineRequest::Absolute(idx) => idx,
                LineRequest::Relative(step) => controller.current_line_idx() as i64 + step,
            };
            let programme = controller.current_playback_programme().cloned();
            controller.change_current_channel(channel, Some(idx), programme);
        }
        Command::Goto(name) => {
            let found = controller
                .channel_groups()
                .channel_list()
                .iter()
                .find(|channel| channel.name.eq_ignore_ascii_case(&name))
                .cloned();
            match found {
                Some(channel) => controller.change_current_channel(channel, None, None),
                None => println!("no channel named {name}"),
            }
        }
        Command::Timeshift(programme) => {
            let channel = controller.current_channel().clone();
            if !controller.support_current_playback() {
                println!("{} does not support timeshift", channel.name);
                return;
            }
            let idx = Some(controller.current_line_idx() as i64);
            controller.change_current_channel(channel, idx, Some(programme));
        }
        Command::Live => {
            let channel = controller.current_channel().clone();
            let idx = Some(controller.current_line_idx() as i64);
            controller.change_current_channel(channel, idx, None);
        }
        Command::Reserve(programme) => {
            let channel = controller.current_channel().clone();
            match controller.toggle_programme_reserve(&channel, &programme) {
                ReserveToggle::Reserved(r) => println!("reserved {} - {}", r.channel, r.programme),
                ReserveToggle::Cancelled(r) => {
                    println!("cancelled {} - {}", r.channel, r.programme)
                }
            }
        }
        Command::Status => print_status(controller),
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }
}

#[tokio::main]
async fn main() -> Result<(), HeadlessError> {
    let args = Args::parse();
    let config = Config::load(args.config);

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        config.level_filter()
    };
    TermLogger::init(
        level,
        simplelog::Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )?;
    log::debug!("Config loaded from {}", config.path().display());

    let channels_path = args
        .channels
        .unwrap_or_else(|| PathBuf::from(&config.channels));
    let snapshot = ChannelSnapshot::load(&channels_path)?;

    let settings = match args.settings {
        Some(path) => FileSettingsStore::open(path)?,
        None => FileSettingsStore::open_default()?,
    };
    log::info!("Playback settings at {}", settings.path().display());
    let load_timeout = Duration::from_millis(settings.settings().load_timeout_ms);

    let hub = PlayerEventHub::with_load_timeout(Arc::new(TokioScheduler::current()), load_timeout);
    let mut player = FfprobePlayer::new(hub, Handle::current()).with_ffprobe(&config.ffprobe);
    if let Some(user_agent) = &config.user_agent {
        player = player.with_user_agent(user_agent);
    }
    player.initialize();

    let options = ControllerOptions {
        overlay_hide_delay: Duration::from_millis(config.overlay_hide_delay_ms),
    };
    let mut controller = PlaybackController::new(
        player,
        settings,
        snapshot.groups,
        snapshot.favorites,
        options,
    );
    print_status(&controller);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match Command::parse(&line) {
                    Ok(Some(Command::Quit)) => break,
                    Ok(Some(command)) => execute(&mut controller, command),
                    Ok(None) => {}
                    Err(e) => println!("{e}"),
                }
            }
            running = controller.next() => {
                if !running {
                    break;
                }
            }
        }
    }

    controller.player_mut().release();
    log::info!("Bye");
    Ok(())
}
