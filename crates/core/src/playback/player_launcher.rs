use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;

use crate::shared::constants::PLAYER_CANDIDATES;

#[derive(Error, Debug)]
pub enum PlayerError {
    #[error("video not found: {0}")]
    MissingVideo(PathBuf),

    #[error("failed to launch player {program}: {source}")]
    Launch {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open {path} with the default viewer: {source}")]
    DefaultViewer {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// First known player found on `PATH`.
pub fn locate_player() -> Option<PathBuf> {
    locate_from(PLAYER_CANDIDATES)
}

fn locate_from(candidates: &[&str]) -> Option<PathBuf> {
    candidates.iter().find_map(|name| which::which(name).ok())
}

/// Opens a finished video for review.
///
/// With a `player`, it is launched detached with the video as its only
/// argument. Without one, the system's default viewer is used.
pub fn open_in_player(video: &Path, player: Option<&Path>) -> Result<(), PlayerError> {
    if !video.is_file() {
        return Err(PlayerError::MissingVideo(video.to_path_buf()));
    }

    match player {
        Some(program) => launch_detached(program, video),
        None => {
            log::debug!("Opening {} with the default viewer", video.display());
            open::that(video).map_err(|source| PlayerError::DefaultViewer {
                path: video.to_path_buf(),
                source,
            })
        }
    }
}

fn launch_detached(program: &Path, video: &Path) -> Result<(), PlayerError> {
    log::debug!("Launching {} {}", program.display(), video.display());
    let mut child = Command::new(program)
        .arg(video)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| PlayerError::Launch {
            program: program.to_path_buf(),
            source,
        })?;

    // Reaped in the background; the caller never waits on the player.
    std::thread::spawn(move || {
        let _ = child.wait();
    });
    Ok(())
}
