use std::io;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::filename::song_filename;
use crate::song::Song;

/// Length of the video id at the end of a youtube url
const URL_ID_LEN: usize = 11;

/// Find the file the downloader produced for a search result in `directory`.
///
/// Downloads are named after the search result title followed by a dash and a
/// unique id:
/// - youtube: the 11 character video id that also ends the url,
///   e.g. `Green Day - Bang Bang (Official Lyric Video)-mg5Bp_Gzs0s.mp3`
/// - soundcloud: a 9 digit id, e.g. `Curse the Weather-297150404.mp3`
///
/// A file matching the url's id is preferred over one matching the title.
/// When several files match, the first in directory listing order wins.
pub fn find_downloaded_file(
    directory: &Path,
    title: &str,
    url: Option<&str>,
) -> io::Result<Option<String>> {
    let title_pattern = Regex::new(&format!(
        r"^.*{}-\S{{9}}(\S{{2}})?\.mp3",
        regex::escape(title)
    ))
    .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let url_pattern = url
        .map(|url| Regex::new(&format!(r"^.*?-{}", regex::escape(url_id(url)))))
        .transpose()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let mut title_match = None;
    for entry in walkdir::WalkDir::new(directory).min_depth(1).max_depth(1) {
        let entry = entry?;
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };

        match &url_pattern {
            Some(url_pattern) if url_pattern.is_match(name) => {
                log::debug!("Found download by url id: {}", name);
                return Ok(Some(name.to_string()));
            }
            Some(_) => {
                if title_match.is_none() && title_pattern.is_match(name) {
                    title_match = Some(name.to_string());
                }
            }
            None => {
                if title_pattern.is_match(name) {
                    log::debug!("Found download by title: {}", name);
                    return Ok(Some(name.to_string()));
                }
            }
        }
    }

    if let Some(name) = &title_match {
        log::debug!("Found download by title: {}", name);
    }
    Ok(title_match)
}

/// The last 11 characters of a url, the whole url if it's shorter
fn url_id(url: &str) -> &str {
    let start = url
        .char_indices()
        .rev()
        .nth(URL_ID_LEN - 1)
        .map(|(index, _)| index)
        .unwrap_or(0);
    &url[start..]
}

/// Rename a downloaded file to the standard name for its song.
pub fn rename_to_standard(
    directory: &Path,
    current_filename: &str,
    song: &Song,
) -> io::Result<PathBuf> {
    let from = directory.join(current_filename);
    let to = directory.join(song_filename(song));
    log::debug!("Renaming {} to {}", from.display(), to.display());
    std::fs::rename(&from, &to)?;
    Ok(to)
}
