use std::fmt;

/// Counts for one playlist run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub requested: u32,
    pub skipped: u32,
    pub failed: u32,
    pub downloaded: u32,
}

impl Stats {
    pub fn record_requested(&mut self) {
        self.requested += 1;
    }

    /// Song already existed locally
    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    /// Song failed to download or had no acceptable search result
    pub fn record_failed(&mut self) {
        self.failed += 1;
    }

    pub fn record_downloaded(&mut self) {
        self.downloaded += 1;
    }

    pub fn summary<'a>(&'a self, playlist_name: &'a str) -> Summary<'a> {
        Summary {
            stats: self,
            playlist_name,
        }
    }
}

/// Human readable report of a playlist run
pub struct Summary<'a> {
    stats: &'a Stats,
    playlist_name: &'a str,
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(
            f,
            "===== Download Summary for \"{}\" =====",
            self.playlist_name
        )?;
        writeln!(f, "{} songs requested", self.stats.requested)?;
        writeln!(
            f,
            "{} songs already existed and were skipped",
            self.stats.skipped
        )?;
        writeln!(
            f,
            "{} songs failed to download or were not found",
            self.stats.failed
        )?;
        write!(
            f,
            "{} songs were downloaded successfully",
            self.stats.downloaded
        )
    }
}

pub fn print_summary(stats: &Stats, playlist_name: &str) {
    println!("{}", stats.summary(playlist_name));
}
