//! Write the current track to a text file, e.g. for OBS text sources.

use async_trait::async_trait;
use tracing::debug;

use super::Hook;
use crate::config::FileDumpConfig;
use crate::display::fit_width;
use crate::error::{Error, Result};
use crate::track::Track;

pub struct FileDumpHook {
    config: FileDumpConfig,
    show_inactive: bool,
}

impl FileDumpHook {
    #[must_use]
    pub const fn new(config: FileDumpConfig, show_inactive: bool) -> Self {
        Self {
            config,
            show_inactive,
        }
    }

    fn render(&self, track: &Track) -> String {
        let text = track.formatted(self.show_inactive);
        // A zero limit means no limit
        match self.config.max_length {
            Some(max) if max > 0 => fit_width(&text, max),
            _ => text,
        }
    }
}

#[async_trait]
impl Hook for FileDumpHook {
    fn name(&self) -> &'static str {
        "FileDump"
    }

    async fn on_track_change(&mut self, track: &Track) -> Result<()> {
        let text = self.render(track);
        tokio::fs::write(&self.config.out_file, &text)
            .await
            .map_err(|e| {
                Error::hook(
                    self.name(),
                    format!("writing {}: {e}", self.config.out_file.display()),
                )
            })?;

        debug!(path = %self.config.out_file.display(), "Wrote current track");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::sample_track;

    fn hook(dir: &tempfile::TempDir, max_length: Option<usize>, show_inactive: bool) -> FileDumpHook {
        FileDumpHook::new(
            FileDumpConfig {
                out_file: dir.path().join("now.txt"),
                max_length,
            },
            show_inactive,
        )
    }

    #[tokio::test]
    async fn test_writes_formatted_track() {
        let dir = tempfile::tempdir().unwrap();
        let mut hook = hook(&dir, None, false);

        hook.on_track_change(&sample_track("Artist A", "Song B", true))
            .await
            .unwrap();

        let written = std::fs::read_to_string(dir.path().join("now.txt")).unwrap();
        assert_eq!(written, "Artist A - Song B");
    }

    #[tokio::test]
    async fn test_inactive_track_clears_file_unless_shown() {
        let dir = tempfile::tempdir().unwrap();
        let stopped = sample_track("Artist A", "Song B", false);

        let mut hidden = hook(&dir, None, false);
        hidden.on_track_change(&stopped).await.unwrap();
        assert_eq!(std::fs::read_to_string(dir.path().join("now.txt")).unwrap(), "");

        let mut shown = hook(&dir, None, true);
        shown.on_track_change(&stopped).await.unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("now.txt")).unwrap(),
            "Artist A - Song B"
        );
    }

    #[tokio::test]
    async fn test_truncates_to_max_length() {
        let dir = tempfile::tempdir().unwrap();
        let mut hook = hook(&dir, Some(10), false);

        hook.on_track_change(&sample_track("Artist A", "Song B", true))
            .await
            .unwrap();

        let written = std::fs::read_to_string(dir.path().join("now.txt")).unwrap();
        assert_eq!(written, "Artist ...");
    }

    #[tokio::test]
    async fn test_zero_max_length_writes_full_track() {
        let dir = tempfile::tempdir().unwrap();
        let mut hook = hook(&dir, Some(0), false);

        hook.on_track_change(&sample_track("Artist A", "Song B", true))
            .await
            .unwrap();

        let written = std::fs::read_to_string(dir.path().join("now.txt")).unwrap();
        assert_eq!(written, "Artist A - Song B");
    }

    #[tokio::test]
    async fn test_unwritable_path_is_a_hook_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut hook = FileDumpHook::new(
            FileDumpConfig {
                out_file: dir.path().join("missing").join("now.txt"),
                max_length: None,
            },
            false,
        );

        let err = hook
            .on_track_change(&sample_track("Artist A", "Song B", true))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("[FileDump] writing"));
    }
}
