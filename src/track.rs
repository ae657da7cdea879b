//! Canonical track model and display formatting

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Separator between artist and title in the display string.
pub const TRACK_SEPARATOR: &str = " - ";

/// Index of the largest image variant (`extralarge`) in a Last.fm image set.
const COVER_IMAGE_INDEX: usize = 3;

/// A recent track as reported by Last.fm, after the wire mapping step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub artist: Artist,
    pub name: String,
    pub album: Album,
    /// Size-labelled cover variants, smallest first
    pub images: Vec<Image>,
    pub mbid: String,
    pub url: String,
    pub streamable: Option<String>,
    /// When the track was scrobbled; absent for the now-playing entry
    pub scrobbled_at: Option<Scrobbled>,
    pub attributes: Option<TrackAttributes>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub mbid: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub mbid: String,
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Size label (`small`, `medium`, `large`, `extralarge`)
    pub size: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scrobbled {
    pub at: Option<DateTime<Utc>>,
    /// Human-readable date exactly as Last.fm rendered it
    pub text: String,
}

/// Playback and pagination attributes attached to a track or a response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackAttributes {
    pub now_playing: bool,
    pub user: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
    pub total_pages: Option<String>,
    pub total: Option<String>,
}

impl Track {
    /// Whether Last.fm marks this track as currently playing.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.attributes.as_ref().is_some_and(|attr| attr.now_playing)
    }

    /// Canonical `Artist - Title` string, or empty when the track is inactive
    /// and inactive tracks are not shown.
    #[must_use]
    pub fn formatted(&self, show_inactive: bool) -> String {
        if show_inactive || self.is_active() {
            format!("{}{TRACK_SEPARATOR}{}", self.artist.name, self.name)
        } else {
            String::new()
        }
    }

    /// URL of the largest cover variant, if Last.fm provided one.
    #[must_use]
    pub fn cover_url(&self) -> Option<&str> {
        self.images
            .get(COVER_IMAGE_INDEX)
            .map(|image| image.url.as_str())
            .filter(|url| !url.is_empty())
    }
}

/// Format an optional track; no track formats as the empty string.
#[must_use]
pub fn format_track(track: Option<&Track>, show_inactive: bool) -> String {
    track
        .map(|t| t.formatted(show_inactive))
        .unwrap_or_default()
}

#[cfg(test)]
pub(crate) fn sample_track(artist: &str, name: &str, now_playing: bool) -> Track {
    let sizes = ["small", "medium", "large", "extralarge"];
    Track {
        artist: Artist {
            mbid: String::new(),
            name: artist.to_string(),
        },
        name: name.to_string(),
        album: Album {
            mbid: String::new(),
            title: format!("{name} (Album)"),
        },
        images: sizes
            .iter()
            .map(|size| Image {
                size: (*size).to_string(),
                url: format!("https://img.example/{size}/{artist}-{name}.png").replace(' ', "_"),
            })
            .collect(),
        mbid: String::new(),
        url: format!("https://www.last.fm/music/{artist}/_/{name}").replace(' ', "+"),
        streamable: Some("0".to_string()),
        scrobbled_at: None,
        attributes: now_playing.then(|| TrackAttributes {
            now_playing: true,
            ..TrackAttributes::default()
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_track_formats_artist_and_title() {
        let track = sample_track("Artist A", "Song B", true);
        assert!(track.is_active());
        assert_eq!(track.formatted(false), "Artist A - Song B");
        assert_eq!(track.formatted(true), "Artist A - Song B");
    }

    #[test]
    fn test_inactive_track_hidden_unless_requested() {
        let track = sample_track("Artist A", "Song B", false);
        assert!(!track.is_active());
        assert_eq!(track.formatted(false), "");
        assert_eq!(track.formatted(true), "Artist A - Song B");
    }

    #[test]
    fn test_flag_changes_inclusion_not_content() {
        let inactive = sample_track("Same", "Name", false);
        let active = sample_track("Same", "Name", true);
        assert_eq!(inactive.formatted(true), active.formatted(false));
    }

    #[test]
    fn test_attributes_without_now_playing_are_inactive() {
        let mut track = sample_track("A", "B", false);
        track.attributes = Some(TrackAttributes {
            page: Some("1".to_string()),
            ..TrackAttributes::default()
        });
        assert!(!track.is_active());
    }

    #[test]
    fn test_format_track_none_is_empty() {
        assert_eq!(format_track(None, true), "");
        let track = sample_track("A", "B", true);
        assert_eq!(format_track(Some(&track), false), "A - B");
    }

    #[test]
    fn test_cover_url_uses_largest_variant() {
        let track = sample_track("A", "B", true);
        assert_eq!(
            track.cover_url(),
            Some("https://img.example/extralarge/A-B.png")
        );
    }

    #[test]
    fn test_cover_url_empty_or_missing() {
        let mut track = sample_track("A", "B", true);
        track.images[3].url.clear();
        assert_eq!(track.cover_url(), None);

        track.images.truncate(2);
        assert_eq!(track.cover_url(), None);
    }
}
