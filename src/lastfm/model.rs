//! Wire format of `user.getrecenttracks` and its mapping onto [`Track`]
//!
//! The structs here mirror the JSON exactly (including the `#text` and
//! `@attr` keys). [`RecentTracksResponse::into_tracks`] is the single step
//! that turns them into the canonical model.

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer, Unexpected};
use serde::Deserialize;

use crate::track::{Album, Artist, Image, Scrobbled, Track, TrackAttributes};

/// Number of image variants Last.fm sends for every track.
pub const IMAGE_VARIANTS: usize = 4;

/// Top-level response body.
#[derive(Debug, Deserialize)]
pub struct RecentTracksResponse {
    pub recenttracks: RecentTracks,
}

#[derive(Debug, Deserialize)]
pub struct RecentTracks {
    pub track: Vec<RawTrack>,
    #[serde(rename = "@attr")]
    pub attr: Option<RawAttributes>,
}

#[derive(Debug, Deserialize)]
pub struct RawTrack {
    pub artist: RawText,
    pub streamable: Option<String>,
    pub image: Vec<RawImage>,
    pub mbid: String,
    pub album: RawText,
    pub name: String,
    pub url: String,
    pub date: Option<RawDate>,
    #[serde(rename = "@attr")]
    pub attr: Option<RawAttributes>,
}

/// The `{mbid, #text}` shape used for artists and albums.
#[derive(Debug, Deserialize)]
pub struct RawText {
    pub mbid: String,
    #[serde(rename = "#text")]
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct RawImage {
    pub size: String,
    #[serde(rename = "#text")]
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct RawDate {
    pub uts: String,
    #[serde(rename = "#text")]
    pub text: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAttributes {
    pub user: Option<String>,
    #[serde(rename = "nowplaying", default, deserialize_with = "boolish")]
    pub now_playing: Option<bool>,
    pub total_pages: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
    pub total: Option<String>,
}

/// Accept a JSON boolean or the strings `"true"` / `"false"`.
fn boolish<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Boolish {
        Bool(bool),
        Text(String),
    }

    match Option::<Boolish>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Boolish::Bool(value)) => Ok(Some(value)),
        Some(Boolish::Text(text)) => match text.as_str() {
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            other => Err(de::Error::invalid_value(
                Unexpected::Str(other),
                &"a boolean or \"true\"/\"false\"",
            )),
        },
    }
}

impl RecentTracksResponse {
    /// Map every wire track onto the canonical model, most recent first.
    ///
    /// # Errors
    ///
    /// Returns a description of the first track that violates the schema.
    pub fn into_tracks(self) -> Result<Vec<Track>, String> {
        self.recenttracks
            .track
            .into_iter()
            .enumerate()
            .map(|(index, raw)| {
                Track::try_from(raw).map_err(|e| format!("recenttracks.track[{index}]: {e}"))
            })
            .collect()
    }
}

impl TryFrom<RawTrack> for Track {
    type Error = String;

    fn try_from(raw: RawTrack) -> Result<Self, Self::Error> {
        if raw.image.len() != IMAGE_VARIANTS {
            return Err(format!(
                "expected {IMAGE_VARIANTS} image variants, got {}",
                raw.image.len()
            ));
        }

        Ok(Self {
            artist: Artist {
                mbid: raw.artist.mbid,
                name: raw.artist.text,
            },
            name: raw.name,
            album: Album {
                mbid: raw.album.mbid,
                title: raw.album.text,
            },
            images: raw
                .image
                .into_iter()
                .map(|image| Image {
                    size: image.size,
                    url: image.text,
                })
                .collect(),
            mbid: raw.mbid,
            url: raw.url,
            streamable: raw.streamable,
            scrobbled_at: raw.date.map(Scrobbled::from),
            attributes: raw.attr.map(TrackAttributes::from),
        })
    }
}

impl From<RawDate> for Scrobbled {
    fn from(raw: RawDate) -> Self {
        let at = raw
            .uts
            .parse::<i64>()
            .ok()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));
        Self { at, text: raw.text }
    }
}

impl From<RawAttributes> for TrackAttributes {
    fn from(raw: RawAttributes) -> Self {
        Self {
            now_playing: raw.now_playing.unwrap_or(false),
            user: raw.user,
            page: raw.page,
            per_page: raw.per_page,
            total_pages: raw.total_pages,
            total: raw.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_track(attr: serde_json::Value) -> serde_json::Value {
        json!({
            "artist": {"mbid": "a-mbid", "#text": "Artist A"},
            "streamable": "0",
            "image": [
                {"size": "small", "#text": "https://img/s.png"},
                {"size": "medium", "#text": "https://img/m.png"},
                {"size": "large", "#text": "https://img/l.png"},
                {"size": "extralarge", "#text": "https://img/xl.png"}
            ],
            "mbid": "t-mbid",
            "album": {"mbid": "", "#text": "Album C"},
            "name": "Song B",
            "url": "https://www.last.fm/music/Artist+A/_/Song+B",
            "@attr": attr
        })
    }

    fn parse(body: serde_json::Value) -> Result<Vec<Track>, String> {
        serde_json::from_value::<RecentTracksResponse>(body)
            .map_err(|e| e.to_string())?
            .into_tracks()
    }

    #[test]
    fn test_maps_renamed_fields() {
        let body = json!({
            "recenttracks": {
                "track": [raw_track(json!({"nowplaying": "true"}))],
                "@attr": {"user": "alice", "page": "1", "perPage": "1", "totalPages": "10", "total": "10"}
            }
        });

        let tracks = parse(body).unwrap();
        assert_eq!(tracks.len(), 1);
        let track = &tracks[0];
        assert_eq!(track.artist.name, "Artist A");
        assert_eq!(track.artist.mbid, "a-mbid");
        assert_eq!(track.album.title, "Album C");
        assert_eq!(track.images[3].size, "extralarge");
        assert_eq!(track.images[3].url, "https://img/xl.png");
        assert!(track.is_active());
    }

    #[test]
    fn test_nowplaying_accepts_json_bool() {
        let body = json!({"recenttracks": {"track": [raw_track(json!({"nowplaying": true}))]}});
        assert!(parse(body).unwrap()[0].is_active());

        let body = json!({"recenttracks": {"track": [raw_track(json!({"nowplaying": "false"}))]}});
        assert!(!parse(body).unwrap()[0].is_active());
    }

    #[test]
    fn test_nowplaying_rejects_other_strings() {
        let body = json!({"recenttracks": {"track": [raw_track(json!({"nowplaying": "yes"}))]}});
        assert!(parse(body).is_err());
    }

    #[test]
    fn test_missing_attr_is_inactive() {
        let mut track = raw_track(json!(null));
        track.as_object_mut().unwrap().remove("@attr");
        let body = json!({"recenttracks": {"track": [track]}});
        let tracks = parse(body).unwrap();
        assert!(tracks[0].attributes.is_none());
        assert!(!tracks[0].is_active());
    }

    #[test]
    fn test_scrobble_date_decoded() {
        let mut track = raw_track(json!({}));
        track["date"] = json!({"uts": "1700000000", "#text": "14 Nov 2023, 22:13"});
        let body = json!({"recenttracks": {"track": [track]}});
        let scrobbled = parse(body).unwrap()[0].scrobbled_at.clone().unwrap();
        assert_eq!(scrobbled.at.unwrap().timestamp(), 1_700_000_000);
        assert_eq!(scrobbled.text, "14 Nov 2023, 22:13");
    }

    #[test]
    fn test_wrong_image_count_is_rejected() {
        let mut track = raw_track(json!({}));
        track["image"].as_array_mut().unwrap().pop();
        let body = json!({"recenttracks": {"track": [track]}});
        let err = parse(body).unwrap_err();
        assert!(err.contains("track[0]"));
        assert!(err.contains("image variants"));
    }

    #[test]
    fn test_empty_track_list() {
        let body = json!({"recenttracks": {"track": []}});
        assert!(parse(body).unwrap().is_empty());
    }

    #[test]
    fn test_missing_recenttracks_is_rejected() {
        assert!(parse(json!({"error": 6, "message": "User not found"})).is_err());
    }
}
