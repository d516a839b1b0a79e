use std::sync::OnceLock;
use std::time::Duration;

use regex::{Captures, Regex};
use reqwest::blocking::Client;
use reqwest::header::ACCEPT_LANGUAGE;
use serde::Deserialize;

use crate::config::CaptionsConfig;
use crate::error::ProviderError;
use crate::model::{CaptionEntry, Track};
use crate::providers::backend::TrackProvider;

/// Client identity sent to the innertube player endpoint.
const INNERTUBE_CLIENT_NAME: &str = "ANDROID";
const INNERTUBE_CLIENT_VERSION: &str = "20.10.38";

/// Caption tracks from YouTube: the watch page yields the innertube API key,
/// the player endpoint lists tracks, and each track's `baseUrl` serves
/// timed-text XML.
pub struct YouTubeCaptions {
    client: Client,
    watch_url: String,
    player_url: String,
}

impl YouTubeCaptions {
    pub fn new(config: &CaptionsConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            watch_url: config.watch_url.clone(),
            player_url: config.player_url.clone(),
        })
    }

    fn fetch_api_key(&self, video_id: &str) -> Result<String, ProviderError> {
        let html = self
            .client
            .get(&self.watch_url)
            .query(&[("v", video_id)])
            .header(ACCEPT_LANGUAGE, "en-US")
            .send()?
            .error_for_status()?
            .text()?;
        extract_api_key(&html)
    }

    fn fetch_player(&self, video_id: &str, api_key: &str) -> Result<PlayerResponse, ProviderError> {
        let body = serde_json::json!({
            "context": {
                "client": {
                    "clientName": INNERTUBE_CLIENT_NAME,
                    "clientVersion": INNERTUBE_CLIENT_VERSION,
                }
            },
            "videoId": video_id,
        });

        let response = self
            .client
            .post(&self.player_url)
            .query(&[("key", api_key)])
            .json(&body)
            .send()?
            .error_for_status()?;
        Ok(response.json()?)
    }
}

impl TrackProvider for YouTubeCaptions {
    fn name(&self) -> &str {
        "youtube-captions"
    }

    fn list_tracks(&self, video_id: &str) -> Result<Vec<Track>, ProviderError> {
        let api_key = self.fetch_api_key(video_id)?;
        let player = self.fetch_player(video_id, &api_key)?;
        let tracks = tracks_from_player(video_id, player)?;
        tracing::debug!("{} caption track(s) listed for {}", tracks.len(), video_id);
        Ok(tracks)
    }

    fn fetch(&self, track: &Track) -> Result<Vec<CaptionEntry>, ProviderError> {
        let xml = self
            .client
            .get(&track.base_url)
            .header(ACCEPT_LANGUAGE, "en-US")
            .send()?
            .error_for_status()?
            .text()?;
        parse_timed_text(&xml)
    }
}

// --- Innertube player response ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerResponse {
    playability_status: Option<PlayabilityStatus>,
    captions: Option<PlayerCaptions>,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    status: String,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerCaptions {
    player_captions_tracklist_renderer: Option<TracklistRenderer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TracklistRenderer {
    #[serde(default)]
    caption_tracks: Vec<CaptionTrack>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    language_code: String,
    name: Option<TrackName>,
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrackName {
    simple_text: Option<String>,
    #[serde(default)]
    runs: Vec<TextRun>,
}

#[derive(Debug, Deserialize)]
struct TextRun {
    text: String,
}

impl TrackName {
    fn text(&self) -> Option<String> {
        self.simple_text
            .clone()
            .or_else(|| self.runs.first().map(|run| run.text.clone()))
    }
}

fn extract_api_key(html: &str) -> Result<String, ProviderError> {
    static API_KEY: OnceLock<Regex> = OnceLock::new();
    let re = API_KEY.get_or_init(|| {
        Regex::new(r#""INNERTUBE_API_KEY":\s*"([a-zA-Z0-9_-]+)""#).expect("static regex")
    });

    if let Some(caps) = re.captures(html) {
        return Ok(caps[1].to_string());
    }
    if html.contains("class=\"g-recaptcha\"") {
        return Err(ProviderError::Unexpected(
            "YouTube is rate limiting requests (captcha challenge)".to_string(),
        ));
    }
    Err(ProviderError::Unavailable("The video is unavailable".to_string()))
}

fn tracks_from_player(video_id: &str, player: PlayerResponse) -> Result<Vec<Track>, ProviderError> {
    if let Some(playability) = &player.playability_status {
        if playability.status != "OK" {
            let reason = playability
                .reason
                .clone()
                .unwrap_or_else(|| format!("video is not playable ({})", playability.status));
            return Err(ProviderError::Unavailable(reason));
        }
    }

    let renderer = player
        .captions
        .and_then(|c| c.player_captions_tracklist_renderer)
        .ok_or_else(|| {
            ProviderError::Unavailable("Subtitles are disabled for this video".to_string())
        })?;

    Ok(renderer
        .caption_tracks
        .into_iter()
        .map(|track| Track {
            video_id: video_id.to_string(),
            language: track
                .name
                .as_ref()
                .and_then(TrackName::text)
                .unwrap_or_else(|| track.language_code.clone()),
            is_generated: track.kind.as_deref() == Some("asr"),
            base_url: strip_format_param(&track.base_url),
            language_code: track.language_code,
        })
        .collect())
}

/// Drop any `fmt` query parameter so the endpoint serves its default XML.
fn strip_format_param(base_url: &str) -> String {
    let Ok(mut url) = url::Url::parse(base_url) else {
        return base_url.to_string();
    };

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "fmt")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    if pairs.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }
    url.to_string()
}

// --- Timed-text XML ---

fn parse_timed_text(xml: &str) -> Result<Vec<CaptionEntry>, ProviderError> {
    static ELEMENT: OnceLock<Regex> = OnceLock::new();
    static ATTRIBUTE: OnceLock<Regex> = OnceLock::new();
    let element = ELEMENT.get_or_init(|| {
        Regex::new(r"(?s)<text\b([^>]*?)(?:/>|>(.*?)</text>)").expect("static regex")
    });
    let attribute =
        ATTRIBUTE.get_or_init(|| Regex::new(r#"([\w-]+)="([^"]*)""#).expect("static regex"));

    let mut entries = Vec::new();
    for caps in element.captures_iter(xml) {
        let body = match caps.get(2) {
            Some(body) if !body.as_str().is_empty() => body.as_str(),
            _ => continue,
        };

        let mut start = None;
        let mut duration = None;
        for attr in attribute.captures_iter(&caps[1]) {
            match &attr[1] {
                "start" => start = Some(attr.get(2).map_or("", |m| m.as_str())),
                "dur" => duration = Some(attr.get(2).map_or("", |m| m.as_str())),
                _ => {}
            }
        }

        let start = start
            .ok_or_else(|| ProviderError::Unexpected("caption entry without start".to_string()))?;
        entries.push(CaptionEntry {
            text: strip_markup(&decode_entities(&decode_entities(body))),
            start: parse_seconds(start)?,
            duration: parse_seconds(duration.unwrap_or("0.0"))?,
        });
    }
    Ok(entries)
}

fn parse_seconds(value: &str) -> Result<f64, ProviderError> {
    value
        .parse()
        .map_err(|_| ProviderError::Unexpected(format!("invalid caption time {:?}", value)))
}

/// Decode one level of XML/HTML character references. Timed-text bodies are
/// escaped twice (XML, then HTML), so callers apply this twice.
fn decode_entities(text: &str) -> String {
    static ENTITY: OnceLock<Regex> = OnceLock::new();
    let re = ENTITY.get_or_init(|| {
        Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("static regex")
    });

    re.replace_all(text, |caps: &Captures| {
        let name = &caps[1];
        let decoded = match name {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some('\u{a0}'),
            _ => name
                .strip_prefix("#x")
                .or_else(|| name.strip_prefix("#X"))
                .map(|hex| u32::from_str_radix(hex, 16).ok())
                .unwrap_or_else(|| name.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                .and_then(char::from_u32),
        };
        decoded.map_or_else(|| caps[0].to_string(), String::from)
    })
    .into_owned()
}

fn strip_markup(text: &str) -> String {
    static TAG: OnceLock<Regex> = OnceLock::new();
    let re = TAG.get_or_init(|| Regex::new(r"<[^>]*>").expect("static regex"));
    re.replace_all(text, "").into_owned()
}
