//! Source reference validation and conversion into bridge [`AudioSource`]s.

use bridge_traits::AudioSource;
use url::Url;

use crate::error::{PlaybackError, Result};

/// Audio container extensions accepted for playback.
pub const AUDIO_EXTENSIONS: &[&str] = &[
    "m4a", "mp3", "aac", "wav", "ogg", "oga", "opus", "caf", "3gp", "amr", "webm", "flac",
];

const ALLOWED_SCHEMES: &[&str] = &["http", "https", "file"];

/// Returns `true` if `source_ref` is an http(s) or file URL whose last path
/// segment carries a known audio extension.
///
/// Query strings and fragments are ignored; extension matching is
/// case-insensitive.
pub fn is_valid_audio_url(source_ref: &str) -> bool {
    parse_audio_url(source_ref).is_some()
}

fn parse_audio_url(source_ref: &str) -> Option<Url> {
    let trimmed = source_ref.trim();
    if trimmed.is_empty() {
        return None;
    }

    let url = Url::parse(trimmed).ok()?;
    if !ALLOWED_SCHEMES.contains(&url.scheme()) {
        return None;
    }

    let file_name = url.path_segments()?.next_back()?;
    let (_, extension) = file_name.rsplit_once('.')?;
    let extension = extension.to_ascii_lowercase();

    AUDIO_EXTENSIONS
        .contains(&extension.as_str())
        .then_some(url)
}

/// Validates `source_ref` and converts it into the source handed to the
/// sound factory.
pub fn resolve_source(source_ref: &str) -> Result<AudioSource> {
    let url = parse_audio_url(source_ref)
        .ok_or_else(|| PlaybackError::InvalidSource(source_ref.to_string()))?;

    if url.scheme() == "file" {
        let path = url
            .to_file_path()
            .map_err(|_| PlaybackError::InvalidSource(source_ref.to_string()))?;
        Ok(AudioSource::LocalFile { path })
    } else {
        Ok(AudioSource::RemoteStream {
            url: url.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn accepts_remote_audio() {
        assert!(is_valid_audio_url("https://cdn.example.com/voice/abc.m4a"));
        assert!(is_valid_audio_url("http://cdn.example.com/a.MP3"));
        assert!(is_valid_audio_url(
            "https://cdn.example.com/a.opus?X-Amz-Signature=abc#t=3"
        ));
        assert!(is_valid_audio_url("  https://cdn.example.com/a.flac  "));
    }

    #[test]
    fn rejects_non_audio() {
        assert!(!is_valid_audio_url(""));
        assert!(!is_valid_audio_url("   "));
        assert!(!is_valid_audio_url("not a url"));
        assert!(!is_valid_audio_url("ftp://cdn.example.com/a.m4a"));
        assert!(!is_valid_audio_url("https://cdn.example.com/a.png"));
        assert!(!is_valid_audio_url("https://cdn.example.com/voice"));
        assert!(!is_valid_audio_url("https://cdn.example.com/"));
        assert!(!is_valid_audio_url("https://cdn.example.com/page?file=a.m4a"));
    }

    #[test]
    fn resolves_file_urls_to_local_paths() {
        let source = resolve_source("file:///tmp/voice/1.m4a").unwrap();
        assert_eq!(
            source,
            AudioSource::LocalFile {
                path: PathBuf::from("/tmp/voice/1.m4a")
            }
        );
    }

    #[test]
    fn resolves_remote_urls_untouched() {
        let source = resolve_source("https://cdn.example.com/a.m4a?sig=1").unwrap();
        assert_eq!(
            source,
            AudioSource::RemoteStream {
                url: "https://cdn.example.com/a.m4a?sig=1".to_string()
            }
        );
    }

    #[test]
    fn invalid_source_reports_reference() {
        match resolve_source("ftp://x/a.m4a") {
            Err(PlaybackError::InvalidSource(source)) => assert_eq!(source, "ftp://x/a.m4a"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
