//! Embedded base64 assets
//!
//! The host page ships every image and sound inline as two window globals,
//! `IMAGE_DATA` and `AUDIO_DATA`, each mapping an asset name to a base64
//! string (bare or already wrapped in a `data:` url).
use crate::browser;
use crate::engine::{self, Sound, Texture};
use anyhow::{anyhow, Context, Result};
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use futures::future::join_all;
use std::collections::HashMap;

pub const IMAGE_BUNDLE: &str = "IMAGE_DATA";
pub const AUDIO_BUNDLE: &str = "AUDIO_DATA";

// browsers accept payloads with or without trailing `=`
const PAYLOAD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Name -> base64 payload, exactly as the page declared it
pub type Bundle = HashMap<String, String>;

pub fn read_bundle(global: &str) -> Result<Bundle> {
    browser::global_value::<Bundle>(global)
        .with_context(|| format!("Failed to read asset bundle window.{}", global))
}

pub fn normalize_image_data_url(data: &str) -> String {
    let trimmed = data.trim();
    if !carries_base64(trimmed) {
        // e.g. inline svg, whitespace is part of the markup
        return trimmed.to_string();
    }
    let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.starts_with("data:") {
        return cleaned;
    }
    let mime = if cleaned.starts_with("/9j/") {
        "image/jpeg"
    } else if cleaned.starts_with("R0lGOD") {
        "image/gif"
    } else if cleaned.starts_with("UklGR") {
        "image/webp"
    } else {
        "image/png"
    };
    format!("data:{};base64,{}", mime, cleaned)
}

pub fn normalize_audio_data_url(data: &str) -> String {
    let trimmed = data.trim();
    if trimmed.starts_with("data:") {
        return trimmed.to_string();
    }
    let mime = if trimmed.starts_with("T2dnUw") {
        "audio/ogg"
    } else if trimmed.starts_with("UklGR") {
        "audio/wav"
    } else {
        // ID3 tagged ("SUQz") and bare frame ("//u", "//s") mp3 both land here
        "audio/mpeg"
    };
    format!("data:{};base64,{}", mime, trimmed)
}

/// `false` only for `data:` urls whose header does not declare `;base64`
fn carries_base64(data: &str) -> bool {
    match data.strip_prefix("data:").and_then(|rest| rest.split_once(',')) {
        Some((header, _)) => header.contains(";base64"),
        None => true,
    }
}

/// Decodes the payload of a data url, returns the byte count
/// - non-base64 data urls are left to the browser, their raw length is returned
pub fn validate_base64(data_url: &str) -> Result<usize> {
    if !carries_base64(data_url) {
        return Ok(data_url.split_once(',').map_or(0, |(_, payload)| payload.len()));
    }
    let payload = data_url
        .split_once(',')
        .map(|(_, payload)| payload)
        .unwrap_or(data_url);
    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    PAYLOAD
        .decode(cleaned.as_bytes())
        .map(|bytes| bytes.len())
        .map_err(|err| anyhow!("invalid base64 payload : {}", err))
}

/// Decoded textures by asset name
#[derive(Debug, Default, Clone)]
pub struct Textures {
    textures: HashMap<String, Texture>,
    empty: Texture,
}

impl Textures {
    /// Missing names come back as an empty texture
    pub fn get(&self, name: &str) -> &Texture {
        self.textures.get(name).unwrap_or(&self.empty)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

/// Decodes every key in parallel
/// - a bad or missing entry logs a warning and becomes an empty texture
pub async fn load_textures(bundle: &Bundle, keys: &[String]) -> Textures {
    let loads = keys.iter().map(|key| async move {
        let texture = match load_texture(bundle, key).await {
            Ok(texture) => texture,
            Err(err) => {
                log::warn!("Texture '{}' unavailable : {:#}", key, err);
                Texture::empty()
            }
        };
        (key.clone(), texture)
    });
    Textures {
        textures: join_all(loads).await.into_iter().collect(),
        empty: Texture::empty(),
    }
}

async fn load_texture(bundle: &Bundle, key: &str) -> Result<Texture> {
    let data = bundle
        .get(key)
        .ok_or_else(|| anyhow!("not present in {}", IMAGE_BUNDLE))?;
    let url = normalize_image_data_url(data);
    validate_base64(&url)?;
    let image = engine::load_image(&url).await?;
    Ok(Texture::new(image))
}

pub fn load_sound(bundle: &Bundle, key: &str) -> Result<Sound> {
    let data = bundle
        .get(key)
        .ok_or_else(|| anyhow!("Sound '{}' not present in {}", key, AUDIO_BUNDLE))?;
    Sound::new(&normalize_audio_data_url(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_png_gets_png_prefix_and_loses_whitespace() {
        let url = normalize_image_data_url(" iVBORw0K\nGgoAAAA NSUhEUg== ");
        assert_eq!(url, "data:image/png;base64,iVBORw0KGgoAAAANSUhEUg==");
    }

    #[test]
    fn image_mime_is_sniffed_from_the_payload() {
        assert!(normalize_image_data_url("/9j/4AAQ").starts_with("data:image/jpeg;base64,"));
        assert!(normalize_image_data_url("R0lGODlh").starts_with("data:image/gif;base64,"));
        assert!(normalize_image_data_url("UklGRiQA").starts_with("data:image/webp;base64,"));
    }

    #[test]
    fn existing_data_urls_pass_through() {
        let url = "data:image/jpeg;base64,/9j/4AAQ";
        assert_eq!(normalize_image_data_url(url), url);
        assert_eq!(
            normalize_audio_data_url("  data:audio/ogg;base64,T2dnUw==\n"),
            "data:audio/ogg;base64,T2dnUw=="
        );
    }

    #[test]
    fn audio_mime_defaults_to_mpeg() {
        assert!(normalize_audio_data_url("SUQzBAAA").starts_with("data:audio/mpeg;base64,"));
        assert!(normalize_audio_data_url("T2dnUwAC").starts_with("data:audio/ogg;base64,"));
        assert!(normalize_audio_data_url("UklGRiQA").starts_with("data:audio/wav;base64,"));
    }

    #[test]
    fn validate_base64_counts_decoded_bytes() {
        // "PNG" magic without the leading 0x89
        assert_eq!(validate_base64("data:image/png;base64,UE5H").unwrap(), 3);
        assert_eq!(validate_base64("UE5H").unwrap(), 3);
        assert!(validate_base64("data:image/png;base64,@@not base64@@").is_err());
    }

    #[test]
    fn unpadded_payloads_are_accepted() {
        let padded = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";
        let unpadded = padded.trim_end_matches('=');
        assert_eq!(
            validate_base64(&normalize_image_data_url(unpadded)).unwrap(),
            validate_base64(&normalize_image_data_url(padded)).unwrap()
        );
        assert_eq!(validate_base64("UE5HUE4").unwrap(), 5);
    }

    #[test]
    fn plain_text_data_urls_are_left_to_the_browser() {
        let svg = "data:image/svg+xml;utf8,<svg xmlns='http://www.w3.org/2000/svg' width='1' height='1'/>";
        assert_eq!(normalize_image_data_url(svg), svg);
        assert_eq!(
            validate_base64(svg).unwrap(),
            "<svg xmlns='http://www.w3.org/2000/svg' width='1' height='1'/>".len()
        );
        // a base64 header still gets checked
        assert!(validate_base64("data:image/svg+xml;base64,<svg/>").is_err());
    }

    #[test]
    fn missing_texture_falls_back_to_empty() {
        let textures = Textures::default();
        assert!(textures.is_empty());
        assert_eq!(textures.get("ball").size(), crate::engine::Size::default());
    }
}
