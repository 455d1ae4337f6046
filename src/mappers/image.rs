use crate::config::TranslatorConfig;
use crate::error::{BridgeError, Result};
use crate::mappers::fill::fill_to_paint;
use crate::scene::host::Host;
use crate::scene::paint::Paint;
use crate::schema::paint::{Fill, PaintType};
use base64::{engine::general_purpose, Engine as _};
use std::collections::HashMap;
use tracing::debug;
use url::Url;

/// url -> image hash, kept for the lifetime of a translator
#[derive(Debug, Clone, Default)]
pub struct ImageCache {
    by_url: HashMap<String, String>,
}

impl ImageCache {
    pub fn get(&self, url: &str) -> Option<&str> {
        self.by_url.get(url).map(String::as_str)
    }

    pub fn insert(&mut self, url: &str, hash: &str) {
        self.by_url.insert(url.to_string(), hash.to_string());
    }

    pub fn len(&self) -> usize {
        self.by_url.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_url.is_empty()
    }
}

/// hash -> base64 bytes, scoped to one export call
#[derive(Debug, Default)]
pub struct EmbeddedImages {
    encoded: HashMap<String, String>,
}

impl EmbeddedImages {
    /// Base64 of the bitmap behind `hash`, read from the host at most once
    pub async fn encode<H: Host>(&mut self, host: &mut H, hash: &str) -> Result<String> {
        if let Some(encoded) = self.encoded.get(hash) {
            return Ok(encoded.clone());
        }
        let bytes = host.image_bytes(hash).await?;
        let encoded = general_purpose::STANDARD.encode(&bytes);
        self.encoded.insert(hash.to_string(), encoded.clone());
        Ok(encoded)
    }

    pub fn len(&self) -> usize {
        self.encoded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encoded.is_empty()
    }
}

/// Resolve a fill into a host paint, creating bitmaps for image fills
///
/// Image fills are resolved in order of preference: inline `imageData`,
/// then `imageUrl` (through the url cache, and through the conversion proxy
/// for SVG sources), then an `imageHash` the host already knows.
///
/// # Returns
/// * `Ok(Paint)` - The host paint, image fills carrying the new hash
/// * `Err(BridgeError)` - On decode, fetch or bitmap creation failure
pub async fn resolve_fill<H: Host>(
    host: &mut H,
    cache: &mut ImageCache,
    config: &TranslatorConfig,
    fill: &Fill,
) -> Result<Paint> {
    if fill.paint_type != PaintType::Image {
        return fill_to_paint(fill);
    }

    let hash = if let Some(data) = &fill.image_data {
        let bytes = decode_inline(data)?;
        host.create_image(&bytes).await?
    } else if let Some(url) = &fill.image_url {
        resolve_url(host, cache, config, url).await?
    } else if let Some(hash) = &fill.image_hash {
        if !host.has_image(hash).await {
            return Err(BridgeError::Image(format!("no image with hash {}", hash)));
        }
        hash.clone()
    } else {
        return Err(BridgeError::invalid(
            "fills",
            "IMAGE paint without imageData, imageUrl or imageHash",
        ));
    };

    let mut resolved = fill.clone();
    resolved.image_hash = Some(hash);
    fill_to_paint(&resolved)
}

/// Resolve a whole paint list; the first failure aborts the list
pub async fn resolve_fills<H: Host>(
    host: &mut H,
    cache: &mut ImageCache,
    config: &TranslatorConfig,
    fills: &[Fill],
) -> Result<Vec<Paint>> {
    let mut paints = Vec::with_capacity(fills.len());
    for fill in fills {
        paints.push(resolve_fill(host, cache, config, fill).await?);
    }
    Ok(paints)
}

async fn resolve_url<H: Host>(
    host: &mut H,
    cache: &mut ImageCache,
    config: &TranslatorConfig,
    url: &str,
) -> Result<String> {
    if let Some(hash) = cache.get(url) {
        debug!("Image cache hit for {}", url);
        return Ok(hash.to_string());
    }

    let source = match (&config.svg_proxy_url, is_svg_url(url)) {
        (Some(proxy), true) => proxy_url(proxy, url)?,
        _ => url.to_string(),
    };

    let bytes = host.fetch(&source).await?;
    let hash = host.create_image(&bytes).await?;
    cache.insert(url, &hash);
    Ok(hash)
}

/// Build `<proxy>?url=<source>` with the source percent-encoded
pub fn proxy_url(proxy: &str, source: &str) -> Result<String> {
    Ok(Url::parse_with_params(proxy, &[("url", source)])?.to_string())
}

pub fn is_svg_url(url: &str) -> bool {
    if url.starts_with("data:image/svg") {
        return true;
    }
    match Url::parse(url) {
        Ok(parsed) => parsed.path().to_ascii_lowercase().ends_with(".svg"),
        Err(_) => url.to_ascii_lowercase().ends_with(".svg"),
    }
}

/// Decode base64 image data, with or without a `data:<mime>;base64,` prefix
pub fn decode_inline(data: &str) -> Result<Vec<u8>> {
    let payload = match data.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => data,
    };
    Ok(general_purpose::STANDARD.decode(payload.trim())?)
}
