//! Media type detection from leading bytes.

use mime::Mime;

fn parse_or_binary(raw: &str) -> Mime {
    raw.parse().unwrap_or(mime::APPLICATION_OCTET_STREAM)
}

fn is_riff(data: &[u8], form: &[u8; 4]) -> bool {
    data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == form
}

/// Detects PNG, JPEG, GIF and WebP. Anything else is `application/octet-stream`.
pub fn sniff_image(data: &[u8]) -> Mime {
    if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        mime::IMAGE_PNG
    } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        mime::IMAGE_JPEG
    } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        mime::IMAGE_GIF
    } else if is_riff(data, b"WEBP") {
        parse_or_binary("image/webp")
    } else {
        mime::APPLICATION_OCTET_STREAM
    }
}

/// Detects MP3, WAV, OGG and FLAC. Anything else is `application/octet-stream`.
pub fn sniff_audio(data: &[u8]) -> Mime {
    let mpeg_frame = data.len() >= 2 && data[0] == 0xFF && data[1] & 0xE0 == 0xE0;
    if data.starts_with(b"ID3") || mpeg_frame {
        parse_or_binary("audio/mpeg")
    } else if is_riff(data, b"WAVE") {
        parse_or_binary("audio/wav")
    } else if data.starts_with(b"OggS") {
        parse_or_binary("audio/ogg")
    } else if data.starts_with(b"fLaC") {
        parse_or_binary("audio/flac")
    } else {
        mime::APPLICATION_OCTET_STREAM
    }
}
