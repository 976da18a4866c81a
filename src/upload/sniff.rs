//! Header sniffing for uploaded media. Works on the in-memory bytes only and
//! never decodes audio.

use std::io::Cursor;

use id3::{Tag, TagLike};
use serde::Serialize;
use thiserror::Error;

/// Frames walked before the rest of the stream is extrapolated.
const MAX_SCANNED_FRAMES: usize = 2000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SniffError {
    #[error("No MPEG audio frame found")]
    NoAudioFrame,
    #[error("Unrecognised image format")]
    UnknownImage,
    #[error("Truncated {0} header")]
    Truncated(&'static str),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MpegVersion {
    V1,
    V2,
    V25,
}

impl MpegVersion {
    fn label(self) -> &'static str {
        match self {
            MpegVersion::V1 => "1",
            MpegVersion::V2 => "2",
            MpegVersion::V25 => "2.5",
        }
    }
}

const BITRATES_V1: [[u32; 15]; 3] = [
    [0, 32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448],
    [0, 32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384],
    [0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320],
];
const BITRATES_V2: [[u32; 15]; 2] = [
    [0, 32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256],
    [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160],
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct FrameHeader {
    version: MpegVersion,
    layer: u8,
    bitrate_kbps: u32,
    sample_rate: u32,
    padding: bool,
    channel_mode: u8,
}

impl FrameHeader {
    fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 4 || bytes[0] != 0xFF || bytes[1] & 0xE0 != 0xE0 {
            return None;
        }
        let version = match (bytes[1] >> 3) & 0x03 {
            0 => MpegVersion::V25,
            2 => MpegVersion::V2,
            3 => MpegVersion::V1,
            _ => return None,
        };
        let layer = match (bytes[1] >> 1) & 0x03 {
            1 => 3,
            2 => 2,
            3 => 1,
            _ => return None,
        };
        let bitrate_index = (bytes[2] >> 4) as usize;
        // 0 is "free format", 15 is invalid; neither gives a usable frame size
        if bitrate_index == 0 || bitrate_index == 15 {
            return None;
        }
        let bitrate_kbps = match version {
            MpegVersion::V1 => BITRATES_V1[(layer - 1) as usize][bitrate_index],
            _ if layer == 1 => BITRATES_V2[0][bitrate_index],
            _ => BITRATES_V2[1][bitrate_index],
        };
        let base_rate = match (bytes[2] >> 2) & 0x03 {
            0 => 44100,
            1 => 48000,
            2 => 32000,
            _ => return None,
        };
        let sample_rate = match version {
            MpegVersion::V1 => base_rate,
            MpegVersion::V2 => base_rate / 2,
            MpegVersion::V25 => base_rate / 4,
        };
        Some(FrameHeader {
            version,
            layer,
            bitrate_kbps,
            sample_rate,
            padding: (bytes[2] >> 1) & 0x01 == 1,
            channel_mode: bytes[3] >> 6,
        })
    }

    fn samples(&self) -> u32 {
        match (self.layer, self.version) {
            (1, _) => 384,
            (2, _) => 1152,
            (_, MpegVersion::V1) => 1152,
            _ => 576,
        }
    }

    fn length(&self) -> usize {
        let bitrate = self.bitrate_kbps * 1000;
        let padding = u32::from(self.padding);
        let length = if self.layer == 1 {
            (12 * bitrate / self.sample_rate + padding) * 4
        } else {
            self.samples() / 8 * bitrate / self.sample_rate + padding
        };
        length as usize
    }

    fn channel_mode(&self) -> &'static str {
        match self.channel_mode {
            0 => "stereo",
            1 => "joint_stereo",
            2 => "dual_channel",
            _ => "mono",
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AudioInfo {
    /// Seconds, rounded.
    pub duration: u32,
    pub bitrate: u32,
    pub sample_rate: u32,
    pub channel_mode: String,
    pub mpeg_version: String,
    pub layer: u8,
    pub vbr: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ImageInfo {
    pub format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// Length of a leading ID3v2 tag, footer included.
fn id3v2_length(bytes: &[u8]) -> usize {
    if bytes.len() < 10 || &bytes[..3] != b"ID3" {
        return 0;
    }
    let size = bytes[6..10]
        .iter()
        .fold(0usize, |acc, b| (acc << 7) | (*b & 0x7F) as usize);
    let footer = if bytes[5] & 0x10 != 0 { 10 } else { 0 };
    10 + size + footer
}

/// First frame header that is followed by another valid header (or the end
/// of the data), which rules out stray sync bytes.
fn first_frame(bytes: &[u8], from: usize) -> Option<(usize, FrameHeader)> {
    let mut offset = from;
    while offset + 4 <= bytes.len() {
        if let Some(header) = FrameHeader::parse(&bytes[offset..]) {
            let next = offset + header.length();
            if next + 4 > bytes.len() || FrameHeader::parse(&bytes[next..]).is_some() {
                return Some((offset, header));
            }
        }
        offset += 1;
    }
    None
}

/// Text fields of a leading ID3v2 tag.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrackTags {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub year: Option<String>,
}

pub fn read_tags(bytes: &[u8]) -> TrackTags {
    let tag = match Tag::read_from2(Cursor::new(bytes)) {
        Ok(tag) => tag,
        Err(_) => return TrackTags::default(),
    };
    let text = |value: Option<&str>| {
        value
            .map(|text| text.trim_matches(char::from(0)).trim().to_owned())
            .filter(|text| !text.is_empty())
    };
    TrackTags {
        title: text(tag.title()),
        artist: text(tag.artist()),
        album: text(tag.album()),
        year: tag
            .year()
            .or_else(|| tag.date_recorded().map(|date| date.year))
            .map(|year| year.to_string()),
    }
}

pub fn sniff_audio(bytes: &[u8]) -> Result<AudioInfo, SniffError> {
    let start = id3v2_length(bytes).min(bytes.len());
    let end = if bytes.len() >= start + 128 && &bytes[bytes.len() - 128..bytes.len() - 125] == b"TAG"
    {
        bytes.len() - 128
    } else {
        bytes.len()
    };
    let audio = &bytes[..end];
    let (first_offset, first) = first_frame(audio, start).ok_or(SniffError::NoAudioFrame)?;

    let mut offset = first_offset;
    let mut frames = 0usize;
    let mut scanned_bytes = 0usize;
    let mut bitrate_sum = 0u64;
    let mut vbr = false;
    while frames < MAX_SCANNED_FRAMES && offset + 4 <= audio.len() {
        let header = match FrameHeader::parse(&audio[offset..]) {
            Some(header) => header,
            None => break,
        };
        let length = header.length().max(1);
        vbr |= header.bitrate_kbps != first.bitrate_kbps;
        bitrate_sum += u64::from(header.bitrate_kbps);
        scanned_bytes += length.min(audio.len() - offset);
        frames += 1;
        offset += length;
    }

    let samples = f64::from(first.samples());
    let sample_rate = f64::from(first.sample_rate);
    let total_frames = if offset >= audio.len() {
        frames as f64
    } else {
        // Extrapolate from the average frame size seen so far
        let average = scanned_bytes as f64 / frames as f64;
        (audio.len() - first_offset) as f64 / average
    };
    let duration = (total_frames * samples / sample_rate).round() as u32;
    let tags = if start > 0 {
        read_tags(bytes)
    } else {
        TrackTags::default()
    };

    Ok(AudioInfo {
        duration,
        bitrate: (bitrate_sum / frames as u64) as u32,
        sample_rate: first.sample_rate,
        channel_mode: first.channel_mode().to_string(),
        mpeg_version: first.version.label().to_string(),
        layer: first.layer,
        vbr,
        title: tags.title,
        artist: tags.artist,
        album: tags.album,
    })
}

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

fn be16(bytes: &[u8], at: usize) -> u32 {
    u32::from(bytes[at]) << 8 | u32::from(bytes[at + 1])
}

fn be32(bytes: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn is_start_of_frame(marker: u8) -> bool {
    (0xC0..=0xCF).contains(&marker) && !matches!(marker, 0xC4 | 0xC8 | 0xCC)
}

fn sniff_jpeg(bytes: &[u8]) -> ImageInfo {
    let mut info = ImageInfo {
        format: "jpeg".to_string(),
        width: None,
        height: None,
    };
    let mut offset = 2;
    while offset + 4 <= bytes.len() {
        if bytes[offset] != 0xFF {
            offset += 1;
            continue;
        }
        let marker = bytes[offset + 1];
        match marker {
            // fill byte
            0xFF => offset += 1,
            // start of scan or end of image; entropy-coded data follows
            0xDA | 0xD9 => break,
            0x01 | 0xD0..=0xD7 => offset += 2,
            _ if is_start_of_frame(marker) => {
                if offset + 9 <= bytes.len() {
                    info.height = Some(be16(bytes, offset + 5));
                    info.width = Some(be16(bytes, offset + 7));
                }
                break;
            }
            _ => offset += 2 + be16(bytes, offset + 2) as usize,
        }
    }
    info
}

pub fn sniff_image(bytes: &[u8]) -> Result<ImageInfo, SniffError> {
    if bytes.starts_with(&PNG_SIGNATURE) {
        if bytes.len() < 24 {
            return Err(SniffError::Truncated("png"));
        }
        return Ok(ImageInfo {
            format: "png".to_string(),
            width: Some(be32(bytes, 16)),
            height: Some(be32(bytes, 20)),
        });
    }
    if bytes.starts_with(&[0xFF, 0xD8]) {
        return Ok(sniff_jpeg(bytes));
    }
    Err(SniffError::UnknownImage)
}
