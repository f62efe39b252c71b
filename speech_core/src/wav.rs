//! WAV framing for raw PCM payloads returned by the generation API.
//!
//! The API streams little-endian PCM and describes it with a MIME string such
//! as `audio/L16;rate=24000`. Nothing here resamples or converts bit depth:
//! the header only describes the layout the bytes are assumed to have.

/// Size of the canonical RIFF/WAVE header written by [`wrap_pcm`].
pub const WAV_HEADER_LEN: usize = 44;

/// MIME type reported for every framed payload.
pub const WAV_MIME: &str = "audio/wav";

const DEFAULT_BITS_PER_SAMPLE: u16 = 16;
const DEFAULT_SAMPLE_RATE: u32 = 24_000;
const NUM_CHANNELS: u16 = 1;

/// PCM layout parsed from a declared audio content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioMimeDescriptor {
    pub bits_per_sample: u16,
    pub sample_rate: u32,
}

impl Default for AudioMimeDescriptor {
    fn default() -> Self {
        Self {
            bits_per_sample: DEFAULT_BITS_PER_SAMPLE,
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

/// Audio bytes together with the MIME type they should be served as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramedAudio {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Parse bits per sample and sample rate out of e.g. `audio/L16;rate=24000`.
///
/// Never fails: segments that don't parse leave the default in place.
pub fn parse_audio_mime(mime_type: &str) -> AudioMimeDescriptor {
    let mut desc = AudioMimeDescriptor::default();

    for param in mime_type.split(';').map(str::trim) {
        let is_rate = param
            .get(..5)
            .is_some_and(|key| key.eq_ignore_ascii_case("rate="));
        if is_rate {
            if let Ok(rate) = param[5..].trim().parse::<u32>() {
                desc.sample_rate = rate;
            }
        } else if let Some(bits) = param.strip_prefix("audio/L") {
            if let Ok(bits) = bits.trim().parse::<u16>() {
                desc.bits_per_sample = bits;
            }
        }
    }

    desc
}

/// Prepend a 44-byte mono PCM header to `data`.
pub fn wrap_pcm(data: &[u8], desc: AudioMimeDescriptor) -> Vec<u8> {
    let bits_per_sample = desc.bits_per_sample;
    let block_align: u16 = NUM_CHANNELS.saturating_mul(bits_per_sample / 8);
    let byte_rate: u32 = desc.sample_rate.saturating_mul(block_align as u32);
    let data_size: u32 = u32::try_from(data.len()).unwrap_or(u32::MAX);
    let riff_size: u32 = data_size.saturating_add(36);

    let mut out = Vec::<u8>::with_capacity(WAV_HEADER_LEN + data.len());

    // RIFF header
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&riff_size.to_le_bytes());
    out.extend_from_slice(b"WAVE");

    // fmt chunk
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes()); // fmt chunk size
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&NUM_CHANNELS.to_le_bytes());
    out.extend_from_slice(&desc.sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&bits_per_sample.to_le_bytes());

    // data chunk
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_size.to_le_bytes());

    out.extend_from_slice(data);
    out
}

/// Normalize an accumulated payload into something a browser can play.
///
/// * no MIME type seen: wrap with the default layout and call it `audio/wav`
/// * MIME type ends in `wav`: assumed already framed, returned untouched
/// * anything else: wrap using the parsed layout and report `audio/wav`
pub fn frame_audio(data: Vec<u8>, mime_type: Option<&str>) -> FramedAudio {
    match mime_type.filter(|m| !m.is_empty()) {
        None => FramedAudio {
            // No declared layout, so this also wraps payloads that were
            // already WAV. Accepted as a fallback.
            bytes: wrap_pcm(&data, parse_audio_mime(WAV_MIME)),
            mime_type: WAV_MIME.to_string(),
        },
        Some(mime) if mime.ends_with("wav") => FramedAudio {
            bytes: data,
            mime_type: mime.to_string(),
        },
        Some(mime) => FramedAudio {
            bytes: wrap_pcm(&data, parse_audio_mime(mime)),
            mime_type: WAV_MIME.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn u32_at(buf: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes(buf[offset..offset + 4].try_into().unwrap())
    }

    fn u16_at(buf: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes(buf[offset..offset + 2].try_into().unwrap())
    }

    #[test]
    fn test_parse_mime_valid() {
        let d = parse_audio_mime("audio/L16;rate=24000");
        assert_eq!(d, AudioMimeDescriptor { bits_per_sample: 16, sample_rate: 24000 });

        let d = parse_audio_mime("audio/L24; rate=48000");
        assert_eq!(d, AudioMimeDescriptor { bits_per_sample: 24, sample_rate: 48000 });

        let d = parse_audio_mime("audio/L8;RATE=8000");
        assert_eq!(d, AudioMimeDescriptor { bits_per_sample: 8, sample_rate: 8000 });
    }

    #[test]
    fn test_parse_mime_defaults() {
        let default = AudioMimeDescriptor::default();
        assert_eq!(parse_audio_mime(""), default);
        assert_eq!(parse_audio_mime("audio/wav"), default);
        assert_eq!(parse_audio_mime("audio/Lxx;rate=fast"), default);
        assert_eq!(parse_audio_mime("garbage;;;"), default);
        assert_eq!(parse_audio_mime("audio/L-16;rate=-1"), default);
        assert_eq!(parse_audio_mime("ééé;ràte=1"), default);
    }

    #[test]
    fn test_parse_mime_partial() {
        let d = parse_audio_mime("audio/L32;rate=abc");
        assert_eq!(d.bits_per_sample, 32);
        assert_eq!(d.sample_rate, 24000);

        let d = parse_audio_mime("audio/pcm;rate=16000;codec=x");
        assert_eq!(d.bits_per_sample, 16);
        assert_eq!(d.sample_rate, 16000);
    }

    #[test]
    fn test_wrap_header_fields() {
        let data = b"\x00\x01".repeat(5);
        let out = wrap_pcm(&data, parse_audio_mime("audio/L16;rate=24000"));

        assert_eq!(out.len(), 54);
        assert_eq!(&out[0..4], b"RIFF");
        assert_eq!(u32_at(&out, 4), 46);
        assert_eq!(&out[8..12], b"WAVE");
        assert_eq!(&out[12..16], b"fmt ");
        assert_eq!(u32_at(&out, 16), 16);
        assert_eq!(u16_at(&out, 20), 1);
        assert_eq!(u16_at(&out, 22), 1);
        assert_eq!(u32_at(&out, 24), 24000);
        assert_eq!(u32_at(&out, 28), 48000);
        assert_eq!(u16_at(&out, 32), 2);
        assert_eq!(u16_at(&out, 34), 16);
        assert_eq!(&out[36..40], b"data");
        assert_eq!(u32_at(&out, 40), 10);
        assert_eq!(&out[44..], &data[..]);
    }

    #[test]
    fn test_wrap_readable_by_hound() {
        let samples: Vec<i16> = vec![0, 1000, -1000, i16::MAX, i16::MIN];
        let raw: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        let wav = wrap_pcm(&raw, parse_audio_mime("audio/L16;rate=22050"));

        let reader = hound::WavReader::new(Cursor::new(wav)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 22050);
        assert_eq!(spec.bits_per_sample, 16);
        let decoded: Vec<i16> = reader.into_samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn test_double_wrap_is_not_self_correcting() {
        let data = vec![7u8; 8];
        let once = wrap_pcm(&data, AudioMimeDescriptor::default());
        let twice = wrap_pcm(&once, AudioMimeDescriptor::default());

        assert_eq!(twice.len(), WAV_HEADER_LEN + once.len());
        assert_eq!(u32_at(&twice, 40) as usize, once.len());
        assert_eq!(u32_at(&twice, 4) as usize, 36 + once.len());
        // the inner header is now sample data
        assert_eq!(&twice[44..48], b"RIFF");
        assert_eq!(&twice[44..], &once[..]);
    }

    #[test]
    fn test_frame_pcm_is_wrapped() {
        let data = b"\x00\x01".repeat(5);
        let framed = frame_audio(data.clone(), Some("audio/L16;rate=24000"));
        assert_eq!(framed.mime_type, WAV_MIME);
        assert_eq!(framed.bytes.len(), 54);
        assert_eq!(&framed.bytes[0..4], b"RIFF");
        assert_eq!(&framed.bytes[8..12], b"WAVE");
        assert_eq!(u32_at(&framed.bytes, 40), 10);
    }

    #[test]
    fn test_frame_missing_mime_empty_payload() {
        let framed = frame_audio(Vec::new(), None);
        assert_eq!(framed.mime_type, WAV_MIME);
        assert_eq!(framed.bytes.len(), WAV_HEADER_LEN);
        assert_eq!(u32_at(&framed.bytes, 40), 0);
        assert_eq!(u32_at(&framed.bytes, 24), 24000);

        let framed = frame_audio(Vec::new(), Some(""));
        assert_eq!(framed.bytes.len(), WAV_HEADER_LEN);
    }

    #[test]
    fn test_frame_wav_passthrough() {
        let already = wrap_pcm(&[1, 2, 3, 4], AudioMimeDescriptor::default());
        let framed = frame_audio(already.clone(), Some("audio/wav"));
        assert_eq!(framed.bytes, already);
        assert_eq!(framed.mime_type, "audio/wav");

        let framed = frame_audio(vec![9, 9], Some("audio/x-wav"));
        assert_eq!(framed.bytes, vec![9, 9]);
        assert_eq!(framed.mime_type, "audio/x-wav");
    }
}
