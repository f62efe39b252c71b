//! Server-rendered HTML for the script form.

use speech_core::CATALOG_SIZE;

use crate::speakers::SPEAKER_PRESETS;

/// Browser helpers for the form, served at [`SCRIPT_PATH`].
pub const FORM_SCRIPT: &str = include_str!("../assets/sonify.js");
pub const SCRIPT_PATH: &str = "/assets/sonify.js";

const LANGUAGES: [(&str, &str); 3] = [("en", "EN"), ("id", "ID"), ("zh", "中文")];

/// What the form page should show besides the inputs.
#[derive(Debug, Default, Clone)]
pub struct FormView<'a> {
    pub script: &'a str,
    pub num_speakers: usize,
    pub error: Option<&'a str>,
    pub audio: Option<AudioView<'a>>,
}

#[derive(Debug, Clone)]
pub struct AudioView<'a> {
    pub audio_url: &'a str,
    pub download_url: &'a str,
    pub voices: &'a [String],
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn speaker_buttons() -> String {
    let mut buttons: String = SPEAKER_PRESETS
        .iter()
        .map(|&n| {
            let label = if n == 1 { "Speaker" } else { "Speakers" };
            format!(r#"<button type="button" class="speaker-btn" data-speakers="{n}">{n} {label}</button>"#)
        })
        .collect();
    buttons.push_str(r#"<button type="button" class="speaker-btn" data-speakers="custom">Custom</button>"#);
    buttons
}

fn language_buttons() -> String {
    LANGUAGES
        .iter()
        .map(|(code, label)| {
            format!(r#"<button type="button" class="lang-btn" data-lang="{code}">{label}</button>"#)
        })
        .collect()
}

pub fn render_form(view: &FormView<'_>) -> String {
    let num_speakers = view.num_speakers.max(1);

    let error = view
        .error
        .map(|e| format!(r#"<p class="error" role="alert">{}</p>"#, escape_html(e)))
        .unwrap_or_default();

    let audio = view
        .audio
        .as_ref()
        .map(|a| {
            let voices = a
                .voices
                .iter()
                .enumerate()
                .map(|(i, v)| format!("<li>Speaker {}: {}</li>", i + 1, escape_html(v)))
                .collect::<String>();
            format!(
                r#"<section class="result">
  <h3 data-i18n="audioGenerated">Audio generated</h3>
  <audio controls src="{src}"></audio>
  <ul class="voices">{voices}</ul>
  <a href="{download}" download data-i18n="downloadBtn">Download audio</a>
</section>"#,
                src = escape_html(a.audio_url),
                download = escape_html(a.download_url),
                voices = voices,
            )
        })
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Sonify</title>
<style>
body {{ font-family: sans-serif; max-width: 48rem; margin: 2rem auto; padding: 0 1rem; }}
textarea {{ width: 100%; min-height: 12rem; }}
.error {{ color: #b91c1c; }}
.result {{ margin-top: 1.5rem; }}
.speaker-btn.active, .lang-btn.active {{ background: #4f46e5; color: #fff; }}
#loadingOverlay {{ position: fixed; inset: 0; background: rgba(0, 0, 0, .5); color: #fff;
  display: flex; align-items: center; justify-content: center; font-size: 1.5rem; }}
#loadingOverlay[hidden] {{ display: none; }}
</style>
</head>
<body>
<nav class="languages">{languages}</nav>
<h1>Sonify</h1>
<p data-i18n="subtitle">AI voice generator with {catalog} voice options</p>
{error}
<form id="audioForm" method="post" action="/">
  <label for="num_speakers" data-i18n="speakerLabel">Number of speakers:</label>
  <div class="speakers">{speakers}</div>
  <div id="customInput" hidden>
    <input id="customSpeakers" type="number" min="1" max="{catalog}" placeholder="Enter number (1-{catalog})">
    <button type="button" id="applyCustom" data-i18n="apply">Apply</button>
  </div>
  <input id="num_speakers" name="num_speakers" type="number" min="1" max="{catalog}" value="{num_speakers}">
  <label for="script" data-i18n="scriptLabel">Conversation text / script:</label>
  <textarea id="script" name="script" placeholder="Speaker 1: ...">{script}</textarea>
  <button type="submit" data-i18n="generateBtn">Generate audio</button>
</form>
{audio}
<div id="loadingOverlay" hidden><span data-i18n="loadingText">Generating audio</span></div>
<script src="{script_path}" defer></script>
</body>
</html>
"#,
        languages = language_buttons(),
        catalog = CATALOG_SIZE,
        error = error,
        speakers = speaker_buttons(),
        num_speakers = num_speakers,
        script = escape_html(view.script),
        audio = audio,
        script_path = SCRIPT_PATH,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<script>alert("x")</script> & 'y'"#),
            "&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt; &amp; &#39;y&#39;"
        );
    }

    #[test]
    fn test_render_empty_form() {
        let html = render_form(&FormView::default());
        assert!(html.contains(r#"name="script""#));
        assert!(html.contains(r#"value="1""#));
        assert!(!html.contains("<audio"));
        assert!(!html.contains(r#"class="error""#));
    }

    #[test]
    fn test_render_controls() {
        let html = render_form(&FormView::default());
        for n in 1..=4 {
            assert!(html.contains(&format!(r#"data-speakers="{n}""#)));
        }
        assert!(html.contains(r#"data-speakers="custom""#));
        assert!(html.contains(r#"<input id="customSpeakers" type="number" min="1" max="30""#));
        for lang in ["en", "id", "zh"] {
            assert!(html.contains(&format!(r#"data-lang="{lang}""#)));
        }
        assert!(html.contains(r#"<div id="loadingOverlay" hidden>"#));
        assert!(html.contains(r#"<script src="/assets/sonify.js" defer>"#));
    }

    #[test]
    fn test_form_script_targets_page_ids() {
        for id in ["audioForm", "num_speakers", "script", "customInput", "customSpeakers", "applyCustom", "loadingOverlay"] {
            assert!(FORM_SCRIPT.contains(&format!(r#""{id}""#)), "missing {id}");
        }
        assert!(FORM_SCRIPT.contains(r"/Speaker\s+(\d+):/g"));
    }

    #[test]
    fn test_render_result_and_escaped_script() {
        let voices = vec!["Kore".to_string(), "Puck".to_string()];
        let html = render_form(&FormView {
            script: "Speaker 1: <b>hi</b>",
            num_speakers: 2,
            error: None,
            audio: Some(AudioView {
                audio_url: "/audio/sonify_abcd1234.wav",
                download_url: "/download/sonify_abcd1234.wav",
                voices: &voices,
            }),
        });
        assert!(html.contains("Speaker 1: &lt;b&gt;hi&lt;/b&gt;</textarea>"));
        assert!(html.contains(r#"<audio controls src="/audio/sonify_abcd1234.wav">"#));
        assert!(html.contains(r#"href="/download/sonify_abcd1234.wav""#));
        assert!(html.contains("<li>Speaker 2: Puck</li>"));
    }

    #[test]
    fn test_render_error() {
        let html = render_form(&FormView {
            error: Some("Text cannot be empty"),
            ..Default::default()
        });
        assert!(html.contains("Text cannot be empty"));
    }
}
