//! Character classification and font segmentation helpers.

use std::ops::Range;

use crate::manager::FontHandle;

/// Decode UTF-8 bytes, replacing invalid sequences with U+FFFD.
pub fn decode_utf8(bytes: &[u8]) -> Vec<char> {
    String::from_utf8_lossy(bytes).chars().collect()
}

/// Coarse script classification used to pick a shaping language.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Script {
    Han,
    Latin,
    Hiragana,
    Katakana,
    Hangul,
    Common,
}

pub fn detect_script(ch: char) -> Script {
    match ch as u32 {
        0x4E00..=0x9FFF
        | 0x3400..=0x4DBF
        | 0x20000..=0x2A6DF
        | 0x2A700..=0x2B73F
        | 0x2B740..=0x2B81F
        | 0xF900..=0xFAFF
        | 0x2F800..=0x2FA1F => Script::Han,
        0x0020..=0x007F | 0x00A0..=0x024F => Script::Latin,
        0x3040..=0x309F => Script::Hiragana,
        0x30A0..=0x30FF => Script::Katakana,
        0xAC00..=0xD7AF => Script::Hangul,
        _ => Script::Common,
    }
}

/// Dominant script of `text`: Han if any Han character is present, then the
/// last other non-Latin script seen, then Latin, else Common.
pub fn detect_text_script(text: &str) -> Script {
    let mut han = false;
    let mut latin = false;
    let mut other = None;
    for ch in text.chars().filter(|&c| c != char::REPLACEMENT_CHARACTER) {
        match detect_script(ch) {
            Script::Han => han = true,
            Script::Latin => latin = true,
            Script::Common => {}
            script => other = Some(script),
        }
    }
    if han {
        Script::Han
    } else if let Some(script) = other {
        script
    } else if latin {
        Script::Latin
    } else {
        Script::Common
    }
}

impl Script {
    /// The shaping engine's ISO 15924 script for this class.
    pub fn shaping_script(self) -> rustybuzz::Script {
        match self {
            Script::Han => rustybuzz::script::HAN,
            Script::Latin => rustybuzz::script::LATIN,
            Script::Hiragana => rustybuzz::script::HIRAGANA,
            Script::Katakana => rustybuzz::script::KATAKANA,
            Script::Hangul => rustybuzz::script::HANGUL,
            Script::Common => rustybuzz::script::COMMON,
        }
    }
}

/// BCP 47 tag handed to the shaping engine for `script`.
pub fn language_for_script(script: Script) -> &'static str {
    match script {
        Script::Han => "zh-cn",
        Script::Hiragana | Script::Katakana => "ja",
        Script::Hangul => "ko",
        Script::Latin | Script::Common => "en",
    }
}

/// A maximal run of characters that resolve to the same font.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextSegment {
    pub font: FontHandle,
    /// Byte range in the source text.
    pub range: Range<usize>,
}

impl TextSegment {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.range.clone()]
    }
}

/// Split `text` into runs sharing the font returned by `select`.
pub fn segment_text(text: &str, mut select: impl FnMut(char) -> FontHandle) -> Vec<TextSegment> {
    let mut segments: Vec<TextSegment> = Vec::new();
    for (offset, ch) in text.char_indices() {
        let font = select(ch);
        let end = offset + ch.len_utf8();
        match segments.last_mut() {
            Some(last) if last.font == font => last.range.end = end,
            _ => segments.push(TextSegment {
                font,
                range: offset..end,
            }),
        }
    }
    segments
}
