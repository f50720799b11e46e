/// Turns raw OCR output into the canonical plate identity (`[A-Z0-9]*`).
///
/// The optional correction table maps letters OCR commonly confuses with
/// digits (`O→0`, `I→1`, `S→5`). It is off by default: on a plate that really
/// carries those letters it produces a different identity, which can then
/// match (or miss) the wrong whitelist entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlateTextNormalizer {
    pub ocr_corrections: bool,
}

const CORRECTIONS: [(char, char); 3] = [('O', '0'), ('I', '1'), ('S', '5')];

impl PlateTextNormalizer {
    pub fn new(ocr_corrections: bool) -> Self {
        Self { ocr_corrections }
    }

    /// Normalize `raw`. May return an empty string, which callers treat as
    /// "no usable reading".
    pub fn normalize(&self, raw: &str) -> String {
        raw.chars()
            .filter(|c| !matches!(c, ' ' | '-' | '.'))
            .flat_map(char::to_uppercase)
            .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
            .map(|c| if self.ocr_corrections { correct(c) } else { c })
            .collect()
    }
}

fn correct(c: char) -> char {
    CORRECTIONS
        .iter()
        .find(|(from, _)| *from == c)
        .map(|(_, to)| *to)
        .unwrap_or(c)
}

/// Normalize with the default (corrections disabled) settings.
pub fn normalize(raw: &str) -> String {
    PlateTextNormalizer::default().normalize(raw)
}
