//! OCR engine/language pairs and the variant stores they name.

use serde::{Deserialize, Serialize};

/// OCR engines the harvesting step is known to produce stores for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrEngine {
    #[default]
    Tesseract,
    EasyOcr,
    Gemini,
}

impl OcrEngine {
    pub fn as_str(&self) -> &'static str {
        match self {
            OcrEngine::Tesseract => "tesseract",
            OcrEngine::EasyOcr => "easyocr",
            OcrEngine::Gemini => "gemini",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "tesseract" => Some(OcrEngine::Tesseract),
            "easyocr" => Some(OcrEngine::EasyOcr),
            "gemini" => Some(OcrEngine::Gemini),
            _ => None,
        }
    }
}

impl std::fmt::Display for OcrEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// OCR language configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OcrLang {
    #[serde(rename = "tha")]
    Tha,
    #[serde(rename = "eng")]
    Eng,
    #[default]
    #[serde(rename = "tha+eng")]
    ThaEng,
}

impl OcrLang {
    pub fn as_str(&self) -> &'static str {
        match self {
            OcrLang::Tha => "tha",
            OcrLang::Eng => "eng",
            OcrLang::ThaEng => "tha+eng",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        // '+' often arrives as a space when a query string is not encoded
        match s.to_lowercase().trim() {
            "tha" => Some(OcrLang::Tha),
            "eng" => Some(OcrLang::Eng),
            "tha+eng" | "tha eng" => Some(OcrLang::ThaEng),
            _ => None,
        }
    }
}

impl std::fmt::Display for OcrLang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One engine + language configuration, i.e. one variant store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariantSource {
    pub engine: String,
    pub lang: String,
}

impl VariantSource {
    pub fn new(engine: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            engine: engine.into(),
            lang: lang.into(),
        }
    }

    /// Tag stored on variant records, e.g. `tesseract_tha+eng`.
    pub fn tag(&self) -> String {
        format!("{}_{}", self.engine, self.lang)
    }

    /// Conventional store file name: `summary_{engine}_{lang}.csv`.
    pub fn file_name(&self) -> String {
        format!("summary_{}.csv", self.tag())
    }

    /// Parse a store file name back into its engine/language pair.
    ///
    /// The engine is everything up to the first `_` after the prefix, so
    /// language tags may themselves contain underscores.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let stem = name.strip_prefix("summary_")?.strip_suffix(".csv")?;
        let (engine, lang) = stem.split_once('_')?;
        if engine.is_empty() || lang.is_empty() {
            return None;
        }
        Some(Self::new(engine, lang))
    }
}

impl From<(OcrEngine, OcrLang)> for VariantSource {
    fn from((engine, lang): (OcrEngine, OcrLang)) -> Self {
        Self::new(engine.as_str(), lang.as_str())
    }
}

impl std::fmt::Display for VariantSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.engine, self.lang)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_round_trip() {
        let source = VariantSource::new("tesseract", "tha+eng");
        assert_eq!(source.file_name(), "summary_tesseract_tha+eng.csv");
        assert_eq!(
            VariantSource::from_file_name("summary_tesseract_tha+eng.csv"),
            Some(source)
        );
    }

    #[test]
    fn test_from_file_name_rejects_other_files() {
        assert_eq!(VariantSource::from_file_name("summary.csv"), None);
        assert_eq!(VariantSource::from_file_name("notes_tesseract_tha.csv"), None);
        assert_eq!(VariantSource::from_file_name("summary_tesseract_tha.txt"), None);
    }

    #[test]
    fn test_lang_parsing_accepts_unencoded_plus() {
        assert_eq!(OcrLang::from_str("tha+eng"), Some(OcrLang::ThaEng));
        assert_eq!(OcrLang::from_str("tha eng"), Some(OcrLang::ThaEng));
        assert_eq!(OcrLang::from_str("THA"), Some(OcrLang::Tha));
        assert_eq!(OcrLang::from_str("fra"), None);
    }

    #[test]
    fn test_engine_lang_into_source() {
        let source: VariantSource = (OcrEngine::Tesseract, OcrLang::default()).into();
        assert_eq!(source.tag(), "tesseract_tha+eng");
    }
}
