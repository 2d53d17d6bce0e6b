/// Caption language selected by a two-letter request code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Language {
    pub code: &'static str,
    pub name: &'static str,
}

const LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("fr", "French"),
    ("es", "Spanish"),
    ("de", "German"),
    ("th", "Thai"),
    ("jp", "Japanese"),
    ("cn", "Chinese"),
    ("it", "Italian"),
    ("nl", "Dutch"),
    ("pl", "Polish"),
    ("pt", "Portuguese"),
    ("ro", "Romanian"),
    ("ru", "Russian"),
    ("tr", "Turkish"),
    ("ar", "Arabic"),
    ("vi", "Vietnamese"),
    ("id", "Indonesian"),
    ("ms", "Malay"),
    ("hi", "Hindi"),
    ("bn", "Bengali"),
    ("ta", "Tamil"),
    ("te", "Telugu"),
];

impl Language {
    pub const ENGLISH: Self = Self {
        code: "en",
        name: "English",
    };

    /// Unknown or empty codes resolve to English.
    pub fn from_code(code: &str) -> Self {
        let code = code.trim().to_ascii_lowercase();
        LANGUAGES
            .iter()
            .find(|(c, _)| *c == code)
            .map(|&(code, name)| Self { code, name })
            .unwrap_or(Self::ENGLISH)
    }

    pub fn supported() -> impl Iterator<Item = Self> {
        LANGUAGES.iter().map(|&(code, name)| Self { code, name })
    }
}

impl Default for Language {
    fn default() -> Self {
        Self::ENGLISH
    }
}
