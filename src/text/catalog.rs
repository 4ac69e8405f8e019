use crate::template::Language;

/// A font offered for selection, with the CSS-like value stored in template configs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontChoice {
    pub label: &'static str,
    pub value: &'static str,
    pub language: Language,
}

const fn choice(label: &'static str, value: &'static str, language: Language) -> FontChoice {
    FontChoice {
        label,
        value,
        language,
    }
}

pub const FONT_CHOICES: &[FontChoice] = &[
    choice("Arial", "Arial, sans-serif", Language::En),
    choice("Times New Roman", "Times New Roman, serif", Language::En),
    choice("Georgia", "Georgia, serif", Language::En),
    choice("Verdana", "Verdana, sans-serif", Language::En),
    choice("Courier New", "Courier New, monospace", Language::En),
    choice("Tahoma", "Tahoma, sans-serif", Language::En),
    choice("Trebuchet MS", "Trebuchet MS, sans-serif", Language::En),
    choice("Impact", "Impact, sans-serif", Language::En),
    choice(
        "Noto Nastaliq Urdu",
        "\"Noto Nastaliq Urdu\", serif",
        Language::Ur,
    ),
];

pub fn choices_for(language: Language) -> impl Iterator<Item = &'static FontChoice> {
    FONT_CHOICES
        .iter()
        .filter(move |choice| choice.language == language)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urdu_has_a_single_nastaliq_choice() {
        let urdu = choices_for(Language::Ur).collect::<Vec<_>>();
        assert_eq!(urdu.len(), 1);
        assert_eq!(urdu[0].label, "Noto Nastaliq Urdu");
    }

    #[test]
    fn english_choices_include_default_font() {
        assert!(choices_for(Language::En)
            .any(|choice| choice.value == crate::template::DEFAULT_FONT));
    }
}
