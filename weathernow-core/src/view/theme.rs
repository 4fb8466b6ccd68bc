use serde::Serialize;

use crate::model::WeatherSnapshot;

/// Background palette selected from the condition text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Theme {
    StormViolet,
    StormDark,
    OvercastGray,
    ClearWarm,
    DefaultBlue,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::StormViolet => "storm-violet",
            Theme::StormDark => "storm-dark",
            Theme::OvercastGray => "overcast-gray",
            Theme::ClearWarm => "clear-warm",
            Theme::DefaultBlue => "default-blue",
        }
    }

    /// Decorative background effect drawn behind the dashboard.
    pub fn animation(&self) -> Option<Animation> {
        match self {
            Theme::StormViolet => Some(Animation::Thunder),
            Theme::StormDark => Some(Animation::Rain),
            Theme::OvercastGray => Some(Animation::Clouds),
            Theme::ClearWarm => Some(Animation::Sun),
            Theme::DefaultBlue => None,
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Animation {
    Thunder,
    Rain,
    Clouds,
    Sun,
}

#[derive(Debug, Clone, Copy)]
pub struct ThemeRule {
    pub keywords: &'static [&'static str],
    pub theme: Theme,
}

/// Evaluated in order, first match wins. Keywords are lowercase.
pub const THEME_RULES: &[ThemeRule] = &[
    ThemeRule {
        keywords: &["thunderstorm", "thunder", "trovoada"],
        theme: Theme::StormViolet,
    },
    ThemeRule {
        keywords: &["rain", "drizzle", "chuva", "garoa"],
        theme: Theme::StormDark,
    },
    ThemeRule {
        keywords: &["cloud", "overcast", "nublado"],
        theme: Theme::OvercastGray,
    },
    ThemeRule {
        keywords: &["clear", "sun", "céu limpo", "sol"],
        theme: Theme::ClearWarm,
    },
];

/// Case-insensitive substring match of `description` against `rules`.
pub fn classify_with(rules: &[ThemeRule], description: &str) -> Theme {
    let desc = description.to_lowercase();
    rules
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| desc.contains(k)))
        .map(|rule| rule.theme)
        .unwrap_or(Theme::DefaultBlue)
}

pub fn classify(description: &str) -> Theme {
    classify_with(THEME_RULES, description)
}

pub fn theme_for(snapshot: Option<&WeatherSnapshot>) -> Theme {
    snapshot.map_or(Theme::DefaultBlue, |s| classify(&s.description))
}
