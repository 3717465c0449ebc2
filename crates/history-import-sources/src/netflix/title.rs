use once_cell::sync::Lazy;
use regex::Regex;

// "Seinfeld: Season 4: The Bubble Boy (Episode 6)"
// "Outnumbered: Series 1: The City Farm (Episode 3)"
static EPISODE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(.+?):\s+(?:Season|Series)\s+(\d+):\s+.+?\s+\(Episode\s+(\d+)\)$")
        .expect("episode title regex should compile")
});

// "Adolescence: Limited Series: Episode 4 (Episode 4)"
// Limited series carry no season number; they log as season 1.
static LIMITED_SERIES_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(.+?):\s+Limited Series:\s+.+?\s+\(Episode\s+(\d+)\)$")
        .expect("limited series title regex should compile")
});

static COUNTRY_QUALIFIER_UK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\(U\.K\.\)").expect("UK qualifier regex should compile"));
static COUNTRY_QUALIFIER_US: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\(U\.S\.\)").expect("US qualifier regex should compile"));

/// Show name plus season/episode extracted from a Netflix title string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTitle {
    pub show_title: String,
    pub season: u32,
    pub episode: u32,
}

/// Parse a raw Netflix title into show/season/episode.
///
/// Returns `None` for titles that carry no episode structure; Netflix
/// writes movies as a bare title, so `None` means "not an episode".
/// Parsing is deterministic: the same raw string always yields the same
/// result.
pub fn parse_title(raw: &str) -> Option<ParsedTitle> {
    if let Some(caps) = EPISODE_PATTERN.captures(raw) {
        return Some(ParsedTitle {
            show_title: normalize_show_title(&caps[1]),
            season: caps[2].parse().ok()?,
            episode: caps[3].parse().ok()?,
        });
    }

    if let Some(caps) = LIMITED_SERIES_PATTERN.captures(raw) {
        return Some(ParsedTitle {
            show_title: normalize_show_title(&caps[1]),
            season: 1,
            episode: caps[2].parse().ok()?,
        });
    }

    None
}

/// Rewrite locale qualifiers Netflix uses into the form metadata search
/// understands: "The Office (U.K.)" -> "The Office UK".
pub fn normalize_show_title(title: &str) -> String {
    let normalized = COUNTRY_QUALIFIER_UK.replace_all(title, " UK");
    let normalized = COUNTRY_QUALIFIER_US.replace_all(&normalized, " US");
    normalized.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_regular_episode() {
        let parsed = parse_title("Seinfeld: Season 3: The Pen (Episode 5)").unwrap();
        assert_eq!(parsed.show_title, "Seinfeld");
        assert_eq!(parsed.season, 3);
        assert_eq!(parsed.episode, 5);
    }

    #[test]
    fn test_parse_series_keyword() {
        let parsed = parse_title("Outnumbered: Series 1: The City Farm (Episode 3)").unwrap();
        assert_eq!(parsed.show_title, "Outnumbered");
        assert_eq!(parsed.season, 1);
        assert_eq!(parsed.episode, 3);
    }

    #[test]
    fn test_parse_limited_series_is_season_one() {
        let parsed = parse_title("Adolescence: Limited Series: Episode 4 (Episode 4)").unwrap();
        assert_eq!(parsed.show_title, "Adolescence");
        assert_eq!(parsed.season, 1);
        assert_eq!(parsed.episode, 4);
    }

    #[test]
    fn test_movie_title_is_not_an_episode() {
        assert_eq!(parse_title("Glass Onion: A Knives Out Mystery"), None);
        assert_eq!(parse_title("Klaus"), None);
    }

    #[test]
    fn test_show_title_with_colon_keeps_shortest_prefix() {
        // Netflix writes the whole prefix before ": Season N:" as the show.
        let parsed =
            parse_title("Star Trek: Deep Space Nine: Season 2: The Wire (Episode 22)").unwrap();
        assert_eq!(parsed.show_title, "Star Trek: Deep Space Nine");
        assert_eq!(parsed.season, 2);
        assert_eq!(parsed.episode, 22);
    }

    #[test]
    fn test_normalize_country_qualifiers() {
        assert_eq!(normalize_show_title("The Office (U.K.)"), "The Office UK");
        assert_eq!(normalize_show_title("The Office (U.S.)"), "The Office US");
        assert_eq!(normalize_show_title("Severance"), "Severance");
    }

    #[test]
    fn test_parse_is_deterministic() {
        let raw = "Seinfeld: Season 4: The Bubble Boy (Episode 6)";
        assert_eq!(parse_title(raw), parse_title(raw));
    }
}
