use crate::types::Source;

/// Built-in feed catalog: global technology coverage plus women-in-tech
/// outlets. Order is processing order.
pub fn default_sources() -> Vec<Source> {
    vec![
        // Global
        Source::new(
            "https://globalvoices.org/category/technology/feed/",
            "Global Voices Tech",
            9,
            "Global",
        ),
        Source::new("https://www.bbc.com/news/technology/rss.xml", "BBC Technology", 9, "UK"),
        // Asia-Pacific
        Source::new(
            "https://www.channelnewsasia.com/rss/8395894",
            "Channel NewsAsia Tech",
            8,
            "Singapore",
        ),
        Source::new("https://techinasia.com/feed", "Tech in Asia", 8, "Asia"),
        Source::new("https://www.itnews.asia/RSS/rss.ashx", "IT News Asia", 7, "Asia"),
        Source::new(
            "https://www.computerworld.com.au/feed/",
            "Computerworld Australia",
            8,
            "Australia",
        ),
        Source::new("https://techday.co.nz/feed", "Techday NZ", 7, "New Zealand"),
        // Africa
        Source::new(
            "https://allafrica.com/tools/headlines/rdf/africa/headlines.rdf",
            "AllAfrica Tech News",
            8,
            "Africa",
        ),
        Source::new("https://disrupt-africa.com/feed/", "Disrupt Africa", 8, "Africa"),
        // Canada
        Source::new("https://www.itworldcanada.com/feed", "IT World Canada", 8, "Canada"),
        // East and Southeast Asia
        Source::new(
            "https://www.scmp.com/rss/4/feed",
            "South China Morning Post Tech",
            8,
            "Hong Kong",
        ),
        Source::new(
            "https://www.bangkokpost.com/rss/data/tech.xml",
            "Bangkok Post Tech",
            7,
            "Thailand",
        ),
        // United States
        Source::new(
            "https://techcrunch.com/category/artificial-intelligence/feed/",
            "TechCrunch AI",
            9,
            "US",
        ),
        Source::new("https://www.technologyreview.com/feed/", "MIT Technology Review", 10, "US"),
        // Women-focused
        Source::new("https://www.forbes.com/women/feed/", "Forbes Women", 8, "US"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asian_outlets_carry_asian_origins() {
        let sources = default_sources();
        let origin_of = |name: &str| {
            sources
                .iter()
                .find(|s| s.name == name)
                .map(|s| s.origin.as_str())
        };

        assert_eq!(origin_of("South China Morning Post Tech"), Some("Hong Kong"));
        assert_eq!(origin_of("Bangkok Post Tech"), Some("Thailand"));
        assert_eq!(origin_of("IT World Canada"), Some("Canada"));
        assert_eq!(sources.last().map(|s| s.name.as_str()), Some("Forbes Women"));
    }
}
