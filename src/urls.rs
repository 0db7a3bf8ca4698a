// ABOUTME: URL helpers for building site, theme and image URLs
// ABOUTME: Implements absolute/relative conversion, segment assembly and locale-aware site prefixing

use url::Url;

use crate::config::Settings;

/// Script name inserted after the site URL when front-controller URLs are requested.
const FRONT_CONTROLLER: &str = "index.php";

#[derive(Debug, Clone)]
pub struct UrlGenerator {
    settings: Settings,
}

impl UrlGenerator {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Site URL of the default locale
    pub fn site_url(&self) -> String {
        self.settings.site_url(None)
    }

    pub fn is_external(url: &str) -> bool {
        url.starts_with("http://") || url.starts_with("https://")
    }

    /// Prefix a relative URL with the default site URL
    pub fn make_absolute(&self, url: &str) -> String {
        if Self::is_external(url) {
            return url.to_string();
        }

        match Url::parse(&self.site_url()) {
            Ok(site) if site.has_host() => {
                let port = site.port().map(|p| format!(":{}", p)).unwrap_or_default();
                format!(
                    "{}://{}{}{}",
                    site.scheme(),
                    site.host_str().unwrap_or_default(),
                    port,
                    ensure_leading_slash(url)
                )
            }
            _ => ensure_leading_slash(url),
        }
    }

    /// Strip scheme and host, keeping path, query and fragment
    pub fn make_relative(&self, url: &str) -> String {
        match Url::parse(url) {
            Ok(parsed) if parsed.has_host() => {
                let mut relative = parsed.path().to_string();
                if let Some(query) = parsed.query() {
                    relative.push('?');
                    relative.push_str(query);
                }
                if let Some(fragment) = parsed.fragment() {
                    relative.push('#');
                    relative.push_str(fragment);
                }
                relative
            }
            _ => url.to_string(),
        }
    }

    /// Join segments with single slashes, keeping a leading slash or scheme of the first
    pub fn assemble<S: AsRef<str>>(segments: &[S]) -> String {
        let mut assembled = String::new();

        for (index, segment) in segments.iter().enumerate() {
            let segment = segment.as_ref();
            if segment.is_empty() {
                continue;
            }

            if assembled.is_empty() {
                assembled = if index == 0 {
                    segment.trim_end_matches('/').to_string()
                } else {
                    segment.trim_matches('/').to_string()
                };
                if assembled.is_empty() && segment.starts_with('/') {
                    assembled.push('/');
                }
                continue;
            }

            let trimmed = segment.trim_matches('/');
            if trimmed.is_empty() {
                continue;
            }
            if !assembled.ends_with('/') {
                assembled.push('/');
            }
            assembled.push_str(trimmed);
        }

        assembled
    }

    /// Prefix `url` with the site URL of `locale`, optionally through the front controller
    pub fn prepend_site_url(&self, url: &str, locale: Option<&str>, front_controller: bool) -> String {
        let site_url = self.settings.site_url(locale);

        if front_controller {
            Self::assemble(&[site_url.as_str(), FRONT_CONTROLLER, url])
        } else {
            Self::assemble(&[site_url.as_str(), url])
        }
    }
}

/// Ensure exactly one leading slash
pub fn ensure_leading_slash(path: &str) -> String {
    format!("/{}", path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> UrlGenerator {
        let settings = Settings::new()
            .with("system.locales.en.url", "https://example.com/")
            .with("system.locales.fr.url", "https://example.com/fr/");
        UrlGenerator::new(settings)
    }

    #[test]
    fn test_assemble() {
        assert_eq!(
            UrlGenerator::assemble(&["/site/themes/", "/redwood/", "css/app.css"]),
            "/site/themes/redwood/css/app.css"
        );
        assert_eq!(
            UrlGenerator::assemble(&["https://example.com/", "img", ""]),
            "https://example.com/img"
        );
        assert_eq!(UrlGenerator::assemble(&["/", "assets"]), "/assets");
        assert_eq!(UrlGenerator::assemble::<&str>(&[]), "");
    }

    #[test]
    fn test_make_absolute_and_relative() {
        let urls = generator();

        assert_eq!(
            urls.make_absolute("/img/a.jpg"),
            "https://example.com/img/a.jpg"
        );
        assert_eq!(
            urls.make_absolute("https://cdn.test/a.jpg"),
            "https://cdn.test/a.jpg"
        );
        assert_eq!(
            urls.make_relative("https://example.com/img/a.jpg?w=10#top"),
            "/img/a.jpg?w=10#top"
        );
        assert_eq!(urls.make_relative("/img/a.jpg"), "/img/a.jpg");
    }

    #[test]
    fn test_prepend_site_url() {
        let urls = generator();

        assert_eq!(
            urls.prepend_site_url("/site/themes/redwood/app.css", Some("fr"), false),
            "https://example.com/fr/site/themes/redwood/app.css"
        );
        assert_eq!(
            urls.prepend_site_url("blog", None, true),
            "https://example.com/index.php/blog"
        );
    }

    #[test]
    fn test_relative_site_url() {
        let urls = UrlGenerator::new(Settings::new());
        assert_eq!(urls.make_absolute("img/a.jpg"), "/img/a.jpg");
        assert_eq!(urls.prepend_site_url("/themes/a.css", None, false), "/themes/a.css");
    }
}
