//! SEO artifact builders: robots.txt, sitemap.xml, the RSS 2.0 feed and
//! the web app manifest.
//!
//! All builders are pure; the API layer gathers published entities and
//! passes them in.

use std::fmt::Write;

use serde::Serialize;

use crate::content::ContentKind;
use crate::types::Timestamp;

/// Number of posts included in the RSS feed.
pub const FEED_ITEM_LIMIT: i64 = 20;

/// Site identity used in feeds and absolute URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteInfo {
    /// Absolute base URL without a trailing slash, e.g. `https://example.com`.
    pub base_url: String,
    pub name: String,
    pub tagline: String,
}

impl SiteInfo {
    pub fn new(base_url: &str, name: &str, tagline: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            name: name.to_string(),
            tagline: tagline.to_string(),
        }
    }

    /// Join a site-relative path onto the base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Public page path of an entity.
pub fn entity_path(kind: ContentKind, slug: &str) -> String {
    match kind {
        ContentKind::Post => format!("/blog/{slug}"),
        ContentKind::PortfolioItem => format!("/portfolio/{slug}"),
    }
}

/// Escape text for inclusion in XML element content or attributes.
pub fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// robots.txt
// ---------------------------------------------------------------------------

pub fn robots_txt(site: &SiteInfo) -> String {
    format!(
        "User-agent: *\n\
         Allow: /\n\
         Disallow: /admin/\n\
         Disallow: /api/v1/admin/\n\
         Disallow: /api/v1/auth/\n\
         Crawl-delay: 1\n\
         \n\
         Sitemap: {}\n",
        site.url("/sitemap.xml")
    )
}

// ---------------------------------------------------------------------------
// sitemap.xml
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeFreq {
    Daily,
    Weekly,
    Monthly,
}

impl ChangeFreq {
    fn as_str(self) -> &'static str {
        match self {
            ChangeFreq::Daily => "daily",
            ChangeFreq::Weekly => "weekly",
            ChangeFreq::Monthly => "monthly",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub path: String,
    pub lastmod: Option<Timestamp>,
    pub changefreq: ChangeFreq,
    pub priority: f32,
}

impl SitemapEntry {
    /// Entry for a published entity, last modified at `updated_at`.
    pub fn for_entity(kind: ContentKind, slug: &str, updated_at: Timestamp) -> Self {
        Self {
            path: entity_path(kind, slug),
            lastmod: Some(updated_at),
            changefreq: ChangeFreq::Monthly,
            priority: match kind {
                ContentKind::Post => 0.8,
                ContentKind::PortfolioItem => 0.7,
            },
        }
    }
}

/// The fixed pages of the public site, stamped with `today`.
pub fn static_pages(today: Timestamp) -> Vec<SitemapEntry> {
    [
        ("/", ChangeFreq::Weekly, 1.0),
        ("/about", ChangeFreq::Monthly, 0.8),
        ("/portfolio", ChangeFreq::Weekly, 0.9),
        ("/blog", ChangeFreq::Daily, 0.9),
        ("/contact", ChangeFreq::Monthly, 0.7),
    ]
    .into_iter()
    .map(|(path, changefreq, priority)| SitemapEntry {
        path: path.to_string(),
        lastmod: Some(today),
        changefreq,
        priority,
    })
    .collect()
}

pub fn sitemap_xml(site: &SiteInfo, entries: &[SitemapEntry]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for entry in entries {
        xml.push_str("  <url>\n");
        let _ = writeln!(xml, "    <loc>{}</loc>", xml_escape(&site.url(&entry.path)));
        if let Some(lastmod) = entry.lastmod {
            let _ = writeln!(xml, "    <lastmod>{}</lastmod>", lastmod.format("%Y-%m-%d"));
        }
        let _ = writeln!(xml, "    <changefreq>{}</changefreq>", entry.changefreq.as_str());
        let _ = writeln!(xml, "    <priority>{:.1}</priority>", entry.priority);
        xml.push_str("  </url>\n");
    }
    xml.push_str("</urlset>\n");
    xml
}

// ---------------------------------------------------------------------------
// RSS feed
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem {
    pub title: String,
    pub slug: String,
    pub description: String,
    pub published_at: Timestamp,
    pub categories: Vec<String>,
}

/// Render an RSS 2.0 document. `built_at` is the channel's build date.
pub fn rss_feed(site: &SiteInfo, items: &[FeedItem], built_at: Timestamp) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <rss version=\"2.0\" xmlns:atom=\"http://www.w3.org/2005/Atom\">\n\
         <channel>\n",
    );
    let _ = writeln!(xml, "  <title>{}</title>", xml_escape(&site.name));
    let _ = writeln!(xml, "  <link>{}</link>", xml_escape(&site.url("/blog")));
    let _ = writeln!(xml, "  <description>{}</description>", xml_escape(&site.tagline));
    let _ = writeln!(
        xml,
        "  <atom:link href=\"{}\" rel=\"self\" type=\"application/rss+xml\"/>",
        xml_escape(&site.url("/feed.xml"))
    );
    let _ = writeln!(xml, "  <lastBuildDate>{}</lastBuildDate>", built_at.to_rfc2822());

    for item in items {
        let link = xml_escape(&site.url(&entity_path(ContentKind::Post, &item.slug)));
        xml.push_str("  <item>\n");
        let _ = writeln!(xml, "    <title>{}</title>", xml_escape(&item.title));
        let _ = writeln!(xml, "    <link>{link}</link>");
        let _ = writeln!(xml, "    <guid isPermaLink=\"true\">{link}</guid>");
        let _ = writeln!(xml, "    <description>{}</description>", xml_escape(&item.description));
        let _ = writeln!(xml, "    <pubDate>{}</pubDate>", item.published_at.to_rfc2822());
        for category in &item.categories {
            let _ = writeln!(xml, "    <category>{}</category>", xml_escape(category));
        }
        xml.push_str("  </item>\n");
    }

    xml.push_str("</channel>\n</rss>\n");
    xml
}

// ---------------------------------------------------------------------------
// Web app manifest
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestIcon {
    pub src: &'static str,
    pub sizes: &'static str,
    #[serde(rename = "type")]
    pub mime: &'static str,
}

/// `manifest.json` for installing the site as a progressive web app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebManifest {
    pub name: String,
    pub short_name: String,
    pub description: String,
    pub start_url: &'static str,
    pub display: &'static str,
    pub background_color: &'static str,
    pub theme_color: &'static str,
    pub orientation: &'static str,
    pub icons: Vec<ManifestIcon>,
    pub categories: Vec<&'static str>,
    pub lang: &'static str,
}

pub fn web_manifest(site: &SiteInfo) -> WebManifest {
    WebManifest {
        name: format!("{} - Terminal Interface", site.name),
        short_name: site.name.clone(),
        description: site.tagline.clone(),
        start_url: "/",
        display: "standalone",
        background_color: "#000012",
        theme_color: "#00ff00",
        orientation: "portrait-primary",
        icons: vec![
            ManifestIcon {
                src: "/icons/icon-192.png",
                sizes: "192x192",
                mime: "image/png",
            },
            ManifestIcon {
                src: "/icons/icon-512.png",
                sizes: "512x512",
                mime: "image/png",
            },
        ],
        categories: vec!["developer", "portfolio", "blog"],
        lang: "en",
    }
}
