//! Robots.txt sitemap directive scanning

/// Collects the value of every `Sitemap:` directive, in file order
///
/// The directive name is matched case-insensitively. Values are trimmed;
/// empty values and comment lines are skipped. Every other directive is
/// ignored since only entry points are of interest here.
///
/// # Examples
///
/// ```
/// use sitemap_tally::robots::parse_sitemap_directives;
///
/// let robots = "User-agent: *\nDisallow: /admin\nSitemap: https://a.com/sitemap.xml\n";
/// assert_eq!(parse_sitemap_directives(robots), vec!["https://a.com/sitemap.xml"]);
/// ```
pub fn parse_sitemap_directives(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once(':'))
        .filter(|(key, _)| key.trim().eq_ignore_ascii_case("sitemap"))
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}
