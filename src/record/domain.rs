use url::Url;

/// Derives the vendor domain from a vendor website
///
/// The host is lowercased and a leading `www.` is removed. Websites given
/// without a scheme (`acme.com/about`, `acme.com:8080`) are parsed with an
/// `https://` prefix.
///
/// # Arguments
///
/// * `website` - The raw vendor website, if the marketplace exposes one
///
/// # Returns
///
/// * `Some(String)` - The host-only domain
/// * `None` - If the website is absent or cannot be parsed into a host
///
/// # Examples
///
/// ```
/// use listing_harvester::record::extract_vendor_domain;
///
/// assert_eq!(
///     extract_vendor_domain(Some("https://www.Example.com/path")),
///     Some("example.com".to_string())
/// );
/// assert_eq!(extract_vendor_domain(Some("acme.io")), Some("acme.io".to_string()));
/// assert_eq!(extract_vendor_domain(None), None);
/// ```
pub fn extract_vendor_domain(website: Option<&str>) -> Option<String> {
    let website = website?.trim();
    if website.is_empty() {
        return None;
    }

    // "acme.com:8080" parses as scheme "acme.com", so anything without "://" gets one
    let parsed = if website.contains("://") {
        Url::parse(website).ok()?
    } else {
        Url::parse(&format!("https://{}", website)).ok()?
    };

    let host = parsed.host_str()?.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);

    // "https://" alone or garbage that only yields a dot
    if host.is_empty() || !host.contains(|c: char| c.is_alphanumeric()) {
        return None;
    }

    Some(host.to_string())
}
