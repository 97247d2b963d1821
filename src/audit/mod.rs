use chrono::Utc;
use log::info;
use rand::Rng;
use thiserror::Error;
use url::Url;

use crate::models::audit::*;

const SOCIAL_PLATFORMS: [&str; 6] = [
    "instagram.com",
    "facebook.com",
    "linkedin.com",
    "twitter.com",
    "tiktok.com",
    "youtube.com",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuditError {
    #[error("Audit restricted to professional websites only. Social media profiles are not supported.")]
    SocialProfile,
    #[error("Please enter a valid website domain (e.g., mysite.com).")]
    InvalidDomain,
}

/// Rejects social-profile URLs and obviously invalid domains.
pub fn validate_url(url: &str) -> Result<(), AuditError> {
    let lower = url.to_lowercase();
    if SOCIAL_PLATFORMS.iter().any(|platform| lower.contains(platform)) {
        return Err(AuditError::SocialProfile);
    }
    if !url.contains('.') || url.len() < 4 {
        return Err(AuditError::InvalidDomain);
    }
    Ok(())
}

/// Prefixes https:// when no scheme is present, then confirms the result
/// parses as a URL at all.
pub fn normalize_url(url: &str) -> Result<String, AuditError> {
    let normalized = if url.starts_with("http") {
        url.to_string()
    } else {
        format!("https://{}", url)
    };
    Url::parse(&normalized).map_err(|_| AuditError::InvalidDomain)?;
    Ok(normalized)
}

/// Produces one audit snapshot for a URL: deterministic in shape, randomized
/// in values. E-commerce-looking URLs get a checkout-focused closing issue.
pub fn generate_mock_audit(url: &str) -> WebsiteContext {
    let mut rng = rand::thread_rng();

    let is_ecommerce =
        url.contains("shop") || url.contains("store") || url.contains("ecommerce");
    let social_share = rng.gen_range(20..50);
    let organic_share = rng.gen_range(30..50);
    let direct_share = 15;

    let platform = match rng.gen_range(0..5) {
        0 => Platform::Shopify,
        1 => Platform::WordPress,
        2 => Platform::Custom,
        3 => Platform::Wix,
        _ => Platform::Magento,
    };
    info!("Generated mock audit for {} (platform: {})", url, platform);

    let bounce_rate = 78.0 + rng.gen::<f64>() * 10.0;

    WebsiteContext {
        url: url.to_string(),
        timestamp: Utc::now().timestamp(),
        platform,
        metrics: CoreMetrics {
            lcp_ms: 3200.0 + rng.gen::<f64>() * 1000.0,
            cls: 0.15 + rng.gen::<f64>() * 0.1,
            inp_ms: 280.0 + rng.gen::<f64>() * 50.0,
            speed_score: rng.gen_range(45..65),
        },
        seo: SeoFindings {
            meta_tags: "Missing Open Graph tags, Title too long (75 chars)".to_string(),
            headings: vec![
                "H1: Welcome to our site".to_string(),
                "H2: Our Products".to_string(),
                "H3: Quality counts".to_string()
            ],
            indexability: Indexability::Indexed,
        },
        usability: UsabilityFindings {
            mobile_friendly: rng.gen::<f64>() > 0.3,
            touch_targets: "Several links are too close together on mobile viewport.".to_string(),
        },
        traffic: TrafficProfile {
            sources: TrafficSources {
                organic: organic_share,
                social: social_share,
                direct: direct_share,
                paid: (100u32).saturating_sub(organic_share + social_share + direct_share),
            },
            social_breakdown: SocialBreakdown {
                meta: rng.gen_range(40..60),
                google: rng.gen_range(15..25),
                linkedin: rng.gen_range(10..20),
                tiktok: rng.gen_range(20..30),
                other: 5,
            },
            social_quality: SocialQuality {
                bounce_rate,
                time_on_site: "0m 42s".to_string(),
                conversions: 2,
            },
        },
        detected_issues: vec![
            "LCP exceeds 2.5s (Poor)".to_string(),
            format!("Social traffic bounce rate is critical ({}%)", bounce_rate.round() as u32),
            "High CLS on product listing pages".to_string(),
            "Missing schema markup for products".to_string(),
            "Large unoptimized image assets (>1MB)".to_string(),
            if is_ecommerce {
                "Cart abandonment rate likely high due to checkout friction".to_string()
            } else {
                "No clear CTA on homepage hero".to_string()
            }
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn social_profiles_are_rejected() {
        assert_eq!(validate_url("https://instagram.com/someshop"), Err(AuditError::SocialProfile));
        assert_eq!(validate_url("Facebook.com/page"), Err(AuditError::SocialProfile));
    }

    #[test]
    fn bare_or_dotless_strings_are_rejected() {
        assert_eq!(validate_url("abc"), Err(AuditError::InvalidDomain));
        assert_eq!(validate_url("a.b"), Err(AuditError::InvalidDomain));
        assert!(validate_url("mysite.com").is_ok());
    }

    #[test]
    fn normalize_prefixes_scheme_only_when_missing() {
        assert_eq!(normalize_url("mysite.com").as_deref(), Ok("https://mysite.com"));
        assert_eq!(normalize_url("http://mysite.com").as_deref(), Ok("http://mysite.com"));
        assert!(normalize_url("not a url at all").is_err());
    }

    #[test]
    fn mock_audit_values_stay_in_their_bands() {
        let audit = generate_mock_audit("https://mysite.com");
        assert!(audit.metrics.lcp_ms >= 3200.0 && audit.metrics.lcp_ms < 4200.0);
        assert!(audit.metrics.cls >= 0.15 && audit.metrics.cls < 0.25);
        assert!((45..65).contains(&audit.metrics.speed_score));
        assert!(audit.traffic.social_quality.bounce_rate >= 78.0);
        let sources = &audit.traffic.sources;
        let expected_paid =
            (100u32).saturating_sub(sources.organic + sources.social + sources.direct);
        assert_eq!(sources.paid, expected_paid);
        assert_eq!(audit.detected_issues.len(), 6);
    }

    #[test]
    fn ecommerce_urls_get_a_checkout_issue() {
        let audit = generate_mock_audit("https://big-store.com");
        assert!(audit.detected_issues.last().map_or(false, |i| i.contains("checkout")));

        let audit = generate_mock_audit("https://portfolio.dev");
        assert!(audit.detected_issues.last().map_or(false, |i| i.contains("CTA")));
    }
}
