use serde::{ Deserialize, Serialize };
use std::fmt;
use std::str::FromStr;

/// One site's simulated audit snapshot. Built once per scan and never
/// mutated afterwards; the session that opens against it keeps its own copy.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WebsiteContext {
    pub url: String,
    pub timestamp: i64,
    pub platform: Platform,
    pub metrics: CoreMetrics,
    pub seo: SeoFindings,
    pub usability: UsabilityFindings,
    pub traffic: TrafficProfile,
    pub detected_issues: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Platform {
    Shopify,
    WordPress,
    Custom,
    Wix,
    Magento,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::Shopify => "Shopify",
            Platform::WordPress => "WordPress",
            Platform::Custom => "Custom",
            Platform::Wix => "Wix",
            Platform::Magento => "Magento",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParsePlatformError {
    message: String,
}

impl fmt::Display for ParsePlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParsePlatformError {}

impl FromStr for Platform {
    type Err = ParsePlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "shopify" => Ok(Platform::Shopify),
            "wordpress" => Ok(Platform::WordPress),
            "custom" => Ok(Platform::Custom),
            "wix" => Ok(Platform::Wix),
            "magento" => Ok(Platform::Magento),
            _ =>
                Err(ParsePlatformError {
                    message: format!("Invalid platform: '{}'", s),
                }),
        }
    }
}

/// Core Web Vitals of the simulated scan. LCP and INP are milliseconds.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CoreMetrics {
    pub lcp_ms: f64,
    pub cls: f64,
    pub inp_ms: f64,
    pub speed_score: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Indexability {
    Indexed,
    Noindex,
    Pending,
}

impl fmt::Display for Indexability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Indexability::Indexed => "Indexed",
            Indexability::Noindex => "Noindex",
            Indexability::Pending => "Pending",
        };
        write!(f, "{}", name)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SeoFindings {
    pub meta_tags: String,
    pub headings: Vec<String>,
    pub indexability: Indexability,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UsabilityFindings {
    pub mobile_friendly: bool,
    pub touch_targets: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrafficProfile {
    pub sources: TrafficSources,
    pub social_breakdown: SocialBreakdown,
    pub social_quality: SocialQuality,
}

/// Percentage shares per acquisition channel, conceptually summing to 100.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrafficSources {
    pub organic: u32,
    pub social: u32,
    pub direct: u32,
    pub paid: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SocialBreakdown {
    pub meta: u32,
    pub google: u32,
    pub linkedin: u32,
    pub tiktok: u32,
    pub other: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SocialQuality {
    pub bounce_rate: f64,
    pub time_on_site: String,
    pub conversions: u32,
}

/// One replayable audit in the local history file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub url: String,
    pub timestamp: i64,
    pub data: WebsiteContext,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_parses_case_insensitively() {
        assert_eq!("shopify".parse::<Platform>(), Ok(Platform::Shopify));
        assert_eq!("WordPress".parse::<Platform>(), Ok(Platform::WordPress));
        assert!("drupal".parse::<Platform>().is_err());
    }

    #[test]
    fn platform_displays_its_name() {
        assert_eq!(Platform::Magento.to_string(), "Magento");
        assert_eq!(Indexability::Noindex.to_string(), "Noindex");
    }
}
