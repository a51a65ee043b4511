//! Marketplace listings, one markdown file per platform

use crate::models::Classification;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Envato,
    CreativeMarket,
    Adobe,
    Etsy,
    Gumroad,
    Sellfy,
    CineD,
    FilterGrade,
    Own3d,
    Shopify,
}

impl Platform {
    pub const ALL: [Platform; 10] = [
        Platform::Envato,
        Platform::CreativeMarket,
        Platform::Adobe,
        Platform::Etsy,
        Platform::Gumroad,
        Platform::Sellfy,
        Platform::CineD,
        Platform::FilterGrade,
        Platform::Own3d,
        Platform::Shopify,
    ];

    /// File stem under `marketing/`
    pub fn slug(self) -> &'static str {
        match self {
            Platform::Envato => "envato",
            Platform::CreativeMarket => "creative_market",
            Platform::Adobe => "adobe",
            Platform::Etsy => "etsy",
            Platform::Gumroad => "gumroad",
            Platform::Sellfy => "sellfy",
            Platform::CineD => "cined",
            Platform::FilterGrade => "filtergrade",
            Platform::Own3d => "own3d",
            Platform::Shopify => "shopify",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Platform::Envato => "Envato Elements",
            Platform::CreativeMarket => "Creative Market",
            Platform::Adobe => "Adobe Exchange",
            Platform::Etsy => "Etsy",
            Platform::Gumroad => "Gumroad",
            Platform::Sellfy => "Sellfy",
            Platform::CineD => "CineD",
            Platform::FilterGrade => "FilterGrade",
            Platform::Own3d => "OWN3D",
            Platform::Shopify => "Shopify",
        }
    }

    fn price(self) -> &'static str {
        match self {
            Platform::Envato | Platform::Sellfy => "29€",
            Platform::CreativeMarket => "35€",
            Platform::Adobe | Platform::FilterGrade => "39€",
            Platform::Etsy => "19€",
            Platform::Gumroad => "25€+",
            Platform::CineD | Platform::Shopify => "49€",
            Platform::Own3d => "24€",
        }
    }

    fn audience(self) -> &'static str {
        match self {
            Platform::Envato | Platform::CreativeMarket => "designers and illustrators",
            Platform::Adobe => "Lightroom and Photoshop users",
            Platform::Etsy | Platform::Shopify => "hobby photographers",
            Platform::Gumroad | Platform::Sellfy => "independent creators",
            Platform::CineD | Platform::FilterGrade => "filmmakers and colorists",
            Platform::Own3d => "streamers and video creators",
        }
    }

    fn title(self, subject: &str, category: &str) -> String {
        match self {
            Platform::Envato => format!(
                "[CINEMATIC] {} - {} DNA Color Grade Pack for DaVinci & Premiere",
                subject, category
            ),
            Platform::CreativeMarket => format!("{} DNA Presets - {} Professional Color Matrix", subject, category),
            Platform::Adobe => format!("{} DNA Look - {} Premium CC Edition", subject, category),
            Platform::Etsy => format!("{} DNA Preset - {} Cinematic Digital Download", subject, category),
            Platform::Gumroad => format!("{} DNA Sequence - {} Full Professional Pipeline", subject, category),
            Platform::Sellfy => format!("{} DNA Tactical Look - {} Pro Colorist Series", subject, category),
            Platform::CineD => format!("{} Cinema Grade DNA - {} Tactical Edition", subject, category),
            Platform::FilterGrade => format!(
                "{} DNA Tactical Presets - {} Ultimate Creative Collection",
                subject, category
            ),
            Platform::Own3d => format!("Streamer {} DNA Look - {} Pro Tactical Grade", subject, category),
            Platform::Shopify => format!(
                "{} DNA Collection - {} Exclusive Professional Bundle",
                subject, category
            ),
        }
    }

    /// Platform-specific search keywords, appended after subject and category
    fn keywords(self) -> &'static [&'static str] {
        match self {
            Platform::Envato => &[
                "cinematic",
                "film look",
                "professional",
                "color grading",
                "hollywood-style",
                "davinci resolve",
                "luts",
            ],
            Platform::CreativeMarket => &[
                "photography",
                "presets",
                "lightroom",
                "editing",
                "dna",
                "high-end",
                "master-painter",
            ],
            Platform::Adobe => &["premiere", "photoshop", "lut", "dna", "cinematic"],
            Platform::Etsy => &["digital", "preset", "lut", "creator", "instagram", "vlogger"],
            Platform::Gumroad => &["creator", "color", "dna", "filmmaking"],
            Platform::Sellfy => &["pro", "preset", "lut", "fashion"],
            Platform::CineD => &["pro", "lut", "dna", "filmmaking"],
            Platform::FilterGrade => &["preset", "dna", "nature"],
            Platform::Own3d => &["gaming", "dna", "obs"],
            Platform::Shopify => &["pro", "dna", "agency"],
        }
    }
}

/// Markdown listing for one platform
pub fn render_listing(platform: Platform, classification: &Classification, integrity_tag: &str) -> String {
    let subject = classification.primary_subject.as_str();
    let category = classification.category.label();

    format!(
        "# {title}\n\
         \n\
         Platform: {platform}\n\
         Price: {price}\n\
         \n\
         A {category_lower} study derived from sequence data and tuned after {subject}. \
         Built for {audience}.\n\
         \n\
         ## Included\n\
         \n\
         - 3D LUT (.cube), standard and log variants\n\
         - Lightroom preset (.xmp)\n\
         - Krita preset (.kpp)\n\
         - Preset descriptor (PIF JSON)\n\
         \n\
         Tags: {subject_tag}, {category_tag}, {keywords}\n\
         \n\
         Integrity: {tag}\n",
        title = platform.title(subject, category),
        platform = platform.display_name(),
        price = platform.price(),
        category_lower = category.to_lowercase(),
        subject = subject,
        audience = platform.audience(),
        subject_tag = subject.to_lowercase(),
        category_tag = category.to_lowercase(),
        keywords = platform.keywords().join(", "),
        tag = integrity_tag,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use std::collections::HashSet;

    #[test]
    fn test_slugs_are_unique() {
        let slugs: HashSet<&str> = Platform::ALL.iter().map(|p| p.slug()).collect();
        assert_eq!(slugs.len(), 10);
    }

    #[test]
    fn test_every_listing_references_tag_and_subject() {
        let classification = Classification {
            primary_subject: "Van Gogh".to_string(),
            category: Category::Color,
        };
        for platform in Platform::ALL {
            let listing = render_listing(platform, &classification, "0123456789abcdef");
            assert!(listing.contains("Integrity: 0123456789abcdef"), "{}", platform.slug());
            assert!(listing.contains("Van Gogh"));
            assert!(listing.starts_with("# "));
        }
    }

    #[test]
    fn test_listing_carries_platform_title_price_and_keywords() {
        let classification = Classification {
            primary_subject: "Vermeer".to_string(),
            category: Category::Composition,
        };

        let envato = render_listing(Platform::Envato, &classification, "feedbeef00112233");
        assert!(envato.starts_with(
            "# [CINEMATIC] Vermeer - Composition DNA Color Grade Pack for DaVinci & Premiere\n"
        ));
        assert!(envato.contains("Price: 29€\n"));
        assert!(envato.contains("Tags: vermeer, composition, cinematic, film look,"));

        let gumroad = render_listing(Platform::Gumroad, &classification, "feedbeef00112233");
        assert!(gumroad.contains("Price: 25€+\n"));
        assert!(gumroad.ends_with("Integrity: feedbeef00112233\n"));
    }
}
