//! Built-in default content for every registered page.
//!
//! Used whenever the store has nothing for a page, and as the gap filler
//! under stored content.

use serde_json::{Value, json};

use crate::content::PageContent;

/// Default content for `page`. Empty for pages without a registry entry.
pub fn page_defaults(page: &str) -> PageContent {
    PageContent::from_value(default_value(page))
}

/// Human title for a page, used when the record is first created.
pub fn page_title(page: &str) -> String {
    match page {
        "home" => "Home".into(),
        "about" => "About".into(),
        "work" => "Work".into(),
        "contact" => "Contact".into(),
        "case-studies" => "Case Studies".into(),
        "shopify" => "Shopify".into(),
        other => other
            .split(['-', '_'])
            .filter(|w| !w.is_empty())
            .map(|w| {
                let mut chars = w.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" "),
    }
}

fn testimonial(id: &str, author: &str, role: &str, quote: &str) -> Value {
    json!({
        "id": id,
        "quote1": quote,
        "quote2": "",
        "authorName": author,
        "authorRole": role,
        "authorImage": "",
        "stat1Value": "",
        "stat1Label": "",
        "stat2Value": "",
        "stat2Label": "",
        "stat3Value": "",
        "stat3Label": "",
    })
}

fn default_value(page: &str) -> Value {
    match page {
        "about" => json!({
            "heroTitle1": "We build brands",
            "heroTitle2": "that move people",
            "heroDescription": "An independent studio for strategy, design and film.",
            "heroImage": "/images/about/hero.jpg",
            "storyTitle": "Our story",
            "storyText": "Started in a spare room, now a team of makers across three cities.",
            "storyImages": [
                "/images/about/story-1.jpg",
                "/images/about/story-2.jpg",
                "/images/about/story-3.jpg",
            ],
            "statsTitle": "In numbers",
            "stats": [
                { "value": "12", "label": "Years" },
                { "value": "240+", "label": "Projects" },
                { "value": "30", "label": "People" },
            ],
            "teamTitle": "The team",
            "teamDescription": "Designers, producers and engineers.",
            "teamPhotos": [
                { "id": "team-1", "image": "/images/about/team-1.jpg", "name": "Alex" },
                { "id": "team-2", "image": "/images/about/team-2.jpg", "name": "Sam" },
            ],
            "ctaTitle": "Have a project in mind?",
            "ctaButtonText": "Get in touch",
            "ctaButtonLink": "/contact",
        }),
        "work" => json!({
            "heroTitle": "Selected work",
            "heroSubtitle": "Campaigns, products and films we are proud of.",
            "heroMedia": { "url": "/videos/work-reel.mp4", "mediaType": "video" },
            "clientsTitle": "Trusted by",
            "clientLogos": [
                { "id": "client-1", "image": "/images/logos/client-1.svg", "name": "Northwind" },
                { "id": "client-2", "image": "/images/logos/client-2.svg", "name": "Contoso" },
            ],
            "testimonialsTitle": "What clients say",
            "testimonials": [
                testimonial("testimonial-1", "Jordan Lee", "CMO, Northwind", "They understood the brief before we finished writing it."),
            ],
            "ctaTitle": "Let's make something",
            "ctaButtonText": "Start a project",
        }),
        "contact" => json!({
            "heroTitle": "Say hello",
            "heroDescription": "Tell us about your project and we will get back within two days.",
            "formTitle": "Send a message",
            "formDescription": "All fields except company are required.",
            "submitButtonText": "Send",
            "email": "hello@example.com",
            "phone": "+1 555 0100",
            "address": "1 Studio Lane\nSpringfield",
            "officeImage": "/images/contact/office.jpg",
        }),
        "home" => json!({
            "heroTitle": "Stories worth watching",
            "heroSubtitle": "Brand, content and commerce for ambitious teams.",
            "heroMedia": { "url": "/videos/home-hero.mp4", "mediaType": "video" },
            "servicesTitle": "What we do",
            "servicesDescription": "Strategy, identity, film and e-commerce under one roof.",
            "serviceImages": [
                "/images/home/service-1.jpg",
                "/images/home/service-2.jpg",
                "/images/home/service-3.jpg",
            ],
            "stats": [
                { "value": "240+", "label": "Projects" },
                { "value": "18", "label": "Awards" },
            ],
            "showcaseTitle": "Latest reel",
            "showcaseMedia": { "url": "/images/home/showcase.jpg", "mediaType": "image" },
            "testimonials": [
                testimonial("testimonial-1", "Riley Chen", "Founder, Fieldwork", "Sales doubled in the first quarter after launch."),
            ],
            "ctaTitle": "Ready when you are",
            "ctaButtonText": "Contact us",
            "ctaButtonLink": "/contact",
        }),
        "case-studies" => json!({
            "heroTitle": "Case studies",
            "heroDescription": "How we approached some of our favourite briefs.",
            "heroImage": "/images/case-studies/hero.jpg",
            "introTitle": "Behind the work",
            "introText": "Each study walks through the problem, the process and the result.",
            "ctaTitle": "Want results like these?",
            "ctaButtonText": "Talk to us",
        }),
        "shopify" => json!({
            "heroTitle": "Shopify stores that sell",
            "heroSubtitle": "Design, build and growth for Shopify and Shopify Plus.",
            "heroMedia": { "url": "/images/shopify/hero.jpg", "mediaType": "image" },
            "heroButtonText": "Book a call",
            "logosTitle": "Partners",
            "partnerLogos": [
                { "id": "partner-1", "image": "/images/logos/shopify-plus.svg", "name": "Shopify Plus" },
            ],
            "featuresTitle": "Everything you need",
            "featuresText": "Theme development, apps, migrations and CRO.",
            "featureImages": [
                "/images/shopify/feature-1.jpg",
                "/images/shopify/feature-2.jpg",
            ],
            "stats": [
                { "value": "60+", "label": "Stores launched" },
                { "value": "3x", "label": "Average conversion lift" },
            ],
            "testimonials": [
                testimonial("testimonial-1", "Morgan Diaz", "Head of E-commerce, Tidewater", "Our migration went live with zero downtime."),
            ],
            "ctaTitle": "Grow your store",
            "ctaButtonText": "Get a quote",
            "ctaButtonLink": "/contact",
        }),
        _ => json!({}),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{KNOWN_PAGES, sections_for_page};

    #[test]
    fn test_defaults_cover_every_registry_key() {
        for page in KNOWN_PAGES {
            let defaults = page_defaults(page);
            for field in sections_for_page(page).iter().flat_map(|s| s.fields) {
                assert!(defaults.contains_key(field.key), "{page}: missing default for {}", field.key);
            }
            assert_eq!(
                defaults.fields().len(),
                sections_for_page(page).iter().map(|s| s.fields.len()).sum::<usize>(),
                "{page}: defaults carry keys outside the registry"
            );
        }
    }

    #[test]
    fn test_about_has_hero_title() {
        assert_eq!(page_defaults("about").text("heroTitle1"), "We build brands");
    }

    #[test]
    fn test_unknown_page_defaults_empty() {
        assert!(page_defaults("blog").is_empty());
    }

    #[test]
    fn test_page_title() {
        assert_eq!(page_title("case-studies"), "Case Studies");
        assert_eq!(page_title("press-kit"), "Press Kit");
    }
}
