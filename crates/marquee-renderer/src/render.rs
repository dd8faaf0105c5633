use marquee_editor_core::preview::{EditorMode, EmbeddedPreview, PreviewMessage, PreviewPort};
use marquee_editor_core::{
    Control, FieldDescriptor, ImageItem, PageContent, Section, Stat, Testimonial, page_title,
    render_control, section_by_id, sections_for_page,
};
use minijinja::{AutoEscape, Environment, context};
use serde::Serialize;

use crate::error::{RenderError, Result};

/// ES module of the embedded preview runtime, as written by
/// `wasm-pack build --target web --out-name preview`. Its default export
/// loads the wasm and starts the runtime.
pub const DEFAULT_BOOTSTRAP_SRC: &str = "/assets/preview.js";

/// Per-request rendering switches.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions<'a> {
    pub mode: EditorMode,
    /// Highlighted section (editor mode only).
    pub selected: Option<&'a str>,
    /// The site's own origin, handed to the preview runtime.
    pub origin: Option<&'a str>,
}

impl<'a> RenderOptions<'a> {
    pub fn standalone() -> Self {
        Self::default()
    }

    pub fn embedded(selected: Option<&'a str>) -> Self {
        Self {
            mode: EditorMode::Embedded,
            selected,
            origin: None,
        }
    }

    pub fn with_origin(mut self, origin: &'a str) -> Self {
        self.origin = Some(origin);
        self
    }
}

#[derive(Serialize)]
struct SectionView<'a> {
    id: &'a str,
    label: &'a str,
    visible: bool,
    selected: bool,
    fields: Vec<FieldView<'a>>,
}

#[derive(Serialize)]
struct FieldView<'a> {
    key: &'a str,
    label: &'a str,
    #[serde(flatten)]
    body: FieldBody,
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum FieldBody {
    Heading { text: String },
    Paragraphs { paragraphs: Vec<String> },
    Image { url: String },
    Gallery { items: Vec<ImageItem> },
    Stats { rows: Vec<Stat> },
    Media { url: String, video: bool },
    Testimonials { items: Vec<Testimonial> },
}

/// Renders public pages from registry sections and page content.
pub struct PageRenderer {
    env: Environment<'static>,
    site_name: String,
    bootstrap_src: String,
}

impl PageRenderer {
    pub fn new(site_name: impl Into<String>) -> Result<Self> {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        env.add_template("page.html", include_str!("../templates/page.html"))?;
        env.add_template("section.html", include_str!("../templates/section.html"))?;
        env.add_template("field.html", include_str!("../templates/field.html"))?;
        Ok(Self {
            env,
            site_name: site_name.into(),
            bootstrap_src: DEFAULT_BOOTSTRAP_SRC.to_string(),
        })
    }

    pub fn with_bootstrap_src(mut self, src: impl Into<String>) -> Self {
        self.bootstrap_src = src.into();
        self
    }

    /// Render a full page.
    ///
    /// Standalone pages omit hidden sections. In editor mode hidden sections
    /// stay in the document, marked `data-hidden`, so they can still be
    /// selected, and every section gets its badge.
    pub fn render(&self, page: &str, content: &PageContent, options: &RenderOptions<'_>) -> Result<String> {
        let sections = sections_for_page(page);
        if sections.is_empty() {
            return Err(RenderError::UnknownPage { page: page.into() });
        }
        let editor = options.mode.is_embedded();
        let views: Vec<_> = sections
            .iter()
            .filter(|s| editor || content.is_section_visible(s.id))
            .map(|s| section_view(s, content, options))
            .collect();

        let template = self.env.get_template("page.html")?;
        let html = template.render(context! {
            page => page,
            title => page_title(page),
            site_name => self.site_name,
            editor => editor,
            sections => views,
            bootstrap_src => self.bootstrap_src,
            origin => options.origin,
        })?;
        tracing::debug!(page, editor, bytes = html.len(), "rendered page");
        Ok(html)
    }

    /// Render one section, regardless of its visibility.
    pub fn render_section(
        &self,
        page: &str,
        section_id: &str,
        content: &PageContent,
        options: &RenderOptions<'_>,
    ) -> Result<String> {
        let section = section_by_id(page, section_id).ok_or_else(|| RenderError::UnknownSection {
            page: page.into(),
            section: section_id.into(),
        })?;
        let template = self.env.get_template("section.html")?;
        Ok(template.render(context! {
            section => section_view(section, content, options),
            editor => options.mode.is_embedded(),
        })?)
    }

    /// Render whatever an embedded preview currently holds.
    pub fn render_preview<P: PreviewPort<PreviewMessage>>(&self, preview: &EmbeddedPreview<P>) -> Result<String> {
        let options = RenderOptions {
            mode: preview.mode(),
            selected: preview.selected_section(),
            origin: None,
        };
        self.render(preview.page(), preview.content(), &options)
    }

    /// Every section of an embedded preview, rendered on its own, for
    /// swapping into an already loaded page. Hidden sections are included.
    pub fn render_preview_sections<P: PreviewPort<PreviewMessage>>(
        &self,
        preview: &EmbeddedPreview<P>,
    ) -> Result<Vec<(&'static str, String)>> {
        let options = RenderOptions {
            mode: preview.mode(),
            selected: preview.selected_section(),
            origin: None,
        };
        preview
            .sections()
            .map(|(section, _)| {
                let html = self.render_section(preview.page(), section.id, preview.content(), &options)?;
                Ok((section.id, html))
            })
            .collect()
    }
}

fn section_view<'a>(section: &'a Section, content: &PageContent, options: &RenderOptions<'_>) -> SectionView<'a> {
    let editor = options.mode.is_embedded();
    SectionView {
        id: section.id,
        label: section.label,
        visible: content.is_section_visible(section.id),
        selected: editor && options.selected == Some(section.id),
        fields: section
            .fields
            .iter()
            .filter_map(|f| field_view(f, content))
            .collect(),
    }
}

/// `None` for fields with nothing to show.
fn field_view<'a>(descriptor: &'a FieldDescriptor, content: &PageContent) -> Option<FieldView<'a>> {
    let body = match render_control(descriptor, content.get(descriptor.key)) {
        Control::Text { value, .. } if value.trim().is_empty() => return None,
        Control::Text {
            value,
            multiline: false,
        } => FieldBody::Heading { text: value },
        Control::Text {
            value,
            multiline: true,
        } => FieldBody::Paragraphs {
            paragraphs: value
                .split("\n\n")
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect(),
        },
        Control::Image { url } => FieldBody::Image { url: url? },
        Control::ImageList { items, .. } if items.is_empty() => return None,
        Control::ImageList { items, .. } => FieldBody::Gallery { items },
        Control::Stats { rows, .. } if rows.is_empty() => return None,
        Control::Stats { rows, .. } => FieldBody::Stats { rows },
        Control::Media { url, media_type } => FieldBody::Media {
            url: url?,
            video: media_type.is_video(),
        },
        Control::Testimonials { items, .. } if items.is_empty() => return None,
        Control::Testimonials { items, .. } => FieldBody::Testimonials { items },
    };
    Some(FieldView {
        key: descriptor.key,
        label: descriptor.label,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_editor_core::page_defaults;
    use serde_json::json;

    fn renderer() -> PageRenderer {
        PageRenderer::new("Studio").unwrap()
    }

    #[test]
    fn test_standalone_omits_hidden_sections() {
        let mut content = page_defaults("about");
        content.set_section_visible("stats", false);
        let html = renderer()
            .render("about", &content, &RenderOptions::standalone())
            .unwrap();
        assert!(html.contains(r#"data-section-id="hero""#));
        assert!(!html.contains(r#"data-section-id="stats""#));
        assert!(!html.contains("section-badge"));
        assert!(!html.contains("<script"));
    }

    #[test]
    fn test_editor_mode_chrome() {
        let mut content = page_defaults("about");
        content.set_section_visible("stats", false);
        let html = renderer()
            .render("about", &content, &RenderOptions::embedded(Some("story")))
            .unwrap();
        assert!(html.contains(r#"data-section-id="stats""#));
        assert!(html.contains(r#"data-hidden="true""#));
        assert!(html.contains("section section-story is-selected"));
        assert!(!html.contains("section section-hero is-selected"));
        assert!(html.contains(r#"<span class="section-badge">Our story</span>"#));
        assert!(html.contains(r#"<script type="module">import init from "/assets/preview.js"; init();</script>"#));
        assert!(!html.contains("data-origin"));
    }

    #[test]
    fn test_editor_origin_on_body() {
        let html = renderer()
            .render(
                "about",
                &page_defaults("about"),
                &RenderOptions::embedded(None).with_origin("https://site.example"),
            )
            .unwrap();
        assert!(html.contains(r#"data-origin="https:&#x2f;&#x2f;site.example""#));

        let html = renderer()
            .render(
                "about",
                &page_defaults("about"),
                &RenderOptions::standalone().with_origin("https://site.example"),
            )
            .unwrap();
        assert!(!html.contains("data-origin"));
    }

    #[test]
    fn test_content_is_escaped() {
        let mut content = page_defaults("contact");
        content.set("heroTitle", json!("<script>alert(1)</script>"));
        let html = renderer()
            .render("contact", &content, &RenderOptions::standalone())
            .unwrap();
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_media_renders_by_type() {
        let mut content = page_defaults("home");
        content.set("heroMedia", json!("/videos/reel.webm"));
        content.set("showcaseMedia", json!({ "url": "/img/still.jpg", "mediaType": "image" }));
        let html = renderer()
            .render("home", &content, &RenderOptions::standalone())
            .unwrap();
        // Autoescape encodes `/`, so only match up to the attribute.
        assert!(html.contains(r#"<video class="field field-heroMedia" src="#));
        assert!(html.contains(r#"<img class="field field-showcaseMedia" src="#));
    }

    #[test]
    fn test_unknown_page() {
        let err = renderer()
            .render("blog", &PageContent::new(), &RenderOptions::standalone())
            .unwrap_err();
        assert!(matches!(err, RenderError::UnknownPage { .. }));
    }

    #[test]
    fn test_render_section_includes_fields() {
        let content = page_defaults("work");
        let html = renderer()
            .render_section("work", "testimonials", &content, &RenderOptions::standalone())
            .unwrap();
        assert!(html.contains("Jordan Lee"));
        assert!(html.contains(r#"data-item-id="testimonial-1""#));
    }
}
