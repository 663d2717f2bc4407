//! In-process node views over engine markup and the accessibility rewrites
//! applied to them.

use std::{cell::RefCell, rc::Rc};

use lol_html::{RewriteStrSettings, element, html_content::ContentType, rewrite_str};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum MarkupError {
    #[error("markup rewrite failed: {0}")]
    Rewrite(String),
}

/// Root attributes of a rendered SVG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorNode {
    pub width: String,
    pub height: String,
    pub style: String,
}

impl VectorNode {
    /// Read the root `<svg>` element. Returns `None` unless both `width` and
    /// `height` are present.
    pub fn parse(svg: &str) -> Option<Self> {
        let found: Rc<RefCell<Option<(Option<String>, Option<String>, Option<String>)>>> =
            Rc::new(RefCell::new(None));

        rewrite_str(
            svg,
            RewriteStrSettings {
                element_content_handlers: vec![element!("svg", {
                    let found = Rc::clone(&found);
                    move |el| {
                        let mut found = found.borrow_mut();
                        if found.is_none() {
                            *found = Some((
                                el.get_attribute("width"),
                                el.get_attribute("height"),
                                el.get_attribute("style"),
                            ));
                        }
                        Ok(())
                    }
                })],
                ..RewriteStrSettings::default()
            },
        )
        .ok()?;

        let (width, height, style) = found.borrow_mut().take()?;
        Some(Self {
            width: width?,
            height: height?,
            style: style.unwrap_or_default().trim().to_string(),
        })
    }

    /// Width and height in `ex`, when both are plain numbers in that unit.
    pub fn size_in_ex(&self) -> Option<(f64, f64)> {
        Some((parse_ex(&self.width)?, parse_ex(&self.height)?))
    }

    /// Inline style combining the intrinsic style with explicit dimensions.
    pub fn math_style(&self) -> String {
        format!(
            "{} width:{}; height:{};",
            self.style, self.width, self.height
        )
    }
}

fn parse_ex(value: &str) -> Option<f64> {
    let number = value.trim().strip_suffix("ex")?.trim();
    number.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Handle on a markup tree identified by its outermost element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupNode {
    pub root: String,
}

impl MarkupNode {
    pub fn parse(markup: &str) -> Option<Self> {
        let root: Rc<RefCell<Option<String>>> = Rc::new(RefCell::new(None));

        rewrite_str(
            markup,
            RewriteStrSettings {
                element_content_handlers: vec![element!("*", {
                    let root = Rc::clone(&root);
                    move |el| {
                        let mut root = root.borrow_mut();
                        if root.is_none() {
                            *root = Some(el.tag_name());
                        }
                        Ok(())
                    }
                })],
                ..RewriteStrSettings::default()
            },
        )
        .ok()?;

        let root = root.borrow_mut().take()?;
        Some(Self { root })
    }
}

/// Paint the SVG with an explicit foreground color for the rasterizer.
pub fn with_explicit_color(svg: &str) -> String {
    svg.replace("=\"currentColor\"", "=\"black\"")
}

/// Write `speak_text` into the SVG `<title>` and restore `xlink:` on `href`
/// attributes of `use` and `image` elements.
pub fn annotate_svg(svg: &str, speak_text: &str) -> Result<String, MarkupError> {
    let titled = Rc::new(RefCell::new(false));

    let rewritten = rewrite_str(
        svg,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("title", {
                    let titled = Rc::clone(&titled);
                    move |el| {
                        let mut titled = titled.borrow_mut();
                        if !*titled {
                            el.set_inner_content(speak_text, ContentType::Text);
                            *titled = true;
                        }
                        Ok(())
                    }
                }),
                element!("use[href], image[href]", |el| {
                    if el.get_attribute("xlink:href").is_none()
                        && let Some(href) = el.get_attribute("href")
                    {
                        el.remove_attribute("href");
                        el.set_attribute("xlink:href", &href)?;
                    }
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|err| MarkupError::Rewrite(err.to_string()))?;

    if *titled.borrow() {
        return Ok(rewritten);
    }

    let title = format!("<title>{}</title>", escape_text(speak_text));
    let inserted = Rc::new(RefCell::new(false));
    rewrite_str(
        &rewritten,
        RewriteStrSettings {
            element_content_handlers: vec![element!("svg", {
                let inserted = Rc::clone(&inserted);
                move |el| {
                    let mut inserted = inserted.borrow_mut();
                    if !*inserted {
                        el.prepend(&title, ContentType::Html);
                        *inserted = true;
                    }
                    Ok(())
                }
            })],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|err| MarkupError::Rewrite(err.to_string()))
}

/// Set `aria-label` on the outermost element of the auxiliary markup.
pub fn annotate_aux(markup: &str, label: &str) -> Result<String, MarkupError> {
    set_root_attribute(markup, "aria-label", label)
}

/// Set `alttext` on the MathML root. The rewriter only escapes quotes in
/// attribute values, so `&`, `<` and `>` are escaped here to keep the
/// document well-formed XML.
pub fn annotate_mathml(mml: &str, alttext: &str) -> Result<String, MarkupError> {
    set_root_attribute(mml, "alttext", &escape_text(alttext))
}

fn set_root_attribute(markup: &str, name: &'static str, value: &str) -> Result<String, MarkupError> {
    let done = Rc::new(RefCell::new(false));

    rewrite_str(
        markup,
        RewriteStrSettings {
            element_content_handlers: vec![element!("*", {
                let done = Rc::clone(&done);
                move |el| {
                    let mut done = done.borrow_mut();
                    if !*done {
                        el.set_attribute(name, value)?;
                        *done = true;
                    }
                    Ok(())
                }
            })],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|err| MarkupError::Rewrite(err.to_string()))
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
