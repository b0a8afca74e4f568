//! The site navigation bar: brand link home, call-to-action link to upload.

use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavLink {
    pub href: &'static str,
    pub label: &'static str,
    pub class: &'static str,
}

/// Static navigation element. No state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navbar {
    pub home: NavLink,
    pub upload: NavLink,
}

impl Default for Navbar {
    fn default() -> Self {
        Self {
            home: NavLink {
                href: "/",
                label: "RESUMIND",
                class: "text-lg sm:text-2xl font-bold text-gradient",
            },
            upload: NavLink {
                href: "/upload",
                label: "Upload Resume",
                class: "primary-button w-fit text-sm sm:text-2xl",
            },
        }
    }
}

impl Navbar {
    pub fn links(&self) -> [NavLink; 2] {
        [self.home, self.upload]
    }

    /// `<nav class="navbar">…</nav>`
    pub fn render_html(&self) -> String {
        let mut html = String::from(r#"<nav class="navbar">"#);
        let _ = write!(
            html,
            r#"<a href="{}"><p class="{}">{}</p></a>"#,
            self.home.href, self.home.class, self.home.label
        );
        let _ = write!(
            html,
            r#"<a href="{}" class="{}">{}</a>"#,
            self.upload.href, self.upload.class, self.upload.label
        );
        html.push_str("</nav>");
        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_home_and_upload_links() {
        let nav = Navbar::default();
        let hrefs: Vec<_> = nav.links().iter().map(|l| l.href).collect();
        assert_eq!(hrefs, vec!["/", "/upload"]);
    }

    #[test]
    fn renders_both_anchors() {
        let html = Navbar::default().render_html();
        assert!(html.starts_with(r#"<nav class="navbar">"#));
        assert!(html.contains(r#"<a href="/"><p class="text-lg sm:text-2xl font-bold text-gradient">RESUMIND</p></a>"#));
        assert!(html.contains(r#"href="/upload""#));
        assert!(html.contains(">Upload Resume</a>"));
        assert!(html.ends_with("</nav>"));
    }
}
