//! Page templates compiled into the binary, overridable from disk.

use catalog_http::Views;
use catalog_kernel::settings::ViewSettings;

const EMBEDDED: &[(&str, &str)] = &[
    ("layout.html", include_str!("../templates/layout.html")),
    ("errors.html", include_str!("../templates/errors.html")),
    ("index.html", include_str!("../templates/index.html")),
    ("author_list.html", include_str!("../templates/author_list.html")),
    ("author_detail.html", include_str!("../templates/author_detail.html")),
    ("author_form.html", include_str!("../templates/author_form.html")),
    ("author_delete.html", include_str!("../templates/author_delete.html")),
    ("book_list.html", include_str!("../templates/book_list.html")),
    ("book_detail.html", include_str!("../templates/book_detail.html")),
    ("book_form.html", include_str!("../templates/book_form.html")),
    ("book_delete.html", include_str!("../templates/book_delete.html")),
    ("genre_list.html", include_str!("../templates/genre_list.html")),
    ("genre_detail.html", include_str!("../templates/genre_detail.html")),
    ("genre_form.html", include_str!("../templates/genre_form.html")),
    ("genre_delete.html", include_str!("../templates/genre_delete.html")),
    (
        "bookinstance_list.html",
        include_str!("../templates/bookinstance_list.html"),
    ),
    (
        "bookinstance_detail.html",
        include_str!("../templates/bookinstance_detail.html"),
    ),
    (
        "bookinstance_form.html",
        include_str!("../templates/bookinstance_form.html"),
    ),
    (
        "bookinstance_delete.html",
        include_str!("../templates/bookinstance_delete.html"),
    ),
];

/// Compile the configured template directory, or the embedded set when none is set.
pub fn load(settings: &ViewSettings) -> anyhow::Result<Views> {
    match &settings.template_dir {
        Some(dir) => {
            tracing::info!(dir = %dir.display(), "loading templates from disk");
            Views::from_dir(dir)
        }
        None => Views::from_sources(EMBEDDED),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_templates_compile() {
        let views = load(&ViewSettings::default()).unwrap();
        for (name, _) in EMBEDDED {
            assert!(views.has_template(name), "{name} missing");
        }
    }

    #[test]
    fn template_dir_override_is_used() {
        let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("templates");
        let settings = ViewSettings {
            template_dir: Some(dir),
        };
        let views = load(&settings).unwrap();
        assert!(views.has_template("book_form.html"));
    }
}
