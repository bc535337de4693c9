//! The upload page.
//!
//! One template serves every HTML response: the empty form, the form with a
//! download link, and the form with error messages. The template name ends in
//! `.html`, so minijinja escapes every interpolated value.

use crate::category::Category;
use minijinja::Environment;
use serde::Serialize;

const INDEX_NAME: &str = "index.html";

const INDEX_TEMPLATE: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Document converter</title>
  <style>
    body { font-family: sans-serif; max-width: 40rem; margin: 2rem auto; }
    .messages li { color: #a40000; }
    .download { padding: .75rem; background: #eef7ee; border: 1px solid #9c9; }
  </style>
</head>
<body>
  <h1>Document converter</h1>
  <p>Convert Word, PowerPoint, Excel, text, Markdown and image files to PDF, or PDF to Word.</p>

  {% if messages %}
  <ul class="messages">
    {% for message in messages %}<li>{{ message }}</li>{% endfor %}
  </ul>
  {% endif %}

  {% if download_url %}
  <p class="download">
    {% if archived %}Your files are ready:{% else %}Your file is ready:{% endif %}
    <a href="{{ download_url }}">{{ download_name }}</a>
  </p>
  {% endif %}

  <form method="post" action="/" enctype="multipart/form-data">
    <p><input type="file" name="file" multiple></p>
    <p>
      <label for="conversion_type">Conversion type</label>
      <select id="conversion_type" name="conversion_type">
        <option value="">Detect from extension</option>
        {% for option in categories %}
        <option value="{{ option.value }}"{% if option.value == selected %} selected{% endif %}>{{ option.label }}</option>
        {% endfor %}
      </select>
    </p>
    <p><button type="submit">Convert</button></p>
  </form>
</body>
</html>
"#;

/// Build the template environment.
pub fn templates() -> Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template(INDEX_NAME, INDEX_TEMPLATE)?;
    Ok(env)
}

#[derive(Debug, Serialize)]
struct CategoryOption {
    value: &'static str,
    label: &'static str,
}

/// Values rendered into the upload page.
#[derive(Debug, Default, Serialize)]
pub struct PageView {
    pub messages: Vec<String>,
    pub download_url: Option<String>,
    pub download_name: Option<String>,
    pub archived: bool,
    /// Conversion type to keep selected after a submit.
    pub selected: Option<&'static str>,
}

#[derive(Serialize)]
struct PageContext<'a> {
    #[serde(flatten)]
    view: &'a PageView,
    categories: Vec<CategoryOption>,
}

/// Render the upload page.
pub fn render(env: &Environment<'_>, view: &PageView) -> Result<String, minijinja::Error> {
    let categories = Category::ALL
        .iter()
        .map(|c| CategoryOption {
            value: c.as_str(),
            label: c.label(),
        })
        .collect();
    env.get_template(INDEX_NAME)?
        .render(PageContext { view, categories })
}
